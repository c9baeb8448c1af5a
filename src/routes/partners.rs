//! Business partner routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::partners::{BusinessPartner, CreatePartnerRequest};
use crate::error::ApiError;

/// POST /partners
///
/// Register a business partner. Admin only.
pub async fn create_partner(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<CreatePartnerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::role("only admins can register partners"));
    }
    if req.company_name.trim().is_empty() {
        return Err(ApiError::validation("company_name must not be empty"));
    }

    let partner = sqlx::query_as::<_, BusinessPartner>(
        r#"
        INSERT INTO business_partners (id, company_name, contact_name, phone, email, is_active)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        RETURNING id, company_name, contact_name, phone, email, is_active,
                  created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.company_name.trim())
    .bind(&req.contact_name)
    .bind(&req.phone)
    .bind(&req.email)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(partner))))
}

/// GET /partners
pub async fn list_partners(
    State(state): State<Arc<AppState>>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let partners = sqlx::query_as::<_, BusinessPartner>(
        r#"
        SELECT id, company_name, contact_name, phone, email, is_active,
               created_at, updated_at
        FROM business_partners
        ORDER BY company_name
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(partners)))
}

/// GET /partners/:partner_id
pub async fn get_partner(
    State(state): State<Arc<AppState>>,
    Path(partner_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let partner = sqlx::query_as::<_, BusinessPartner>(
        r#"
        SELECT id, company_name, contact_name, phone, email, is_active,
               created_at, updated_at
        FROM business_partners
        WHERE id = $1
        "#,
    )
    .bind(partner_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Partner not found"))?;

    Ok(Json(DataResponse::new(partner)))
}
