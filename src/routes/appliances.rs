//! Appliance routes
//!
//! Appliances are registered under a client and referenced by services.

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
use crate::domain::appliances::{Appliance, CreateApplianceRequest, UpdateApplianceRequest};
use crate::error::ApiError;

/// POST /clients/:client_id/appliances
///
/// Register an appliance for a client. Admin only.
pub async fn create_appliance(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<CreateApplianceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::role("only admins can register appliances"));
    }
    if req.category.trim().is_empty() || req.manufacturer.trim().is_empty() {
        return Err(ApiError::validation(
            "category and manufacturer must not be empty",
        ));
    }

    let client_exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM clients WHERE id = $1")
        .bind(client_id)
        .fetch_optional(&state.db)
        .await?;
    if client_exists.is_none() {
        return Err(ApiError::not_found("Client not found"));
    }

    let appliance = sqlx::query_as::<_, Appliance>(
        r#"
        INSERT INTO appliances (id, client_id, category, manufacturer, model, serial_number)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, client_id, category, manufacturer, model, serial_number,
                  created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(client_id)
    .bind(req.category.trim())
    .bind(req.manufacturer.trim())
    .bind(&req.model)
    .bind(&req.serial_number)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(appliance))))
}

/// GET /clients/:client_id/appliances
pub async fn list_appliances(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let appliances = sqlx::query_as::<_, Appliance>(
        r#"
        SELECT id, client_id, category, manufacturer, model, serial_number,
               created_at, updated_at
        FROM appliances
        WHERE client_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(client_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(appliances)))
}

/// GET /appliances/:appliance_id
pub async fn get_appliance(
    State(state): State<Arc<AppState>>,
    Path(appliance_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let appliance = sqlx::query_as::<_, Appliance>(
        r#"
        SELECT id, client_id, category, manufacturer, model, serial_number,
               created_at, updated_at
        FROM appliances
        WHERE id = $1
        "#,
    )
    .bind(appliance_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Appliance not found"))?;

    Ok(Json(DataResponse::new(appliance)))
}

/// PUT /appliances/:appliance_id
///
/// Corrective edits only. Admin only.
pub async fn update_appliance(
    State(state): State<Arc<AppState>>,
    Path(appliance_id): Path<Uuid>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<UpdateApplianceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::role("only admins can edit appliances"));
    }

    let appliance = sqlx::query_as::<_, Appliance>(
        r#"
        UPDATE appliances SET
            category = COALESCE($2, category),
            manufacturer = COALESCE($3, manufacturer),
            model = COALESCE($4, model),
            serial_number = COALESCE($5, serial_number),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, client_id, category, manufacturer, model, serial_number,
                  created_at, updated_at
        "#,
    )
    .bind(appliance_id)
    .bind(&req.category)
    .bind(&req.manufacturer)
    .bind(&req.model)
    .bind(&req.serial_number)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Appliance not found"))?;

    Ok(Json(DataResponse::new(appliance)))
}
