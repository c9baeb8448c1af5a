//! Technician routes

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
use crate::domain::technicians::{
    CreateTechnicianRequest, Technician, UpdateTechnicianRequest,
};
use crate::error::ApiError;

/// POST /technicians
///
/// Register a technician. Admin only.
pub async fn create_technician(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<CreateTechnicianRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::role("only admins can register technicians"));
    }
    if req.full_name.trim().is_empty() {
        return Err(ApiError::validation("full_name must not be empty"));
    }

    let technician = sqlx::query_as::<_, Technician>(
        r#"
        INSERT INTO technicians (id, full_name, phone, email, is_active)
        VALUES ($1, $2, $3, $4, TRUE)
        RETURNING id, full_name, phone, email, is_active, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.full_name.trim())
    .bind(&req.phone)
    .bind(&req.email)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(technician))))
}

/// GET /technicians
pub async fn list_technicians(
    State(state): State<Arc<AppState>>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let technicians = sqlx::query_as::<_, Technician>(
        r#"
        SELECT id, full_name, phone, email, is_active, created_at, updated_at
        FROM technicians
        ORDER BY full_name
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(technicians)))
}

/// GET /technicians/:technician_id
pub async fn get_technician(
    State(state): State<Arc<AppState>>,
    Path(technician_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let technician = sqlx::query_as::<_, Technician>(
        r#"
        SELECT id, full_name, phone, email, is_active, created_at, updated_at
        FROM technicians
        WHERE id = $1
        "#,
    )
    .bind(technician_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Technician not found"))?;

    Ok(Json(DataResponse::new(technician)))
}

/// PUT /technicians/:technician_id
///
/// Update contact data or deactivate. Admin only.
pub async fn update_technician(
    State(state): State<Arc<AppState>>,
    Path(technician_id): Path<Uuid>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<UpdateTechnicianRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::role("only admins can edit technicians"));
    }

    let technician = sqlx::query_as::<_, Technician>(
        r#"
        UPDATE technicians SET
            full_name = COALESCE($2, full_name),
            phone = COALESCE($3, phone),
            email = COALESCE($4, email),
            is_active = COALESCE($5, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, full_name, phone, email, is_active, created_at, updated_at
        "#,
    )
    .bind(technician_id)
    .bind(&req.full_name)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(req.is_active)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Technician not found"))?;

    Ok(Json(DataResponse::new(technician)))
}
