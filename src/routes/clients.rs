//! Client routes
//!
//! Client intake and directory management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::clients::{Client, ClientQuery, CreateClientRequest, UpdateClientRequest};
use crate::error::ApiError;

/// POST /clients
///
/// Register a new client. Admin only.
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<CreateClientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::role("only admins can register clients"));
    }
    if req.full_name.trim().is_empty() {
        return Err(ApiError::validation("full_name must not be empty"));
    }

    let client = sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients (id, full_name, phone, email, address, district, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, full_name, phone, email, address, district, notes,
                  created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.full_name.trim())
    .bind(&req.phone)
    .bind(&req.email)
    .bind(&req.address)
    .bind(&req.district)
    .bind(&req.notes)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(client))))
}

/// GET /clients
///
/// List clients, optionally filtered by a name/phone search term.
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(query): Query<ClientQuery>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let search = query
        .search
        .as_deref()
        .map(|s| format!("%{}%", s.trim()))
        .unwrap_or_else(|| "%".to_string());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM clients WHERE full_name ILIKE $1 OR phone ILIKE $1",
    )
    .bind(&search)
    .fetch_one(&state.db)
    .await?;

    let clients = sqlx::query_as::<_, Client>(
        r#"
        SELECT id, full_name, phone, email, address, district, notes,
               created_at, updated_at
        FROM clients
        WHERE full_name ILIKE $1 OR phone ILIKE $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&search)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    Ok(Paginated::new(clients, &pagination, total as u64))
}

/// GET /clients/:client_id
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let client = sqlx::query_as::<_, Client>(
        r#"
        SELECT id, full_name, phone, email, address, district, notes,
               created_at, updated_at
        FROM clients
        WHERE id = $1
        "#,
    )
    .bind(client_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Client not found"))?;

    Ok(Json(DataResponse::new(client)))
}

/// PUT /clients/:client_id
///
/// Corrective edits to client contact data. Admin only.
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<UpdateClientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::role("only admins can edit clients"));
    }

    let client = sqlx::query_as::<_, Client>(
        r#"
        UPDATE clients SET
            full_name = COALESCE($2, full_name),
            phone = COALESCE($3, phone),
            email = COALESCE($4, email),
            address = COALESCE($5, address),
            district = COALESCE($6, district),
            notes = COALESCE($7, notes),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, full_name, phone, email, address, district, notes,
                  created_at, updated_at
        "#,
    )
    .bind(client_id)
    .bind(&req.full_name)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(&req.address)
    .bind(&req.district)
    .bind(&req.notes)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Client not found"))?;

    Ok(Json(DataResponse::new(client)))
}
