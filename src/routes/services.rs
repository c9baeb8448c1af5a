//! Service ticket routes
//!
//! Intake, listing, edits and soft delete, plus the status endpoint
//! that hands over to the workflow engine. Nothing here writes
//! `services.status` directly.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::services::{
    ChangeStatusRequest, CreateServiceRequest, Service, ServiceQuery, ServiceStatus,
    UpdateServiceRequest, WarrantyStatus,
};
use crate::error::ApiError;

/// Database row for a service
#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    client_id: Uuid,
    appliance_id: Uuid,
    technician_id: Option<Uuid>,
    business_partner_id: Option<Uuid>,
    status: String,
    warranty_status: String,
    problem_description: String,
    customer_refusal_reason: Option<String>,
    client_unavailable_reason: Option<String>,
    needs_rescheduling: bool,
    rescheduling_notes: Option<String>,
    scheduled_date: Option<DateTime<Utc>>,
    completed_date: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ServiceRow> for Service {
    type Error = ApiError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ServiceStatus>()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;
        let warranty_status = row
            .warranty_status
            .parse::<WarrantyStatus>()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;

        Ok(Service {
            id: row.id,
            client_id: row.client_id,
            appliance_id: row.appliance_id,
            technician_id: row.technician_id,
            business_partner_id: row.business_partner_id,
            status,
            warranty_status,
            problem_description: row.problem_description,
            customer_refusal_reason: row.customer_refusal_reason,
            client_unavailable_reason: row.client_unavailable_reason,
            needs_rescheduling: row.needs_rescheduling,
            rescheduling_notes: row.rescheduling_notes,
            scheduled_date: row.scheduled_date,
            completed_date: row.completed_date,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SERVICE_COLUMNS: &str = r#"id, client_id, appliance_id, technician_id, business_partner_id,
    status, warranty_status, problem_description,
    customer_refusal_reason, client_unavailable_reason,
    needs_rescheduling, rescheduling_notes,
    scheduled_date, completed_date, version, created_at, updated_at"#;

/// POST /services
///
/// Service intake. Admin only; a ticket always starts as `pending`.
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<CreateServiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::role("only admins can create services"));
    }
    if req.problem_description.trim().is_empty() {
        return Err(ApiError::validation("problem_description must not be empty"));
    }

    // The appliance must belong to the client on the ticket
    let owner: Option<Uuid> = sqlx::query_scalar("SELECT client_id FROM appliances WHERE id = $1")
        .bind(req.appliance_id)
        .fetch_optional(&state.db)
        .await?;
    match owner {
        None => return Err(ApiError::not_found("Appliance not found")),
        Some(owner) if owner != req.client_id => {
            return Err(ApiError::validation(
                "appliance does not belong to the given client",
            ))
        }
        Some(_) => {}
    }

    let row = sqlx::query_as::<_, ServiceRow>(&format!(
        r#"
        INSERT INTO services (id, client_id, appliance_id, technician_id,
                              business_partner_id, status, warranty_status,
                              problem_description, scheduled_date)
        VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8)
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(req.client_id)
    .bind(req.appliance_id)
    .bind(req.technician_id)
    .bind(req.business_partner_id)
    .bind(req.warranty_status.as_str())
    .bind(req.problem_description.trim())
    .bind(req.scheduled_date)
    .fetch_one(&state.db)
    .await?;

    let service = Service::try_from(row)?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(service))))
}

/// GET /services
///
/// List services with optional status / technician / client filters.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(query): Query<ServiceQuery>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let status_filter = query.status.map(|s| s.as_str().to_string());

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM services
        WHERE deleted_at IS NULL
          AND ($1::text IS NULL OR status = $1)
          AND ($2::uuid IS NULL OR technician_id = $2)
          AND ($3::uuid IS NULL OR client_id = $3)
        "#,
    )
    .bind(&status_filter)
    .bind(query.technician_id)
    .bind(query.client_id)
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query_as::<_, ServiceRow>(&format!(
        r#"
        SELECT {SERVICE_COLUMNS}
        FROM services
        WHERE deleted_at IS NULL
          AND ($1::text IS NULL OR status = $1)
          AND ($2::uuid IS NULL OR technician_id = $2)
          AND ($3::uuid IS NULL OR client_id = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#
    ))
    .bind(&status_filter)
    .bind(query.technician_id)
    .bind(query.client_id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let services = rows
        .into_iter()
        .map(Service::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Paginated::new(services, &pagination, total as u64))
}

/// GET /services/:service_id
///
/// Joined detail view: service + client + appliance + technician + partner.
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.store.get_service_detail(service_id).await?;
    Ok(Json(DataResponse::new(detail)))
}

/// PUT /services/:service_id
///
/// General edits: assignment, scheduling, description. Status never
/// moves here. Admin only.
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<UpdateServiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::role("only admins can edit services"));
    }

    if let Some(technician_id) = req.technician_id {
        let active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM technicians WHERE id = $1")
                .bind(technician_id)
                .fetch_optional(&state.db)
                .await?;
        match active {
            None => return Err(ApiError::not_found("Technician not found")),
            Some(false) => {
                return Err(ApiError::validation(
                    "cannot assign an inactive technician",
                ))
            }
            Some(true) => {}
        }
    }

    let row = sqlx::query_as::<_, ServiceRow>(&format!(
        r#"
        UPDATE services SET
            technician_id = COALESCE($2, technician_id),
            business_partner_id = COALESCE($3, business_partner_id),
            problem_description = COALESCE($4, problem_description),
            scheduled_date = COALESCE($5, scheduled_date),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(service_id)
    .bind(req.technician_id)
    .bind(req.business_partner_id)
    .bind(&req.problem_description)
    .bind(req.scheduled_date)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Service not found"))?;

    let service = Service::try_from(row)?;
    Ok(Json(DataResponse::new(service)))
}

/// DELETE /services/:service_id
///
/// Soft delete: the record stays for the audit trail but disappears
/// from reads and cannot transition anymore. Admin only.
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    RequireAuth(actor): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::role("only admins can delete services"));
    }

    let result = sqlx::query(
        "UPDATE services SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(service_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Service not found"));
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Service deleted")),
    ))
}

/// PUT /services/:service_id/status
///
/// The only way a service status moves. Delegates to the workflow
/// engine; the response reflects the persisted status, not the
/// notification outcomes.
pub async fn change_status(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = state.engine.change_status(service_id, &actor, &req).await?;
    Ok(Json(DataResponse::new(service)))
}
