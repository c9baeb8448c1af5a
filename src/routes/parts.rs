//! Spare part order routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::{ActorRole, RequireAuth};
use crate::domain::parts::{
    ChangePartStatusRequest, CreatePartOrderRequest, PartOrderStatus, PartUrgency, SparePartOrder,
};
use crate::error::ApiError;

/// Database row for a spare part order
#[derive(Debug, sqlx::FromRow)]
struct PartOrderRow {
    id: Uuid,
    service_id: Uuid,
    technician_id: Option<Uuid>,
    part_name: String,
    quantity: i32,
    unit_price: Option<Decimal>,
    urgency: String,
    status: String,
    catalog_ref: Option<String>,
    ordered_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PartOrderRow> for SparePartOrder {
    type Error = ApiError;

    fn try_from(row: PartOrderRow) -> Result<Self, Self::Error> {
        let urgency = row
            .urgency
            .parse::<PartUrgency>()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;
        let status = row
            .status
            .parse::<PartOrderStatus>()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;

        Ok(SparePartOrder {
            id: row.id,
            service_id: row.service_id,
            technician_id: row.technician_id,
            part_name: row.part_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            urgency,
            status,
            catalog_ref: row.catalog_ref,
            ordered_at: row.ordered_at,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// POST /services/:service_id/parts
///
/// Request a part for a service. Admins, or the technician assigned to
/// the service.
pub async fn create_part_order(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<CreatePartOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.part_name.trim().is_empty() {
        return Err(ApiError::validation("part_name must not be empty"));
    }
    if req.quantity < 1 {
        return Err(ApiError::validation("quantity must be at least 1"));
    }

    let assigned: Option<Option<Uuid>> = sqlx::query_scalar(
        "SELECT technician_id FROM services WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(service_id)
    .fetch_optional(&state.db)
    .await?;
    let assigned = assigned.ok_or_else(|| ApiError::not_found("Service not found"))?;

    match actor.role {
        ActorRole::Admin => {}
        ActorRole::Technician => {
            if assigned != Some(actor.id) {
                return Err(ApiError::role(
                    "technicians can only order parts for services assigned to them",
                ));
            }
        }
        ActorRole::BusinessPartner => {
            return Err(ApiError::role("business partners cannot order parts"))
        }
    }

    let technician_id = match actor.role {
        ActorRole::Technician => Some(actor.id),
        _ => assigned,
    };

    let row = sqlx::query_as::<_, PartOrderRow>(
        r#"
        INSERT INTO spare_part_orders (id, service_id, technician_id, part_name,
                                       quantity, unit_price, urgency, status, catalog_ref)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8)
        RETURNING id, service_id, technician_id, part_name, quantity, unit_price,
                  urgency, status, catalog_ref, ordered_at, delivered_at,
                  created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(service_id)
    .bind(technician_id)
    .bind(req.part_name.trim())
    .bind(req.quantity)
    .bind(req.unit_price)
    .bind(req.urgency.as_str())
    .bind(&req.catalog_ref)
    .fetch_one(&state.db)
    .await?;

    let order = SparePartOrder::try_from(row)?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(order))))
}

/// GET /services/:service_id/parts
pub async fn list_part_orders(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, PartOrderRow>(
        r#"
        SELECT id, service_id, technician_id, part_name, quantity, unit_price,
               urgency, status, catalog_ref, ordered_at, delivered_at,
               created_at, updated_at
        FROM spare_part_orders
        WHERE service_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(service_id)
    .fetch_all(&state.db)
    .await?;

    let orders = rows
        .into_iter()
        .map(SparePartOrder::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse::new(orders)))
}

/// PUT /parts/:part_id/status
///
/// Advance a part order (pending -> ordered -> delivered) through the
/// workflow engine, which also fans out the parts notifications.
pub async fn change_part_status(
    State(state): State<Arc<AppState>>,
    Path(part_id): Path<Uuid>,
    RequireAuth(actor): RequireAuth,
    Json(req): Json<ChangePartStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .engine
        .change_part_status(part_id, &actor, req.status)
        .await?;
    Ok(Json(DataResponse::new(order)))
}
