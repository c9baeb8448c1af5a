//! Entity store seam for the workflow engine.
//!
//! The engine talks to persistence through this trait only, which keeps
//! the transition/notification logic testable against an in-memory
//! store. `PgEntityStore` is the production implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::parts::{PartOrderStatus, SparePartOrder};
use crate::domain::services::{Service, ServiceDetail, ServiceStatus};
use crate::domain::users::AdminContact;
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// The version-checked write matched no row: another transition won.
    #[error("concurrent modification")]
    VersionConflict,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::not_found("Service not found"),
            StoreError::VersionConflict => {
                ApiError::conflict("Service was modified concurrently, reload and retry")
            }
            StoreError::Database(e) => ApiError::Database(e),
        }
    }
}

/// Field set persisted atomically with a status transition.
#[derive(Debug, Clone)]
pub struct StatusWrite {
    pub status: ServiceStatus,
    pub customer_refusal_reason: Option<String>,
    pub client_unavailable_reason: Option<String>,
    pub needs_rescheduling: bool,
    pub rescheduling_notes: Option<String>,
    pub completed_date: Option<DateTime<Utc>>,
    /// Version the transition was validated against
    pub expected_version: i64,
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Load a service joined with client, appliance, technician and
    /// partner. Soft-deleted services are not found.
    async fn get_service_detail(&self, id: Uuid) -> Result<ServiceDetail, StoreError>;

    /// Persist a validated transition as a single version-checked write.
    async fn apply_status_write(&self, id: Uuid, write: &StatusWrite)
        -> Result<Service, StoreError>;

    /// Active admin users for notification fan-out.
    async fn get_admin_contacts(&self) -> Result<Vec<AdminContact>, StoreError>;

    async fn get_part_order(&self, id: Uuid) -> Result<SparePartOrder, StoreError>;

    /// Persist a part order status step, stamping ordered_at/delivered_at.
    async fn apply_part_status(
        &self,
        id: Uuid,
        status: PartOrderStatus,
    ) -> Result<SparePartOrder, StoreError>;
}
