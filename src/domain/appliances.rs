//! Appliance domain types
//!
//! Category + manufacturer + model + serial, owned by a client and
//! referenced by service tickets. Immutable once created except for
//! corrective edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Appliance entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appliance {
    pub id: Uuid,
    pub client_id: Uuid,
    /// e.g. "washing_machine", "refrigerator", "oven"
    pub category: String,
    pub manufacturer: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for registering an appliance under a client
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApplianceRequest {
    pub category: String,
    pub manufacturer: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
}

/// Request DTO for corrective edits
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateApplianceRequest {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
}
