//! Client domain types
//!
//! A client is the appliance owner the business serves. Phone is the
//! primary notification address; email is optional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Client entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for client intake
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClientRequest {
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request DTO for corrective edits
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateClientRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query params for listing clients
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClientQuery {
    /// Case-insensitive match on name or phone
    #[serde(default)]
    pub search: Option<String>,
}
