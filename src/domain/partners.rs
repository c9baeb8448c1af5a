//! Business partner domain types
//!
//! Partners (property managers, retailers) refer services in and receive
//! SMS updates for tickets linked to them. They never drive transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Business partner entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BusinessPartner {
    pub id: Uuid,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a partner
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePartnerRequest {
    pub company_name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
