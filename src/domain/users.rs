//! Back-office user domain types
//!
//! Admin users form the always-notified recipient group for every
//! service transition; only their dispatch contact data is modeled here.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Contact projection of an active admin user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminContact {
    pub id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
}
