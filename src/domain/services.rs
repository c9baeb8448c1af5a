//! Service ticket domain types
//!
//! A service is one repair job. Its `status` field moves through the
//! closed set below and is only ever mutated by the workflow engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Closed set of service ticket statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Pending,
    Scheduled,
    Assigned,
    InProgress,
    WaitingParts,
    ClientNotHome,
    ClientNotAnswering,
    CustomerRefusedRepair,
    RepairFailed,
    DevicePickedUp,
    Completed,
    Cancelled,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 12] = [
        Self::Pending,
        Self::Scheduled,
        Self::Assigned,
        Self::InProgress,
        Self::WaitingParts,
        Self::ClientNotHome,
        Self::ClientNotAnswering,
        Self::CustomerRefusedRepair,
        Self::RepairFailed,
        Self::DevicePickedUp,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::WaitingParts => "waiting_parts",
            Self::ClientNotHome => "client_not_home",
            Self::ClientNotAnswering => "client_not_answering",
            Self::CustomerRefusedRepair => "customer_refused_repair",
            Self::RepairFailed => "repair_failed",
            Self::DevicePickedUp => "device_picked_up",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no outgoing transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Statuses that require a stored client-unavailability reason.
    pub fn requires_unavailability_reason(&self) -> bool {
        matches!(self, Self::ClientNotHome | Self::ClientNotAnswering)
    }

    /// Human wording used in notification texts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Assigned => "assigned to a technician",
            Self::InProgress => "in progress",
            Self::WaitingParts => "waiting for spare parts",
            Self::ClientNotHome => "client not home",
            Self::ClientNotAnswering => "client not answering",
            Self::CustomerRefusedRepair => "repair refused by customer",
            Self::RepairFailed => "repair failed",
            Self::DevicePickedUp => "device picked up",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown service status '{s}'"))
    }
}

/// Warranty coverage of the appliance on this ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarrantyStatus {
    InWarranty,
    OutOfWarranty,
}

impl WarrantyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InWarranty => "in_warranty",
            Self::OutOfWarranty => "out_of_warranty",
        }
    }
}

impl FromStr for WarrantyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_warranty" => Ok(Self::InWarranty),
            "out_of_warranty" => Ok(Self::OutOfWarranty),
            other => Err(format!("unknown warranty status '{other}'")),
        }
    }
}

/// Service ticket entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub client_id: Uuid,
    pub appliance_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub business_partner_id: Option<Uuid>,
    pub status: ServiceStatus,
    pub warranty_status: WarrantyStatus,
    pub problem_description: String,
    pub customer_refusal_reason: Option<String>,
    pub client_unavailable_reason: Option<String>,
    pub needs_rescheduling: bool,
    pub rescheduling_notes: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    /// Bumped on every status transition; backs the optimistic write check
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Service joined with the parties the dispatcher and detail view need.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDetail {
    #[serde(flatten)]
    pub service: Service,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
    pub appliance_category: String,
    pub appliance_manufacturer: String,
    pub appliance_model: Option<String>,
    pub technician_name: Option<String>,
    pub partner_company: Option<String>,
    pub partner_phone: Option<String>,
}

/// Request DTO for service intake
#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceRequest {
    pub client_id: Uuid,
    pub appliance_id: Uuid,
    pub problem_description: String,
    pub warranty_status: WarrantyStatus,
    #[serde(default)]
    pub technician_id: Option<Uuid>,
    #[serde(default)]
    pub business_partner_id: Option<Uuid>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
}

/// Request DTO for general edits (scheduling, assignment). Status is
/// deliberately absent; it only moves through the status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateServiceRequest {
    #[serde(default)]
    pub technician_id: Option<Uuid>,
    #[serde(default)]
    pub business_partner_id: Option<Uuid>,
    #[serde(default)]
    pub problem_description: Option<String>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
}

/// Request DTO for `PUT /services/{id}/status`
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: ServiceStatus,
    #[serde(default)]
    pub customer_refusal_reason: Option<String>,
    #[serde(default)]
    pub client_unavailable_reason: Option<String>,
    #[serde(default)]
    pub needs_rescheduling: Option<bool>,
    #[serde(default)]
    pub rescheduling_notes: Option<String>,
}

/// Query params for listing services
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceQuery {
    #[serde(default)]
    pub status: Option<ServiceStatus>,
    #[serde(default)]
    pub technician_id: Option<Uuid>,
    #[serde(default)]
    pub client_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in ServiceStatus::ALL {
            assert_eq!(status.as_str().parse::<ServiceStatus>(), Ok(status));
        }
        assert!("unknown".parse::<ServiceStatus>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(ServiceStatus::Completed.is_terminal());
        assert!(ServiceStatus::Cancelled.is_terminal());
        assert!(!ServiceStatus::InProgress.is_terminal());
        assert!(!ServiceStatus::DevicePickedUp.is_terminal());
    }

    #[test]
    fn status_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_value(ServiceStatus::CustomerRefusedRepair).unwrap(),
            serde_json::json!("customer_refused_repair")
        );
    }

    #[test]
    fn change_status_request_accepts_minimal_payload() {
        let req: ChangeStatusRequest =
            serde_json::from_str(r#"{"status": "client_not_home", "client_unavailable_reason": "no answer"}"#)
                .unwrap();
        assert_eq!(req.status, ServiceStatus::ClientNotHome);
        assert_eq!(req.client_unavailable_reason.as_deref(), Some("no answer"));
        assert_eq!(req.needs_rescheduling, None);
    }
}
