//! Spare part order domain types
//!
//! A part requested for a service. Orders move through their own small
//! state machine: pending -> ordered -> delivered.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Spare part order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartOrderStatus {
    Pending,
    Ordered,
    Delivered,
}

impl PartOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ordered => "ordered",
            Self::Delivered => "delivered",
        }
    }

    /// Orders only move forward, one step at a time.
    pub fn next(&self) -> Option<PartOrderStatus> {
        match self {
            Self::Pending => Some(Self::Ordered),
            Self::Ordered => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }
}

impl std::fmt::Display for PartOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "ordered" => Ok(Self::Ordered),
            "delivered" => Ok(Self::Delivered),
            other => Err(format!("unknown part order status '{other}'")),
        }
    }
}

/// Part order urgency, surfaced as a prefix in supplier notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartUrgency {
    Normal,
    High,
    Urgent,
}

impl PartUrgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl Default for PartUrgency {
    fn default() -> Self {
        Self::Normal
    }
}

impl FromStr for PartUrgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(format!("unknown part urgency '{other}'")),
        }
    }
}

/// Spare part order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparePartOrder {
    pub id: Uuid,
    pub service_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub part_name: String,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub urgency: PartUrgency,
    pub status: PartOrderStatus,
    /// Reference into the external parts catalog, when known
    pub catalog_ref: Option<String>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a part order under a service
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePartOrderRequest {
    pub part_name: String,
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub urgency: PartUrgency,
    #[serde(default)]
    pub catalog_ref: Option<String>,
}

/// Request DTO for `PUT /parts/{id}/status`
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePartStatusRequest {
    pub status: PartOrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_status_only_moves_forward() {
        assert_eq!(PartOrderStatus::Pending.next(), Some(PartOrderStatus::Ordered));
        assert_eq!(PartOrderStatus::Ordered.next(), Some(PartOrderStatus::Delivered));
        assert_eq!(PartOrderStatus::Delivered.next(), None);
    }
}
