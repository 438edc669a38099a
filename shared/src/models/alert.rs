//! Stock alert models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Alert severity derived from the current snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "alert_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    OutOfStock,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowStock => "low_stock",
            AlertType::OutOfStock => "out_of_stock",
        }
    }
}

/// The alert slot for a (branch, item) pair.
///
/// At most one unresolved alert exists per pair at any time; a new qualifying
/// state resolves the prior alert and creates a fresh one.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockAlert {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub raw_item_id: Uuid,
    pub alert_type: AlertType,
    /// Quantity in storage units at the time the alert was raised
    pub current_quantity: Decimal,
    pub threshold_quantity: Decimal,
    pub is_resolved: bool,
    /// Staff member who acknowledged the alert; empty for automatic resolution
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
