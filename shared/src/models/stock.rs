//! Stock snapshot and movement-ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kinds of stock movements recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Purchase,
    Waste,
    Adjustment,
    Return,
    OrderDeduction,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Purchase => "purchase",
            MovementType::Waste => "waste",
            MovementType::Adjustment => "adjustment",
            MovementType::Return => "return",
            MovementType::OrderDeduction => "order_deduction",
        }
    }

    /// Movement types a caller may record through the stock-in operation
    pub fn allowed_for_stock_in(&self) -> bool {
        matches!(self, MovementType::Purchase | MovementType::Adjustment)
    }

    /// Movement types a caller may record through the stock-out operation.
    /// Order deductions only enter the ledger via the order-deduction path.
    pub fn allowed_for_stock_out(&self) -> bool {
        matches!(
            self,
            MovementType::Waste | MovementType::Adjustment | MovementType::Return
        )
    }
}

/// Current stock snapshot for one (branch, item) pair.
///
/// `current_quantity` is a materialized view of the movement ledger: summing
/// every `quantity_delta` for the pair reproduces it exactly.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BranchStock {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub raw_item_id: Uuid,
    /// Storage units, never negative
    pub current_quantity: Decimal,
    /// Storage units held for pending orders, never negative and never above
    /// `current_quantity`
    pub reserved_quantity: Decimal,
    pub last_updated: DateTime<Utc>,
}

/// One immutable, signed quantity change in the ledger
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovement {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub raw_item_id: Uuid,
    pub movement_type: MovementType,
    /// Signed delta in storage units: positive for stock-in, negative for stock-out
    pub quantity_delta: Decimal,
    /// Snapshot quantity before the movement, for audit without replay
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Sufficiency of the current quantity against the item's low-stock threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Sufficient,
    Low,
    OutOfStock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Sufficient => "sufficient",
            StockStatus::Low => "low",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }
}
