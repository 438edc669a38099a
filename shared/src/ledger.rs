//! Ledger math for branch stock snapshots
//!
//! The pure rules behind every stock mutation: applying a signed delta,
//! replaying the movement ledger, deriving sufficiency status, and deciding
//! which alert the current quantity warrants. The backend wraps these in a
//! database transaction; tests exercise them directly.

use rust_decimal::Decimal;

use crate::models::{AlertType, StockStatus};

/// Apply a signed movement delta to the current quantity.
///
/// Fails when the result would be negative; a failed application has no
/// partial effect, the caller simply keeps the old quantity.
pub fn apply_delta(current: Decimal, delta: Decimal) -> Result<Decimal, &'static str> {
    let next = current + delta;
    if next < Decimal::ZERO {
        return Err("Insufficient stock");
    }
    Ok(next)
}

/// Sum the signed deltas of a movement ledger in order.
///
/// For a consistent snapshot this reproduces `current_quantity` exactly.
pub fn replay<I>(deltas: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    deltas.into_iter().fold(Decimal::ZERO, |acc, d| acc + d)
}

/// Derive the sufficiency status of a quantity against an optional threshold
pub fn stock_status(current: Decimal, min_level: Option<Decimal>) -> StockStatus {
    if current <= Decimal::ZERO {
        return StockStatus::OutOfStock;
    }
    match min_level {
        Some(min) if current <= min => StockStatus::Low,
        _ => StockStatus::Sufficient,
    }
}

/// Which alert, if any, the current quantity warrants.
///
/// Out-of-stock applies regardless of thresholds; low-stock only when the
/// item has a minimum level configured.
pub fn alert_for(current: Decimal, min_level: Option<Decimal>) -> Option<AlertType> {
    if current <= Decimal::ZERO {
        return Some(AlertType::OutOfStock);
    }
    match min_level {
        Some(min) if current <= min => Some(AlertType::LowStock),
        _ => None,
    }
}

/// Add a hold to the reserved quantity.
///
/// Reservations never push the reserved total above what is physically on
/// hand. Returns the new reserved quantity.
pub fn reserve(
    current: Decimal,
    reserved: Decimal,
    quantity: Decimal,
) -> Result<Decimal, &'static str> {
    let next = reserved + quantity;
    if next > current {
        return Err("Insufficient unreserved stock");
    }
    Ok(next)
}

/// Release a hold from the reserved quantity. Returns the new reserved quantity.
pub fn release(reserved: Decimal, quantity: Decimal) -> Result<Decimal, &'static str> {
    let next = reserved - quantity;
    if next < Decimal::ZERO {
        return Err("Release exceeds reserved quantity");
    }
    Ok(next)
}
