//! Alert manager for low-stock and out-of-stock conditions
//!
//! Keeps the alert slot for each (branch, item) pair consistent with the
//! latest stock snapshot. Alerts are only created and auto-resolved here,
//! as a post-commit step of every stock mutation; the ledger never waits
//! on alert handling.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::ledger;
use shared::models::{AlertType, RawItem, StockAlert, StockStatus, StorageUnit};
use shared::types::Pagination;

use crate::error::{AppError, AppResult};

/// Columns returned for every alert query
const ALERT_COLUMNS: &str = "id, branch_id, raw_item_id, alert_type, current_quantity, \
                             threshold_quantity, is_resolved, resolved_by, resolved_at, created_at";

/// Alert service for deriving and resolving stock alerts
#[derive(Clone)]
pub struct AlertService {
    db: PgPool,
}

/// Result of re-evaluating the alert slot after a mutation
#[derive(Debug, Clone)]
pub struct AlertTransition {
    /// Type of the previously open alert, if one was auto-resolved
    pub previous: Option<AlertType>,
    /// Newly created alert, when the quantity still qualifies for one
    pub created: Option<StockAlert>,
}

impl AlertTransition {
    /// Whether the slot moved to a different alert state (none -> low,
    /// low -> out, out -> none, ...) rather than refreshing the same one
    pub fn changed(&self) -> bool {
        self.previous != self.created.as_ref().map(|a| a.alert_type)
    }
}

/// An item currently at or below its low-stock threshold
#[derive(Debug, Clone, Serialize)]
pub struct LowStockItem {
    pub raw_item_id: Uuid,
    pub code: String,
    pub name: String,
    pub name_th: Option<String>,
    pub storage_unit: StorageUnit,
    pub current_quantity: Decimal,
    pub min_stock_level: Option<Decimal>,
    pub status: StockStatus,
}

impl AlertService {
    /// Create a new AlertService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Re-evaluate the alert slot for a (branch, item) pair against the given
    /// snapshot quantity.
    ///
    /// Any open alert is resolved first; a fresh alert is then created when
    /// the quantity is zero (out of stock) or at/below the item's minimum
    /// level (low stock). Manual resolution earlier does not suppress
    /// re-creation here; the slot always reflects the latest snapshot.
    pub async fn reevaluate(
        &self,
        branch_id: Uuid,
        item: &RawItem,
        current_quantity: Decimal,
    ) -> AppResult<AlertTransition> {
        let mut tx = self.db.begin().await?;

        // At most one unresolved alert exists per pair (partial unique index)
        let previous = sqlx::query_scalar::<_, AlertType>(
            r#"
            UPDATE stock_alerts
            SET is_resolved = true, resolved_at = NOW()
            WHERE branch_id = $1 AND raw_item_id = $2 AND is_resolved = false
            RETURNING alert_type
            "#,
        )
        .bind(branch_id)
        .bind(item.id)
        .fetch_optional(&mut *tx)
        .await?;

        let created = match ledger::alert_for(current_quantity, item.min_stock_level) {
            Some(alert_type) => {
                let threshold = item.min_stock_level.unwrap_or(Decimal::ZERO);
                let alert = sqlx::query_as::<_, StockAlert>(&format!(
                    r#"
                    INSERT INTO stock_alerts (
                        branch_id, raw_item_id, alert_type, current_quantity, threshold_quantity
                    )
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING {ALERT_COLUMNS}
                    "#,
                ))
                .bind(branch_id)
                .bind(item.id)
                .bind(alert_type)
                .bind(current_quantity)
                .bind(threshold)
                .fetch_one(&mut *tx)
                .await?;
                Some(alert)
            }
            None => None,
        };

        tx.commit().await?;

        if let Some(alert) = &created {
            tracing::info!(
                branch_id = %branch_id,
                item_code = %item.code,
                alert_type = alert.alert_type.as_str(),
                quantity = %current_quantity,
                "stock alert raised"
            );
        }

        Ok(AlertTransition { previous, created })
    }

    /// Manually resolve an alert (staff acknowledgement without a stock change)
    pub async fn resolve_alert(&self, alert_id: Uuid, resolved_by: Uuid) -> AppResult<StockAlert> {
        let alert = sqlx::query_as::<_, StockAlert>(&format!(
            r#"
            UPDATE stock_alerts
            SET is_resolved = true, resolved_by = $2, resolved_at = NOW()
            WHERE id = $1 AND is_resolved = false
            RETURNING {ALERT_COLUMNS}
            "#,
        ))
        .bind(alert_id)
        .bind(resolved_by)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert".to_string()))?;

        Ok(alert)
    }

    /// Get unresolved alerts for a branch
    pub async fn get_active_alerts(&self, branch_id: Uuid) -> AppResult<Vec<StockAlert>> {
        let alerts = sqlx::query_as::<_, StockAlert>(&format!(
            r#"
            SELECT {ALERT_COLUMNS}
            FROM stock_alerts
            WHERE branch_id = $1 AND is_resolved = false
            ORDER BY created_at DESC
            "#,
        ))
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(alerts)
    }

    /// List alerts for a branch, newest first
    pub async fn list_alerts(
        &self,
        branch_id: Uuid,
        include_resolved: bool,
        pagination: Pagination,
    ) -> AppResult<Vec<StockAlert>> {
        let pagination = pagination.clamped();

        let alerts = if include_resolved {
            sqlx::query_as::<_, StockAlert>(&format!(
                r#"
                SELECT {ALERT_COLUMNS}
                FROM stock_alerts
                WHERE branch_id = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            ))
            .bind(branch_id)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query_as::<_, StockAlert>(&format!(
                r#"
                SELECT {ALERT_COLUMNS}
                FROM stock_alerts
                WHERE branch_id = $1 AND is_resolved = false
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            ))
            .bind(branch_id)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.db)
            .await?
        };

        Ok(alerts)
    }

    /// Items at or below their low-stock threshold for a branch
    pub async fn get_low_stock_items(&self, branch_id: Uuid) -> AppResult<Vec<LowStockItem>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, Option<String>, StorageUnit, Decimal, Option<Decimal>)>(
            r#"
            SELECT ri.id, ri.code, ri.name, ri.name_th, ri.storage_unit,
                   bs.current_quantity, ri.min_stock_level
            FROM branch_stocks bs
            JOIN raw_items ri ON ri.id = bs.raw_item_id
            WHERE bs.branch_id = $1
              AND (bs.current_quantity <= 0
                   OR (ri.min_stock_level IS NOT NULL AND bs.current_quantity <= ri.min_stock_level))
            ORDER BY bs.current_quantity ASC
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(raw_item_id, code, name, name_th, storage_unit, current_quantity, min_stock_level)| {
                LowStockItem {
                    raw_item_id,
                    code,
                    name,
                    name_th,
                    storage_unit,
                    current_quantity,
                    min_stock_level,
                    status: ledger::stock_status(current_quantity, min_stock_level),
                }
            })
            .collect())
    }
}
