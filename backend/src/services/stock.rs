//! Stock engine for the branch stock ledger
//!
//! Every stock change flows through `record_movement`: one database
//! transaction that locks the snapshot row for the (branch, item) pair,
//! enforces the non-negative invariant, appends the immutable movement, and
//! writes the new snapshot. Rows for different pairs never contend with each
//! other; two writers on the same pair serialize on the row lock, so the
//! read-check-write sequence cannot interleave and drive a quantity negative.
//!
//! Unit conversion happens before the transaction starts and alert
//! re-evaluation after it commits, keeping the critical section free of
//! anything but the ledger write.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use shared::ledger;
use shared::models::{
    BranchStock, MovementType, RawItem, StockMovement, StockStatus, StorageUnit,
};
use shared::types::Pagination;
use shared::units;
use shared::validation;

use crate::error::{AppError, AppResult};
use crate::services::alerts::AlertService;
use crate::services::notifications::NotificationService;

/// Columns returned for every snapshot query
const STOCK_COLUMNS: &str =
    "id, branch_id, raw_item_id, current_quantity, reserved_quantity, last_updated";

/// Columns returned for every movement query
const MOVEMENT_COLUMNS: &str = "id, branch_id, raw_item_id, movement_type, quantity_delta, \
                                previous_quantity, new_quantity, reference_type, reference_id, \
                                notes, created_by, created_at";

/// Stock engine service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
    alerts: AlertService,
    notifications: NotificationService,
}

/// Identity and deadline for one mutating stock operation.
///
/// The deadline is checked on entry and again immediately before the row
/// lock is taken; once the transaction has started the operation runs to
/// completion, since an interrupted ledger write would break the
/// snapshot-equals-sum-of-movements invariant.
#[derive(Debug, Clone, Copy)]
pub struct OperationContext {
    pub actor: Uuid,
    pub deadline: Option<Instant>,
}

impl OperationContext {
    pub fn new(actor: Uuid) -> Self {
        Self {
            actor,
            deadline: None,
        }
    }

    pub fn with_timeout(actor: Uuid, timeout: Duration) -> Self {
        Self {
            actor,
            deadline: Some(Instant::now() + timeout),
        }
    }

    fn ensure_not_expired(&self) -> AppResult<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(AppError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// Input for recording a stock-in movement
#[derive(Debug, Deserialize)]
pub struct StockInInput {
    pub branch_id: Uuid,
    pub raw_item_id: Uuid,
    pub quantity: Decimal,
    /// Input unit, converted to the item's storage unit before recording
    pub unit: String,
    /// purchase (default) or adjustment
    pub movement_type: Option<MovementType>,
    /// Optional link to a purchase invoice or similar document
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Input for recording a stock-out movement
#[derive(Debug, Deserialize)]
pub struct StockOutInput {
    pub branch_id: Uuid,
    pub raw_item_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
    /// waste, adjustment or return
    pub movement_type: MovementType,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// One item line of an order deduction
#[derive(Debug, Deserialize)]
pub struct OrderItemInput {
    pub raw_item_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
}

/// Input for deducting the resolved ingredient quantities of an order
#[derive(Debug, Deserialize)]
pub struct OrderDeductionInput {
    pub branch_id: Uuid,
    pub order_id: Uuid,
    pub items: Vec<OrderItemInput>,
}

/// Input for placing or releasing a reservation hold
#[derive(Debug, Deserialize)]
pub struct ReservationInput {
    pub branch_id: Uuid,
    pub raw_item_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
}

/// Result of a single recorded movement
#[derive(Debug, Serialize)]
pub struct MovementOutcome {
    pub stock: BranchStock,
    pub movement: StockMovement,
}

/// Per-item results of an order deduction.
///
/// Items are deducted independently: one item running short does not roll
/// back deductions already applied for the order. The caller compensates at
/// the business level (flag the order, notify the kitchen) using the failed
/// list.
#[derive(Debug, Serialize)]
pub struct OrderDeductionOutcome {
    pub order_id: Uuid,
    pub succeeded: Vec<DeductedItem>,
    pub failed: Vec<FailedDeduction>,
}

#[derive(Debug, Serialize)]
pub struct DeductedItem {
    pub raw_item_id: Uuid,
    pub movement_id: Uuid,
    pub new_quantity: Decimal,
}

#[derive(Debug, Serialize)]
pub struct FailedDeduction {
    pub raw_item_id: Uuid,
    pub code: &'static str,
    pub message: String,
}

/// Current stock level of an item at a branch
#[derive(Debug, Serialize)]
pub struct StockLevel {
    pub branch_id: Uuid,
    pub raw_item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub current_quantity: Decimal,
    pub reserved_quantity: Decimal,
    pub storage_unit: StorageUnit,
    pub min_stock_level: Option<Decimal>,
    pub status: StockStatus,
}

/// Comparison of a snapshot against a replay of its movement ledger
#[derive(Debug, Serialize)]
pub struct SnapshotAudit {
    pub branch_id: Uuid,
    pub raw_item_id: Uuid,
    pub snapshot_quantity: Decimal,
    pub ledger_quantity: Decimal,
    pub movement_count: i64,
    pub consistent: bool,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool, webhook_url: Option<String>) -> Self {
        Self {
            alerts: AlertService::new(db.clone()),
            notifications: NotificationService::new(db.clone(), webhook_url),
            db,
        }
    }

    // ========================================================================
    // Mutating operations
    // ========================================================================

    /// Record incoming stock (purchase receipt or manual upward adjustment)
    pub async fn record_stock_in(
        &self,
        input: StockInInput,
        ctx: &OperationContext,
    ) -> AppResult<MovementOutcome> {
        ctx.ensure_not_expired()?;
        validate_quantity(input.quantity)?;

        let movement_type = input.movement_type.unwrap_or(MovementType::Purchase);
        if !movement_type.allowed_for_stock_in() {
            return Err(AppError::Validation {
                field: "movement_type".to_string(),
                message: format!(
                    "Movement type '{}' cannot be recorded as stock-in",
                    movement_type.as_str()
                ),
                message_th: "ประเภทรายการไม่สามารถใช้กับการรับสินค้าเข้าได้".to_string(),
            });
        }

        let item = self.load_item(input.raw_item_id).await?;
        let quantity = self.to_storage_unit(&item, input.quantity, &input.unit)?;

        let (stock, movement) = self
            .record_movement(
                input.branch_id,
                &item,
                quantity,
                movement_type,
                input.reference_type,
                input.reference_id,
                input.notes,
                ctx,
            )
            .await?;

        self.finish_mutation(&item, &stock).await?;

        Ok(MovementOutcome { stock, movement })
    }

    /// Record outgoing stock (waste, manual downward adjustment, or return)
    pub async fn record_stock_out(
        &self,
        input: StockOutInput,
        ctx: &OperationContext,
    ) -> AppResult<MovementOutcome> {
        ctx.ensure_not_expired()?;
        validate_quantity(input.quantity)?;

        if !input.movement_type.allowed_for_stock_out() {
            return Err(AppError::Validation {
                field: "movement_type".to_string(),
                message: format!(
                    "Movement type '{}' cannot be recorded as stock-out",
                    input.movement_type.as_str()
                ),
                message_th: "ประเภทรายการไม่สามารถใช้กับการตัดสินค้าออกได้".to_string(),
            });
        }

        let item = self.load_item(input.raw_item_id).await?;
        let quantity = self.to_storage_unit(&item, input.quantity, &input.unit)?;

        let (stock, movement) = self
            .record_movement(
                input.branch_id,
                &item,
                -quantity,
                input.movement_type,
                input.reference_type,
                input.reference_id,
                input.notes,
                ctx,
            )
            .await?;

        self.finish_mutation(&item, &stock).await?;

        Ok(MovementOutcome { stock, movement })
    }

    /// Deduct the already-resolved ingredient quantities of a completed order.
    ///
    /// Each item line is its own atomic ledger write. Business rejections
    /// (insufficient stock, unknown item, bad unit) are reported per item;
    /// infrastructure failures abort the call. A retried call for the same
    /// order is caught per item by the duplicate-reference guard instead of
    /// deducting twice.
    pub async fn deduct_from_order(
        &self,
        input: OrderDeductionInput,
        ctx: &OperationContext,
    ) -> AppResult<OrderDeductionOutcome> {
        ctx.ensure_not_expired()?;

        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "Order deduction requires at least one item".to_string(),
                message_th: "ต้องมีรายการสินค้าอย่างน้อยหนึ่งรายการ".to_string(),
            });
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for line in &input.items {
            match self
                .deduct_order_line(input.branch_id, input.order_id, line, ctx)
                .await
            {
                Ok(outcome) => {
                    succeeded.push(DeductedItem {
                        raw_item_id: line.raw_item_id,
                        movement_id: outcome.movement.id,
                        new_quantity: outcome.stock.current_quantity,
                    });
                }
                Err(err) if is_item_level_error(&err) => {
                    tracing::warn!(
                        order_id = %input.order_id,
                        raw_item_id = %line.raw_item_id,
                        "order deduction line rejected: {}",
                        err
                    );
                    failed.push(FailedDeduction {
                        raw_item_id: line.raw_item_id,
                        code: failure_code(&err),
                        message: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        Ok(OrderDeductionOutcome {
            order_id: input.order_id,
            succeeded,
            failed,
        })
    }

    async fn deduct_order_line(
        &self,
        branch_id: Uuid,
        order_id: Uuid,
        line: &OrderItemInput,
        ctx: &OperationContext,
    ) -> AppResult<MovementOutcome> {
        validate_quantity(line.quantity)?;

        let item = self.load_item(line.raw_item_id).await?;
        let quantity = self.to_storage_unit(&item, line.quantity, &line.unit)?;

        let (stock, movement) = self
            .record_movement(
                branch_id,
                &item,
                -quantity,
                MovementType::OrderDeduction,
                Some("order".to_string()),
                Some(order_id),
                None,
                ctx,
            )
            .await?;

        self.finish_mutation(&item, &stock).await?;

        Ok(MovementOutcome { stock, movement })
    }

    /// Place a reservation hold on unreserved stock
    pub async fn reserve_stock(
        &self,
        input: ReservationInput,
        ctx: &OperationContext,
    ) -> AppResult<BranchStock> {
        ctx.ensure_not_expired()?;
        validate_quantity(input.quantity)?;

        let item = self.load_item(input.raw_item_id).await?;
        let quantity = self.to_storage_unit(&item, input.quantity, &input.unit)?;

        ctx.ensure_not_expired()?;
        let mut tx = self.db.begin().await?;
        let stock = self
            .lock_stock_row(&mut tx, input.branch_id, item.id, false)
            .await?;

        let new_reserved = ledger::reserve(stock.current_quantity, stock.reserved_quantity, quantity)
            .map_err(|_| AppError::InsufficientStock {
                requested: quantity,
                available: stock.current_quantity - stock.reserved_quantity,
            })?;

        let updated = self.write_reserved(&mut tx, &stock, new_reserved).await?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Release a reservation hold
    pub async fn release_reservation(
        &self,
        input: ReservationInput,
        ctx: &OperationContext,
    ) -> AppResult<BranchStock> {
        ctx.ensure_not_expired()?;
        validate_quantity(input.quantity)?;

        let item = self.load_item(input.raw_item_id).await?;
        let quantity = self.to_storage_unit(&item, input.quantity, &input.unit)?;

        ctx.ensure_not_expired()?;
        let mut tx = self.db.begin().await?;
        let stock = self
            .lock_stock_row(&mut tx, input.branch_id, item.id, false)
            .await?;

        let new_reserved =
            ledger::release(stock.reserved_quantity, quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
                message_th: "ปริมาณที่ปล่อยเกินกว่าที่จองไว้".to_string(),
            })?;

        let updated = self.write_reserved(&mut tx, &stock, new_reserved).await?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Rebuild the snapshot for a (branch, item) pair from its movement ledger.
    ///
    /// Holds the same row lock as normal movements so concurrent writers see
    /// either the old or the repaired snapshot, never a half-written one.
    pub async fn rebuild_snapshot(
        &self,
        branch_id: Uuid,
        raw_item_id: Uuid,
        ctx: &OperationContext,
    ) -> AppResult<SnapshotAudit> {
        ctx.ensure_not_expired()?;
        let item = self.load_item(raw_item_id).await?;

        ctx.ensure_not_expired()?;
        let mut tx = self.db.begin().await?;
        let stock = self.lock_stock_row(&mut tx, branch_id, item.id, false).await?;

        let deltas = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT quantity_delta
            FROM stock_movements
            WHERE branch_id = $1 AND raw_item_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(branch_id)
        .bind(raw_item_id)
        .fetch_all(&mut *tx)
        .await?;

        let movement_count = deltas.len() as i64;
        let ledger_quantity = ledger::replay(deltas);
        let consistent = ledger_quantity == stock.current_quantity;

        let repaired = sqlx::query_as::<_, BranchStock>(&format!(
            r#"
            UPDATE branch_stocks
            SET current_quantity = $3, last_updated = NOW()
            WHERE branch_id = $1 AND raw_item_id = $2
            RETURNING {STOCK_COLUMNS}
            "#,
        ))
        .bind(branch_id)
        .bind(raw_item_id)
        .bind(ledger_quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if !consistent {
            tracing::warn!(
                branch_id = %branch_id,
                item_code = %item.code,
                snapshot = %stock.current_quantity,
                ledger = %ledger_quantity,
                "snapshot drift repaired from movement ledger"
            );
        }

        self.finish_mutation(&item, &repaired).await?;

        Ok(SnapshotAudit {
            branch_id,
            raw_item_id,
            snapshot_quantity: stock.current_quantity,
            ledger_quantity,
            movement_count,
            consistent,
        })
    }

    // ========================================================================
    // Read-only operations
    // ========================================================================

    /// Current stock level and sufficiency status for an item at a branch
    pub async fn get_stock_level(&self, branch_id: Uuid, raw_item_id: Uuid) -> AppResult<StockLevel> {
        let item = self.load_item(raw_item_id).await?;

        let stock = sqlx::query_as::<_, BranchStock>(&format!(
            "SELECT {STOCK_COLUMNS} FROM branch_stocks WHERE branch_id = $1 AND raw_item_id = $2",
        ))
        .bind(branch_id)
        .bind(raw_item_id)
        .fetch_optional(&self.db)
        .await?;

        let (current_quantity, reserved_quantity) = stock
            .map(|s| (s.current_quantity, s.reserved_quantity))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));

        Ok(StockLevel {
            branch_id,
            raw_item_id,
            item_code: item.code,
            item_name: item.name,
            current_quantity,
            reserved_quantity,
            storage_unit: item.storage_unit,
            min_stock_level: item.min_stock_level,
            status: ledger::stock_status(current_quantity, item.min_stock_level),
        })
    }

    /// Movement history for an item at a branch, newest first
    pub async fn get_movements(
        &self,
        branch_id: Uuid,
        raw_item_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<Vec<StockMovement>> {
        let pagination = pagination.clamped();

        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE branch_id = $1 AND raw_item_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        ))
        .bind(branch_id)
        .bind(raw_item_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// All movement history for a branch, newest first
    pub async fn list_branch_movements(
        &self,
        branch_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<Vec<StockMovement>> {
        let pagination = pagination.clamped();

        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE branch_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(branch_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Compare a snapshot against a replay of its movement ledger, read-only
    pub async fn verify_snapshot(
        &self,
        branch_id: Uuid,
        raw_item_id: Uuid,
    ) -> AppResult<SnapshotAudit> {
        self.load_item(raw_item_id).await?;

        let stock = sqlx::query_as::<_, BranchStock>(&format!(
            "SELECT {STOCK_COLUMNS} FROM branch_stocks WHERE branch_id = $1 AND raw_item_id = $2",
        ))
        .bind(branch_id)
        .bind(raw_item_id)
        .fetch_optional(&self.db)
        .await?;

        let (ledger_quantity, movement_count) = sqlx::query_as::<_, (Decimal, i64)>(
            r#"
            SELECT COALESCE(SUM(quantity_delta), 0), COUNT(*)
            FROM stock_movements
            WHERE branch_id = $1 AND raw_item_id = $2
            "#,
        )
        .bind(branch_id)
        .bind(raw_item_id)
        .fetch_one(&self.db)
        .await?;

        let snapshot_quantity = stock
            .map(|s| s.current_quantity)
            .unwrap_or(Decimal::ZERO);

        Ok(SnapshotAudit {
            branch_id,
            raw_item_id,
            snapshot_quantity,
            ledger_quantity,
            movement_count,
            consistent: snapshot_quantity == ledger_quantity,
        })
    }

    // ========================================================================
    // Ledger choke point
    // ========================================================================

    /// Apply one signed movement atomically.
    ///
    /// This is the single path through which `branch_stocks.current_quantity`
    /// changes. The row lock taken here serializes concurrent writers on the
    /// same (branch, item) pair; the non-negative check and both writes
    /// happen inside the same transaction, so a rejected movement leaves no
    /// partial effect.
    #[allow(clippy::too_many_arguments)]
    async fn record_movement(
        &self,
        branch_id: Uuid,
        item: &RawItem,
        delta: Decimal,
        movement_type: MovementType,
        reference_type: Option<String>,
        reference_id: Option<Uuid>,
        notes: Option<String>,
        ctx: &OperationContext,
    ) -> AppResult<(BranchStock, StockMovement)> {
        // Last deadline check before the lock; past this point the operation
        // runs to completion.
        ctx.ensure_not_expired()?;

        let mut tx = self.db.begin().await?;

        let stock = self
            .lock_stock_row(&mut tx, branch_id, item.id, delta > Decimal::ZERO)
            .await?;

        if movement_type == MovementType::OrderDeduction {
            if let (Some(ref_type), Some(ref_id)) = (&reference_type, reference_id) {
                let duplicate = sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS(
                        SELECT 1 FROM stock_movements
                        WHERE branch_id = $1 AND raw_item_id = $2
                          AND movement_type = $3
                          AND reference_type = $4 AND reference_id = $5
                    )
                    "#,
                )
                .bind(branch_id)
                .bind(item.id)
                .bind(movement_type)
                .bind(ref_type)
                .bind(ref_id)
                .fetch_one(&mut *tx)
                .await?;

                if duplicate {
                    return Err(AppError::DuplicateMovement {
                        reference: format!("{}:{}", ref_type, ref_id),
                    });
                }
            }
        }

        let new_quantity = ledger::apply_delta(stock.current_quantity, delta).map_err(|_| {
            AppError::InsufficientStock {
                requested: delta.abs(),
                available: stock.current_quantity,
            }
        })?;

        let updated = sqlx::query_as::<_, BranchStock>(&format!(
            r#"
            UPDATE branch_stocks
            SET current_quantity = $3, last_updated = NOW()
            WHERE branch_id = $1 AND raw_item_id = $2
            RETURNING {STOCK_COLUMNS}
            "#,
        ))
        .bind(branch_id)
        .bind(item.id)
        .bind(new_quantity)
        .fetch_one(&mut *tx)
        .await?;

        let movement = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            INSERT INTO stock_movements (
                branch_id, raw_item_id, movement_type, quantity_delta,
                previous_quantity, new_quantity, reference_type, reference_id,
                notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {MOVEMENT_COLUMNS}
            "#,
        ))
        .bind(branch_id)
        .bind(item.id)
        .bind(movement_type)
        .bind(delta)
        .bind(stock.current_quantity)
        .bind(new_quantity)
        .bind(&reference_type)
        .bind(reference_id)
        .bind(&notes)
        .bind(ctx.actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            branch_id = %branch_id,
            item_code = %item.code,
            movement_type = movement_type.as_str(),
            delta = %delta,
            new_quantity = %new_quantity,
            "stock movement recorded"
        );

        Ok((updated, movement))
    }

    /// Lock the snapshot row for a pair, lazily creating it on first stock-in
    async fn lock_stock_row(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        branch_id: Uuid,
        raw_item_id: Uuid,
        create_if_missing: bool,
    ) -> AppResult<BranchStock> {
        let existing = sqlx::query_as::<_, BranchStock>(&format!(
            r#"
            SELECT {STOCK_COLUMNS}
            FROM branch_stocks
            WHERE branch_id = $1 AND raw_item_id = $2
            FOR UPDATE
            "#,
        ))
        .bind(branch_id)
        .bind(raw_item_id)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(stock) = existing {
            return Ok(stock);
        }

        if !create_if_missing {
            return Err(AppError::NoStockRecord);
        }

        // First stock-in for the pair. ON CONFLICT covers two callers racing
        // on the insert; the re-select takes the lock either way.
        sqlx::query(
            r#"
            INSERT INTO branch_stocks (branch_id, raw_item_id)
            VALUES ($1, $2)
            ON CONFLICT (branch_id, raw_item_id) DO NOTHING
            "#,
        )
        .bind(branch_id)
        .bind(raw_item_id)
        .execute(&mut **tx)
        .await?;

        let stock = sqlx::query_as::<_, BranchStock>(&format!(
            r#"
            SELECT {STOCK_COLUMNS}
            FROM branch_stocks
            WHERE branch_id = $1 AND raw_item_id = $2
            FOR UPDATE
            "#,
        ))
        .bind(branch_id)
        .bind(raw_item_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(stock)
    }

    async fn write_reserved(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        stock: &BranchStock,
        new_reserved: Decimal,
    ) -> AppResult<BranchStock> {
        let updated = sqlx::query_as::<_, BranchStock>(&format!(
            r#"
            UPDATE branch_stocks
            SET reserved_quantity = $3, last_updated = NOW()
            WHERE branch_id = $1 AND raw_item_id = $2
            RETURNING {STOCK_COLUMNS}
            "#,
        ))
        .bind(stock.branch_id)
        .bind(stock.raw_item_id)
        .bind(new_reserved)
        .fetch_one(&mut **tx)
        .await?;

        Ok(updated)
    }

    // ========================================================================
    // Shared steps
    // ========================================================================

    async fn load_item(&self, raw_item_id: Uuid) -> AppResult<RawItem> {
        let item = sqlx::query_as::<_, RawItem>(
            r#"
            SELECT id, code, name, name_th, category, storage_unit, unit_cost,
                   min_stock_level, max_stock_level, is_active, created_at, updated_at
            FROM raw_items
            WHERE id = $1
            "#,
        )
        .bind(raw_item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Raw item".to_string()))?;

        Ok(item)
    }

    /// Convert an input quantity into the item's storage unit
    fn to_storage_unit(
        &self,
        item: &RawItem,
        quantity: Decimal,
        unit: &str,
    ) -> AppResult<Decimal> {
        let from = units::parse_unit(unit)?;
        let converted = units::convert(quantity, from, item.storage_unit.unit())?
            .round_dp(units::QUANTITY_SCALE);

        // Identity conversions skip rounding; a quantity below ledger
        // precision would otherwise persist as a zero delta
        if converted.is_zero() {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity is too small to record at ledger precision".to_string(),
                message_th: "ปริมาณน้อยเกินกว่าจะบันทึกได้".to_string(),
            });
        }

        Ok(converted)
    }

    /// Post-commit step of every mutation: bring the alert slot in line with
    /// the new snapshot and hand any new alert to the notifier without
    /// waiting on it.
    async fn finish_mutation(&self, item: &RawItem, stock: &BranchStock) -> AppResult<()> {
        let transition = self
            .alerts
            .reevaluate(stock.branch_id, item, stock.current_quantity)
            .await?;

        // Only a state change is worth a notification; a low-stock slot
        // refreshed by another small deduction is not news.
        if transition.changed() {
            if let Some(alert) = transition.created {
                let notifications = self.notifications.clone();
                let item = item.clone();
                tokio::spawn(async move {
                    if let Err(e) = notifications.notify_alert(&item, &alert).await {
                        tracing::error!(
                            item_code = %item.code,
                            "failed to dispatch stock alert notification: {}",
                            e
                        );
                    }
                });
            }
        }

        Ok(())
    }
}

/// Validate a movement or reservation quantity from an API input
fn validate_quantity(quantity: Decimal) -> AppResult<()> {
    validation::validate_positive_quantity(quantity).map_err(|msg| AppError::Validation {
        field: "quantity".to_string(),
        message: msg.to_string(),
        message_th: "ปริมาณต้องเป็นค่าบวก".to_string(),
    })
}

/// Whether an error is reported per item in an order deduction rather than
/// aborting the whole call
fn is_item_level_error(err: &AppError) -> bool {
    matches!(
        err,
        AppError::InsufficientStock { .. }
            | AppError::NoStockRecord
            | AppError::DuplicateMovement { .. }
            | AppError::NotFound(_)
            | AppError::UnsupportedUnit(_)
            | AppError::IncompatibleUnits { .. }
            | AppError::Validation { .. }
    )
}

fn failure_code(err: &AppError) -> &'static str {
    match err {
        AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
        AppError::NoStockRecord => "NO_STOCK_RECORD",
        AppError::DuplicateMovement { .. } => "DUPLICATE_MOVEMENT",
        AppError::NotFound(_) => "NOT_FOUND",
        AppError::UnsupportedUnit(_) => "UNSUPPORTED_UNIT",
        AppError::IncompatibleUnits { .. } => "INCOMPATIBLE_UNITS",
        AppError::Validation { .. } => "VALIDATION_ERROR",
        _ => "INTERNAL_ERROR",
    }
}
