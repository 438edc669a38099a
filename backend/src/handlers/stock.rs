//! HTTP handlers for stock engine endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tokio::time::Duration;
use uuid::Uuid;

use crate::models::{BranchStock, StockMovement};
use shared::types::Pagination;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::stock::{
    MovementOutcome, OperationContext, OrderDeductionInput, OrderDeductionOutcome,
    ReservationInput, SnapshotAudit, StockInInput, StockLevel, StockOutInput, StockService,
};
use crate::AppState;

fn stock_service(state: &AppState) -> StockService {
    StockService::new(
        state.db.clone(),
        state.config.notifier.webhook_url.clone(),
    )
}

fn operation_context(state: &AppState, current_user: &CurrentUser) -> OperationContext {
    OperationContext::with_timeout(
        current_user.0.user_id,
        Duration::from_millis(state.config.stock.operation_timeout_ms),
    )
}

/// Record incoming stock
pub async fn record_stock_in(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StockInInput>,
) -> AppResult<Json<MovementOutcome>> {
    let ctx = operation_context(&state, &current_user);
    let outcome = stock_service(&state).record_stock_in(input, &ctx).await?;
    Ok(Json(outcome))
}

/// Record outgoing stock (waste, adjustment, return)
pub async fn record_stock_out(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StockOutInput>,
) -> AppResult<Json<MovementOutcome>> {
    let ctx = operation_context(&state, &current_user);
    let outcome = stock_service(&state).record_stock_out(input, &ctx).await?;
    Ok(Json(outcome))
}

/// Deduct the resolved ingredient quantities of a completed order
pub async fn deduct_from_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<OrderDeductionInput>,
) -> AppResult<Json<OrderDeductionOutcome>> {
    let ctx = operation_context(&state, &current_user);
    let outcome = stock_service(&state).deduct_from_order(input, &ctx).await?;
    Ok(Json(outcome))
}

/// Place a reservation hold
pub async fn reserve_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReservationInput>,
) -> AppResult<Json<BranchStock>> {
    let ctx = operation_context(&state, &current_user);
    let stock = stock_service(&state).reserve_stock(input, &ctx).await?;
    Ok(Json(stock))
}

/// Release a reservation hold
pub async fn release_reservation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReservationInput>,
) -> AppResult<Json<BranchStock>> {
    let ctx = operation_context(&state, &current_user);
    let stock = stock_service(&state).release_reservation(input, &ctx).await?;
    Ok(Json(stock))
}

/// Get the stock level of an item at a branch
pub async fn get_stock_level(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((branch_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<StockLevel>> {
    let level = stock_service(&state).get_stock_level(branch_id, item_id).await?;
    Ok(Json(level))
}

/// Movement history for an item at a branch
pub async fn get_item_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((branch_id, item_id)): Path<(Uuid, Uuid)>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let movements = stock_service(&state)
        .get_movements(branch_id, item_id, pagination)
        .await?;
    Ok(Json(movements))
}

/// Movement history for a whole branch
pub async fn list_branch_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let movements = stock_service(&state)
        .list_branch_movements(branch_id, pagination)
        .await?;
    Ok(Json(movements))
}

/// Compare a snapshot against its movement ledger
pub async fn verify_snapshot(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((branch_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<SnapshotAudit>> {
    let audit = stock_service(&state).verify_snapshot(branch_id, item_id).await?;
    Ok(Json(audit))
}

/// Rebuild a snapshot from its movement ledger (managers only)
pub async fn rebuild_snapshot(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((branch_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<SnapshotAudit>> {
    if !current_user.0.is_manager() {
        return Err(AppError::InsufficientPermissions);
    }

    let ctx = operation_context(&state, &current_user);
    let audit = stock_service(&state)
        .rebuild_snapshot(branch_id, item_id, &ctx)
        .await?;
    Ok(Json(audit))
}
