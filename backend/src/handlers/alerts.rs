//! HTTP handlers for stock alert endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::StockAlert;
use shared::types::Pagination;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::alerts::{AlertService, LowStockItem};
use crate::AppState;

/// Query parameters for listing alerts
#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    #[serde(default)]
    pub include_resolved: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Get unresolved alerts for a branch
pub async fn get_active_alerts(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockAlert>>> {
    let service = AlertService::new(state.db);
    let alerts = service.get_active_alerts(branch_id).await?;
    Ok(Json(alerts))
}

/// List alerts for a branch, optionally including resolved ones
pub async fn list_alerts(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
    Query(query): Query<ListAlertsQuery>,
) -> AppResult<Json<Vec<StockAlert>>> {
    let pagination = Pagination {
        limit: query.limit.unwrap_or(Pagination::default().limit),
        offset: query.offset.unwrap_or(0),
    };
    let service = AlertService::new(state.db);
    let alerts = service
        .list_alerts(branch_id, query.include_resolved, pagination)
        .await?;
    Ok(Json(alerts))
}

/// Items at or below their low-stock threshold for a branch
pub async fn get_low_stock_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<LowStockItem>>> {
    let service = AlertService::new(state.db);
    let items = service.get_low_stock_items(branch_id).await?;
    Ok(Json(items))
}

/// Manually resolve an alert
pub async fn resolve_alert(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(alert_id): Path<Uuid>,
) -> AppResult<Json<StockAlert>> {
    let service = AlertService::new(state.db);
    let alert = service.resolve_alert(alert_id, current_user.0.user_id).await?;
    Ok(Json(alert))
}
