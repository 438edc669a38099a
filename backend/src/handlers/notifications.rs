//! HTTP handlers for stock notification endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::StockNotification;
use shared::types::Pagination;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::notifications::NotificationService;
use crate::AppState;

/// Query parameters for queue processing
#[derive(Debug, Deserialize)]
pub struct ProcessQueueQuery {
    pub limit: Option<i64>,
}

/// Response for queue processing
#[derive(Debug, Serialize)]
pub struct ProcessQueueResponse {
    pub sent: i32,
}

/// Recent notifications for a branch
pub async fn list_notifications(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<StockNotification>>> {
    let service = NotificationService::new(state.db, state.config.notifier.webhook_url.clone());
    let notifications = service.list_recent(branch_id, pagination).await?;
    Ok(Json(notifications))
}

/// Retry undelivered notifications
pub async fn process_notification_queue(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ProcessQueueQuery>,
) -> AppResult<Json<ProcessQueueResponse>> {
    let service = NotificationService::new(state.db, state.config.notifier.webhook_url.clone());
    let sent = service.process_queue(query.limit.unwrap_or(50)).await?;
    Ok(Json(ProcessQueueResponse { sent }))
}
