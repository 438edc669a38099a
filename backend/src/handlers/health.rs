//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    /// Stock notifications still waiting for delivery
    pub notification_backlog: Option<i64>,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let backlog = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM stock_notifications WHERE status IN ('pending', 'failed')",
    )
    .fetch_one(&state.db)
    .await
    .ok();

    let (status, database) = match backlog {
        Some(_) => ("healthy", "connected"),
        None => ("degraded", "disconnected"),
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        notification_backlog: backlog,
    })
}
