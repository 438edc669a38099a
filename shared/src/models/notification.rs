//! Stock notification models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Delivery state of a queued notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

/// A queued stock notification.
///
/// Rows are written after the stock mutation commits and are delivered by a
/// detached task, so a slow or unreachable receiver never stalls a write.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockNotification {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub raw_item_id: Uuid,
    pub alert_id: Option<Uuid>,
    pub title: String,
    pub title_th: Option<String>,
    pub message: String,
    pub message_th: Option<String>,
    pub status: NotificationStatus,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
