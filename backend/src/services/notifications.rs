//! Stock notification service
//!
//! Queues a notification for every alert transition and pushes it to an
//! optional webhook endpoint. Dispatch happens after the stock mutation has
//! committed, from a detached task, so a slow receiver never holds up a
//! ledger write.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{AlertType, NotificationStatus, RawItem, StockAlert, StockNotification};
use shared::types::Pagination;

use crate::error::{AppError, AppResult};

/// Columns returned for every notification query
const NOTIFICATION_COLUMNS: &str = "id, branch_id, raw_item_id, alert_id, title, title_th, \
                                    message, message_th, status, error_message, sent_at, created_at";

/// Notification service for stock alerts
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
    webhook: Option<WebhookClient>,
}

/// Webhook client for pushing alert notifications to an external receiver
#[derive(Clone)]
pub struct WebhookClient {
    url: String,
    http_client: reqwest::Client,
}

/// Payload posted to the webhook endpoint
#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    branch_id: Uuid,
    item_code: &'a str,
    alert_type: &'a str,
    title: &'a str,
    message: &'a str,
}

/// Message content for one queued notification
#[derive(Debug, Clone)]
struct NotificationContent {
    title: String,
    title_th: String,
    message: String,
    message_th: String,
}

impl WebhookClient {
    /// Create a new webhook client
    pub fn new(url: String) -> Self {
        Self {
            url,
            http_client: reqwest::Client::new(),
        }
    }

    /// Push one message to the webhook endpoint
    async fn send(&self, payload: &WebhookMessage<'_>) -> Result<(), String> {
        let response = self
            .http_client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| format!("Failed to reach webhook: {}", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("Webhook returned status {}", response.status()))
        }
    }
}

impl NotificationService {
    /// Create a new NotificationService instance; no webhook URL means
    /// notifications stay in the queue for in-app consumption only.
    pub fn new(db: PgPool, webhook_url: Option<String>) -> Self {
        let webhook = webhook_url
            .filter(|url| !url.is_empty())
            .map(WebhookClient::new);
        Self { db, webhook }
    }

    /// Queue and dispatch the notification for a freshly raised alert
    pub async fn notify_alert(
        &self,
        item: &RawItem,
        alert: &StockAlert,
    ) -> AppResult<StockNotification> {
        let content = match alert.alert_type {
            AlertType::LowStock => low_stock_content(item, alert),
            AlertType::OutOfStock => out_of_stock_content(item),
        };

        // Queue first so the alert survives a webhook outage
        let queued = sqlx::query_as::<_, StockNotification>(&format!(
            r#"
            INSERT INTO stock_notifications (
                branch_id, raw_item_id, alert_id, title, title_th, message, message_th
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {NOTIFICATION_COLUMNS}
            "#,
        ))
        .bind(alert.branch_id)
        .bind(alert.raw_item_id)
        .bind(alert.id)
        .bind(&content.title)
        .bind(&content.title_th)
        .bind(&content.message)
        .bind(&content.message_th)
        .fetch_one(&self.db)
        .await?;

        self.dispatch(item, alert, &queued).await
    }

    /// Attempt webhook delivery for a queued notification and record the outcome
    async fn dispatch(
        &self,
        item: &RawItem,
        alert: &StockAlert,
        notification: &StockNotification,
    ) -> AppResult<StockNotification> {
        let client = match &self.webhook {
            Some(client) => client,
            // In-app only: the queue row is the delivery
            None => return self.mark_status(notification.id, NotificationStatus::Sent, None).await,
        };

        let payload = WebhookMessage {
            branch_id: alert.branch_id,
            item_code: &item.code,
            alert_type: alert.alert_type.as_str(),
            title: &notification.title,
            message: &notification.message,
        };

        match client.send(&payload).await {
            Ok(()) => self.mark_status(notification.id, NotificationStatus::Sent, None).await,
            Err(e) => {
                tracing::warn!("Stock alert webhook delivery failed: {}", e);
                self.mark_status(notification.id, NotificationStatus::Failed, Some(e))
                    .await
            }
        }
    }

    async fn mark_status(
        &self,
        notification_id: Uuid,
        status: NotificationStatus,
        error_message: Option<String>,
    ) -> AppResult<StockNotification> {
        let notification = sqlx::query_as::<_, StockNotification>(&format!(
            r#"
            UPDATE stock_notifications
            SET status = $2,
                error_message = $3,
                sent_at = CASE WHEN $2 = 'sent'::notification_status THEN NOW() ELSE sent_at END
            WHERE id = $1
            RETURNING {NOTIFICATION_COLUMNS}
            "#,
        ))
        .bind(notification_id)
        .bind(status)
        .bind(&error_message)
        .fetch_one(&self.db)
        .await?;

        Ok(notification)
    }

    /// Retry undelivered notifications. Returns the number delivered.
    pub async fn process_queue(&self, limit: i64) -> AppResult<i32> {
        let pending = sqlx::query_as::<_, StockNotification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM stock_notifications
            WHERE status IN ('pending', 'failed')
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        let mut sent = 0;
        for notification in pending {
            let alert = self.load_alert(&notification).await?;
            let item = self.load_item(notification.raw_item_id).await?;
            match self.dispatch(&item, &alert, &notification).await {
                Ok(updated) if updated.status == NotificationStatus::Sent => sent += 1,
                Ok(_) => {}
                Err(e) => {
                    // Keep draining the queue; this row stays failed
                    tracing::error!("Failed to process notification {}: {}", notification.id, e);
                }
            }
        }

        Ok(sent)
    }

    /// Recent notifications for a branch, newest first
    pub async fn list_recent(
        &self,
        branch_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<Vec<StockNotification>> {
        let pagination = pagination.clamped();

        let notifications = sqlx::query_as::<_, StockNotification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM stock_notifications
            WHERE branch_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(branch_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.db)
        .await?;

        Ok(notifications)
    }

    async fn load_alert(&self, notification: &StockNotification) -> AppResult<StockAlert> {
        let alert_id = notification
            .alert_id
            .ok_or_else(|| AppError::NotFound("Alert".to_string()))?;

        sqlx::query_as::<_, StockAlert>(
            r#"
            SELECT id, branch_id, raw_item_id, alert_type, current_quantity, threshold_quantity,
                   is_resolved, resolved_by, resolved_at, created_at
            FROM stock_alerts
            WHERE id = $1
            "#,
        )
        .bind(alert_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert".to_string()))
    }

    async fn load_item(&self, raw_item_id: Uuid) -> AppResult<RawItem> {
        sqlx::query_as::<_, RawItem>(
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
        .ok_or_else(|| AppError::NotFound("Raw item".to_string()))
    }
}

/// Build the bilingual content for a low-stock alert
fn low_stock_content(item: &RawItem, alert: &StockAlert) -> NotificationContent {
    let display_name = item.name_th.as_deref().unwrap_or(&item.name);
    NotificationContent {
        title: format!("Low Stock Alert: {}", item.name),
        title_th: format!("แจ้งเตือนสต็อกต่ำ: {}", display_name),
        message: format!(
            "Item '{}' ({}) is below its minimum level. Current: {} {}, Minimum: {} {}",
            item.name,
            item.code,
            alert.current_quantity,
            item.storage_unit.as_str(),
            alert.threshold_quantity,
            item.storage_unit.as_str(),
        ),
        message_th: format!(
            "สินค้า '{}' ({}) ต่ำกว่าเกณฑ์ขั้นต่ำ คงเหลือ: {} {} เกณฑ์: {} {}",
            display_name,
            item.code,
            alert.current_quantity,
            item.storage_unit.as_str(),
            alert.threshold_quantity,
            item.storage_unit.as_str(),
        ),
    }
}

/// Build the bilingual content for an out-of-stock alert
fn out_of_stock_content(item: &RawItem) -> NotificationContent {
    let display_name = item.name_th.as_deref().unwrap_or(&item.name);
    NotificationContent {
        title: format!("Out of Stock: {}", item.name),
        title_th: format!("สินค้าหมดสต็อก: {}", display_name),
        message: format!(
            "Item '{}' ({}) is out of stock. Restock as soon as possible.",
            item.name, item.code,
        ),
        message_th: format!(
            "สินค้า '{}' ({}) หมดสต็อกแล้ว กรุณาเติมสต็อกโดยเร็ว",
            display_name, item.code,
        ),
    }
}
