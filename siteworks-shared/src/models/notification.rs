/// Notification model and database operations
///
/// In-app notification inbox. Expired notifications are never returned
/// by listings; `purge_expired` removes them for good and runs
/// opportunistically whenever an inbox is listed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::priority::RequestPriority;

/// Category of notification, used by clients for routing and icons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    SiteUpdate,
    MaterialRequest,
    Payment,
    TaskAssignment,
    IssueReport,
    General,
    System,
}

/// Notification delivered to a user's inbox
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub priority: RequestPriority,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub data: Option<JsonValue>,
    pub action_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const NOTIFICATION_COLUMNS: &str = "id, recipient_id, sender_id, site_id, title, message, kind, \
     priority, is_read, read_at, data, action_url, expires_at, created_at";

/// Input for creating a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    #[serde(default)]
    pub priority: RequestPriority,
    pub data: Option<JsonValue>,
    pub action_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub async fn create(pool: &PgPool, data: CreateNotification) -> Result<Self, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (recipient_id, sender_id, site_id, title, message, kind,
                                       priority, data, action_url, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {NOTIFICATION_COLUMNS}
            "#,
        ))
        .bind(data.recipient_id)
        .bind(data.sender_id)
        .bind(data.site_id)
        .bind(data.title)
        .bind(data.message)
        .bind(data.kind)
        .bind(data.priority)
        .bind(data.data)
        .bind(data.action_url)
        .bind(data.expires_at)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// Lists a user's notifications, newest first, skipping expired ones
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE recipient_id = $1
              AND (expires_at IS NULL OR expires_at > NOW())
              AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        ))
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    /// Count of unread, unexpired notifications
    pub async fn unread_count(pool: &PgPool, recipient_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE recipient_id = $1
              AND NOT is_read
              AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .bind(recipient_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Marks one notification as read, scoped to its recipient
    pub async fn mark_read(
        pool: &PgPool,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE,
                read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND recipient_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(pool)
        .await?;

        Ok(notification)
    }

    /// Marks everything in a user's inbox as read
    pub async fn mark_all_read(pool: &PgPool, recipient_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE recipient_id = $1 AND NOT is_read
            "#,
        )
        .bind(recipient_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes expired notifications; returns how many were removed
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at <= NOW()")
                .execute(pool)
                .await?;

        Ok(result.rows_affected())
    }
}
