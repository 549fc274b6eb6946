/// Append-only audit trail
///
/// Records financial and status events against a site. Rows are only
/// ever inserted and listed; there is no update or delete path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// What kind of event was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_kind", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditKind {
    Payment,
    MaterialRequest,
    DeliveryUpdate,
    StatusUpdate,
}

/// One entry in the audit trail
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub site_id: Uuid,
    pub kind: AuditKind,
    pub actor_id: Uuid,
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Appends an entry to the trail
    pub async fn record(
        pool: &PgPool,
        site_id: Uuid,
        kind: AuditKind,
        actor_id: Uuid,
        details: JsonValue,
    ) -> Result<Self, sqlx::Error> {
        let entry = sqlx::query_as::<_, AuditEntry>(
            r#"
            INSERT INTO audit_log (site_id, kind, actor_id, details)
            VALUES ($1, $2, $3, $4)
            RETURNING id, site_id, kind, actor_id, details, created_at
            "#,
        )
        .bind(site_id)
        .bind(kind)
        .bind(actor_id)
        .bind(details)
        .fetch_one(pool)
        .await?;

        Ok(entry)
    }

    /// Lists entries for a site, newest first
    pub async fn list_by_site(
        pool: &PgPool,
        site_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT id, site_id, kind, actor_id, details, created_at
            FROM audit_log
            WHERE site_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(site_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }
}
