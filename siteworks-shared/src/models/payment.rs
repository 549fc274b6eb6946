/// Payment model and database operations
///
/// Payments are recorded between two users on a site, typically from
/// the owner to a contractor or supplier. Approval and payout stamp
/// their own timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Payment lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Paid,
    Cancelled,
}

/// What the payment is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_kind", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    Advance,
    Progress,
    Final,
    Material,
    Other,
}

/// Payment between two site participants
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub site_id: Uuid,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub status: PaymentStatus,
    pub kind: PaymentKind,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const PAYMENT_COLUMNS: &str = "id, site_id, amount, date, from_user, to_user, status, kind, \
     reference, note, approved_by, approved_at, paid_at, created_at, updated_at";

/// Input for recording a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayment {
    pub site_id: Uuid,
    pub amount: f64,
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub kind: PaymentKind,
    pub reference: Option<String>,
    pub note: Option<String>,
}

/// Per-status totals for the payment summary endpoint
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentSummary {
    pub total_count: i64,
    pub total_amount: f64,
    pub pending_amount: f64,
    pub approved_amount: f64,
    pub paid_amount: f64,
}

impl Payment {
    /// Records a new payment in `pending` state
    pub async fn create(pool: &PgPool, data: CreatePayment) -> Result<Self, sqlx::Error> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (site_id, amount, from_user, to_user, kind, reference, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(data.site_id)
        .bind(data.amount)
        .bind(data.from_user)
        .bind(data.to_user)
        .bind(data.kind)
        .bind(data.reference)
        .bind(data.note)
        .fetch_one(pool)
        .await?;

        Ok(payment)
    }

    /// Finds a payment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(payment)
    }

    /// Lists payments on a site
    pub async fn list_by_site(
        pool: &PgPool,
        site_id: Uuid,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE site_id = $1
              AND ($2::payment_status IS NULL OR status = $2)
            ORDER BY date DESC
            "#,
        ))
        .bind(site_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(payments)
    }

    /// Lists payments a user sent or received
    pub async fn list_involving(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE (from_user = $1 OR to_user = $1)
              AND ($2::payment_status IS NULL OR status = $2)
            ORDER BY date DESC
            "#,
        ))
        .bind(user_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(payments)
    }

    /// Lists payments across all sites of a company
    pub async fn list_for_company(
        pool: &PgPool,
        company_id: Uuid,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.*
            FROM payments p
            JOIN sites s ON s.id = p.site_id
            WHERE s.company_id = $1
              AND ($2::payment_status IS NULL OR p.status = $2)
            ORDER BY p.date DESC
            "#,
        )
        .bind(company_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(payments)
    }

    /// Approves a pending payment
    pub async fn approve(
        pool: &PgPool,
        id: Uuid,
        approved_by: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'approved',
                approved_by = $2,
                approved_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(approved_by)
        .fetch_optional(pool)
        .await?;

        Ok(payment)
    }

    /// Marks an approved payment as paid
    pub async fn mark_paid(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'paid',
                paid_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'approved'
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(payment)
    }

    /// Cancels a payment that has not been paid out
    pub async fn cancel(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'cancelled',
                updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'approved')
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(payment)
    }

    /// Per-status totals for one site
    pub async fn summary_for_site(
        pool: &PgPool,
        site_id: Uuid,
    ) -> Result<PaymentSummary, sqlx::Error> {
        let summary = sqlx::query_as::<_, PaymentSummary>(
            r#"
            SELECT COUNT(*) AS total_count,
                   COALESCE(SUM(amount), 0) AS total_amount,
                   COALESCE(SUM(amount) FILTER (WHERE status = 'pending'), 0) AS pending_amount,
                   COALESCE(SUM(amount) FILTER (WHERE status = 'approved'), 0) AS approved_amount,
                   COALESCE(SUM(amount) FILTER (WHERE status = 'paid'), 0) AS paid_amount
            FROM payments
            WHERE site_id = $1
            "#,
        )
        .bind(site_id)
        .fetch_one(pool)
        .await?;

        Ok(summary)
    }
}
