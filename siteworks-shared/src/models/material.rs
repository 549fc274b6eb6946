/// Material request model and database operations
///
/// Contractors raise material requests against a site, addressed to a
/// specific supplier. That supplier approves, rejects, and marks
/// delivery.
///
/// # State Machine
///
/// ```text
/// pending → approved → delivered
///        → rejected
/// pending → cancelled
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::priority::RequestPriority;

/// Material request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "material_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialStatus {
    Pending,
    Approved,
    Rejected,
    Delivered,
    Cancelled,
}

impl MaterialStatus {
    /// Checks if transition to target state is valid
    pub fn can_transition_to(&self, target: MaterialStatus) -> bool {
        match (self, target) {
            (MaterialStatus::Pending, MaterialStatus::Approved) => true,
            (MaterialStatus::Pending, MaterialStatus::Rejected) => true,
            (MaterialStatus::Pending, MaterialStatus::Cancelled) => true,
            (MaterialStatus::Approved, MaterialStatus::Delivered) => true,
            (MaterialStatus::Approved, MaterialStatus::Cancelled) => true,
            _ => false,
        }
    }
}

/// A single line item inside a material request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: Option<f64>,
    pub notes: Option<String>,
}

/// Material request
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MaterialRequest {
    pub id: Uuid,
    pub site_id: Uuid,
    pub requested_by: Uuid,

    /// Supplier expected to fulfil the request
    pub supplier_id: Uuid,

    /// Line items as JSON, shaped like [`MaterialItem`]
    pub items: JsonValue,

    pub status: MaterialStatus,
    pub priority: RequestPriority,
    pub requested_date: DateTime<Utc>,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub total_amount: Option<f64>,
    pub notes: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const MATERIAL_COLUMNS: &str = "id, site_id, requested_by, supplier_id, items, status, priority, \
     requested_date, expected_delivery_date, actual_delivery_date, total_amount, notes, \
     approved_by, approved_at, rejection_reason, created_at, updated_at";

/// Input for raising a material request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMaterialRequest {
    pub site_id: Uuid,
    pub requested_by: Uuid,
    pub supplier_id: Uuid,
    pub items: JsonValue,
    #[serde(default)]
    pub priority: RequestPriority,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    pub total_amount: Option<f64>,
    pub notes: Option<String>,
}

impl MaterialRequest {
    /// Raises a new material request in `pending` state
    pub async fn create(pool: &PgPool, data: CreateMaterialRequest) -> Result<Self, sqlx::Error> {
        let request = sqlx::query_as::<_, MaterialRequest>(&format!(
            r#"
            INSERT INTO material_requests (site_id, requested_by, supplier_id, items, priority,
                                           expected_delivery_date, total_amount, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MATERIAL_COLUMNS}
            "#,
        ))
        .bind(data.site_id)
        .bind(data.requested_by)
        .bind(data.supplier_id)
        .bind(data.items)
        .bind(data.priority)
        .bind(data.expected_delivery_date)
        .bind(data.total_amount)
        .bind(data.notes)
        .fetch_one(pool)
        .await?;

        Ok(request)
    }

    /// Finds a material request by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, MaterialRequest>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM material_requests WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Lists requests on a site
    pub async fn list_by_site(
        pool: &PgPool,
        site_id: Uuid,
        status: Option<MaterialStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let requests = sqlx::query_as::<_, MaterialRequest>(&format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM material_requests
            WHERE site_id = $1
              AND ($2::material_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(site_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(requests)
    }

    /// Lists requests addressed to a supplier
    pub async fn list_for_supplier(
        pool: &PgPool,
        supplier_id: Uuid,
        status: Option<MaterialStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let requests = sqlx::query_as::<_, MaterialRequest>(&format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM material_requests
            WHERE supplier_id = $1
              AND ($2::material_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(supplier_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(requests)
    }

    /// Lists requests raised by a user
    pub async fn list_requested_by(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<MaterialStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let requests = sqlx::query_as::<_, MaterialRequest>(&format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM material_requests
            WHERE requested_by = $1
              AND ($2::material_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(requests)
    }

    /// Lists requests across all sites of a company
    pub async fn list_for_company(
        pool: &PgPool,
        company_id: Uuid,
        status: Option<MaterialStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let requests = sqlx::query_as::<_, MaterialRequest>(
            r#"
            SELECT m.*
            FROM material_requests m
            JOIN sites s ON s.id = m.site_id
            WHERE s.company_id = $1
              AND ($2::material_status IS NULL OR m.status = $2)
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(requests)
    }

    /// Approves a pending request
    pub async fn approve(
        pool: &PgPool,
        id: Uuid,
        approved_by: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, MaterialRequest>(&format!(
            r#"
            UPDATE material_requests
            SET status = 'approved',
                approved_by = $2,
                approved_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {MATERIAL_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(approved_by)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Rejects a pending request with a reason
    pub async fn reject(
        pool: &PgPool,
        id: Uuid,
        rejected_by: Uuid,
        reason: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, MaterialRequest>(&format!(
            r#"
            UPDATE material_requests
            SET status = 'rejected',
                approved_by = $2,
                rejection_reason = $3,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {MATERIAL_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(rejected_by)
        .bind(reason)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Marks an approved request as delivered
    pub async fn mark_delivered(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, MaterialRequest>(&format!(
            r#"
            UPDATE material_requests
            SET status = 'delivered',
                actual_delivery_date = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'approved'
            RETURNING {MATERIAL_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Cancels a request that has not yet been delivered or rejected
    pub async fn cancel(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, MaterialRequest>(&format!(
            r#"
            UPDATE material_requests
            SET status = 'cancelled',
                updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'approved')
            RETURNING {MATERIAL_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_status_transitions() {
        assert!(MaterialStatus::Pending.can_transition_to(MaterialStatus::Approved));
        assert!(MaterialStatus::Pending.can_transition_to(MaterialStatus::Rejected));
        assert!(MaterialStatus::Pending.can_transition_to(MaterialStatus::Cancelled));
        assert!(MaterialStatus::Approved.can_transition_to(MaterialStatus::Delivered));
        assert!(MaterialStatus::Approved.can_transition_to(MaterialStatus::Cancelled));

        assert!(!MaterialStatus::Pending.can_transition_to(MaterialStatus::Delivered));
        assert!(!MaterialStatus::Rejected.can_transition_to(MaterialStatus::Approved));
        assert!(!MaterialStatus::Delivered.can_transition_to(MaterialStatus::Cancelled));
        assert!(!MaterialStatus::Cancelled.can_transition_to(MaterialStatus::Pending));
    }

    #[test]
    fn test_material_item_shape() {
        let item = MaterialItem {
            name: "Cement".to_string(),
            quantity: 40.0,
            unit: "bag".to_string(),
            unit_price: Some(12.5),
            notes: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["name"], "Cement");
        assert_eq!(json["quantity"], 40.0);
    }
}
