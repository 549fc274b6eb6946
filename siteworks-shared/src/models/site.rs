/// Site model and database operations
///
/// Sites belong to a company and its owner. Contractors and suppliers
/// gain access to a site only through a row in `site_assignments`; no
/// other path grants visibility.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE site_status AS ENUM ('not_started', 'in_progress', 'completed', 'on_hold');
/// CREATE TYPE assignment_role AS ENUM ('contractor', 'supplier');
///
/// CREATE TABLE sites (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     status site_status NOT NULL DEFAULT 'not_started',
///     progress_percent INTEGER NOT NULL DEFAULT 0 CHECK (progress_percent BETWEEN 0 AND 100),
///     -- location, dates, budget, photos, geometry columns omitted
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE site_assignments (
///     site_id UUID NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role assignment_role NOT NULL,
///     PRIMARY KEY (site_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::policy::SiteAccess;

/// Lifecycle status of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "site_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::NotStarted => "not_started",
            SiteStatus::InProgress => "in_progress",
            SiteStatus::Completed => "completed",
            SiteStatus::OnHold => "on_hold",
        }
    }
}

/// Role under which a user is assigned to a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "assignment_role", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentRole {
    Contractor,
    Supplier,
}

/// Construction site
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Site {
    pub id: Uuid,
    pub company_id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub address: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub expected_end_date: Option<DateTime<Utc>>,
    pub actual_end_date: Option<DateTime<Utc>>,
    pub status: SiteStatus,

    /// Completion percentage, always within 0..=100
    pub progress_percent: i32,

    pub description: Option<String>,
    pub budget: Option<f64>,
    pub actual_cost: Option<f64>,
    pub photos: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub site_area: Option<f64>,
    pub building_type: Option<String>,
    pub floors: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SITE_COLUMNS: &str = "id, company_id, owner_id, name, location, address, start_date, \
     expected_end_date, actual_end_date, status, progress_percent, description, budget, \
     actual_cost, photos, latitude, longitude, site_area, building_type, floors, \
     created_at, updated_at";

/// Input for creating a site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSite {
    pub company_id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub address: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub expected_end_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub budget: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub site_area: Option<f64>,
    pub building_type: Option<String>,
    pub floors: Option<i32>,
}

/// Input for a full site update (owner only)
///
/// Deliberately has no `owner_id` or `company_id` field; a site never
/// moves between companies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSite {
    pub name: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub expected_end_date: Option<DateTime<Utc>>,
    pub status: Option<SiteStatus>,
    pub progress_percent: Option<i32>,
    pub description: Option<String>,
    pub budget: Option<f64>,
    pub actual_cost: Option<f64>,
    pub building_type: Option<String>,
    pub floors: Option<i32>,
}

/// Row shape for loading a [`SiteAccess`] in one query
#[derive(Debug, sqlx::FromRow)]
struct SiteAccessRow {
    id: Uuid,
    company_id: Uuid,
    owner_id: Uuid,
    contractors: Vec<Uuid>,
    suppliers: Vec<Uuid>,
}

impl Site {
    /// Creates a new site in `not_started` state
    pub async fn create(pool: &PgPool, data: CreateSite) -> Result<Self, sqlx::Error> {
        let site = sqlx::query_as::<_, Site>(&format!(
            r#"
            INSERT INTO sites (company_id, owner_id, name, location, address, start_date,
                               expected_end_date, description, budget, latitude, longitude,
                               site_area, building_type, floors)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {SITE_COLUMNS}
            "#,
        ))
        .bind(data.company_id)
        .bind(data.owner_id)
        .bind(data.name)
        .bind(data.location)
        .bind(data.address)
        .bind(data.start_date)
        .bind(data.expected_end_date)
        .bind(data.description)
        .bind(data.budget)
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(data.site_area)
        .bind(data.building_type)
        .bind(data.floors)
        .fetch_one(pool)
        .await?;

        Ok(site)
    }

    /// Finds a site by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let site = sqlx::query_as::<_, Site>(&format!(
            "SELECT {SITE_COLUMNS} FROM sites WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(site)
    }

    /// Loads the access snapshot used by the authorization policy
    ///
    /// Pulls the site's company, owner, and assigned contractor and
    /// supplier IDs in a single query.
    pub async fn load_access(pool: &PgPool, id: Uuid) -> Result<Option<SiteAccess>, sqlx::Error> {
        let row = sqlx::query_as::<_, SiteAccessRow>(
            r#"
            SELECT s.id, s.company_id, s.owner_id,
                   COALESCE(array_agg(a.user_id) FILTER (WHERE a.role = 'contractor'),
                            ARRAY[]::uuid[]) AS contractors,
                   COALESCE(array_agg(a.user_id) FILTER (WHERE a.role = 'supplier'),
                            ARRAY[]::uuid[]) AS suppliers
            FROM sites s
            LEFT JOIN site_assignments a ON a.site_id = s.id
            WHERE s.id = $1
            GROUP BY s.id, s.company_id, s.owner_id
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|r| SiteAccess {
            site_id: r.id,
            company_id: r.company_id,
            owner_id: r.owner_id,
            contractors: r.contractors,
            suppliers: r.suppliers,
        }))
    }

    /// Lists all sites belonging to a company
    pub async fn list_for_company(pool: &PgPool, company_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sites = sqlx::query_as::<_, Site>(&format!(
            r#"
            SELECT {SITE_COLUMNS}
            FROM sites
            WHERE company_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(company_id)
        .fetch_all(pool)
        .await?;

        Ok(sites)
    }

    /// Lists sites a user is assigned to under a given role
    pub async fn list_assigned_to(
        pool: &PgPool,
        user_id: Uuid,
        role: AssignmentRole,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sites = sqlx::query_as::<_, Site>(
            r#"
            SELECT s.*
            FROM sites s
            JOIN site_assignments a ON a.site_id = s.id
            WHERE a.user_id = $1 AND a.role = $2
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(role)
        .fetch_all(pool)
        .await?;

        Ok(sites)
    }

    /// Full site update (owner path)
    ///
    /// Unset fields keep their current value. Moving to `completed`
    /// stamps `actual_end_date` if not already set.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateSite,
    ) -> Result<Option<Self>, sqlx::Error> {
        let progress = data.progress_percent.map(|p| p.clamp(0, 100));

        let site = sqlx::query_as::<_, Site>(&format!(
            r#"
            UPDATE sites
            SET name = COALESCE($2, name),
                location = COALESCE($3, location),
                address = COALESCE($4, address),
                start_date = COALESCE($5, start_date),
                expected_end_date = COALESCE($6, expected_end_date),
                status = COALESCE($7, status),
                progress_percent = COALESCE($8, progress_percent),
                description = COALESCE($9, description),
                budget = COALESCE($10, budget),
                actual_cost = COALESCE($11, actual_cost),
                building_type = COALESCE($12, building_type),
                floors = COALESCE($13, floors),
                actual_end_date = CASE
                    WHEN $7::site_status = 'completed' THEN COALESCE(actual_end_date, NOW())
                    ELSE actual_end_date
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SITE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.location)
        .bind(data.address)
        .bind(data.start_date)
        .bind(data.expected_end_date)
        .bind(data.status)
        .bind(progress)
        .bind(data.description)
        .bind(data.budget)
        .bind(data.actual_cost)
        .bind(data.building_type)
        .bind(data.floors)
        .fetch_optional(pool)
        .await?;

        Ok(site)
    }

    /// Status and progress update (contractor path)
    ///
    /// Contractors may touch nothing but these two columns. Progress is
    /// clamped into 0..=100 before it reaches the database.
    pub async fn update_status_progress(
        pool: &PgPool,
        id: Uuid,
        status: Option<SiteStatus>,
        progress_percent: Option<i32>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let progress = progress_percent.map(|p| p.clamp(0, 100));

        let site = sqlx::query_as::<_, Site>(&format!(
            r#"
            UPDATE sites
            SET status = COALESCE($2, status),
                progress_percent = COALESCE($3, progress_percent),
                actual_end_date = CASE
                    WHEN $2::site_status = 'completed' THEN COALESCE(actual_end_date, NOW())
                    ELSE actual_end_date
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SITE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status)
        .bind(progress)
        .fetch_optional(pool)
        .await?;

        Ok(site)
    }

    /// Assigns a user to a site, idempotently
    pub async fn assign_user(
        pool: &PgPool,
        site_id: Uuid,
        user_id: Uuid,
        role: AssignmentRole,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO site_assignments (site_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (site_id, user_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(site_id)
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Removes a user's assignment from a site
    pub async fn unassign_user(
        pool: &PgPool,
        site_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM site_assignments WHERE site_id = $1 AND user_id = $2")
                .bind(site_id)
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Appends a photo URL to the site's gallery
    pub async fn add_photo(pool: &PgPool, id: Uuid, url: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE sites SET photos = array_append(photos, $2), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(url)
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_status_as_str() {
        assert_eq!(SiteStatus::NotStarted.as_str(), "not_started");
        assert_eq!(SiteStatus::InProgress.as_str(), "in_progress");
        assert_eq!(SiteStatus::Completed.as_str(), "completed");
        assert_eq!(SiteStatus::OnHold.as_str(), "on_hold");
    }

    #[test]
    fn test_update_site_has_no_ownership_fields() {
        // UpdateSite has no owner or company fields, so any such keys a
        // client sends are dropped during deserialization.
        let json = r#"{"name":"New name","owner_id":"00000000-0000-0000-0000-000000000001"}"#;
        let update: UpdateSite = serde_json::from_str(json).unwrap();
        assert_eq!(update.name.as_deref(), Some("New name"));
    }
}
