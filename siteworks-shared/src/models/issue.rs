/// Issue model and database operations
///
/// Issues are problems reported against a site. Resolving one stamps
/// `resolved_at` and records the resolution text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::priority::WorkPriority;

/// Issue lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

/// What kind of problem the issue describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_category", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCategory {
    Safety,
    Quality,
    Schedule,
    Cost,
    Material,
    Equipment,
    Other,
}

/// Issue reported on a site
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Issue {
    pub id: Uuid,
    pub site_id: Uuid,
    pub reported_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    pub priority: WorkPriority,
    pub category: IssueCategory,
    pub location: Option<String>,
    pub photos: Vec<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub estimated_cost: Option<f64>,
    pub actual_cost: Option<f64>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ISSUE_COLUMNS: &str = "id, site_id, reported_by, assigned_to, title, description, status, \
     priority, category, location, photos, resolved_at, resolution, estimated_cost, actual_cost, \
     tags, created_at, updated_at";

/// Input for reporting an issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIssue {
    pub site_id: Uuid,
    pub reported_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: WorkPriority,
    pub category: IssueCategory,
    pub location: Option<String>,
    pub estimated_cost: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for updating an issue; unset fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIssue {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<WorkPriority>,
    pub category: Option<IssueCategory>,
    pub assigned_to: Option<Uuid>,
    pub location: Option<String>,
    pub resolution: Option<String>,
    pub estimated_cost: Option<f64>,
    pub actual_cost: Option<f64>,
    pub tags: Option<Vec<String>>,
}

/// Aggregate counts for the issue stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssueStats {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
    pub critical: i64,
}

impl Issue {
    /// Reports a new issue in `open` state
    pub async fn create(pool: &PgPool, data: CreateIssue) -> Result<Self, sqlx::Error> {
        let issue = sqlx::query_as::<_, Issue>(&format!(
            r#"
            INSERT INTO issues (site_id, reported_by, assigned_to, title, description,
                                priority, category, location, estimated_cost, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ISSUE_COLUMNS}
            "#,
        ))
        .bind(data.site_id)
        .bind(data.reported_by)
        .bind(data.assigned_to)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.category)
        .bind(data.location)
        .bind(data.estimated_cost)
        .bind(data.tags)
        .fetch_one(pool)
        .await?;

        Ok(issue)
    }

    /// Finds an issue by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let issue = sqlx::query_as::<_, Issue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(issue)
    }

    /// Lists issues on a site, optionally filtered by status
    pub async fn list_by_site(
        pool: &PgPool,
        site_id: Uuid,
        status: Option<IssueStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let issues = sqlx::query_as::<_, Issue>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            WHERE site_id = $1
              AND ($2::issue_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(site_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(issues)
    }

    /// Lists issues a user reported or is assigned to
    pub async fn list_involving(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<IssueStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let issues = sqlx::query_as::<_, Issue>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            WHERE (reported_by = $1 OR assigned_to = $1)
              AND ($2::issue_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(issues)
    }

    /// Lists issues across all sites of a company
    pub async fn list_for_company(
        pool: &PgPool,
        company_id: Uuid,
        status: Option<IssueStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let issues = sqlx::query_as::<_, Issue>(
            r#"
            SELECT i.*
            FROM issues i
            JOIN sites s ON s.id = i.site_id
            WHERE s.company_id = $1
              AND ($2::issue_status IS NULL OR i.status = $2)
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(issues)
    }

    /// Updates an issue
    ///
    /// Moving to `resolved` stamps `resolved_at` if not already set.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateIssue,
    ) -> Result<Option<Self>, sqlx::Error> {
        let issue = sqlx::query_as::<_, Issue>(&format!(
            r#"
            UPDATE issues
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                category = COALESCE($6, category),
                assigned_to = COALESCE($7, assigned_to),
                location = COALESCE($8, location),
                resolution = COALESCE($9, resolution),
                estimated_cost = COALESCE($10, estimated_cost),
                actual_cost = COALESCE($11, actual_cost),
                tags = COALESCE($12, tags),
                resolved_at = CASE
                    WHEN $4::issue_status = 'resolved' THEN COALESCE(resolved_at, NOW())
                    ELSE resolved_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ISSUE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.category)
        .bind(data.assigned_to)
        .bind(data.location)
        .bind(data.resolution)
        .bind(data.estimated_cost)
        .bind(data.actual_cost)
        .bind(data.tags)
        .fetch_optional(pool)
        .await?;

        Ok(issue)
    }

    /// Appends a photo URL
    pub async fn add_photo(pool: &PgPool, id: Uuid, url: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE issues SET photos = array_append(photos, $2), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(url)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Deletes an issue
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM issues WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Aggregate issue counts across a company's sites
    pub async fn stats_for_company(
        pool: &PgPool,
        company_id: Uuid,
    ) -> Result<IssueStats, sqlx::Error> {
        let stats = sqlx::query_as::<_, IssueStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE i.status = 'open') AS open,
                   COUNT(*) FILTER (WHERE i.status = 'in_progress') AS in_progress,
                   COUNT(*) FILTER (WHERE i.status = 'resolved') AS resolved,
                   COUNT(*) FILTER (WHERE i.status = 'closed') AS closed,
                   COUNT(*) FILTER (WHERE i.priority = 'critical') AS critical
            FROM issues i
            JOIN sites s ON s.id = i.site_id
            WHERE s.company_id = $1
            "#,
        )
        .bind(company_id)
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }

    /// Aggregate issue counts for the issues a user reported or holds
    pub async fn stats_involving(pool: &PgPool, user_id: Uuid) -> Result<IssueStats, sqlx::Error> {
        let stats = sqlx::query_as::<_, IssueStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'open') AS open,
                   COUNT(*) FILTER (WHERE status = 'in_progress') AS in_progress,
                   COUNT(*) FILTER (WHERE status = 'resolved') AS resolved,
                   COUNT(*) FILTER (WHERE status = 'closed') AS closed,
                   COUNT(*) FILTER (WHERE priority = 'critical') AS critical
            FROM issues
            WHERE reported_by = $1 OR assigned_to = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }
}
