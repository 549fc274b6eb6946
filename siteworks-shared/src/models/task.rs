/// Task model and database operations
///
/// Tasks are units of work on a site, assigned by one user to another.
/// Completing a task stamps `completed_at`; reopening clears it.
///
/// # State Machine
///
/// ```text
/// todo → in_progress → completed
///                   → cancelled
/// todo → cancelled
/// completed → in_progress   (reopen)
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::priority::WorkPriority;

/// Task completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// Work task on a site
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub site_id: Uuid,

    /// User responsible for the work
    pub assigned_to: Uuid,

    /// User who handed out the task
    pub assigned_by: Uuid,

    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: WorkPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub photos: Vec<String>,
    pub notes: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const TASK_COLUMNS: &str = "id, site_id, assigned_to, assigned_by, title, description, status, \
     priority, due_date, completed_at, estimated_hours, actual_hours, photos, notes, tags, \
     created_at, updated_at";

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub site_id: Uuid,
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: WorkPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Optional filters shared by the task listings
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<WorkPriority>,
    pub assigned_to: Option<Uuid>,
}

/// Input for updating a task; unset fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<WorkPriority>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub tags: Option<Vec<String>>,
}

impl Task {
    /// Creates a new task in `todo` state
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (site_id, assigned_to, assigned_by, title, description,
                               priority, due_date, estimated_hours, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.site_id)
        .bind(data.assigned_to)
        .bind(data.assigned_by)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.estimated_hours)
        .bind(data.tags)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks on a site, with optional status/priority/assignee filters
    pub async fn list_by_site(
        pool: &PgPool,
        site_id: Uuid,
        filter: TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE site_id = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::work_priority IS NULL OR priority = $3)
              AND ($4::uuid IS NULL OR assigned_to = $4)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(site_id)
        .bind(filter.status)
        .bind(filter.priority)
        .bind(filter.assigned_to)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks assigned to a user
    pub async fn list_assigned_to(
        pool: &PgPool,
        user_id: Uuid,
        filter: TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE assigned_to = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::work_priority IS NULL OR priority = $3)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .bind(filter.status)
        .bind(filter.priority)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks on sites owned by a company's owner
    ///
    /// Owner listings are always scoped through the site's company.
    pub async fn list_for_company(
        pool: &PgPool,
        company_id: Uuid,
        filter: TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.*
            FROM tasks t
            JOIN sites s ON s.id = t.site_id
            WHERE s.company_id = $1
              AND ($2::task_status IS NULL OR t.status = $2)
              AND ($3::work_priority IS NULL OR t.priority = $3)
              AND ($4::uuid IS NULL OR t.assigned_to = $4)
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(filter.status)
        .bind(filter.priority)
        .bind(filter.assigned_to)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task
    ///
    /// Moving to `completed` stamps `completed_at`; moving away from it
    /// clears the stamp.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                assigned_to = COALESCE($6, assigned_to),
                due_date = COALESCE($7, due_date),
                estimated_hours = COALESCE($8, estimated_hours),
                actual_hours = COALESCE($9, actual_hours),
                tags = COALESCE($10, tags),
                completed_at = CASE
                    WHEN $4::task_status = 'completed' THEN COALESCE(completed_at, NOW())
                    WHEN $4::task_status IS NOT NULL THEN NULL
                    ELSE completed_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.assigned_to)
        .bind(data.due_date)
        .bind(data.estimated_hours)
        .bind(data.actual_hours)
        .bind(data.tags)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Appends a photo URL
    pub async fn add_photo(pool: &PgPool, id: Uuid, url: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET photos = array_append(photos, $2), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(url)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Appends a free-form note
    pub async fn add_note(pool: &PgPool, id: Uuid, note: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET notes = array_append(notes, $2), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(note)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Deletes a task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_is_terminal() {
        assert!(!TaskStatus::Todo.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_create_task_defaults() {
        let json = r#"{
            "site_id": "00000000-0000-0000-0000-000000000001",
            "assigned_to": "00000000-0000-0000-0000-000000000002",
            "assigned_by": "00000000-0000-0000-0000-000000000003",
            "title": "Pour foundation"
        }"#;
        let data: CreateTask = serde_json::from_str(json).unwrap();
        assert_eq!(data.priority, WorkPriority::Medium);
        assert!(data.tags.is_empty());
    }
}
