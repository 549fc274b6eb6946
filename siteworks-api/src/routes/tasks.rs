/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks` - List tasks visible to the caller
/// - `GET /api/tasks/:id` - Get one task
/// - `POST /api/tasks` - Create a task
/// - `PUT /api/tasks/:id` - Update a task
/// - `DELETE /api/tasks/:id` - Delete a task (site owner only)
/// - `POST /api/tasks/:id/photos` - Attach a photo URL
/// - `POST /api/tasks/:id/notes` - Append a note

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use siteworks_shared::{
    auth::{
        middleware::AuthContext,
        policy::{self, Action, ReadScope, TaskRefs},
    },
    models::{
        priority::WorkPriority,
        site::Site,
        task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask},
    },
    notify,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Query parameters for the task listing
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Restrict to one site (membership checked)
    pub site_id: Option<Uuid>,

    pub status: Option<TaskStatus>,
    pub priority: Option<WorkPriority>,
    pub assigned_to: Option<Uuid>,
}

impl ListTasksQuery {
    fn filter(&self) -> TaskFilter {
        TaskFilter {
            status: self.status,
            priority: self.priority,
            assigned_to: self.assigned_to,
        }
    }
}

/// Create task request; the assigner is always the caller
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub site_id: Uuid,
    pub assigned_to: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,
    #[serde(default)]
    pub priority: WorkPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body for attaching a photo
#[derive(Debug, Deserialize, Validate)]
pub struct AddPhotoRequest {
    #[validate(length(min = 1, message = "Photo URL is required"))]
    pub url: String,
}

/// Body for appending a note
#[derive(Debug, Deserialize, Validate)]
pub struct AddNoteRequest {
    #[validate(length(min = 1, message = "Note text is required"))]
    pub note: String,
}

fn refs(task: &Task) -> TaskRefs {
    TaskRefs {
        assigned_to: task.assigned_to,
        assigned_by: task.assigned_by,
    }
}

/// Loads a task with its site access and checks the given action
async fn authorize(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
    action: Action,
) -> Result<Task, ApiError> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let actor = state.actor(auth).await?;
    let access = Site::load_access(&state.db, task.site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::task_action(&actor, &access, &refs(&task), action)?;

    Ok(task)
}

/// Lists tasks visible to the caller
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let actor = state.actor(&auth).await?;

    if let Some(site_id) = query.site_id {
        let access = Site::load_access(&state.db, site_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;
        policy::site_action(&actor, &access, Action::Read)?;

        // Drop entries the caller could not fetch individually; a site
        // member only sees tasks they assigned or were assigned.
        let mut tasks = Task::list_by_site(&state.db, site_id, query.filter()).await?;
        tasks.retain(|task| policy::task_action(&actor, &access, &refs(task), Action::Read).is_ok());
        return Ok(Json(tasks));
    }

    let tasks = match policy::read_scope(&actor)? {
        ReadScope::Company(company_id) => {
            Task::list_for_company(&state.db, company_id, query.filter()).await?
        }
        ReadScope::ContractorOf(user_id) | ReadScope::SupplierOf(user_id) => {
            Task::list_assigned_to(&state.db, user_id, query.filter()).await?
        }
    };

    Ok(Json(tasks))
}

/// Returns one task for its participants
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = authorize(&state, &auth, id, Action::Read).await?;

    Ok(Json(task))
}

/// Creates a task and notifies the assignee
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let actor = state.actor(&auth).await?;
    let access = Site::load_access(&state.db, req.site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::task_create(&actor, &access)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            site_id: req.site_id,
            assigned_to: req.assigned_to,
            assigned_by: actor.id,
            title: req.title,
            description: req.description,
            priority: req.priority,
            due_date: req.due_date,
            estimated_hours: req.estimated_hours,
            tags: req.tags,
        },
    )
    .await?;

    notify::task_assigned(
        &state.db,
        task.site_id,
        &task.title,
        task.assigned_to,
        task.assigned_by,
    )
    .await;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Updates a task; moving to COMPLETED stamps `completed_at`
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    authorize(&state, &auth, id, Action::Write).await?;

    let task = Task::update(&state.db, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Deletes a task (site owner only)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    authorize(&state, &auth, id, Action::Delete).await?;

    let deleted = Task::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Attaches a photo URL to a task
pub async fn add_photo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddPhotoRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(ApiError::from_validation)?;

    authorize(&state, &auth, id, Action::Write).await?;

    Task::add_photo(&state.db, id, &req.url).await?;

    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Appends a free-form note to a task
pub async fn add_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddNoteRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(ApiError::from_validation)?;

    authorize(&state, &auth, id, Action::Write).await?;

    Task::add_note(&state.db, id, &req.note).await?;

    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}
