/// Issue endpoints
///
/// # Endpoints
///
/// - `GET /api/issues` - List issues visible to the caller
/// - `GET /api/issues/:id` - Get one issue
/// - `POST /api/issues` - Report an issue
/// - `PUT /api/issues/:id` - Update an issue
/// - `DELETE /api/issues/:id` - Delete an issue (site owner only)
/// - `POST /api/issues/:id/photos` - Attach a photo URL
/// - `GET /api/issues/stats/overview` - Aggregate counts

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use siteworks_shared::{
    auth::{
        middleware::AuthContext,
        policy::{self, Action, IssueRefs, ReadScope},
    },
    models::{
        issue::{CreateIssue, Issue, IssueCategory, IssueStats, IssueStatus, UpdateIssue},
        priority::WorkPriority,
        site::Site,
    },
    notify,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Query parameters for the issue listing
#[derive(Debug, Deserialize)]
pub struct ListIssuesQuery {
    /// Restrict to one site (membership checked)
    pub site_id: Option<Uuid>,

    /// Optional status filter
    pub status: Option<IssueStatus>,
}

/// Report issue request; the reporter is always the caller
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIssueRequest {
    pub site_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    pub priority: WorkPriority,
    pub category: IssueCategory,
    pub assigned_to: Option<Uuid>,
    pub location: Option<String>,
    pub estimated_cost: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body for attaching a photo
#[derive(Debug, Deserialize, Validate)]
pub struct AddPhotoRequest {
    #[validate(length(min = 1, message = "Photo URL is required"))]
    pub url: String,
}

fn refs(issue: &Issue) -> IssueRefs {
    IssueRefs {
        reported_by: issue.reported_by,
        assigned_to: issue.assigned_to,
    }
}

/// Loads an issue with its site access and checks the given action
async fn authorize(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
    action: Action,
) -> Result<Issue, ApiError> {
    let issue = Issue::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Issue not found".to_string()))?;

    let actor = state.actor(auth).await?;
    let access = Site::load_access(&state.db, issue.site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::issue_action(&actor, &access, &refs(&issue), action)?;

    Ok(issue)
}

/// Lists issues visible to the caller
pub async fn list_issues(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListIssuesQuery>,
) -> ApiResult<Json<Vec<Issue>>> {
    let actor = state.actor(&auth).await?;

    if let Some(site_id) = query.site_id {
        let access = Site::load_access(&state.db, site_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;
        policy::site_action(&actor, &access, Action::Read)?;

        // Drop entries the caller could not fetch individually; members
        // only see issues they reported or are assigned to.
        let mut issues = Issue::list_by_site(&state.db, site_id, query.status).await?;
        issues
            .retain(|issue| policy::issue_action(&actor, &access, &refs(issue), Action::Read).is_ok());
        return Ok(Json(issues));
    }

    let issues = match policy::read_scope(&actor)? {
        ReadScope::Company(company_id) => {
            Issue::list_for_company(&state.db, company_id, query.status).await?
        }
        ReadScope::ContractorOf(user_id) | ReadScope::SupplierOf(user_id) => {
            Issue::list_involving(&state.db, user_id, query.status).await?
        }
    };

    Ok(Json(issues))
}

/// Returns one issue for its participants
pub async fn get_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Issue>> {
    let issue = authorize(&state, &auth, id, Action::Read).await?;

    Ok(Json(issue))
}

/// Reports an issue and notifies the site owner
pub async fn create_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateIssueRequest>,
) -> ApiResult<(StatusCode, Json<Issue>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let actor = state.actor(&auth).await?;
    let access = Site::load_access(&state.db, req.site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::issue_create(&actor, &access)?;

    let issue = Issue::create(
        &state.db,
        CreateIssue {
            site_id: req.site_id,
            reported_by: actor.id,
            assigned_to: req.assigned_to,
            title: req.title,
            description: req.description,
            priority: req.priority,
            category: req.category,
            location: req.location,
            estimated_cost: req.estimated_cost,
            tags: req.tags,
        },
    )
    .await?;

    notify::issue_reported(
        &state.db,
        issue.site_id,
        &issue.title,
        issue.reported_by,
        access.owner_id,
    )
    .await;

    if let Some(assignee) = issue.assigned_to {
        notify::issue_assigned(&state.db, issue.site_id, &issue.title, assignee, actor.id).await;
    }

    Ok((StatusCode::CREATED, Json(issue)))
}

/// Updates an issue
///
/// Moving to RESOLVED stamps `resolved_at`; assigning the issue to a
/// new user notifies them.
pub async fn update_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateIssue>,
) -> ApiResult<Json<Issue>> {
    let before = authorize(&state, &auth, id, Action::Write).await?;

    let issue = Issue::update(&state.db, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Issue not found".to_string()))?;

    if let Some(assignee) = issue.assigned_to {
        if before.assigned_to != Some(assignee) {
            notify::issue_assigned(&state.db, issue.site_id, &issue.title, assignee, auth.user_id)
                .await;
        }
    }

    Ok(Json(issue))
}

/// Deletes an issue (site owner only)
pub async fn delete_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    authorize(&state, &auth, id, Action::Delete).await?;

    let deleted = Issue::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Issue not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Attaches a photo URL to an issue
pub async fn add_photo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddPhotoRequest>,
) -> ApiResult<Json<Issue>> {
    req.validate().map_err(ApiError::from_validation)?;

    authorize(&state, &auth, id, Action::Write).await?;

    Issue::add_photo(&state.db, id, &req.url).await?;

    let issue = Issue::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Issue not found".to_string()))?;

    Ok(Json(issue))
}

/// Aggregate issue counts for the caller's scope
pub async fn issue_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<IssueStats>> {
    let actor = state.actor(&auth).await?;

    let stats = match policy::read_scope(&actor)? {
        ReadScope::Company(company_id) => Issue::stats_for_company(&state.db, company_id).await?,
        ReadScope::ContractorOf(user_id) | ReadScope::SupplierOf(user_id) => {
            Issue::stats_involving(&state.db, user_id).await?
        }
    };

    Ok(Json(stats))
}
