/// Site endpoints
///
/// # Endpoints
///
/// - `GET /api/sites` - List sites visible to the caller
/// - `GET /api/sites/:id` - Get one site
/// - `POST /api/sites` - Create a site (owner only)
/// - `PUT /api/sites/:id` - Update a site (field scope depends on role)
/// - `POST /api/sites/:id/photos` - Attach a photo URL
/// - `POST /api/sites/:id/contractors` - Assign a contractor (owner only)
/// - `POST /api/sites/:id/suppliers` - Assign a supplier (owner only)
/// - `DELETE /api/sites/:id/contractors/:user_id` - Remove a contractor
/// - `DELETE /api/sites/:id/suppliers/:user_id` - Remove a supplier
/// - `GET /api/sites/:id/activity` - Audit trail (owner only)
/// - `GET /api/sites/available/:role` - Company users available for assignment

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
        policy::{self, Action, ReadScope, SiteUpdateScope},
    },
    models::{
        audit::AuditEntry,
        site::{AssignmentRole, CreateSite, Site, UpdateSite},
        user::{User, UserRole},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create site request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSiteRequest {
    #[validate(length(min = 1, max = 255, message = "Site name is required"))]
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

/// Assignment request body
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub user_id: Uuid,
}

/// Body for attaching a photo
#[derive(Debug, Deserialize, Validate)]
pub struct AddPhotoRequest {
    #[validate(length(min = 1, message = "Photo URL is required"))]
    pub url: String,
}

/// Query parameters for the activity listing
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Lists sites visible to the caller
///
/// Owners see every site of their company; contractors and suppliers
/// see the sites they are assigned to.
pub async fn list_sites(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Site>>> {
    let actor = state.actor(&auth).await?;

    let sites = match policy::read_scope(&actor)? {
        ReadScope::Company(company_id) => Site::list_for_company(&state.db, company_id).await?,
        ReadScope::ContractorOf(user_id) => {
            Site::list_assigned_to(&state.db, user_id, AssignmentRole::Contractor).await?
        }
        ReadScope::SupplierOf(user_id) => {
            Site::list_assigned_to(&state.db, user_id, AssignmentRole::Supplier).await?
        }
    };

    Ok(Json(sites))
}

/// Returns one site, for site members only
pub async fn get_site(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Site>> {
    let actor = state.actor(&auth).await?;
    let access = Site::load_access(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::site_action(&actor, &access, Action::Read)?;

    let site = Site::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    Ok(Json(site))
}

/// Creates a site under the caller's company (owner only)
///
/// New sites start in NOT_STARTED with zero progress.
pub async fn create_site(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateSiteRequest>,
) -> ApiResult<(StatusCode, Json<Site>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let actor = state.actor(&auth).await?;
    if actor.role != UserRole::Owner {
        return Err(ApiError::Forbidden("Only owners create sites".to_string()));
    }
    let company_id = actor
        .company_id
        .ok_or_else(|| ApiError::Forbidden("Create a company first".to_string()))?;

    let site = Site::create(
        &state.db,
        CreateSite {
            company_id,
            owner_id: actor.id,
            name: req.name,
            location: req.location,
            address: req.address,
            start_date: req.start_date,
            expected_end_date: req.expected_end_date,
            description: req.description,
            budget: req.budget,
            latitude: req.latitude,
            longitude: req.longitude,
            site_area: req.site_area,
            building_type: req.building_type,
            floors: req.floors,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(site)))
}

/// True if the update touches anything beyond status and progress
fn touches_restricted_fields(data: &UpdateSite) -> bool {
    data.name.is_some()
        || data.location.is_some()
        || data.address.is_some()
        || data.start_date.is_some()
        || data.expected_end_date.is_some()
        || data.description.is_some()
        || data.budget.is_some()
        || data.actual_cost.is_some()
        || data.building_type.is_some()
        || data.floors.is_some()
}

/// Updates a site
///
/// Owners may change any field. Contractors assigned to the site may
/// change status and progress only; a request carrying any other field
/// is rejected outright rather than partially applied.
pub async fn update_site(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSite>,
) -> ApiResult<Json<Site>> {
    let actor = state.actor(&auth).await?;
    let access = Site::load_access(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    let site = match policy::site_update_scope(&actor, &access)? {
        SiteUpdateScope::Full => Site::update(&state.db, id, req).await?,
        SiteUpdateScope::StatusProgress => {
            if touches_restricted_fields(&req) {
                return Err(ApiError::Forbidden(
                    "Contractors may only update status and progress".to_string(),
                ));
            }
            Site::update_status_progress(&state.db, id, req.status, req.progress_percent).await?
        }
    };

    let site = site.ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    Ok(Json(site))
}

async fn assign(
    state: &AppState,
    auth: &AuthContext,
    site_id: Uuid,
    user_id: Uuid,
    role: AssignmentRole,
) -> Result<(), ApiError> {
    let actor = state.actor(auth).await?;
    let access = Site::load_access(&state.db, site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::site_assignment(&actor, &access)?;

    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let expected = match role {
        AssignmentRole::Contractor => UserRole::Contractor,
        AssignmentRole::Supplier => UserRole::Supplier,
    };
    if target.role != expected {
        return Err(ApiError::BadRequest(format!(
            "User is not a {}",
            expected.as_str()
        )));
    }

    Site::assign_user(&state.db, site_id, user_id, role).await?;

    Ok(())
}

/// Attaches a photo URL to the site's gallery
///
/// Owners and assigned contractors may add photos.
pub async fn add_photo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddPhotoRequest>,
) -> ApiResult<Json<Site>> {
    req.validate().map_err(ApiError::from_validation)?;

    let actor = state.actor(&auth).await?;
    let access = Site::load_access(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::site_action(&actor, &access, Action::Write)?;

    Site::add_photo(&state.db, id, &req.url).await?;

    let site = Site::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    Ok(Json(site))
}

async fn unassign(
    state: &AppState,
    auth: &AuthContext,
    site_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    let actor = state.actor(auth).await?;
    let access = Site::load_access(&state.db, site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::site_assignment(&actor, &access)?;

    let removed = Site::unassign_user(&state.db, site_id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound(
            "User is not assigned to this site".to_string(),
        ));
    }

    Ok(())
}

/// Removes a contractor from a site (owner only)
pub async fn unassign_contractor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    unassign(&state, &auth, id, user_id).await?;

    Ok(Json(serde_json::json!({ "removed": true })))
}

/// Removes a supplier from a site (owner only)
pub async fn unassign_supplier(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    unassign(&state, &auth, id, user_id).await?;

    Ok(Json(serde_json::json!({ "removed": true })))
}

/// Lists the site's audit trail, newest first (owner only)
pub async fn site_activity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<AuditEntry>>> {
    let actor = state.actor(&auth).await?;
    let access = Site::load_access(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::audit_view(&actor, &access)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let entries = AuditEntry::list_by_site(&state.db, id, limit, offset).await?;

    Ok(Json(entries))
}

/// Assigns a contractor to a site (owner only, idempotent)
pub async fn assign_contractor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    assign(&state, &auth, id, req.user_id, AssignmentRole::Contractor).await?;

    Ok(Json(serde_json::json!({ "assigned": true })))
}

/// Assigns a supplier to a site (owner only, idempotent)
pub async fn assign_supplier(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    assign(&state, &auth, id, req.user_id, AssignmentRole::Supplier).await?;

    Ok(Json(serde_json::json!({ "assigned": true })))
}

/// Lists the company's users of a role, for the assignment picker
///
/// Only CONTRACTOR and SUPPLIER are valid; owners are never assigned.
pub async fn list_available_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(role): Path<UserRole>,
) -> ApiResult<Json<Vec<User>>> {
    let actor = state.actor(&auth).await?;
    if actor.role != UserRole::Owner {
        return Err(ApiError::Forbidden(
            "Only owners browse assignable users".to_string(),
        ));
    }
    let company_id = actor
        .company_id
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))?;

    if role == UserRole::Owner {
        return Err(ApiError::BadRequest(
            "Role must be CONTRACTOR or SUPPLIER".to_string(),
        ));
    }

    let users = User::list_by_company(&state.db, company_id, Some(role)).await?;

    Ok(Json(users))
}
