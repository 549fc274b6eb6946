/// Company endpoints
///
/// # Endpoints
///
/// - `POST /api/companies` - Create the caller's company (owner only)
/// - `GET /api/companies` - Get the caller's company
/// - `PUT /api/companies` - Update the caller's company (owner only)
/// - `GET /api/companies/users` - List company members (owner only)
/// - `DELETE /api/companies/users/:id` - Deactivate a member (owner only)

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
    auth::middleware::AuthContext,
    models::{
        company::{Company, CreateCompany, UpdateCompany},
        user::{User, UserRole},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create company request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 255, message = "Company name is required"))]
    pub name: String,

    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub website: Option<String>,
}

/// Query parameters for the member listing
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Optional role filter
    pub role: Option<UserRole>,
}

/// Creates the caller's company
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an owner
/// - `409 Conflict`: Owner already has a company
pub async fn create_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCompanyRequest>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    req.validate().map_err(ApiError::from_validation)?;

    if auth.role != UserRole::Owner {
        return Err(ApiError::Forbidden(
            "Only owners create companies".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    let company = Company::create(
        &mut *tx,
        CreateCompany {
            name: req.name,
            owner_id: auth.user_id,
            description: req.description,
            address: req.address,
            phone: req.phone,
            email: req.email,
            website: req.website,
        },
    )
    .await?;

    // The owner account carries the company from here on.
    User::set_company(&mut *tx, auth.user_id, company.id).await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(company)))
}

/// Returns the caller's company
///
/// Owners resolve through ownership; contractors and suppliers through
/// the company they were invited into.
pub async fn get_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Company>> {
    let company = if auth.role == UserRole::Owner {
        Company::find_by_owner(&state.db, auth.user_id).await?
    } else {
        let user = User::find_by_id(&state.db, auth.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        match user.company_id {
            Some(company_id) => Company::find_by_id(&state.db, company_id).await?,
            None => None,
        }
    };

    let company = company.ok_or_else(|| ApiError::NotFound("Company not found".to_string()))?;

    Ok(Json(company))
}

/// Updates the caller's company (owner only)
pub async fn update_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateCompany>,
) -> ApiResult<Json<Company>> {
    if auth.role != UserRole::Owner {
        return Err(ApiError::Forbidden(
            "Only owners update companies".to_string(),
        ));
    }

    let company = Company::find_by_owner(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))?;

    let company = Company::update(&state.db, company.id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))?;

    Ok(Json(company))
}

/// Lists the caller's company members (owner only)
pub async fn list_company_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Vec<User>>> {
    if auth.role != UserRole::Owner {
        return Err(ApiError::Forbidden(
            "Only owners list company members".to_string(),
        ));
    }

    let company = Company::find_by_owner(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))?;

    let users = User::list_by_company(&state.db, company.id, query.role).await?;

    Ok(Json(users))
}

/// Deactivates a company member (owner only)
///
/// The account can no longer log in; its tasks, requests, and payments
/// stay on record.
pub async fn remove_company_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    if auth.role != UserRole::Owner {
        return Err(ApiError::Forbidden(
            "Only owners remove company members".to_string(),
        ));
    }

    let company = Company::find_by_owner(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))?;

    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if target.company_id != Some(company.id) {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    if target.role == UserRole::Owner {
        return Err(ApiError::BadRequest(
            "Owners cannot be deactivated".to_string(),
        ));
    }

    let removed = User::deactivate(&state.db, id).await?;
    if !removed {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deactivated": true })))
}
