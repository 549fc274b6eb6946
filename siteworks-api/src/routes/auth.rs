/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/signup` - Contractor/supplier self-signup (phone)
/// - `POST /api/auth/signup-owner` - Owner signup with a new company
/// - `POST /api/auth/login` - Login with email or phone
/// - `POST /api/auth/refresh` - Refresh access token
/// - `POST /api/auth/invite` - Invite a contractor or supplier (owner)
/// - `POST /api/auth/register-push` - Register a push token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use siteworks_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::{
        company::{Company, CreateCompany},
        user::{ContractorTrade, CreateUser, User, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Contractor/supplier signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// Phone number; the login identifier for these roles
    #[validate(length(min = 5, max = 50, message = "Phone number is required"))]
    pub phone: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Must be CONTRACTOR or SUPPLIER
    pub role: UserRole,

    /// Trade, for contractors
    pub trade: Option<ContractorTrade>,
}

/// Owner signup request; creates the owner account and their company
#[derive(Debug, Deserialize, Validate)]
pub struct SignupOwnerRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 255, message = "Company name is required"))]
    pub company_name: String,

    pub company_address: Option<String>,
    pub company_phone: Option<String>,
}

/// Token pair returned on signup and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Login request; exactly one of email or phone identifies the account
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub phone: Option<String>,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Invite request; the invited user has no password until they sign in
/// by phone and set one
#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 5, max = 50, message = "Phone number is required"))]
    pub phone: String,

    /// Must be CONTRACTOR or SUPPLIER
    pub role: UserRole,

    pub trade: Option<ContractorTrade>,
}

/// Push token registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPushRequest {
    #[validate(length(min = 1, message = "Push token is required"))]
    pub token: String,
}

fn issue_tokens(user: &User, secret: &str) -> Result<(String, String), ApiError> {
    let access_claims = jwt::Claims::new(user.id, user.role, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, user.role, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, secret)?;
    let refresh_token = jwt::create_token(&refresh_claims, secret)?;

    Ok((access_token, refresh_token))
}

/// Contractor or supplier self-signup
///
/// # Errors
///
/// - `400 Bad Request`: Role is OWNER (owners use `/signup-owner`)
/// - `409 Conflict`: Phone number already in use
/// - `422 Unprocessable Entity`: Validation failed
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate().map_err(ApiError::from_validation)?;

    if req.role == UserRole::Owner {
        return Err(ApiError::BadRequest(
            "Owners must sign up through /signup-owner".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: None,
            phone: Some(req.phone),
            password_hash: Some(password_hash),
            role: req.role,
            trade: req.trade,
            invited_by: None,
            company_id: None,
        },
    )
    .await?;

    let (access_token, refresh_token) = issue_tokens(&user, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user,
            access_token,
            refresh_token,
        }),
    ))
}

/// Owner signup; creates the account and its company in one call
///
/// # Errors
///
/// - `409 Conflict`: Email already in use
/// - `422 Unprocessable Entity`: Validation failed
pub async fn signup_owner(
    State(state): State<AppState>,
    Json(req): Json<SignupOwnerRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let password_hash = password::hash_password(&req.password)?;

    // The account and its company land together or not at all.
    let mut tx = state.db.begin().await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            name: req.name,
            email: Some(req.email),
            phone: None,
            password_hash: Some(password_hash),
            role: UserRole::Owner,
            trade: None,
            invited_by: None,
            company_id: None,
        },
    )
    .await?;

    let company = Company::create(
        &mut *tx,
        CreateCompany {
            name: req.company_name,
            owner_id: user.id,
            description: None,
            address: req.company_address,
            phone: req.company_phone,
            email: None,
            website: None,
        },
    )
    .await?;

    let user = User::set_company(&mut *tx, user.id, company.id)
        .await?
        .ok_or_else(|| ApiError::InternalError("Owner vanished during signup".to_string()))?;

    tx.commit().await?;

    let (access_token, refresh_token) = issue_tokens(&user, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user,
            access_token,
            refresh_token,
        }),
    ))
}

/// Login with email (owners) or phone (contractors and suppliers)
///
/// # Errors
///
/// - `400 Bad Request`: Neither email nor phone provided
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = match (&req.email, &req.phone) {
        (Some(email), _) => User::find_by_email(&state.db, email).await?,
        (None, Some(phone)) => User::find_by_phone(&state.db, phone).await?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Either email or phone is required".to_string(),
            ))
        }
    };

    let user = user.ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !password::verify_password(&req.password, hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let (access_token, refresh_token) = issue_tokens(&user, state.jwt_secret())?;

    Ok(Json(AuthResponse {
        user,
        access_token,
        refresh_token,
    }))
}

/// Exchanges a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Invites a contractor or supplier into the caller's company
///
/// The invited account has no password; the user logs in by phone after
/// the owner shares the invitation.
///
/// # Errors
///
/// - `400 Bad Request`: Role is OWNER
/// - `403 Forbidden`: Caller is not an owner with a company
/// - `409 Conflict`: Phone number already in use
pub async fn invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<InviteRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate().map_err(ApiError::from_validation)?;

    if req.role == UserRole::Owner {
        return Err(ApiError::BadRequest("Owners cannot be invited".to_string()));
    }

    if auth.role != UserRole::Owner {
        return Err(ApiError::Forbidden(
            "Only owners invite users".to_string(),
        ));
    }

    let company = Company::find_by_owner(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("Create a company before inviting".to_string()))?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: None,
            phone: Some(req.phone),
            password_hash: None,
            role: req.role,
            trade: req.trade,
            invited_by: Some(auth.user_id),
            company_id: Some(company.id),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Registers a push notification token for the caller
pub async fn register_push(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<RegisterPushRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    req.validate().map_err(ApiError::from_validation)?;

    User::add_push_token(&state.db, auth.user_id, &req.token).await?;

    Ok(Json(serde_json::json!({ "registered": true })))
}
