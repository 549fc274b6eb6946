/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use siteworks_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = siteworks_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use siteworks_shared::auth::{jwt, middleware::AuthContext};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Builds the policy actor for a request
    ///
    /// The token carries identity and role; the company is looked up
    /// fresh so a revoked membership takes effect immediately.
    pub async fn actor(
        &self,
        auth: &AuthContext,
    ) -> Result<siteworks_shared::auth::policy::Actor, crate::error::ApiError> {
        let user = siteworks_shared::models::user::User::find_by_id(&self.db, auth.user_id)
            .await?
            .ok_or_else(|| {
                crate::error::ApiError::Unauthorized("Account no longer exists".to_string())
            })?;

        Ok(auth.actor(user.company_id))
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                     # Health check (public)
/// └── /api/
///     ├── /auth/                  # Signup/login public; invite and
///     │                           # push registration authenticated
///     ├── /companies/             # Company management
///     ├── /sites/                 # Sites and assignments
///     ├── /tasks/                 # Work tasks
///     ├── /issues/                # Issue reports
///     ├── /materials/             # Material requests
///     ├── /payments/              # Payments
///     ├── /documents/             # Document records
///     └── /notifications/         # In-app inbox
/// ```
///
/// Everything under `/api` except the public auth endpoints requires a
/// valid bearer token; the JWT layer validates it once and stores an
/// [`AuthContext`] in the request extensions.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth endpoints
    let auth_public = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/signup-owner", post(routes::auth::signup_owner))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Auth endpoints that require a logged-in user
    let auth_private = Router::new()
        .route("/invite", post(routes::auth::invite))
        .route("/register-push", post(routes::auth::register_push))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let company_routes = Router::new()
        .route("/", post(routes::companies::create_company))
        .route("/", get(routes::companies::get_company))
        .route("/", put(routes::companies::update_company))
        .route("/users", get(routes::companies::list_company_users))
        .route("/users/:id", delete(routes::companies::remove_company_user));

    let site_routes = Router::new()
        .route("/", get(routes::sites::list_sites))
        .route("/", post(routes::sites::create_site))
        .route("/:id", get(routes::sites::get_site))
        .route("/:id", put(routes::sites::update_site))
        .route("/:id/photos", post(routes::sites::add_photo))
        .route("/:id/contractors", post(routes::sites::assign_contractor))
        .route("/:id/suppliers", post(routes::sites::assign_supplier))
        .route(
            "/:id/contractors/:user_id",
            delete(routes::sites::unassign_contractor),
        )
        .route(
            "/:id/suppliers/:user_id",
            delete(routes::sites::unassign_supplier),
        )
        .route("/:id/activity", get(routes::sites::site_activity))
        .route("/available/:role", get(routes::sites::list_available_users));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route("/:id/photos", post(routes::tasks::add_photo))
        .route("/:id/notes", post(routes::tasks::add_note));

    let issue_routes = Router::new()
        .route("/", get(routes::issues::list_issues))
        .route("/", post(routes::issues::create_issue))
        .route("/:id", get(routes::issues::get_issue))
        .route("/:id", put(routes::issues::update_issue))
        .route("/:id", delete(routes::issues::delete_issue))
        .route("/:id/photos", post(routes::issues::add_photo))
        .route("/stats/overview", get(routes::issues::issue_stats));

    let material_routes = Router::new()
        .route("/", get(routes::materials::list_requests))
        .route("/", post(routes::materials::create_request))
        .route("/:id/status", post(routes::materials::update_status));

    let payment_routes = Router::new()
        .route("/", get(routes::payments::list_payments))
        .route("/", post(routes::payments::create_payment))
        .route("/summary/:site_id", get(routes::payments::payment_summary));

    let document_routes = Router::new()
        .route("/", get(routes::documents::list_documents))
        .route("/", post(routes::documents::create_document))
        .route("/:id", get(routes::documents::get_document))
        .route("/:id", put(routes::documents::update_document))
        .route("/:id", delete(routes::documents::delete_document))
        .route("/:id/download", post(routes::documents::download_document))
        .route("/stats/overview", get(routes::documents::document_stats));

    let notification_routes = Router::new()
        .route("/", get(routes::notifications::list_notifications))
        .route("/:id/read", post(routes::notifications::mark_read))
        .route("/read-all", post(routes::notifications::mark_all_read))
        .route("/send", post(routes::notifications::send_notification));

    // Everything below requires a valid bearer token
    let protected = Router::new()
        .nest("/companies", company_routes)
        .nest("/sites", site_routes)
        .nest("/tasks", task_routes)
        .nest("/issues", issue_routes)
        .nest("/materials", material_routes)
        .nest("/payments", payment_routes)
        .nest("/documents", document_routes)
        .nest("/notifications", notification_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_private))
        .merge(protected);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the bearer token from the Authorization
/// header, then injects an [`AuthContext`] into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let token = siteworks_shared::auth::middleware::extract_bearer_token(req.headers())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing or malformed bearer token".to_string())
        })?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    req.extensions_mut()
        .insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}
