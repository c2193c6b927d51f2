/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.

use crate::{config::Config, error::ApiError};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use taskdeck_shared::{auth::jwt, db::Gateway};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// The gateway clones cheaply (pool handles), and the config is behind an
/// Arc.
#[derive(Clone)]
pub struct AppState {
    /// Database gateway (engine chosen at startup)
    pub db: Gateway,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: Gateway, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// The authenticated caller, injected by [`jwt_auth_layer`]
///
/// The id is carried as the opaque string from the token subject; the
/// data layer coerces it where needed.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Stringified user id from the token subject
    pub id: String,

    /// Email recorded at token issue time
    pub email: String,
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /api
/// ├── /health                      # Health check (public)
/// ├── /auth/                       # Authentication
/// │   ├── POST /register
/// │   ├── POST /login
/// │   └── GET  /me                 # (authenticated)
/// ├── /tasks/                      # Task CRUD (authenticated)
/// │   ├── GET    /                 # List with filters
/// │   ├── POST   /
/// │   ├── GET    /export           # CSV or JSON download
/// │   ├── GET    /:id
/// │   ├── PUT    /:id
/// │   ├── PATCH  /:id/complete     # Toggle status
/// │   └── DELETE /:id
/// ├── /analytics/summary           # (authenticated)
/// └── /admin/                      # Admin (x-admin-key header)
///     ├── GET    /users
///     ├── DELETE /users/:id
///     └── PATCH  /users/:id/reset-password
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route-group basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth routes
    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    // Authenticated auth routes
    let private_auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Task routes (require JWT authentication)
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/export", get(routes::tasks::export_tasks))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id/complete", axum::routing::patch(routes::tasks::toggle_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Analytics routes (require JWT authentication)
    let analytics_routes = Router::new()
        .route("/summary", get(routes::analytics::summary))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Admin routes (require the shared admin key)
    let admin_routes = Router::new()
        .route("/users", get(routes::admin::list_users))
        .route("/users/:id", delete(routes::admin::delete_user))
        .route(
            "/users/:id/reset-password",
            axum::routing::patch(routes::admin::reset_password),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            admin_key_layer,
        ));

    let api_routes = Router::new()
        .merge(health_routes)
        .nest("/auth", public_auth_routes.merge(private_auth_routes))
        .nest("/tasks", task_routes)
        .nest("/analytics", analytics_routes)
        .nest("/admin", admin_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
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
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the Bearer token from the Authorization header,
/// then injects [`CurrentUser`] into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    let current_user = CurrentUser {
        id: claims.sub,
        email: claims.email,
    };

    req.extensions_mut().insert(current_user);

    Ok(next.run(req).await)
}

/// Admin-key middleware layer
///
/// Compares the `x-admin-key` header against the configured shared secret.
/// When no admin key is configured, every request is rejected.
async fn admin_key_layer(
    state: axum::extract::State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let configured = state
        .config
        .admin_key
        .as_deref()
        .ok_or_else(|| ApiError::Forbidden("Admin access is not configured".to_string()))?;

    let presented = req
        .headers()
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing admin key".to_string()))?;

    if presented != configured {
        return Err(ApiError::Forbidden("Invalid admin key".to_string()));
    }

    Ok(next.run(req).await)
}
