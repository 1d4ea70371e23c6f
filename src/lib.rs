pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;
pub mod validations;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, SecurityConfig};
use crate::middleware::jwt_auth_middleware;

pub use state::AppState;

/// Full HTTP surface: banner, health, and the versioned API.
pub fn app(state: AppState) -> Router {
    let protected = protected_routes().route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));
    let v1 = Router::new().merge(public_routes()).merge(protected);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/v1", v1)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/refresh-tokens", post(auth::refresh_tokens))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/verify-email", post(auth::verify_email))
}

fn protected_routes() -> Router<AppState> {
    use handlers::protected::{auth, logs, projects, tasks, teams, users};

    Router::new()
        .route("/auth/send-verification-email", post(auth::send_verification_email))
        // Users
        .route("/users", post(users::create).get(users::list))
        .route("/users/search", get(users::search))
        .route("/users/:userId", get(users::get).patch(users::update).delete(users::delete))
        // Teams
        .route("/teams", post(teams::create).get(teams::list))
        .route("/teams/search", get(teams::search))
        .route("/teams/:teamId", get(teams::get).patch(teams::update).delete(teams::delete))
        // Projects
        .route("/projects", post(projects::create).get(projects::list))
        .route("/projects/search", get(projects::search))
        .route(
            "/projects/:projectId",
            get(projects::get).patch(projects::update).delete(projects::delete),
        )
        // Tasks
        .route("/tasks", post(tasks::create).get(tasks::list))
        .route("/tasks/search", get(tasks::search))
        .route("/tasks/:taskId", get(tasks::get).patch(tasks::update).delete(tasks::delete))
        // Logs
        .route("/logs", post(logs::create).get(logs::list))
        .route("/logs/:logId", get(logs::get).patch(logs::update).delete(logs::delete))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

/// Install the global fmt subscriber. `RUST_LOG` wins over the
/// environment's default level; a second call is a no-op.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_log_level()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "TaskTrack API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "auth": "/v1/auth/*",
            "users": "/v1/users[/:userId]",
            "teams": "/v1/teams[/:teamId]",
            "projects": "/v1/projects[/:projectId]",
            "tasks": "/v1/tasks[/:taskId]",
            "logs": "/v1/logs[/:logId]",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let backend = state.store.backend();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "store": backend })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "timestamp": now, "store": backend })),
            )
        }
    }
}
