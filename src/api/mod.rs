pub mod access;
pub mod auth;
pub mod messages;
pub mod middleware;
pub mod state;
pub mod users;

pub use access::Caller;
pub use state::AppState;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Health check
        .route("/health", get(health))

        // Authentication endpoints
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))

        // User endpoints
        .route("/users", get(users::list_users))
        .route("/users/:username", get(users::get_user))
        .route("/users/:username/to", get(users::messages_to))
        .route("/users/:username/from", get(users::messages_from))

        // Message endpoints
        .route("/messages", post(messages::send_message))
        .route("/messages/:id", get(messages::get_message))
        .route("/messages/:id/read", post(messages::mark_read))

        // Resolve caller identity for every route
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
