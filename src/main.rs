use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use messagely::{
    api::{create_router, AppState},
    config::Config,
    db,
    error::AppError,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,messagely=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting messagely server v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    if config.uses_default_secret() {
        tracing::warn!("SECRET_KEY is not set, tokens are signed with the insecure default");
    }
    tracing::info!("Configuration loaded");

    let pool = db::connect(&config).await?;
    tracing::info!("Database connected: {}", config.database_url);

    db::migrate(&pool).await?;
    tracing::info!("Database migrations completed");

    let state = AppState::new(pool, config.clone())?;
    let app = create_router(state);

    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("  POST /auth/register        - Register new user");
    tracing::info!("  POST /auth/login           - Login with username and password");
    tracing::info!("  GET  /users                - List users (requires auth)");
    tracing::info!("  GET  /users/:username      - User detail (requires self)");
    tracing::info!("  GET  /users/:username/to   - Messages received (requires self)");
    tracing::info!("  GET  /users/:username/from - Messages sent (requires self)");
    tracing::info!("  POST /messages             - Send message (requires auth)");
    tracing::info!("  GET  /messages/:id         - Message detail (requires participant)");
    tracing::info!("  POST /messages/:id/read    - Mark read (requires recipient)");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
