use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::db::{NewUser, UserRepository};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Canonical form of a username as typed by a client
fn normalize_username(username: &str) -> &str {
    username.trim()
}

/// Validate username shape
fn validate_username(username: &str) -> Result<&str, AppError> {
    let trimmed = normalize_username(username);

    if trimmed.is_empty() || trimmed.len() > 32 {
        return Err(AppError::Validation("Username must be 1-32 characters".to_string()));
    }

    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(AppError::Validation(
            "Username must be alphanumeric, underscore, or hyphen".to_string(),
        ));
    }

    Ok(trimmed)
}

fn require_field(name: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", name)));
    }
    Ok(())
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let username = validate_username(&req.username)?.to_string();
    require_field("password", &req.password)?;
    require_field("first_name", &req.first_name)?;
    require_field("last_name", &req.last_name)?;
    require_field("phone", &req.phone)?;

    let user = UserRepository::register(
        &state.db,
        &state.credentials,
        NewUser {
            username,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
        },
    )
    .await?;

    let token = state.tokens.issue(&user.username)?;
    Ok(Json(TokenResponse { token }))
}

/// POST /auth/login
///
/// Unknown usernames and wrong passwords both come back as
/// `InvalidCredentials`.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let username = normalize_username(&req.username);

    let authenticated =
        match UserRepository::authenticate(&state.db, &state.credentials, username, &req.password)
            .await
        {
            Ok(valid) => valid,
            Err(AppError::UserNotFound) => {
                tracing::debug!(username = %username, "login for unknown user");
                false
            }
            Err(e) => return Err(e),
        };

    if !authenticated {
        return Err(AppError::InvalidCredentials);
    }

    UserRepository::touch_login(&state.db, username).await?;

    let token = state.tokens.issue(username)?;
    tracing::info!(username = %username, "user logged in");

    Ok(Json(TokenResponse { token }))
}
