use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::api::access::{require_authenticated, require_self, Caller};
use crate::api::state::AppState;
use crate::db::{MessageRepository, ReceivedMessage, SentMessage, User, UserRepository, UserSummary};
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse<T> {
    pub messages: Vec<T>,
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<UsersResponse>, AppError> {
    require_authenticated(&caller)?;

    let users = UserRepository::list(&state.db).await?;
    Ok(Json(UsersResponse { users }))
}

/// GET /users/:username
pub async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    require_self(&caller, &username)?;

    let user = UserRepository::get(&state.db, &username).await?;
    Ok(Json(UserResponse { user }))
}

/// GET /users/:username/to
pub async fn messages_to(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(username): Path<String>,
) -> Result<Json<MessagesResponse<ReceivedMessage>>, AppError> {
    require_self(&caller, &username)?;

    let messages = MessageRepository::list_received_by(&state.db, &username).await?;
    Ok(Json(MessagesResponse { messages }))
}

/// GET /users/:username/from
pub async fn messages_from(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(username): Path<String>,
) -> Result<Json<MessagesResponse<SentMessage>>, AppError> {
    require_self(&caller, &username)?;

    let messages = MessageRepository::list_sent_by(&state.db, &username).await?;
    Ok(Json(MessagesResponse { messages }))
}
