use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::access::{require_authenticated, require_participant, require_recipient, Caller};
use crate::api::state::AppState;
use crate::db::{Message, MessageDetail, MessageRepository};
use crate::error::AppError;

const MAX_BODY_LEN: usize = 4096;

// A missing message is reported the same way as someone else's
fn hide_missing(err: AppError) -> AppError {
    match err {
        AppError::MessageNotFound => AppError::Unauthorized,
        other => other,
    }
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub to_username: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse<T> {
    pub message: T,
}

/// POST /messages
///
/// The sender is always the caller; the request cannot name one.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<MessageResponse<Message>>, AppError> {
    let from_username = require_authenticated(&caller)?;

    if req.body.is_empty() || req.body.chars().count() > MAX_BODY_LEN {
        return Err(AppError::Validation(format!(
            "Message must be 1-{} characters",
            MAX_BODY_LEN
        )));
    }

    let message =
        MessageRepository::create(&state.db, from_username, &req.to_username, &req.body).await?;

    Ok(Json(MessageResponse { message }))
}

/// GET /messages/:id
pub async fn get_message(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse<MessageDetail>>, AppError> {
    require_authenticated(&caller)?;

    let message = MessageRepository::get(&state.db, id)
        .await
        .map_err(hide_missing)?;
    require_participant(&caller, &message)?;

    Ok(Json(MessageResponse { message }))
}

/// POST /messages/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse<Message>>, AppError> {
    require_authenticated(&caller)?;

    let found = MessageRepository::get(&state.db, id)
        .await
        .map_err(hide_missing)?;
    require_recipient(&caller, &found)?;

    let message = MessageRepository::mark_read(&state.db, id)
        .await
        .map_err(hide_missing)?;
    Ok(Json(MessageResponse { message }))
}
