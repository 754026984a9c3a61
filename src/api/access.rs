//! Caller identity and the ownership gates applied by handlers.
//!
//! Every gate fails with [`AppError::Unauthorized`], whether the caller is
//! anonymous or simply not the owner, so a rejection never reveals which.

use crate::db::{Message, MessageDetail};
use crate::error::AppError;

/// Identity resolved for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// No token, or one that failed verification.
    Anonymous,
    /// Token verified; carries the username claim.
    User(String),
}

impl Caller {
    pub fn username(&self) -> Option<&str> {
        match self {
            Caller::Anonymous => None,
            Caller::User(username) => Some(username.as_str()),
        }
    }
}

/// Ownership data the message gates need.
pub trait Participants {
    fn sender(&self) -> &str;
    fn recipient(&self) -> &str;
}

impl Participants for MessageDetail {
    fn sender(&self) -> &str {
        &self.from_user.username
    }

    fn recipient(&self) -> &str {
        &self.to_user.username
    }
}

impl Participants for Message {
    fn sender(&self) -> &str {
        &self.from_username
    }

    fn recipient(&self) -> &str {
        &self.to_username
    }
}

pub fn require_authenticated(caller: &Caller) -> Result<&str, AppError> {
    caller.username().ok_or(AppError::Unauthorized)
}

pub fn require_self<'a>(caller: &'a Caller, owner: &str) -> Result<&'a str, AppError> {
    match caller.username() {
        Some(username) if username == owner => Ok(username),
        _ => Err(AppError::Unauthorized),
    }
}

pub fn require_participant<'a, M: Participants>(
    caller: &'a Caller,
    message: &M,
) -> Result<&'a str, AppError> {
    match caller.username() {
        Some(username) if username == message.sender() || username == message.recipient() => {
            Ok(username)
        }
        _ => Err(AppError::Unauthorized),
    }
}

pub fn require_recipient<'a, M: Participants>(
    caller: &'a Caller,
    message: &M,
) -> Result<&'a str, AppError> {
    match caller.username() {
        Some(username) if username == message.recipient() => Ok(username),
        _ => Err(AppError::Unauthorized),
    }
}
