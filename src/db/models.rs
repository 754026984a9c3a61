use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Timestamps are Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: i64,
    pub last_login_at: i64,
}

/// Public projection of a user, as embedded in lists and message details
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub from_username: String,
    pub to_username: String,
    pub body: String,
    pub sent_at: i64,
    pub read_at: Option<i64>,
}

/// A message joined with both participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetail {
    pub id: i64,
    pub body: String,
    pub sent_at: i64,
    pub read_at: Option<i64>,
    pub from_user: UserSummary,
    pub to_user: UserSummary,
}

/// An outgoing message joined with its recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: i64,
    pub body: String,
    pub sent_at: i64,
    pub read_at: Option<i64>,
    pub to_user: UserSummary,
}

/// An incoming message joined with its sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    pub id: i64,
    pub body: String,
    pub sent_at: i64,
    pub read_at: Option<i64>,
    pub from_user: UserSummary,
}

// Joined rows alias participant columns with a `from_` / `to_` prefix
fn summary_from_row(row: &SqliteRow, prefix: &str) -> Result<UserSummary, sqlx::Error> {
    Ok(UserSummary {
        username: row.try_get(format!("{}username", prefix).as_str())?,
        first_name: row.try_get(format!("{}first_name", prefix).as_str())?,
        last_name: row.try_get(format!("{}last_name", prefix).as_str())?,
        phone: row.try_get(format!("{}phone", prefix).as_str())?,
    })
}

impl<'r> FromRow<'r, SqliteRow> for MessageDetail {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(MessageDetail {
            id: row.try_get("id")?,
            body: row.try_get("body")?,
            sent_at: row.try_get("sent_at")?,
            read_at: row.try_get("read_at")?,
            from_user: summary_from_row(row, "from_")?,
            to_user: summary_from_row(row, "to_")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for SentMessage {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(SentMessage {
            id: row.try_get("id")?,
            body: row.try_get("body")?,
            sent_at: row.try_get("sent_at")?,
            read_at: row.try_get("read_at")?,
            to_user: summary_from_row(row, "to_")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for ReceivedMessage {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ReceivedMessage {
            id: row.try_get("id")?,
            body: row.try_get("body")?,
            sent_at: row.try_get("sent_at")?,
            read_at: row.try_get("read_at")?,
            from_user: summary_from_row(row, "from_")?,
        })
    }
}
