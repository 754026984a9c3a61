use sqlx::{Pool, Sqlite};

use crate::db::models::{now_millis, Message, MessageDetail, ReceivedMessage, SentMessage};
use crate::db::users::UserRepository;
use crate::error::AppError;

pub struct MessageRepository;

impl MessageRepository {
    /// Insert a message after checking both participants exist.
    pub async fn create(
        pool: &Pool<Sqlite>,
        from_username: &str,
        to_username: &str,
        body: &str,
    ) -> Result<Message, AppError> {
        if !UserRepository::exists(pool, from_username).await? {
            return Err(AppError::InvalidSender);
        }
        if !UserRepository::exists(pool, to_username).await? {
            return Err(AppError::InvalidRecipient);
        }

        let message = sqlx::query_as::<_, Message>(
            r#"
INSERT INTO messages (from_username, to_username, body, sent_at)
VALUES (?, ?, ?, ?)
RETURNING id, from_username, to_username, body, sent_at, read_at
            "#,
        )
        .bind(from_username)
        .bind(to_username)
        .bind(body)
        .bind(now_millis())
        .fetch_one(pool)
        .await?;

        tracing::debug!(id = message.id, from = %from_username, to = %to_username, "message created");
        Ok(message)
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<MessageDetail, AppError> {
        let message = sqlx::query_as::<_, MessageDetail>(
            r#"
SELECT m.id, m.body, m.sent_at, m.read_at,
       f.username AS from_username, f.first_name AS from_first_name,
       f.last_name AS from_last_name, f.phone AS from_phone,
       t.username AS to_username, t.first_name AS to_first_name,
       t.last_name AS to_last_name, t.phone AS to_phone
FROM messages m
JOIN users f ON m.from_username = f.username
JOIN users t ON m.to_username = t.username
WHERE m.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::MessageNotFound)?;

        Ok(message)
    }

    /// Set `read_at` if it is still unset. A repeated call leaves the
    /// original timestamp in place and returns the message unchanged.
    pub async fn mark_read(pool: &Pool<Sqlite>, id: i64) -> Result<Message, AppError> {
        let result = sqlx::query("UPDATE messages SET read_at = ? WHERE id = ? AND read_at IS NULL")
            .bind(now_millis())
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(id, "mark_read found no unread message");
        }

        let message = sqlx::query_as::<_, Message>(
            "SELECT id, from_username, to_username, body, sent_at, read_at FROM messages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::MessageNotFound)?;

        Ok(message)
    }

    pub async fn list_sent_by(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<Vec<SentMessage>, AppError> {
        let messages = sqlx::query_as::<_, SentMessage>(
            r#"
SELECT m.id, m.body, m.sent_at, m.read_at,
       t.username AS to_username, t.first_name AS to_first_name,
       t.last_name AS to_last_name, t.phone AS to_phone
FROM messages m
JOIN users t ON m.to_username = t.username
WHERE m.from_username = ?
ORDER BY m.id
            "#,
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    pub async fn list_received_by(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<Vec<ReceivedMessage>, AppError> {
        let messages = sqlx::query_as::<_, ReceivedMessage>(
            r#"
SELECT m.id, m.body, m.sent_at, m.read_at,
       f.username AS from_username, f.first_name AS from_first_name,
       f.last_name AS from_last_name, f.phone AS from_phone
FROM messages m
JOIN users f ON m.from_username = f.username
WHERE m.to_username = ?
ORDER BY m.id
            "#,
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }
}
