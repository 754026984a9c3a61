use sqlx::{Pool, Sqlite};

use crate::crypto::CredentialStore;
use crate::db::models::{now_millis, User, UserSummary};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

pub struct UserRepository;

impl UserRepository {
    /// Hash the password and insert the user. The primary key on `username`
    /// decides concurrent duplicate registrations.
    pub async fn register(
        pool: &Pool<Sqlite>,
        credentials: &CredentialStore,
        new_user: NewUser,
    ) -> Result<User, AppError> {
        let password_hash = credentials.hash_blocking(new_user.password).await?;
        let now = now_millis();

        let user = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (username, password_hash, first_name, last_name, phone, join_at, last_login_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&new_user.username)
        .bind(&password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.phone)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicateUser,
            other => AppError::StoreUnavailable(other),
        })?;

        tracing::info!(username = %user.username, "user registered");
        Ok(user)
    }

    /// Check a password. Unknown usernames are `UserNotFound`, a wrong
    /// password is `Ok(false)`.
    pub async fn authenticate(
        pool: &Pool<Sqlite>,
        credentials: &CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<bool, AppError> {
        let stored_hash =
            sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(pool)
                .await?;

        match stored_hash {
            Some(hash) => credentials.verify_blocking(password.to_string(), hash).await,
            None => {
                // Same hashing cost as a wrong password
                credentials.verify_dummy_blocking(password.to_string()).await?;
                Err(AppError::UserNotFound)
            }
        }
    }

    /// Advance `last_login_at` to now. Never moves it backwards.
    pub async fn touch_login(pool: &Pool<Sqlite>, username: &str) -> Result<i64, AppError> {
        let last_login_at = sqlx::query_scalar::<_, i64>(
            r#"
UPDATE users SET last_login_at = MAX(last_login_at, ?)
WHERE username = ?
RETURNING last_login_at
            "#,
        )
        .bind(now_millis())
        .bind(username)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::UserNotFound)?;

        Ok(last_login_at)
    }

    pub async fn get(pool: &Pool<Sqlite>, username: &str) -> Result<User, AppError> {
        Self::get_by_username(pool, username)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn get_by_username(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn exists(pool: &Pool<Sqlite>, username: &str) -> Result<bool, AppError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        Ok(found.is_some())
    }

    pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<UserSummary>, AppError> {
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT username, first_name, last_name, phone FROM users ORDER BY rowid",
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}
