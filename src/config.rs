use std::str::FromStr;

use crate::error::AppError;

/// Insecure fallback signing secret. Override `SECRET_KEY` in any real deployment.
pub const DEFAULT_SECRET_KEY: &str = "secret";

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub request_timeout_secs: u64,
    pub secret_key: String,
    pub token_ttl_hours: i64,
    /// Argon2 iteration count.
    pub password_time_cost: u32,
    /// Argon2 memory size in KiB.
    pub password_memory_kib: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            database_url: "sqlite://messagely.db?mode=rwc".to_string(),
            db_max_connections: 20,
            db_min_connections: 1,
            request_timeout_secs: 30,
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            token_ttl_hours: 24,
            password_time_cost: 3,
            password_memory_kib: 19456,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Config::default();

        Ok(Config {
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", defaults.db_min_connections)?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            secret_key: std::env::var("SECRET_KEY").unwrap_or(defaults.secret_key),
            token_ttl_hours: parse_var("TOKEN_TTL_HOURS", defaults.token_ttl_hours)?,
            password_time_cost: parse_var("PASSWORD_TIME_COST", defaults.password_time_cost)?,
            password_memory_kib: parse_var("PASSWORD_MEMORY_KIB", defaults.password_memory_kib)?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}
