use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::crypto::{CredentialStore, TokenService};
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub credentials: CredentialStore,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, config: Arc<Config>) -> Result<Self, AppError> {
        Ok(AppState {
            db,
            credentials: CredentialStore::new(&config)?,
            tokens: Arc::new(TokenService::new(&config)),
            config,
        })
    }
}
