#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::{Pool, Sqlite};
use tower::ServiceExt;

use messagely::api::{create_router, AppState};
use messagely::config::Config;
use messagely::crypto::CredentialStore;
use messagely::db::{self, NewUser, User, UserRepository};

pub fn test_config() -> Config {
    Config {
        secret_key: "test-secret".to_string(),
        password_time_cost: 1,
        password_memory_kib: 8,
        ..Config::default()
    }
}

pub async fn test_pool() -> Result<Pool<Sqlite>> {
    let pool = db::connect_in_memory().await?;
    db::migrate(&pool).await?;
    Ok(pool)
}

pub fn test_credentials() -> CredentialStore {
    CredentialStore::new(&test_config()).expect("valid test work factor")
}

pub async fn register(pool: &Pool<Sqlite>, username: &str, password: &str) -> Result<User> {
    let user = UserRepository::register(
        pool,
        &test_credentials(),
        NewUser {
            username: username.to_string(),
            password: password.to_string(),
            first_name: format!("{}-first", username),
            last_name: format!("{}-last", username),
            phone: "555-0100".to_string(),
        },
    )
    .await?;
    Ok(user)
}

pub async fn test_app() -> Result<Router> {
    let pool = test_pool().await?;
    let state = AppState::new(pool, Arc::new(test_config()))?;
    Ok(create_router(state))
}

pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, json))
}
