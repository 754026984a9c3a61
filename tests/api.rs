mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::{json, Value};

use common::{call, test_app};

async fn register(app: &Router, username: &str, password: &str) -> Result<String> {
    let (status, body) = call(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "password": password,
            "first_name": "First",
            "last_name": "Last",
            "phone": "555-0100",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "register {}: {}", username, body);
    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

async fn login(app: &Router, username: &str, password: &str) -> Result<(StatusCode, Value)> {
    call(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

#[tokio::test]
async fn health_is_public() -> Result<()> {
    let app = test_app().await?;
    let (status, body) = call(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    Ok(())
}

#[tokio::test]
async fn register_login_and_profile_access() -> Result<()> {
    let app = test_app().await?;
    register(&app, "alice", "pw1").await?;
    register(&app, "bob", "pw2").await?;

    let (status, body) = login(&app, "alice", "pw1").await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token").to_string();

    let (status, body) = call(&app, Method::GET, "/users/alice", Some(token.as_str()), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["first_name"], "First");
    assert!(body["user"]["last_login_at"].is_i64());
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());

    let (status, _) = call(&app, Method::GET, "/users/bob", Some(token.as_str()), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, Method::GET, "/users", Some(token.as_str()), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().map(Vec::len), Some(2));
    assert!(body["users"][0].get("join_at").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_register_is_bad_request() -> Result<()> {
    let app = test_app().await?;
    register(&app, "alice", "pw1").await?;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "password": "other",
            "first_name": "A",
            "last_name": "B",
            "phone": "1",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("already exists"));

    // Original password still works
    let (status, _) = login(&app, "alice", "pw1").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() -> Result<()> {
    let app = test_app().await?;
    register(&app, "alice", "pw1").await?;

    let wrong_password = login(&app, "alice", "nope").await?;
    let unknown_user = login(&app, "ghost", "pw1").await?;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);
    Ok(())
}

#[tokio::test]
async fn anonymous_and_bad_tokens_are_unauthorized() -> Result<()> {
    let app = test_app().await?;
    register(&app, "alice", "pw1").await?;

    let (status, _) = call(&app, Method::GET, "/users", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/users", Some("not-a-token"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/messages/1", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn token_accepted_from_query_parameter() -> Result<()> {
    let app = test_app().await?;
    let token = register(&app, "alice", "pw1").await?;

    let uri = format!("/users/alice?_token={}", token);
    let (status, body) = call(&app, Method::GET, &uri, None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    Ok(())
}

#[tokio::test]
async fn message_access_rules() -> Result<()> {
    let app = test_app().await?;
    let alice = register(&app, "alice", "pw1").await?;
    let bob = register(&app, "bob", "pw2").await?;
    let carol = register(&app, "carol", "pw3").await?;

    let (status, body) = call(
        &app,
        Method::POST,
        "/messages",
        Some(alice.as_str()),
        Some(json!({ "to_username": "bob", "body": "hi bob" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["from_username"], "alice");
    assert!(body["message"]["read_at"].is_null());
    let id = body["message"]["id"].as_i64().expect("message id");
    let detail_uri = format!("/messages/{}", id);
    let read_uri = format!("/messages/{}/read", id);

    let (status, body) = call(&app, Method::GET, &detail_uri, Some(bob.as_str()), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["from_user"]["username"], "alice");
    assert_eq!(body["message"]["to_user"]["username"], "bob");

    let (status, _) = call(&app, Method::GET, &detail_uri, Some(alice.as_str()), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::GET, &detail_uri, Some(carol.as_str()), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::POST, &read_uri, Some(alice.as_str()), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, Method::POST, &read_uri, Some(bob.as_str()), None).await?;
    assert_eq!(status, StatusCode::OK);
    let read_at = body["message"]["read_at"].as_i64().expect("read_at set");

    // Second mark-read keeps the first timestamp
    let (status, body) = call(&app, Method::POST, &read_uri, Some(bob.as_str()), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["read_at"].as_i64(), Some(read_at));
    Ok(())
}

#[tokio::test]
async fn message_lists_require_self() -> Result<()> {
    let app = test_app().await?;
    let alice = register(&app, "alice", "pw1").await?;
    let bob = register(&app, "bob", "pw2").await?;

    call(
        &app,
        Method::POST,
        "/messages",
        Some(alice.as_str()),
        Some(json!({ "to_username": "bob", "body": "hello" })),
    )
    .await?;

    let (status, body) = call(&app, Method::GET, "/users/bob/to", Some(bob.as_str()), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"][0]["from_user"]["username"], "alice");
    assert_eq!(body["messages"][0]["body"], "hello");

    let (status, body) = call(&app, Method::GET, "/users/alice/from", Some(alice.as_str()), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"][0]["to_user"]["username"], "bob");

    let (status, _) = call(&app, Method::GET, "/users/bob/to", Some(alice.as_str()), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn send_to_unknown_recipient_fails() -> Result<()> {
    let app = test_app().await?;
    let alice = register(&app, "alice", "pw1").await?;

    let (status, _) = call(
        &app,
        Method::POST,
        "/messages",
        Some(alice.as_str()),
        Some(json!({ "to_username": "ghost", "body": "anyone?" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/messages",
        Some(alice.as_str()),
        Some(json!({ "to_username": "alice", "body": "" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn missing_message_looks_like_foreign_message() -> Result<()> {
    let app = test_app().await?;
    let alice = register(&app, "alice", "pw1").await?;
    register(&app, "bob", "pw2").await?;
    let carol = register(&app, "carol", "pw3").await?;

    let (_, body) = call(
        &app,
        Method::POST,
        "/messages",
        Some(alice.as_str()),
        Some(json!({ "to_username": "bob", "body": "private" })),
    )
    .await?;
    let id = body["message"]["id"].as_i64().expect("message id");
    let missing = id + 1000;

    let foreign = call(&app, Method::GET, &format!("/messages/{}", id), Some(carol.as_str()), None).await?;
    let absent = call(&app, Method::GET, &format!("/messages/{}", missing), Some(carol.as_str()), None).await?;
    assert_eq!(foreign.0, StatusCode::UNAUTHORIZED);
    assert_eq!(foreign, absent);

    let foreign_read =
        call(&app, Method::POST, &format!("/messages/{}/read", id), Some(carol.as_str()), None).await?;
    let absent_read =
        call(&app, Method::POST, &format!("/messages/{}/read", missing), Some(carol.as_str()), None).await?;
    assert_eq!(foreign_read.0, StatusCode::UNAUTHORIZED);
    assert_eq!(foreign_read, absent_read);
    Ok(())
}

#[tokio::test]
async fn percent_encoded_query_token_accepted() -> Result<()> {
    let app = test_app().await?;
    let token = register(&app, "alice", "pw1").await?;

    let uri = format!("/users/alice?_token={}", token.replace('.', "%2E"));
    let (status, body) = call(&app, Method::GET, &uri, None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    Ok(())
}

#[tokio::test]
async fn token_accepted_from_json_body() -> Result<()> {
    let app = test_app().await?;
    let alice = register(&app, "alice", "pw1").await?;
    register(&app, "bob", "pw2").await?;

    let (status, body) = call(
        &app,
        Method::POST,
        "/messages",
        None,
        Some(json!({ "_token": alice, "to_username": "bob", "body": "via body" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["from_username"], "alice");
    assert_eq!(body["message"]["body"], "via body");

    let (status, _) = call(
        &app,
        Method::POST,
        "/messages",
        None,
        Some(json!({ "_token": "forged", "to_username": "bob", "body": "nope" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_trims_username_like_register() -> Result<()> {
    let app = test_app().await?;
    register(&app, " alice", "pw1").await?;

    let (status, _) = login(&app, " alice", "pw1").await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = login(&app, "alice", "pw1").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
