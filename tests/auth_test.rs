//! Authentication API integration tests

mod common;

use axum::http::StatusCode;
use common::{error_message, TestApp, PASSWORD};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::spawn().await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({ "email": "Ann@Example.com", "password": PASSWORD, "name": "Ann" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["msg"], "User created successfully");
    let user_id = body["user_id"].as_i64().unwrap();

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": "ann@example.com", "password": PASSWORD }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["user_role"], "CLIENT");
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    app.register_client("dup@example.com").await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({ "email": "dup@example.com", "password": PASSWORD, "name": "Again" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::spawn().await;

    let missing = app
        .server
        .post("/auth/register")
        .json(&json!({ "email": "x@example.com", "password": PASSWORD }))
        .await;
    missing.assert_status_bad_request();
    assert_contains!(error_message(&missing), "name");

    let short = app
        .server
        .post("/auth/register")
        .json(&json!({ "email": "x@example.com", "password": "short", "name": "X" }))
        .await;
    short.assert_status_bad_request();
    assert_contains!(error_message(&short), "password");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::spawn().await;
    app.register_client("c@example.com").await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": "c@example.com", "password": "not-the-password" }))
        .await;
    response.assert_status_unauthorized();

    let unknown = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": "nobody@example.com", "password": PASSWORD }))
        .await;
    unknown.assert_status_unauthorized();
    assert_eq!(error_message(&response), "Invalid email or password");
    assert_eq!(error_message(&response), error_message(&unknown));
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let app = TestApp::spawn().await;
    let client = app.register_client("me@example.com").await;

    let response = app.server.get("/auth/me").add_header("Authorization", client.auth()).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["email"], "me@example.com");
    assert_eq!(body["role"], "CLIENT");
    assert!(body.get("password_hash").is_none());

    app.server.get("/auth/me").await.assert_status_unauthorized();
    app.server
        .get("/auth/me")
        .add_header("Authorization", "Bearer garbage")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let app = TestApp::spawn().await;
    let other = TestApp::spawn_with(|config| casedesk::backend::server::config::AppConfig {
        jwt_secret: "a-different-secret".to_string(),
        ..config
    })
    .await;
    let foreign = other.register_client("c@example.com").await;

    app.register_client("c@example.com").await;
    app.server
        .get("/auth/me")
        .add_header("Authorization", foreign.auth())
        .await
        .assert_status_unauthorized();
}
