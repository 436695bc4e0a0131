//! User administration integration tests

mod common;

use axum::http::StatusCode;
use common::{TestApp, PASSWORD};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[tokio::test]
async fn test_admin_routes_need_super_admin() {
    let app = TestApp::spawn().await;
    let manager = app.case_manager("m@example.com").await;

    app.server
        .get("/admin/users")
        .add_header("Authorization", manager.auth())
        .await
        .assert_status_forbidden();
    app.server
        .get("/admin/stats")
        .add_header("Authorization", manager.auth())
        .await
        .assert_status_forbidden();
}

#[tokio::test]
async fn test_create_user_rules() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;

    let response = app
        .server
        .post("/admin/users")
        .add_header("Authorization", admin.auth())
        .json(&json!({ "email": "new@example.com", "password": PASSWORD, "name": "New" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["user"]["role"], "CLIENT");
    assert_eq!(body["user"]["email_verified"], true);

    app.server
        .post("/admin/users")
        .add_header("Authorization", admin.auth())
        .json(&json!({ "email": "new@example.com", "password": PASSWORD, "name": "Again" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    app.server
        .post("/admin/users")
        .add_header("Authorization", admin.auth())
        .json(&json!({ "email": "p@example.com", "password": PASSWORD, "name": "P", "role": "PARTNER" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_list_filters() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    app.register_client("alice@example.com").await;
    app.register_client("bob@example.com").await;
    app.case_manager("carol@example.com").await;

    let response = app
        .server
        .get("/admin/users")
        .add_query_param("role", "CLIENT")
        .add_header("Authorization", admin.auth())
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 2);

    let response = app
        .server
        .get("/admin/users")
        .add_query_param("search", "caro")
        .add_header("Authorization", admin.auth())
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["email"], "carol@example.com");
}

#[tokio::test]
async fn test_update_and_toggle() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let client = app.register_client("c@example.com").await;
    let url = format!("/admin/users/{}", client.id);

    let response = app
        .server
        .put(&url)
        .add_header("Authorization", admin.auth())
        .json(&json!({ "role": "CASE_MANAGER", "name": "Promoted" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user"]["role"], "CASE_MANAGER");
    assert_eq!(body["user"]["name"], "Promoted");

    let response = app
        .server
        .post(&format!("{}/toggle-status", url))
        .add_header("Authorization", admin.auth())
        .await;
    let body: Value = response.json();
    assert_eq!(body["msg"], "User activated");
    assert_eq!(body["user"]["email_verified"], true);

    let response = app
        .server
        .post(&format!("{}/toggle-status", url))
        .add_header("Authorization", admin.auth())
        .await;
    let body: Value = response.json();
    assert_eq!(body["msg"], "User deactivated");
}

#[tokio::test]
async fn test_self_protection() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let url = format!("/admin/users/{}", admin.id);

    app.server
        .delete(&url)
        .add_header("Authorization", admin.auth())
        .await
        .assert_status_forbidden();
    app.server
        .put(&url)
        .add_header("Authorization", admin.auth())
        .json(&json!({ "role": "CLIENT" }))
        .await
        .assert_status_forbidden();
}

#[tokio::test]
async fn test_delete_referenced_user_conflicts() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let client = app.register_client("c@example.com").await;
    let idle = app.register_client("idle@example.com").await;
    app.submit_case(&client, "Custody").await;

    app.server
        .delete(&format!("/admin/users/{}", client.id))
        .add_header("Authorization", admin.auth())
        .await
        .assert_status(StatusCode::CONFLICT);

    app.server
        .delete(&format!("/admin/users/{}", idle.id))
        .add_header("Authorization", admin.auth())
        .await
        .assert_status_ok();
    app.server
        .get(&format!("/admin/users/{}", idle.id))
        .add_header("Authorization", admin.auth())
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_system_stats_and_case_managers() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let client = app.register_client("c@example.com").await;
    let manager = app.case_manager("m@example.com").await;
    app.submit_case(&client, "Custody").await;

    let response = app
        .server
        .get("/admin/stats")
        .add_header("Authorization", admin.auth())
        .await;
    response.assert_status_ok();
    let stats: Value = response.json();
    assert_eq!(stats["users"]["total"], 3);
    assert_eq!(stats["users"]["by_role"]["CLIENT"], 1);
    assert_eq!(stats["users"]["by_role"]["VIEWER"], 0);
    assert_eq!(stats["cases"]["total"], 1);
    assert_eq!(stats["appointments"]["total"], 0);

    let response = app
        .server
        .get("/admin/case-managers")
        .add_header("Authorization", manager.auth())
        .await;
    response.assert_status_ok();
    let staff: Vec<Value> = response.json();
    assert_eq!(staff.len(), 2);
}
