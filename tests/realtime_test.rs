//! WebSocket integration tests

mod common;

use std::time::Duration;

use axum_test::TestWebSocket;
use common::{TestApp, TestUser};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::time::timeout;

async fn connect(app: &TestApp, user: &TestUser) -> TestWebSocket {
    app.server
        .get_websocket("/ws")
        .add_header("Authorization", user.auth())
        .await
        .into_websocket()
        .await
}

async fn next_event(socket: &mut TestWebSocket) -> Value {
    timeout(Duration::from_secs(5), socket.receive_json::<Value>())
        .await
        .expect("timed out waiting for event")
}

/// Skip events until one of the wanted type arrives
async fn next_of(socket: &mut TestWebSocket, event: &str) -> Value {
    loop {
        let frame = next_event(socket).await;
        if frame["event"] == event {
            return frame;
        }
    }
}

#[tokio::test]
async fn test_connection_requires_token() {
    let app = TestApp::spawn_http().await;

    app.server.get_websocket("/ws").await.assert_status_unauthorized();
    app.server
        .get_websocket("/ws")
        .add_query_param("token", "not-a-token")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_query_token_connects() {
    let app = TestApp::spawn_http().await;
    let client = app.register_client("c@example.com").await;

    let mut socket = app
        .server
        .get_websocket("/ws")
        .add_query_param("token", &client.token)
        .await
        .into_websocket()
        .await;
    let greeting = next_event(&mut socket).await;
    assert_eq!(greeting["event"], "status");
}

#[tokio::test]
async fn test_join_refused_for_foreign_case() {
    let app = TestApp::spawn_http().await;
    let owner = app.register_client("c@example.com").await;
    let stranger = app.register_client("s@example.com").await;
    let case = app.submit_case(&owner, "Custody").await;

    let mut socket = connect(&app, &stranger).await;
    next_of(&mut socket, "status").await;

    socket
        .send_json(&json!({ "event": "join_case", "data": { "case_id": case["id"] } }))
        .await;
    let refusal = next_of(&mut socket, "error").await;
    assert_eq!(refusal["data"]["msg"], "Unauthorized to join this case room");
}

#[tokio::test]
async fn test_message_pushed_to_case_room() {
    let app = TestApp::spawn_http().await;
    let client = app.register_client("c@example.com").await;
    let manager = app.case_manager("m@example.com").await;
    let case = app.submit_case(&client, "Custody").await;
    let case_id = case["id"].as_i64().unwrap();
    app.assign(&manager, case_id, manager.id).await;

    let mut staff_socket = connect(&app, &manager).await;
    next_of(&mut staff_socket, "status").await;
    staff_socket
        .send_json(&json!({ "event": "join_case", "data": { "case_id": case_id } }))
        .await;
    next_of(&mut staff_socket, "status").await;

    let mut client_socket = connect(&app, &client).await;
    next_of(&mut client_socket, "status").await;
    client_socket
        .send_json(&json!({
            "event": "send_message",
            "data": { "token": client.token, "case_id": case_id, "content": "Hello from the client" },
        }))
        .await;

    // The case room and the personal group forward independently, so the
    // two frames may arrive in either order.
    let mut pushed = None;
    let mut notice = None;
    while pushed.is_none() || notice.is_none() {
        let frame = next_event(&mut staff_socket).await;
        match frame["event"].as_str() {
            Some("new_message") => pushed = Some(frame),
            Some("notification") => notice = Some(frame),
            _ => {}
        }
    }
    let pushed = pushed.unwrap();
    assert_eq!(pushed["data"]["content"], "Hello from the client");
    assert_eq!(pushed["data"]["sender_id"], client.id);
    assert_eq!(notice.unwrap()["data"]["case_id"], case_id);
}

#[tokio::test]
async fn test_status_change_reaches_client() {
    let app = TestApp::spawn_http().await;
    let client = app.register_client("c@example.com").await;
    let admin = app.admin().await;
    let case = app.submit_case(&client, "Custody").await;
    let case_id = case["id"].as_i64().unwrap();

    let mut socket = connect(&app, &client).await;
    next_of(&mut socket, "status").await;
    socket
        .send_json(&json!({ "event": "join_case", "data": { "case_id": case_id } }))
        .await;
    next_of(&mut socket, "status").await;

    app.server
        .put(&format!("/cases/admin/{}", case_id))
        .add_header("Authorization", admin.auth())
        .json(&json!({ "status": "IN_PROGRESS" }))
        .await
        .assert_status_ok();

    let update = next_of(&mut socket, "case_update").await;
    assert_eq!(update["data"]["status"], "IN_PROGRESS");
}
