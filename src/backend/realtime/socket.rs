/**
 * WebSocket Endpoint
 *
 * `GET /ws` upgrades an authenticated request to a realtime connection.
 * The token comes from the `Authorization: Bearer` header, or from the
 * `token` query parameter for browsers that cannot set headers on a
 * WebSocket handshake. A missing or invalid token is refused with 401
 * before the upgrade.
 *
 * The connection runs a single select loop: inbound text frames go to the
 * `CaseSession`, and events queued by the session (replies and group
 * broadcasts) are written back as JSON text frames.
 */

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use super::session::CaseSession;
use crate::backend::error::BackendError;
use crate::backend::middleware::{authenticate_token, bearer_token, AuthenticatedUser};
use crate::backend::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

/// Header token first, then the query parameter
pub fn connection_token<'a>(headers: &'a HeaderMap, query: &'a SocketQuery) -> Option<&'a str> {
    bearer_token(headers).or_else(|| {
        query
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    })
}

/// Handle `GET /ws`
///
/// # Errors
///
/// * `401 Unauthorized` - No token, or it does not resolve to a user
/// * `400 Bad Request` - Authenticated, but not a WebSocket handshake
pub async fn handle_socket_upgrade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SocketQuery>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, BackendError> {
    let token = connection_token(&headers, &query).ok_or_else(|| {
        tracing::warn!("[Realtime] Connection attempt without a token");
        BackendError::unauthorized("Missing token")
    })?;
    let user = authenticate_token(&state, token).await?;

    let upgrade = upgrade.map_err(|e| {
        tracing::warn!("[Realtime] Not a WebSocket handshake: {}", e);
        BackendError::validation("Expected a WebSocket upgrade")
    })?;

    tracing::info!("[Realtime] User {} connecting", user.user_id);
    Ok(upgrade
        .on_upgrade(move |socket| run_connection(socket, state, user))
        .into_response())
}

async fn run_connection(socket: WebSocket, state: AppState, user: AuthenticatedUser) {
    let user_id = user.user_id;
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    let mut session = CaseSession::new(state, user, outbound_tx);
    session.greet();

    loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => session.handle_frame(text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("[Realtime] Socket error for user {}: {}", user_id, e);
                    break;
                }
            },
            queued = outbound_rx.recv() => {
                let Some(event) = queued else { break };
                let frame = match serde_json::to_string(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::error!("[Realtime] Failed to serialize event: {:?}", e);
                        continue;
                    }
                };
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!("[Realtime] User {} disconnected", user_id);
}
