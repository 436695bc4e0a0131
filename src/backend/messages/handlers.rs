/**
 * Message Handlers
 *
 * Case-scoped sending and listing, per-user inbox views and the staff-wide
 * listing. Sending goes through `service::send_case_message`.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::db::{self, ConversationSummary, MessageRecord};
use super::service::send_case_message;
use crate::backend::access::{self, Action};
use crate::backend::cases::find_case;
use crate::backend::error::BackendError;
use crate::backend::middleware::{ApiJson, AuthUser};
use crate::backend::server::config::begin_write;
use crate::backend::server::state::AppState;
use crate::shared::error::require_fields;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageRequest {
    pub content: Option<String>,
    pub recipient_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessageSentResponse {
    pub message: String,
    pub data: MessageRecord,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageRecord>,
    pub total: usize,
}

impl From<Vec<MessageRecord>> for MessageListResponse {
    fn from(messages: Vec<MessageRecord>) -> Self {
        Self {
            total: messages.len(),
            messages,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AdminMessageQuery {
    pub case_id: Option<i64>,
}

/// Send a message on a case (POST /cases/{id}/messages)
///
/// # Errors
///
/// * `400 Bad Request` - Empty content
/// * `403 Forbidden` - Not a party to the case
/// * `404 Not Found` - No such case
/// * `409 Conflict` - Client writing on an unassigned case
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageSentResponse>), BackendError> {
    require_fields(&[("content", request.content.as_deref())])?;
    let content = request.content.unwrap_or_default();

    let message = send_case_message(&state, &user, case_id, &content, request.recipient_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageSentResponse {
            message: "Message sent successfully".to_string(),
            data: message,
        }),
    ))
}

/// Messages of a case, newest first (GET /cases/{id}/messages)
pub async fn list_case_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
) -> Result<Json<MessageListResponse>, BackendError> {
    let case = find_case(&state, case_id).await?;
    access::ensure_can_view_case(&user, case.client_id)?;

    let messages = db::list_messages(&state.db_pool, Some(case_id)).await?;
    Ok(Json(messages.into()))
}

/// Mark a message as read; recipient only (PUT /messages/{id}/read)
pub async fn mark_message_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<i64>,
) -> Result<Json<serde_json::Value>, BackendError> {
    let mut tx = begin_write(&state.db_pool).await?;

    let message = db::get_message(&mut *tx, message_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Message not found"))?;

    if message.recipient_id != user.user_id {
        tracing::warn!(
            "User {} tried to mark message {} addressed to {}",
            user.user_id,
            message_id,
            message.recipient_id
        );
        return Err(BackendError::forbidden("Only the recipient can mark a message as read"));
    }

    db::mark_read(&mut *tx, message_id).await?;
    tx.commit().await?;

    Ok(Json(serde_json::json!({ "msg": "Message marked as read" })))
}

/// Per-case inbox summaries (GET /messages/conversations)
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ConversationSummary>>, BackendError> {
    Ok(Json(db::conversations(&state.db_pool, user.user_id).await?))
}

/// Unread messages addressed to the caller (GET /messages/unread-count)
pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<serde_json::Value>, BackendError> {
    let count = db::unread_count(&state.db_pool, user.user_id).await?;
    Ok(Json(serde_json::json!({ "unread_count": count })))
}

/// Every message, staff only (GET /admin/messages)
pub async fn admin_list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<AdminMessageQuery>,
) -> Result<Json<MessageListResponse>, BackendError> {
    access::require(&user, Action::ListAllMessages)?;
    let messages = db::list_messages(&state.db_pool, query.case_id).await?;
    Ok(Json(messages.into()))
}
