/**
 * Case Messaging Service
 *
 * The single path for sending a message, shared by the HTTP endpoint and
 * the realtime `send_message` event.
 *
 * Messages flow strictly between a case's client and its assigned staff
 * member:
 * - the client writes to the assignee; an unassigned case refuses the
 *   message with 409 rather than storing it with nobody to read it
 * - staff write to the client
 *
 * Once the message is committed a `new_message` event goes to the case
 * group and a `notification` to the recipient's personal group.
 */

use super::db::{self, MessageRecord};
use crate::backend::access::{self, Action};
use crate::backend::cases::db as case_db;
use crate::backend::cases::types::CaseRecord;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthenticatedUser;
use crate::backend::realtime::GroupKey;
use crate::backend::server::config::begin_write;
use crate::backend::server::state::AppState;
use crate::shared::RealtimeEvent;

/// Work out who receives a message from `sender` on `case`
///
/// # Arguments
///
/// * `recipient_hint` - Recipient named by the sender, if any; it must
///   match the resolved party
///
/// # Errors
///
/// * `Forbidden` - Sender is neither the case client nor staff, or the
///   hint names somebody else
/// * `Conflict` - A client writes on a case nobody is assigned to
pub fn resolve_recipient(
    sender: &AuthenticatedUser,
    case: &CaseRecord,
    recipient_hint: Option<i64>,
) -> Result<i64, BackendError> {
    let recipient = if sender.user_id == case.client_id {
        case.assigned_to_id.ok_or_else(|| {
            tracing::warn!("Message on unassigned case {} refused", case.id);
            BackendError::conflict("This case has no assigned staff member to receive messages yet")
        })?
    } else if access::permits(sender, Action::MessageClients) {
        case.client_id
    } else {
        tracing::warn!("User {} may not message on case {}", sender.user_id, case.id);
        return Err(BackendError::forbidden("You do not have access to this case"));
    };

    match recipient_hint {
        Some(hint) if hint != recipient => {
            tracing::warn!(
                "User {} tried to message user {} on case {} (expected {})",
                sender.user_id,
                hint,
                case.id,
                recipient
            );
            Err(BackendError::forbidden("Messages on a case go between its client and assigned staff"))
        }
        _ => Ok(recipient),
    }
}

/// Persist a message and fan it out
pub async fn send_case_message(
    state: &AppState,
    sender: &AuthenticatedUser,
    case_id: i64,
    content: &str,
    recipient_hint: Option<i64>,
) -> Result<MessageRecord, BackendError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(BackendError::validation("Message content cannot be empty"));
    }

    let mut tx = begin_write(&state.db_pool).await?;

    let case = case_db::get_case(&mut *tx, case_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Case not found"))?;
    let recipient_id = resolve_recipient(sender, &case, recipient_hint)?;

    let message_id = db::insert_message(&mut *tx, case_id, sender.user_id, recipient_id, content).await?;
    let message = db::get_message(&mut *tx, message_id)
        .await?
        .ok_or_else(|| BackendError::internal("message vanished after insert"))?;

    tx.commit().await?;
    tracing::info!(
        "Message {} on case {} from {} to {}",
        message.id,
        case.case_number,
        sender.user_id,
        recipient_id
    );

    announce(state, &case, &message);
    Ok(message)
}

fn announce(state: &AppState, case: &CaseRecord, message: &MessageRecord) {
    let payload = serde_json::json!({
        "id": message.id,
        "case_id": message.case_id,
        "content": message.content,
        "sender_id": message.sender_id,
        "sender_name": message.sender_name,
        "recipient_id": message.recipient_id,
        "created_at": message.created_at,
    });
    state
        .case_groups
        .publish(GroupKey::Case(case.id), RealtimeEvent::new_message(payload));

    state.case_groups.publish(
        GroupKey::User(message.recipient_id),
        RealtimeEvent::notification(
            "New message",
            format!("{} wrote on case {}", message.sender_name, case.case_number),
            Some(case.id),
        ),
    );
}
