/**
 * Realtime Connection Session
 *
 * Per-connection state for one authenticated socket. The session owns the
 * groups the connection has joined; for each group a forwarder task copies
 * broadcast events into the connection's outbound queue. The socket loop
 * in `socket.rs` drains that queue onto the wire.
 *
 * Every client frame is answered through the same queue: rejected requests
 * become `error` events, joins and leaves become `status` events. Nothing
 * a client sends can close the connection.
 */

use std::collections::HashMap;

use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::task::JoinHandle;

use super::broadcast::GroupKey;
use crate::backend::access;
use crate::backend::cases::db as case_db;
use crate::backend::error::BackendError;
use crate::backend::messages::service::send_case_message;
use crate::backend::middleware::{authenticate_token, AuthenticatedUser};
use crate::backend::server::state::AppState;
use crate::shared::{ClientEvent, RealtimeEvent};

pub type Outbound = mpsc::UnboundedSender<RealtimeEvent>;

pub struct CaseSession {
    state: AppState,
    user: AuthenticatedUser,
    outbound: Outbound,
    joined: HashMap<GroupKey, JoinHandle<()>>,
}

impl CaseSession {
    pub fn new(state: AppState, user: AuthenticatedUser, outbound: Outbound) -> Self {
        Self {
            state,
            user,
            outbound,
            joined: HashMap::new(),
        }
    }

    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    /// Groups currently joined, personal group included
    pub fn joined_groups(&self) -> Vec<GroupKey> {
        self.joined.keys().copied().collect()
    }

    /// Welcome the connection and subscribe it to its personal group
    pub fn greet(&mut self) {
        self.subscribe(GroupKey::User(self.user.user_id));
        self.emit(RealtimeEvent::status(format!("Connected as {}", self.user.name)));
    }

    /// Handle one text frame from the client
    pub async fn handle_frame(&mut self, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.handle(event).await,
            Err(e) => {
                tracing::debug!("[Realtime] Unparseable frame from user {}: {}", self.user.user_id, e);
                self.emit(RealtimeEvent::error("Unrecognized event"));
            }
        }
    }

    pub async fn handle(&mut self, event: ClientEvent) {
        if let Err(e) = self.check_token(event.token()).await {
            self.emit(RealtimeEvent::error(e.message()));
            return;
        }

        let result = match event {
            ClientEvent::JoinCase { case_id, .. } => self.join_case(case_id).await,
            ClientEvent::LeaveCase { case_id } => {
                self.leave_case(case_id);
                Ok(())
            }
            ClientEvent::SendMessage { case_id, content, .. } => send_case_message(
                &self.state,
                &self.user,
                case_id,
                &content,
                None,
            )
            .await
            .map(|_| ()),
        };

        if let Err(e) = result {
            if e.is_server_error() {
                tracing::error!("[Realtime] Event from user {} failed: {}", self.user.user_id, e);
            }
            self.emit(RealtimeEvent::error(e.message()));
        }
    }

    /// A token inside an event must name the connection's own user
    async fn check_token(&self, token: Option<&str>) -> Result<(), BackendError> {
        let Some(token) = token else {
            return Ok(());
        };
        let principal = authenticate_token(&self.state, token).await?;
        if principal.user_id != self.user.user_id {
            tracing::warn!(
                "[Realtime] Connection of user {} presented a token for user {}",
                self.user.user_id,
                principal.user_id
            );
            return Err(BackendError::unauthorized("Token does not match this connection"));
        }
        Ok(())
    }

    async fn join_case(&mut self, case_id: i64) -> Result<(), BackendError> {
        let case = case_db::get_case(&self.state.db_pool, case_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Case not found"))?;

        if !access::can_view_case(&self.user, case.client_id) {
            tracing::warn!("[Realtime] User {} refused case room {}", self.user.user_id, case_id);
            return Err(BackendError::forbidden("Unauthorized to join this case room"));
        }

        self.subscribe(GroupKey::Case(case_id));
        tracing::info!("[Realtime] User {} joined case room {}", self.user.user_id, case_id);
        self.emit(RealtimeEvent::status(format!("Joined case {}", case.case_number)));
        Ok(())
    }

    fn leave_case(&mut self, case_id: i64) {
        if let Some(forwarder) = self.joined.remove(&GroupKey::Case(case_id)) {
            forwarder.abort();
            tracing::info!("[Realtime] User {} left case room {}", self.user.user_id, case_id);
        }
        self.emit(RealtimeEvent::status(format!("Left case {}", case_id)));
    }

    /// Start forwarding a group; joining twice is a no-op
    fn subscribe(&mut self, key: GroupKey) {
        if self.joined.contains_key(&key) {
            return;
        }
        let mut rx = self.state.case_groups.subscribe(key);
        let outbound = self.outbound.clone();
        let forwarder = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if outbound.send(event).is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("[Realtime] Receiver in {} lagged, skipped {} events", key, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        self.joined.insert(key, forwarder);
    }

    fn emit(&self, event: RealtimeEvent) {
        // The socket loop is gone once the receiver is dropped.
        let _ = self.outbound.send(event);
    }
}

impl Drop for CaseSession {
    fn drop(&mut self) {
        for (_, forwarder) in self.joined.drain() {
            forwarder.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support;
    use crate::shared::{EventType, Role};
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::timeout;

    async fn next(rx: &mut UnboundedReceiver<RealtimeEvent>) -> RealtimeEvent {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("outbound closed")
    }

    fn session(state: &AppState, user: &AuthenticatedUser) -> (CaseSession, UnboundedReceiver<RealtimeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CaseSession::new(state.clone(), user.clone(), tx), rx)
    }

    #[tokio::test]
    async fn test_greet_joins_personal_group() {
        let ctx = test_support::context().await;
        let client = test_support::seed_user(&ctx.state, "c@x.com", Role::Client).await;
        let (mut session, mut rx) = session(&ctx.state, &client);

        session.greet();
        assert_eq!(next(&mut rx).await.event_type, EventType::Status);
        assert_eq!(session.joined_groups(), vec![GroupKey::User(client.user_id)]);

        ctx.state.case_groups.publish(
            GroupKey::User(client.user_id),
            RealtimeEvent::notification("Hi", "there", None),
        );
        assert_eq!(next(&mut rx).await.event_type, EventType::Notification);
    }

    #[tokio::test]
    async fn test_join_requires_case_access() {
        let ctx = test_support::context().await;
        let owner = test_support::seed_user(&ctx.state, "c@x.com", Role::Client).await;
        let stranger = test_support::seed_user(&ctx.state, "s@x.com", Role::Client).await;
        let case = test_support::seed_case(&ctx.state, owner.user_id, None).await;

        let (mut session, mut rx) = session(&ctx.state, &stranger);
        session.handle(ClientEvent::JoinCase { token: None, case_id: case.id }).await;

        let event = next(&mut rx).await;
        assert_eq!(event.event_type, EventType::Error);
        assert_eq!(event.payload["msg"], "Unauthorized to join this case room");
        assert_eq!(ctx.state.case_groups.subscriber_count(GroupKey::Case(case.id)), 0);
    }

    #[tokio::test]
    async fn test_join_then_leave() {
        let ctx = test_support::context().await;
        let owner = test_support::seed_user(&ctx.state, "c@x.com", Role::Client).await;
        let case = test_support::seed_case(&ctx.state, owner.user_id, None).await;

        let (mut session, mut rx) = session(&ctx.state, &owner);
        session.handle(ClientEvent::JoinCase { token: None, case_id: case.id }).await;
        assert_eq!(next(&mut rx).await.event_type, EventType::Status);

        ctx.state
            .case_groups
            .publish(GroupKey::Case(case.id), RealtimeEvent::case_update(case.id, "IN_PROGRESS"));
        assert_eq!(next(&mut rx).await.event_type, EventType::CaseUpdate);

        session.handle(ClientEvent::LeaveCase { case_id: case.id }).await;
        assert_eq!(next(&mut rx).await.event_type, EventType::Status);
        assert!(!session.joined_groups().contains(&GroupKey::Case(case.id)));
    }

    #[tokio::test]
    async fn test_missing_case_is_an_error_event() {
        let ctx = test_support::context().await;
        let staff = test_support::seed_user(&ctx.state, "l@x.com", Role::CaseManager).await;
        let (mut session, mut rx) = session(&ctx.state, &staff);

        session.handle(ClientEvent::JoinCase { token: None, case_id: 999 }).await;
        let event = next(&mut rx).await;
        assert_eq!(event.event_type, EventType::Error);
        assert_eq!(event.payload["msg"], "Case not found");
    }

    #[tokio::test]
    async fn test_foreign_token_is_refused() {
        let ctx = test_support::context().await;
        let client = test_support::seed_user(&ctx.state, "c@x.com", Role::Client).await;
        let other = test_support::seed_user(&ctx.state, "o@x.com", Role::Client).await;
        let case = test_support::seed_case(&ctx.state, client.user_id, None).await;

        let (mut session, mut rx) = session(&ctx.state, &client);
        let token = test_support::token_for(&ctx.state, other.user_id).await;
        session
            .handle(ClientEvent::JoinCase {
                token: Some(token),
                case_id: case.id,
            })
            .await;
        assert_eq!(next(&mut rx).await.event_type, EventType::Error);
        assert!(session.joined_groups().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_reaches_case_room() {
        let ctx = test_support::context().await;
        let client = test_support::seed_user(&ctx.state, "c@x.com", Role::Client).await;
        let lawyer = test_support::seed_user(&ctx.state, "l@x.com", Role::CaseManager).await;
        let case = test_support::seed_case(&ctx.state, client.user_id, Some(lawyer.user_id)).await;

        let (mut session, mut rx) = session(&ctx.state, &client);
        session.handle(ClientEvent::JoinCase { token: None, case_id: case.id }).await;
        next(&mut rx).await;

        session
            .handle(ClientEvent::SendMessage {
                token: None,
                case_id: case.id,
                content: "Any news?".to_string(),
            })
            .await;
        let event = next(&mut rx).await;
        assert_eq!(event.event_type, EventType::NewMessage);
        assert_eq!(event.payload["content"], "Any news?");
        assert_eq!(event.payload["recipient_id"], lawyer.user_id);
    }

    #[tokio::test]
    async fn test_bad_frame_keeps_session() {
        let ctx = test_support::context().await;
        let client = test_support::seed_user(&ctx.state, "c@x.com", Role::Client).await;
        let (mut session, mut rx) = session(&ctx.state, &client);

        session.handle_frame("{not json").await;
        assert_eq!(next(&mut rx).await.event_type, EventType::Error);
        session.handle_frame(r#"{"event":"leave_case","data":{"case_id":3}}"#).await;
        assert_eq!(next(&mut rx).await.event_type, EventType::Status);
    }

    #[tokio::test]
    async fn test_drop_releases_groups() {
        let ctx = test_support::context().await;
        let client = test_support::seed_user(&ctx.state, "c@x.com", Role::Client).await;
        let (mut session, _rx) = session(&ctx.state, &client);
        session.greet();
        tokio::task::yield_now().await;
        assert_eq!(ctx.state.case_groups.subscriber_count(GroupKey::User(client.user_id)), 1);

        drop(session);
        for _ in 0..20 {
            if ctx.state.case_groups.subscriber_count(GroupKey::User(client.user_id)) == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(ctx.state.case_groups.subscriber_count(GroupKey::User(client.user_id)), 0);
    }
}
