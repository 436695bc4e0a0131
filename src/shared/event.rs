/**
 * Real-time Event System
 *
 * Wire types for the case-scoped realtime channel.
 *
 * Server to client frames are `RealtimeEvent`s:
 *
 * ```json
 * {"event": "new_message", "data": {...}, "timestamp": "2025-01-01T10:00:00Z"}
 * ```
 *
 * Client to server frames are `ClientEvent`s, adjacently tagged the same
 * way:
 *
 * ```json
 * {"event": "join_case", "data": {"token": "...", "case_id": 7}}
 * ```
 */
use serde::{Deserialize, Serialize};

/// Type of server-emitted event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Connection or membership status
    Status,
    /// A rejected client request
    Error,
    /// A message persisted on a case
    NewMessage,
    /// A case changed status
    CaseUpdate,
    /// Personal notification for one user
    Notification,
}

/// Event broadcast to realtime subscribers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RealtimeEvent {
    /// Type of event
    #[serde(rename = "event")]
    pub event_type: EventType,
    /// Event payload
    #[serde(rename = "data")]
    pub payload: serde_json::Value,
    /// RFC 3339 timestamp of emission
    pub timestamp: String,
}

impl RealtimeEvent {
    /// Create a new real-time event
    pub fn new(event_type: EventType, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a status event
    pub fn status(message: impl Into<String>) -> Self {
        Self::new(EventType::Status, serde_json::json!({ "msg": message.into() }))
    }

    /// Create an error event
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventType::Error, serde_json::json!({ "msg": message.into() }))
    }

    /// Create a new-message event from a serialized message
    pub fn new_message(payload: serde_json::Value) -> Self {
        Self::new(EventType::NewMessage, payload)
    }

    /// Create a case status update event
    pub fn case_update(case_id: i64, status: &str) -> Self {
        Self::new(
            EventType::CaseUpdate,
            serde_json::json!({
                "case_id": case_id,
                "status": status,
            }),
        )
    }

    /// Create a notification event
    pub fn notification(title: impl Into<String>, message: impl Into<String>, case_id: Option<i64>) -> Self {
        Self::new(
            EventType::Notification,
            serde_json::json!({
                "title": title.into(),
                "message": message.into(),
                "case_id": case_id,
            }),
        )
    }
}

/// Frame sent by a realtime client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Join a case group
    JoinCase {
        #[serde(default)]
        token: Option<String>,
        case_id: i64,
    },
    /// Leave a case group
    LeaveCase { case_id: i64 },
    /// Send a message on a case
    SendMessage {
        #[serde(default)]
        token: Option<String>,
        case_id: i64,
        content: String,
    },
}

impl ClientEvent {
    /// Token carried in the payload, if any
    pub fn token(&self) -> Option<&str> {
        match self {
            ClientEvent::JoinCase { token, .. } | ClientEvent::SendMessage { token, .. } => token.as_deref(),
            ClientEvent::LeaveCase { .. } => None,
        }
    }
}
