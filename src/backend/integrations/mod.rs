//! External Collaborators
//!
//! Meeting-link generation and user notifications. Both are consumed
//! through traits held in `AppState` as `Arc<dyn ...>`, so handlers never
//! reach a process-wide singleton and tests can swap in fakes.
//!
//! ```text
//! integrations/
//! ├── mod.rs      - IntegrationError and re-exports
//! ├── meeting.rs  - MeetingLinkProvider, GoogleMeetLinks
//! └── notify.rs   - Notifier, LogNotifier, SmtpNotifier
//! ```

pub mod meeting;
pub mod notify;

pub use meeting::{GoogleMeetLinks, MeetingLinkProvider, MeetingRequest};
pub use notify::{LogNotifier, Notice, Notifier, SmtpNotifier};

use crate::backend::error::BackendError;
use thiserror::Error;

/// Failure reported by an external collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntegrationError {
    /// The provider could not be reached or timed out
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered but refused the request
    #[error("provider rejected request: {0}")]
    Rejected(String),
}

impl From<IntegrationError> for BackendError {
    fn from(err: IntegrationError) -> Self {
        BackendError::integration(err.to_string())
    }
}
