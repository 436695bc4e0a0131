/**
 * Backend Error Types
 *
 * The request-level error taxonomy. Every handler returns
 * `Result<_, BackendError>` and every variant maps to exactly one HTTP
 * status:
 *
 * | Variant        | Status |
 * |----------------|--------|
 * | `Validation`   | 400    |
 * | `SharedError`  | 400    |
 * | `Unauthorized` | 401    |
 * | `Forbidden`    | 403    |
 * | `NotFound`     | 404    |
 * | `Conflict`     | 409    |
 * | `Integration`  | 502    |
 * | `Database`     | 500    |
 * | `Internal`     | 500    |
 *
 * 500-class errors never leak their cause to the caller; the cause is
 * logged when the response is rendered.
 */

use crate::shared::SharedError;
use axum::http::StatusCode;
use thiserror::Error;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use casedesk::backend::error::BackendError;
///
/// let err = BackendError::forbidden("Only staff may author notes");
/// assert_eq!(err.status_code().as_u16(), 403);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Malformed or missing request data
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Missing, invalid or expired credentials
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Authenticated, but role or ownership does not permit the action
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// The addressed entity does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// The request collides with current state (duplicate, refused transition)
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// An external collaborator failed
    #[error("Integration error: {message}")]
    Integration { message: String },

    /// Wire-level validation failure
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Unexpected persistence failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Anything else that should never reach a caller
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BackendError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn integration(message: impl Into<String>) -> Self {
        Self::Integration { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::SharedError(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Integration { .. } => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller
    ///
    /// Database and internal errors are replaced by a generic text.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::Integration { message } => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::Database(_) | Self::Internal { .. } => "Internal server error".to_string(),
        }
    }

    /// True for errors that indicate a server-side fault
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}
