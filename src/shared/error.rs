//! Shared Error Types
//!
//! Errors raised while validating wire-level values: request fields,
//! enumerated values and realtime frames. They carry enough context to be
//! shown to the caller verbatim and always map to a 400 response.
//!
//! # Error Categories
//!
//! - `SerializationError` - a frame or body that is not valid JSON
//! - `ValidationError` - a single field failed validation
//! - `MissingFields` - one or more required fields were absent
//!
//! # Usage
//!
//! ```rust
//! use casedesk::shared::error::SharedError;
//!
//! let error = SharedError::validation("email", "must contain '@'");
//! assert!(error.to_string().contains("email"));
//! ```
use thiserror::Error;

/// Validation errors shared by the HTTP and realtime layers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Required fields absent from a request
    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFields {
        /// Names of the missing fields, in request order
        fields: Vec<String>,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a missing-fields error
    pub fn missing<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingFields {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

/// Collects the names of required fields that are absent or blank.
///
/// Returns `Ok(())` when every field is present, otherwise a single
/// `MissingFields` error listing all of them.
pub fn require_fields(fields: &[(&str, Option<&str>)]) -> Result<(), SharedError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.map(|v| v.trim().is_empty()).unwrap_or(true))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SharedError::missing(missing))
    }
}
