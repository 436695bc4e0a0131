/**
 * Error Conversion
 *
 * `IntoResponse` for `BackendError` plus conversions from the library
 * errors handlers meet along the way (bcrypt, jsonwebtoken, store
 * constraint violations).
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 400
 * }
 * ```
 */

use crate::backend::error::types::BackendError;
use axum::{
    response::{IntoResponse, Response},
    Json,
};

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_server_error() {
            tracing::error!("Request failed with {}: {}", status, self);
        } else {
            tracing::debug!("Request rejected with {}: {}", status, self);
        }

        let body = serde_json::json!({
            "error": self.message(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<bcrypt::BcryptError> for BackendError {
    fn from(err: bcrypt::BcryptError) -> Self {
        BackendError::internal(format!("password hashing failed: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for BackendError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        BackendError::internal(format!("token encoding failed: {}", err))
    }
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
///
/// # Arguments
///
/// * `err` - Error returned by the store
/// * `message` - Conflict message shown to the caller
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> BackendError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            tracing::warn!("Unique constraint rejected write: {}", db_err);
            BackendError::conflict(message)
        }
        _ => BackendError::Database(err),
    }
}

/// Map a foreign-key violation to `Conflict`, anything else to `Database`.
pub fn conflict_on_reference(err: sqlx::Error, message: &str) -> BackendError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            tracing::warn!("Foreign key constraint rejected write: {}", db_err);
            BackendError::conflict(message)
        }
        _ => BackendError::Database(err),
    }
}

/// True when the store rejected a write for violating a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_error_response_body() {
        let response = BackendError::not_found("Case not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Case not found");
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn test_internal_error_body_is_generic() {
        let response = BackendError::Database(sqlx::Error::PoolClosed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_non_database_error_is_not_conflict() {
        let err = conflict_on_unique(sqlx::Error::RowNotFound, "duplicate");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
