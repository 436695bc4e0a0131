/**
 * Authentication Middleware
 *
 * Protects routes that require a signed-in user. The bearer token is
 * verified, the user is loaded from the store (a deleted account is no
 * longer authenticated even with an unexpired token) and the resulting
 * `AuthenticatedUser` is attached to the request extensions, where the
 * `AuthUser` extractor picks it up.
 */

use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::Role;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

/// The authenticated principal of a request or realtime connection
#[derive(Clone, Debug, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Bearer token from an `Authorization` header, if well formed
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve a bearer token to a principal
///
/// # Errors
///
/// `Unauthorized` when the token is invalid or expired, or its user no
/// longer exists.
pub async fn authenticate_token(state: &AppState, token: &str) -> Result<AuthenticatedUser, BackendError> {
    let claims = state.session_keys.verify(token).map_err(|e| {
        tracing::warn!("Invalid token: {:?}", e);
        BackendError::unauthorized("Invalid or expired token")
    })?;

    let user_id = claims.user_id().ok_or_else(|| {
        tracing::warn!("Token subject is not a user id: {}", claims.sub);
        BackendError::unauthorized("Invalid or expired token")
    })?;

    let user = get_user_by_id(&state.db_pool, user_id).await?.ok_or_else(|| {
        tracing::warn!("Token for unknown user {}", user_id);
        BackendError::unauthorized("User no longer exists")
    })?;

    Ok(AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    })
}

/// Authentication middleware
///
/// Returns 401 when the header is missing or the token does not resolve
/// to a user.
pub async fn require_auth(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        tracing::warn!("Missing or malformed Authorization header");
        BackendError::unauthorized("Missing bearer token")
    })?;

    let user = authenticate_token(&app_state, token).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated user
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                BackendError::unauthorized("Authentication required")
            })?;

        Ok(AuthUser(user))
    }
}
