/**
 * Get Current User Handler
 *
 * `GET /auth/me` returns the profile of the bearer of the token. Runs
 * behind `require_auth`, so the principal is already resolved.
 */

use axum::{extract::State, Json};

use crate::backend::auth::users::{get_user_by_id, UserProfile};
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;

/// Get current user handler
///
/// # Errors
///
/// * `401 Unauthorized` - No authenticated principal
/// * `404 Not Found` - The user vanished between authentication and lookup
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<UserProfile>, BackendError> {
    let user = get_user_by_id(&state.db_pool, principal.user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    Ok(Json(user.into()))
}
