/**
 * Login Handler
 *
 * `POST /auth/login`.
 *
 * # Authentication Process
 *
 * 1. Look up user by email
 * 2. Verify password using bcrypt
 * 3. Issue a bearer token
 *
 * Unknown email and wrong password produce the same 401.
 */
use axum::{extract::State, Json};
use bcrypt::verify;

use crate::backend::auth::handlers::types::{LoginRequest, LoginResponse};
use crate::backend::auth::users::get_user_by_email;
use crate::backend::error::BackendError;
use crate::backend::middleware::ApiJson;
use crate::backend::server::state::AppState;

/// Login handler
///
/// # Errors
///
/// * `401 Unauthorized` - If user is not found or password is incorrect
/// * `500 Internal Server Error` - If the store or token encoding fails
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, BackendError> {
    let invalid = || BackendError::unauthorized("Invalid email or password");

    let user = get_user_by_email(&state.db_pool, &request.email)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Login for unknown email: {}", request.email);
            invalid()
        })?;

    if !verify(&request.password, &user.password_hash)? {
        tracing::warn!("Invalid password for user: {}", user.email);
        return Err(invalid());
    }

    let access_token = state.session_keys.issue(&user)?;
    tracing::info!("User logged in: {} ({})", user.email, user.role);

    Ok(Json(LoginResponse {
        access_token,
        user_role: user.role,
        user_id: user.id,
        user_name: user.name,
    }))
}
