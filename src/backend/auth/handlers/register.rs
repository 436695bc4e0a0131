/**
 * Registration Handler
 *
 * `POST /auth/register`. Self-service registration always creates a
 * CLIENT; staff accounts are created through user administration.
 */
use axum::{extract::State, http::StatusCode, Json};

use crate::backend::auth::handlers::types::{RegisterRequest, RegisterResponse};
use crate::backend::auth::users::{create_user, NewUser};
use crate::backend::error::{conflict_on_unique, BackendError};
use crate::backend::middleware::ApiJson;
use crate::backend::server::state::AppState;
use crate::shared::Role;

/// Register a new client account
///
/// # Returns
///
/// 201 with `{msg, user_id}`
///
/// # Errors
///
/// * `400 Bad Request` - Missing field, malformed email or short password
/// * `409 Conflict` - Email already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), BackendError> {
    let registration = request.validate()?;
    tracing::info!("Registration request for: {}", registration.email);

    let password_hash = bcrypt::hash(&registration.password, state.config.bcrypt_cost)?;

    let user = create_user(
        &state.db_pool,
        NewUser {
            email: registration.email,
            password_hash,
            name: registration.name,
            phone: registration.phone,
            role: Role::Client,
            email_verified: false,
        },
    )
    .await
    .map_err(|e| conflict_on_unique(e, "Email already registered"))?;

    tracing::info!("User registered: {} (id {})", user.email, user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            msg: "User created successfully".to_string(),
            user_id: user.id,
        }),
    ))
}
