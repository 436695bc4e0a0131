/**
 * Admin HTTP Handlers
 *
 * User management and system counters for SUPER_ADMIN, plus the staff
 * roster used when assigning cases. An administrator can never delete
 * their own account or change their own role here.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::collections::BTreeMap;

use super::types::{
    AppointmentCounts, CaseCounts, CreateUserRequest, SystemStats, UpdateUserRequest, UserCounts, UserListQuery,
    UserListResponse, UserResponse,
};
use crate::backend::access::{self, Action, STAFF};
use crate::backend::auth::users::{self, NewUser, UserFilter, UserProfile, UserSummary};
use crate::backend::cases::db::case_statistics;
use crate::backend::error::{conflict_on_reference, conflict_on_unique, BackendError};
use crate::backend::middleware::{ApiJson, AuthUser};
use crate::backend::server::state::AppState;
use crate::shared::Role;

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListResponse>, BackendError> {
    access::require(&user, Action::ManageUsers)?;

    let role = match query.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => Some(raw.parse::<Role>()?),
        None => None,
    };
    let filter = UserFilter {
        role,
        search: query.search,
    };

    let users: Vec<UserProfile> = users::list_users(&state.db_pool, &filter)
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();
    Ok(Json(UserListResponse {
        total: users.len(),
        users,
    }))
}

/// GET /admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserProfile>, BackendError> {
    access::require(&user, Action::ManageUsers)?;
    let found = users::get_user_by_id(&state.db_pool, user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;
    Ok(Json(found.into()))
}

/// Create an account with any role (POST /admin/users)
///
/// # Errors
///
/// * `400 Bad Request` - Missing field, malformed email, short password
///   or unknown role
/// * `409 Conflict` - Email already registered
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), BackendError> {
    access::require(&user, Action::ManageUsers)?;
    let account = request.validate()?;

    let password_hash = bcrypt::hash(&account.password, state.config.bcrypt_cost)?;
    let created = users::create_user(
        &state.db_pool,
        NewUser {
            email: account.email,
            password_hash,
            name: account.name,
            phone: account.phone,
            role: account.role,
            email_verified: true,
        },
    )
    .await
    .map_err(|e| conflict_on_unique(e, "Email already registered"))?;

    tracing::info!("Admin {} created user {} as {}", user.user_id, created.id, created.role);
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            msg: "User created successfully".to_string(),
            user: created.into(),
        }),
    ))
}

/// PUT /admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<i64>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, BackendError> {
    access::require(&user, Action::ManageUsers)?;
    let mut update = request.validate()?;

    if update.changes.role.is_some_and(|role| role != user.role) {
        access::ensure_not_self(&user, user_id, "change your own role")?;
    }
    if let Some(password) = update.password.take() {
        update.changes.password_hash = Some(bcrypt::hash(&password, state.config.bcrypt_cost)?);
    }

    let updated = users::update_user(&state.db_pool, user_id, &update.changes)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already registered"))?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    tracing::info!("Admin {} updated user {}", user.user_id, user_id);
    Ok(Json(UserResponse {
        msg: "User updated successfully".to_string(),
        user: updated.into(),
    }))
}

/// DELETE /admin/users/{id}
///
/// # Errors
///
/// * `403 Forbidden` - Deleting one's own account
/// * `409 Conflict` - Cases, messages or appointments still reference the user
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<serde_json::Value>, BackendError> {
    access::require(&user, Action::ManageUsers)?;
    access::ensure_not_self(&user, user_id, "delete your own account")?;

    let deleted = users::delete_user(&state.db_pool, user_id)
        .await
        .map_err(|e| conflict_on_reference(e, "User still has cases, messages or appointments"))?;
    if !deleted {
        return Err(BackendError::not_found("User not found"));
    }

    tracing::info!("Admin {} deleted user {}", user.user_id, user_id);
    Ok(Json(serde_json::json!({ "msg": "User deleted successfully" })))
}

/// Flip the verification flag (POST /admin/users/{id}/toggle-status)
pub async fn toggle_user_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, BackendError> {
    access::require(&user, Action::ManageUsers)?;

    let toggled = users::toggle_verified(&state.db_pool, user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    let msg = if toggled.email_verified {
        "User activated"
    } else {
        "User deactivated"
    };
    tracing::info!("Admin {}: {} ({})", user.user_id, msg, user_id);
    Ok(Json(UserResponse {
        msg: msg.to_string(),
        user: toggled.into(),
    }))
}

/// System-wide counters (GET /admin/stats)
pub async fn system_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<SystemStats>, BackendError> {
    access::require(&user, Action::ViewSystemStats)?;
    let pool = &state.db_pool;

    let role_counts: Vec<(Role, i64)> = sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role")
        .fetch_all(pool)
        .await?;
    let mut by_role: BTreeMap<String, i64> = Role::ALL.iter().map(|r| (r.to_string(), 0)).collect();
    for (role, count) in &role_counts {
        by_role.insert(role.to_string(), *count);
    }

    let cases = case_statistics(pool, None, None).await?;

    let (total, upcoming): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(CASE WHEN start_datetime > ? AND status IN ('pending', 'confirmed') THEN 1 ELSE 0 END), 0)
        FROM appointments
        "#,
    )
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(Json(SystemStats {
        users: UserCounts {
            total: role_counts.iter().map(|(_, n)| n).sum(),
            by_role,
        },
        cases: CaseCounts {
            total: cases.total,
            by_status: cases.by_status,
        },
        appointments: AppointmentCounts { total, upcoming },
    }))
}

/// Staff who can be assigned cases (GET /admin/case-managers)
pub async fn list_case_managers(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<UserSummary>>, BackendError> {
    access::require(&user, Action::ListCaseManagers)?;
    Ok(Json(users::list_users_with_roles(&state.db_pool, STAFF).await?))
}
