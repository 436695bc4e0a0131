/**
 * Case HTTP Handlers
 *
 * Client-facing endpoints live under `/cases`, staff endpoints under
 * `/cases/admin`. Staff updates run in one transaction: the case is
 * re-read inside it, the status move is checked against the configured
 * policy, the assignee is checked to be staff, and only then is the row
 * written. Realtime events go out after the commit.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::db;
use super::types::{
    CaseChanges, CaseFilter, CaseFilterQuery, CaseRecord, CaseResponse, CaseStatistics, CreateCaseRequest,
    UpdateCaseRequest,
};
use crate::backend::access::{self, Action};
use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::BackendError;
use crate::backend::middleware::{ApiJson, AuthUser};
use crate::backend::realtime::GroupKey;
use crate::backend::server::config::begin_write;
use crate::backend::server::state::AppState;
use crate::shared::{CaseStatus, RealtimeEvent};

/// Load a case or answer 404
pub async fn find_case(state: &AppState, case_id: i64) -> Result<CaseRecord, BackendError> {
    db::get_case(&state.db_pool, case_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Case not found"))
}

/// Submit a new case (POST /cases)
///
/// # Errors
///
/// * `400 Bad Request` - Missing title, category or description, or an
///   unknown category/priority
pub async fn create_case(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateCaseRequest>,
) -> Result<(StatusCode, Json<CaseResponse>), BackendError> {
    access::require(&user, Action::SubmitCase)?;
    let new_case = request.validate(user.user_id)?;

    let case = db::insert_case(&state.db_pool, &state.config.case_id_prefix, new_case).await?;

    Ok((
        StatusCode::CREATED,
        Json(CaseResponse {
            msg: "Case submitted successfully".to_string(),
            case,
        }),
    ))
}

/// The principal's own cases, newest first (GET /cases)
pub async fn list_my_cases(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CaseRecord>>, BackendError> {
    let filter = CaseFilter {
        client_id: Some(user.user_id),
        ..Default::default()
    };
    Ok(Json(db::list_cases(&state.db_pool, &filter).await?))
}

/// One case, for its client or staff (GET /cases/{id})
pub async fn get_case(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
) -> Result<Json<CaseRecord>, BackendError> {
    let case = find_case(&state, case_id).await?;
    access::ensure_can_view_case(&user, case.client_id)?;
    Ok(Json(case))
}

/// Case counts (GET /cases/statistics)
///
/// Staff see every case plus `my_cases`; everybody else only their own.
pub async fn case_statistics(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CaseStatistics>, BackendError> {
    let stats = if access::permits(&user, Action::ListAllCases) {
        db::case_statistics(&state.db_pool, None, Some(user.user_id)).await?
    } else {
        db::case_statistics(&state.db_pool, Some(user.user_id), None).await?
    };
    Ok(Json(stats))
}

/// All cases with optional filters (GET /cases/admin, /cases/admin/filter)
pub async fn admin_list_cases(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<CaseFilterQuery>,
) -> Result<Json<Vec<CaseRecord>>, BackendError> {
    access::require(&user, Action::ListAllCases)?;
    let filter = query.validate()?;
    Ok(Json(db::list_cases(&state.db_pool, &filter).await?))
}

/// Cases assigned to one staff member (GET /cases/admin/assigned/{user_id})
pub async fn admin_assigned_cases(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(assignee_id): Path<i64>,
) -> Result<Json<Vec<CaseRecord>>, BackendError> {
    access::require(&user, Action::ListAllCases)?;
    let filter = CaseFilter {
        assigned_to_id: Some(assignee_id),
        ..Default::default()
    };
    Ok(Json(db::list_cases(&state.db_pool, &filter).await?))
}

/// Any case, staff view (GET /cases/admin/{id})
pub async fn admin_get_case(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
) -> Result<Json<CaseRecord>, BackendError> {
    access::require(&user, Action::ListAllCases)?;
    Ok(Json(find_case(&state, case_id).await?))
}

/// Update status, priority or assignee (PUT /cases/admin/{id})
///
/// # Errors
///
/// * `400 Bad Request` - Unknown enum value, nothing to change, or an
///   assignee that is not staff
/// * `404 Not Found` - No such case
/// * `409 Conflict` - Status move refused by the strict policy
pub async fn admin_update_case(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
    ApiJson(request): ApiJson<UpdateCaseRequest>,
) -> Result<Json<CaseResponse>, BackendError> {
    access::require(&user, Action::UpdateCase)?;
    let changes = request.validate()?;
    if changes.is_empty() {
        return Err(BackendError::validation("Nothing to update"));
    }

    let mut tx = begin_write(&state.db_pool).await?;

    let current = db::get_case(&mut *tx, case_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Case not found"))?;

    if let Some(to) = changes.status {
        state.config.case_status_policy.check(case_id, current.status, to)?;
    }

    if let Some(Some(assignee_id)) = changes.assigned_to_id {
        let assignee = get_user_by_id(&mut *tx, assignee_id).await?;
        if !assignee.map(|a| a.role.is_staff()).unwrap_or(false) {
            tracing::warn!("Refused assigning case {} to non-staff user {}", case_id, assignee_id);
            return Err(BackendError::validation("Cases can only be assigned to staff members"));
        }
    }

    let case = db::update_case(&mut tx, case_id, &changes)
        .await?
        .ok_or_else(|| BackendError::not_found("Case not found"))?;

    tx.commit().await?;
    tracing::info!("Case {} updated by user {}", case.case_number, user.user_id);

    if case.status != current.status {
        announce_status(&state, &case);
    }

    Ok(Json(CaseResponse {
        msg: "Case updated successfully".to_string(),
        case,
    }))
}

/// Soft delete: the case moves to CLOSED (DELETE /cases/admin/{id})
pub async fn admin_close_case(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
) -> Result<Json<CaseResponse>, BackendError> {
    access::require(&user, Action::CloseCase)?;

    let mut tx = begin_write(&state.db_pool).await?;
    let current = db::get_case(&mut *tx, case_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Case not found"))?;

    state.config.case_status_policy.check(case_id, current.status, CaseStatus::Closed)?;

    let changes = CaseChanges {
        status: Some(CaseStatus::Closed),
        ..Default::default()
    };
    let case = db::update_case(&mut tx, case_id, &changes)
        .await?
        .ok_or_else(|| BackendError::not_found("Case not found"))?;
    tx.commit().await?;

    tracing::info!("Case {} closed by user {}", case.case_number, user.user_id);
    if current.status != CaseStatus::Closed {
        announce_status(&state, &case);
    }

    Ok(Json(CaseResponse {
        msg: "Case closed".to_string(),
        case,
    }))
}

fn announce_status(state: &AppState, case: &CaseRecord) {
    state.case_groups.publish(
        GroupKey::Case(case.id),
        RealtimeEvent::case_update(case.id, case.status.as_str()),
    );
    state.case_groups.publish(
        GroupKey::User(case.client_id),
        RealtimeEvent::notification(
            "Case status updated",
            format!("Case {} is now {}", case.case_number, case.status),
            Some(case.id),
        ),
    );
}
