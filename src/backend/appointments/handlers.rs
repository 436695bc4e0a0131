/**
 * Appointment HTTP Handlers
 *
 * Thin wrappers over `service`; everything under `/api/appointments`.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;

use super::db;
use super::service::{self, month_bounds, visible_to};
use super::types::{
    AppointmentFilter, AppointmentList, AppointmentQuery, AppointmentRecord, AppointmentResponse, AppointmentStats,
    CreateAppointmentRequest, UpdateAppointmentRequest,
};
use crate::backend::access::{self, Action, STAFF};
use crate::backend::auth::users::list_users_with_roles;
use crate::backend::error::BackendError;
use crate::backend::middleware::{ApiJson, AuthUser};
use crate::backend::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct AttorneyEntry {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AttorneyList {
    pub attorneys: Vec<AttorneyEntry>,
}

fn respond(msg: &str, appointment: AppointmentRecord, warning: Option<String>) -> Json<AppointmentResponse> {
    Json(AppointmentResponse {
        msg: msg.to_string(),
        appointment,
        warning,
    })
}

/// Appointments visible to the caller (GET /api/appointments)
pub async fn list_appointments(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<AppointmentList>, BackendError> {
    let scope = visible_to(&user);
    let filter = AppointmentFilter {
        client_id: scope.client_id,
        attorney_id: scope.attorney_id,
        ..query.validate()?
    };
    Ok(Json(db::list_appointments(&state.db_pool, &filter).await?.into()))
}

/// Book an appointment (POST /api/appointments)
///
/// # Errors
///
/// * `400 Bad Request` - Missing fields, bad window, start in the past,
///   or parties with the wrong roles
/// * `502 Bad Gateway` - Confirmed video call without a generated link
pub async fn create_appointment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), BackendError> {
    let draft = request.validate()?;
    let appointment = service::create_appointment(&state, &user, draft).await?;
    Ok((
        StatusCode::CREATED,
        respond("Appointment created successfully", appointment, None),
    ))
}

/// One appointment (GET /api/appointments/{id})
pub async fn get_appointment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AppointmentRecord>, BackendError> {
    Ok(Json(service::find_appointment(&state, &user, id).await?))
}

/// Partial update (PUT /api/appointments/{id})
pub async fn update_appointment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentResponse>, BackendError> {
    let patch = request.validate()?;
    let (appointment, warning) = service::update_appointment(&state, &user, id, patch).await?;
    Ok(respond("Appointment updated successfully", appointment, warning))
}

/// Hard delete, staff only (DELETE /api/appointments/{id})
pub async fn delete_appointment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, BackendError> {
    access::require(&user, Action::DeleteAppointment)?;

    if !db::delete_appointment(&state.db_pool, id).await? {
        return Err(BackendError::not_found("Appointment not found"));
    }
    tracing::info!("Appointment {} deleted by user {}", id, user.user_id);
    Ok(Json(serde_json::json!({ "msg": "Appointment deleted successfully" })))
}

/// POST /api/appointments/{id}/cancel
pub async fn cancel_appointment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AppointmentResponse>, BackendError> {
    let appointment = service::cancel_appointment(&state, &user, id).await?;
    Ok(respond("Appointment cancelled successfully", appointment, None))
}

/// POST /api/appointments/{id}/regenerate-link
pub async fn regenerate_link(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AppointmentResponse>, BackendError> {
    let appointment = service::regenerate_link(&state, &user, id).await?;
    Ok(respond("Meeting link regenerated successfully", appointment, None))
}

/// Dashboard counters (GET /api/appointments/stats)
pub async fn appointment_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<AppointmentStats>, BackendError> {
    let scope = visible_to(&user);
    let now = Utc::now();
    let stats = db::appointment_stats(
        &state.db_pool,
        now,
        month_bounds(now)?,
        scope.client_id,
        scope.attorney_id,
    )
    .await?;
    Ok(Json(stats))
}

/// Staff who can be booked (GET /api/appointments/attorneys)
pub async fn list_attorneys(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<AttorneyList>, BackendError> {
    access::require(&user, Action::BookAppointment)?;

    let attorneys = list_users_with_roles(&state.db_pool, STAFF)
        .await?
        .into_iter()
        .map(|u| AttorneyEntry {
            id: u.id,
            name: u.name,
            email: u.email,
        })
        .collect();
    Ok(Json(AttorneyList { attorneys }))
}
