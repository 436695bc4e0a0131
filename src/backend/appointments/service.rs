/**
 * Appointment Workflow
 *
 * Creation, updates, cancellation and link regeneration all run here so
 * the confirmation side effects are applied the same way everywhere.
 *
 * # Meeting Links
 *
 * A VIDEO appointment that becomes CONFIRMED without a link gets one from
 * the injected `MeetingLinkProvider` inside the same transaction:
 * - success stores the link
 * - failure on the appointment's first attempt rolls the whole change
 *   back and answers 502; the attempt itself is still counted
 * - failure on a later attempt keeps the confirmation, flags the row for
 *   manual follow-up and returns a warning
 *
 * # Notifications
 *
 * Entering CONFIRMED notifies client and attorney after the commit. A
 * notifier failure is logged and never fails the request.
 */

use chrono::{DateTime, Datelike, Months, Utc};

use super::db;
use super::schedule::{ensure_not_past, validate_window};
use super::types::{AppointmentDraft, AppointmentFilter, AppointmentPatch, AppointmentRecord, NewAppointment};
use crate::backend::access::{self, Action};
use crate::backend::auth::users::get_user_by_id;
use crate::backend::cases::db as case_db;
use crate::backend::error::BackendError;
use crate::backend::integrations::{IntegrationError, MeetingRequest, Notice};
use crate::backend::middleware::AuthenticatedUser;
use crate::backend::realtime::GroupKey;
use crate::backend::server::config::begin_write;
use crate::backend::server::state::AppState;
use crate::shared::{AppointmentStatus, AppointmentType, RealtimeEvent, Role};
use sqlx::SqliteConnection;

pub const MANUAL_LINK_WARNING: &str =
    "Appointment confirmed, but the meeting link could not be generated. Please add one manually.";

/// Appointments a principal may list
///
/// Clients see their own, staff see everything, anybody else only the
/// appointments where they are the attorney.
pub fn visible_to(user: &AuthenticatedUser) -> AppointmentFilter {
    if access::permits(user, Action::ManageAppointments) {
        return AppointmentFilter::default();
    }
    match user.role {
        Role::Client => AppointmentFilter {
            client_id: Some(user.user_id),
            ..Default::default()
        },
        _ => AppointmentFilter {
            attorney_id: Some(user.user_id),
            ..Default::default()
        },
    }
}

/// Load an appointment the principal may access
pub async fn find_appointment(
    state: &AppState,
    user: &AuthenticatedUser,
    id: i64,
) -> Result<AppointmentRecord, BackendError> {
    let appointment = db::get_appointment(&state.db_pool, id)
        .await?
        .ok_or_else(|| BackendError::not_found("Appointment not found"))?;
    access::ensure_can_access_appointment(user, appointment.client_id, appointment.attorney_id)?;
    Ok(appointment)
}

/// Book an appointment
///
/// # Errors
///
/// * `Validation` - Start in the past, missing party, attorney not staff,
///   client not a CLIENT, or a case of another client
/// * `Integration` - A confirmed video call whose link could not be made
pub async fn create_appointment(
    state: &AppState,
    user: &AuthenticatedUser,
    draft: AppointmentDraft,
) -> Result<AppointmentRecord, BackendError> {
    access::require(user, Action::BookAppointment)?;
    ensure_not_past(draft.start_datetime, Utc::now())?;

    let new = resolve_parties(user, draft)?;

    let mut tx = begin_write(&state.db_pool).await?;

    ensure_attorney(&mut tx, new.attorney_id).await?;
    match get_user_by_id(&mut *tx, new.client_id).await? {
        Some(client) if client.role == Role::Client => {}
        _ => return Err(BackendError::validation("client_id must refer to a client")),
    }
    if let Some(case_id) = new.case_id {
        match case_db::get_case(&mut *tx, case_id).await? {
            Some(case) if case.client_id == new.client_id => {}
            _ => return Err(BackendError::validation("case_id does not belong to this client")),
        }
    }

    let id = db::insert_appointment(&mut *tx, &new).await?;
    let mut appointment = load(&mut tx, id).await?;

    if appointment.is_missing_link() {
        match request_link(state, &appointment).await {
            Ok(link) => {
                db::record_link(&mut *tx, id, &link).await?;
                appointment = load(&mut tx, id).await?;
            }
            Err(e) => {
                tracing::error!("Meeting link for new appointment failed: {}", e);
                return Err(e.into());
            }
        }
    }

    tx.commit().await?;
    tracing::info!(
        "Appointment {} booked by user {} ({} with attorney {})",
        appointment.id,
        user.user_id,
        appointment.status,
        appointment.attorney_id
    );

    if appointment.status == AppointmentStatus::Confirmed {
        notify_confirmed(state, &appointment).await;
    }
    Ok(appointment)
}

fn resolve_parties(user: &AuthenticatedUser, draft: AppointmentDraft) -> Result<NewAppointment, BackendError> {
    let staff_booking = access::permits(user, Action::ManageAppointments);
    let (client_id, attorney_id, status, location, meeting_link) = if staff_booking {
        let client_id = draft
            .client_id
            .ok_or_else(|| BackendError::validation("Missing required fields: client_id"))?;
        let status = draft.status.unwrap_or(AppointmentStatus::Confirmed);
        if !matches!(status, AppointmentStatus::Pending | AppointmentStatus::Confirmed) {
            return Err(BackendError::validation("New appointments start as pending or confirmed"));
        }
        (
            client_id,
            draft.attorney_id.unwrap_or(user.user_id),
            status,
            draft.location,
            draft.meeting_link,
        )
    } else {
        let attorney_id = draft
            .attorney_id
            .ok_or_else(|| BackendError::validation("Missing required fields: attorney_id"))?;
        (user.user_id, attorney_id, AppointmentStatus::Pending, None, None)
    };

    Ok(NewAppointment {
        title: draft.title,
        description: draft.description,
        start_datetime: draft.start_datetime,
        end_datetime: draft.end_datetime,
        duration: draft.duration,
        appointment_type: draft.appointment_type,
        location,
        meeting_link,
        status,
        client_id,
        attorney_id,
        case_id: draft.case_id,
        notes: draft.notes,
        created_by_id: user.user_id,
    })
}

/// Apply a partial update
///
/// Returns the updated appointment and, when the link had to be left for
/// manual follow-up, a warning for the caller.
///
/// # Errors
///
/// * `Forbidden` - A client touching staff fields or moving the status
///   anywhere but CANCELLED
/// * `Validation` - Bad window, start moved into the past, attorney not staff
/// * `Integration` - First link attempt failed; nothing was changed
pub async fn update_appointment(
    state: &AppState,
    user: &AuthenticatedUser,
    id: i64,
    patch: AppointmentPatch,
) -> Result<(AppointmentRecord, Option<String>), BackendError> {
    let before = find_appointment(state, user, id).await?;
    if patch.is_empty() {
        return Err(BackendError::validation("No changes provided"));
    }

    if !access::permits(user, Action::ManageAppointments) {
        let restricted = patch.staff_fields();
        if !restricted.is_empty() {
            return Err(BackendError::forbidden(format!("Only staff may change {}", restricted.join(", "))));
        }
        if patch.status.is_some_and(|s| s != AppointmentStatus::Cancelled) {
            return Err(BackendError::forbidden("Clients may only cancel appointments"));
        }
    }
    if patch.status == Some(AppointmentStatus::Cancelled) {
        ensure_cancellable(&before)?;
    }

    let duration = if patch.start_datetime.is_some() || patch.end_datetime.is_some() {
        let start = patch.start_datetime.unwrap_or(before.start_datetime);
        let end = patch.end_datetime.unwrap_or(before.end_datetime);
        if patch.start_datetime.is_some() {
            ensure_not_past(start, Utc::now())?;
        }
        Some(validate_window(start, end)?)
    } else {
        None
    };

    let mut tx = begin_write(&state.db_pool).await?;

    if let Some(attorney_id) = patch.attorney_id {
        ensure_attorney(&mut tx, attorney_id).await?;
    }
    if !db::update_appointment(&mut *tx, id, &patch, duration).await? {
        return Err(BackendError::not_found("Appointment not found"));
    }
    let mut after = load(&mut tx, id).await?;

    let was_confirmed_video =
        before.status == AppointmentStatus::Confirmed && before.appointment_type == AppointmentType::Video;
    let mut warning = None;

    if after.is_missing_link() && !was_confirmed_video {
        match request_link(state, &after).await {
            Ok(link) => db::record_link(&mut *tx, id, &link).await?,
            Err(e) if before.link_attempts == 0 => {
                tracing::error!("First meeting link attempt for appointment {} failed: {}", id, e);
                drop(tx);
                db::record_link_failure(&state.db_pool, id, false).await?;
                return Err(e.into());
            }
            Err(e) => {
                tracing::warn!("Meeting link for appointment {} failed again, flagged for manual follow-up: {}", id, e);
                db::record_link_failure(&mut *tx, id, true).await?;
                warning = Some(MANUAL_LINK_WARNING.to_string());
            }
        }
        after = load(&mut tx, id).await?;
    }

    tx.commit().await?;
    tracing::info!("Appointment {} updated by user {}", id, user.user_id);

    if before.status != AppointmentStatus::Confirmed && after.status == AppointmentStatus::Confirmed {
        notify_confirmed(state, &after).await;
    }
    Ok((after, warning))
}

/// Cancel an appointment the principal can access
pub async fn cancel_appointment(
    state: &AppState,
    user: &AuthenticatedUser,
    id: i64,
) -> Result<AppointmentRecord, BackendError> {
    let appointment = find_appointment(state, user, id).await?;
    ensure_cancellable(&appointment)?;

    let mut tx = begin_write(&state.db_pool).await?;
    db::set_status(&mut *tx, id, AppointmentStatus::Cancelled).await?;
    let cancelled = load(&mut tx, id).await?;
    tx.commit().await?;

    tracing::info!("Appointment {} cancelled by user {}", id, user.user_id);
    Ok(cancelled)
}

fn ensure_cancellable(appointment: &AppointmentRecord) -> Result<(), BackendError> {
    match appointment.status {
        AppointmentStatus::Cancelled => Err(BackendError::conflict("Appointment is already cancelled")),
        AppointmentStatus::Completed => Err(BackendError::conflict("Completed appointments cannot be cancelled")),
        _ => Ok(()),
    }
}

/// Ask the provider for a fresh link, replacing any existing one
///
/// A failure is counted and flags the appointment for manual follow-up
/// before the error is returned.
pub async fn regenerate_link(
    state: &AppState,
    user: &AuthenticatedUser,
    id: i64,
) -> Result<AppointmentRecord, BackendError> {
    access::require(user, Action::RegenerateMeetingLink)?;
    let appointment = find_appointment(state, user, id).await?;

    if appointment.appointment_type != AppointmentType::Video || appointment.status != AppointmentStatus::Confirmed {
        return Err(BackendError::validation(
            "Meeting links can only be generated for confirmed video appointments",
        ));
    }

    match request_link(state, &appointment).await {
        Ok(link) => db::record_link(&state.db_pool, id, &link).await?,
        Err(e) => {
            tracing::warn!("Regenerating the link of appointment {} failed: {}", id, e);
            db::record_link_failure(&state.db_pool, id, true).await?;
            return Err(e.into());
        }
    }

    tracing::info!("Meeting link of appointment {} regenerated by user {}", id, user.user_id);
    db::get_appointment(&state.db_pool, id)
        .await?
        .ok_or_else(|| BackendError::not_found("Appointment not found"))
}

/// `[first day, first day of next month)` around `now`
pub fn month_bounds(now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), BackendError> {
    let first = now
        .date_naive()
        .with_day(1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .ok_or_else(|| BackendError::internal("invalid calendar month"))?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| BackendError::internal("calendar overflow"))?;
    Ok((first.and_utc(), next.and_utc()))
}

async fn request_link(state: &AppState, appointment: &AppointmentRecord) -> Result<String, IntegrationError> {
    state
        .meeting_links
        .create_link(MeetingRequest {
            appointment_id: appointment.id,
            title: &appointment.title,
        })
        .await
}

async fn ensure_attorney(conn: &mut SqliteConnection, attorney_id: i64) -> Result<(), BackendError> {
    match get_user_by_id(&mut *conn, attorney_id).await? {
        Some(attorney) if attorney.role.is_staff() => Ok(()),
        _ => Err(BackendError::validation("Attorney must be a staff member")),
    }
}

async fn load(conn: &mut SqliteConnection, id: i64) -> Result<AppointmentRecord, BackendError> {
    db::get_appointment(&mut *conn, id)
        .await?
        .ok_or_else(|| BackendError::not_found("Appointment not found"))
}

async fn notify_confirmed(state: &AppState, appointment: &AppointmentRecord) {
    let when = appointment.start_datetime.format("%Y-%m-%d %H:%M UTC");
    let join = appointment
        .meeting_link
        .as_deref()
        .map(|link| format!("\nJoin online: {}", link))
        .unwrap_or_default();

    let parties = [
        (appointment.client_id, &appointment.client_email, &appointment.client_name),
        (appointment.attorney_id, &appointment.attorney_email, &appointment.attorney_name),
    ];
    for (user_id, email, name) in parties {
        let notice = Notice {
            to_email: email.clone(),
            to_name: name.clone(),
            subject: format!("Appointment confirmed: {}", appointment.title),
            body: format!(
                "Hello {},\n\nYour appointment \"{}\" is confirmed for {} ({} minutes).{}\n",
                name, appointment.title, when, appointment.duration, join
            ),
        };
        if let Err(e) = state.notifier.notify(notice).await {
            tracing::warn!("Confirmation notice for appointment {} to {} failed: {}", appointment.id, email, e);
        }

        state.case_groups.publish(
            GroupKey::User(user_id),
            RealtimeEvent::notification(
                "Appointment confirmed",
                format!("{} on {}", appointment.title, when),
                appointment.case_id,
            ),
        );
    }
}
