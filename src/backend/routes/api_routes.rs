/**
 * API Route Tables
 *
 * Public routes need no token. Everything in `protected_routes` sits
 * behind `require_auth`, so handlers there can rely on the `AuthUser`
 * extractor; role and ownership checks happen inside the handlers.
 *
 * # Routes
 *
 * ## Public
 * - `GET /health`
 * - `POST /auth/register`, `POST /auth/login`
 * - `GET /ws` (authenticates its own handshake)
 *
 * ## Cases
 * - `/cases`, `/cases/statistics`, `/cases/{id}`
 * - `/cases/admin`, `/cases/admin/filter`, `/cases/admin/assigned/{user_id}`,
 *   `/cases/admin/{id}`
 * - `/cases/{id}/notes`, `/cases/{id}/messages`, `/cases/{id}/documents`,
 *   `/cases/{id}/deadlines`
 *
 * ## Messages
 * - `/messages/{id}/read`, `/messages/conversations`,
 *   `/messages/unread-count`, `/admin/messages`
 *
 * ## Appointments
 * - `/api/appointments` and its sub-resources
 *
 * ## Administration
 * - `/admin/users`, `/admin/stats`, `/admin/case-managers`
 */

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};

use crate::backend::admin::handlers as admin;
use crate::backend::appointments::handlers as appointments;
use crate::backend::auth::handlers::{get_me, login, register};
use crate::backend::cases::handlers as cases;
use crate::backend::deadlines;
use crate::backend::documents;
use crate::backend::messages::handlers as messages;
use crate::backend::middleware::require_auth;
use crate::backend::notes::handlers as notes;
use crate::backend::realtime::handle_socket_upgrade;
use crate::backend::server::state::AppState;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Routes reachable without a bearer token
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/ws", get(handle_socket_upgrade))
}

/// Routes behind the authentication middleware
pub fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .merge(case_routes())
        .merge(message_routes())
        .merge(appointment_routes())
        .merge(admin_routes())
        .route_layer(from_fn_with_state(state, require_auth))
}

fn case_routes() -> Router<AppState> {
    Router::new()
        .route("/cases", get(cases::list_my_cases).post(cases::create_case))
        .route("/cases/", get(cases::list_my_cases).post(cases::create_case))
        .route("/cases/statistics", get(cases::case_statistics))
        .route("/cases/admin", get(cases::admin_list_cases))
        .route("/cases/admin/filter", get(cases::admin_list_cases))
        .route("/cases/admin/assigned/{user_id}", get(cases::admin_assigned_cases))
        .route(
            "/cases/admin/{id}",
            get(cases::admin_get_case)
                .put(cases::admin_update_case)
                .delete(cases::admin_close_case),
        )
        .route("/cases/{id}", get(cases::get_case))
        .route("/cases/{id}/notes", get(notes::list_notes).post(notes::create_note))
        .route("/cases/{id}/notes/", get(notes::list_notes).post(notes::create_note))
        .route(
            "/cases/{id}/notes/{note_id}",
            put(notes::update_note).delete(notes::delete_note),
        )
        .route(
            "/cases/{id}/messages",
            get(messages::list_case_messages).post(messages::send_message),
        )
        .route(
            "/cases/{id}/documents",
            get(documents::list_documents).post(documents::register_document),
        )
        .route(
            "/cases/{id}/deadlines",
            get(deadlines::list_deadlines).post(deadlines::create_deadline),
        )
        .route("/cases/{id}/deadlines/{deadline_id}", put(deadlines::update_deadline))
}

fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages/{id}/read", put(messages::mark_message_read))
        .route("/messages/conversations", get(messages::list_conversations))
        .route("/messages/unread-count", get(messages::unread_count))
        .route("/admin/messages", get(messages::admin_list_messages))
}

fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route("/api/appointments/stats", get(appointments::appointment_stats))
        .route("/api/appointments/attorneys", get(appointments::list_attorneys))
        .route(
            "/api/appointments/{id}",
            get(appointments::get_appointment)
                .put(appointments::update_appointment)
                .delete(appointments::delete_appointment),
        )
        .route("/api/appointments/{id}/cancel", post(appointments::cancel_appointment))
        .route("/api/appointments/{id}/regenerate-link", post(appointments::regenerate_link))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/admin/users/{id}",
            get(admin::get_user).put(admin::update_user).delete(admin::delete_user),
        )
        .route("/admin/users/{id}/toggle-status", post(admin::toggle_user_status))
        .route("/admin/stats", get(admin::system_stats))
        .route("/admin/case-managers", get(admin::list_case_managers))
}
