/**
 * Case Note Handlers
 *
 * Notes are written by staff only. Reading follows case visibility, and
 * private notes are removed before the response is built for anyone who
 * is not staff.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::db::{self, NoteRecord};
use crate::backend::access::{self, Action};
use crate::backend::cases::find_case;
use crate::backend::error::BackendError;
use crate::backend::middleware::{ApiJson, AuthUser};
use crate::backend::server::config::begin_write;
use crate::backend::server::state::AppState;
use crate::shared::error::require_fields;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateNoteRequest {
    pub content: Option<String>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNoteRequest {
    pub content: Option<String>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub msg: String,
    pub note: NoteRecord,
}

/// Notes visible to the caller (GET /cases/{id}/notes)
pub async fn list_notes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
) -> Result<Json<Vec<NoteRecord>>, BackendError> {
    let case = find_case(&state, case_id).await?;
    access::ensure_can_view_case(&user, case.client_id)?;

    let mut notes = db::list_notes(&state.db_pool, case_id).await?;
    notes.retain(|note| access::can_view_note(&user, case.client_id, note.is_private));

    Ok(Json(notes))
}

/// Add a note (POST /cases/{id}/notes); private unless stated otherwise
pub async fn create_note(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
    ApiJson(request): ApiJson<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), BackendError> {
    access::require(&user, Action::WriteNote)?;
    require_fields(&[("content", request.content.as_deref())])?;
    find_case(&state, case_id).await?;

    let content = request.content.unwrap_or_default();
    let is_private = request.is_private.unwrap_or(true);

    let mut tx = begin_write(&state.db_pool).await?;
    let note_id = db::insert_note(&mut *tx, case_id, user.user_id, content.trim(), is_private).await?;
    let note = db::get_note(&mut *tx, case_id, note_id)
        .await?
        .ok_or_else(|| BackendError::internal("note vanished after insert"))?;
    tx.commit().await?;

    let visibility = if is_private { "private" } else { "public" };
    tracing::info!("User {} added a {} note to case {}", user.user_id, visibility, case_id);

    Ok((
        StatusCode::CREATED,
        Json(NoteResponse {
            msg: "Note added successfully".to_string(),
            note,
        }),
    ))
}

/// Edit a note (PUT /cases/{id}/notes/{note_id})
pub async fn update_note(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((case_id, note_id)): Path<(i64, i64)>,
    ApiJson(request): ApiJson<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>, BackendError> {
    access::require(&user, Action::WriteNote)?;

    let content = request.content.as_deref().map(str::trim);
    if content == Some("") {
        return Err(BackendError::validation("Note content cannot be empty"));
    }

    let mut tx = begin_write(&state.db_pool).await?;
    if !db::update_note(&mut *tx, case_id, note_id, content, request.is_private).await? {
        return Err(BackendError::not_found("Note not found"));
    }
    let note = db::get_note(&mut *tx, case_id, note_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Note not found"))?;
    tx.commit().await?;

    tracing::info!("User {} updated note {} on case {}", user.user_id, note_id, case_id);
    Ok(Json(NoteResponse {
        msg: "Note updated successfully".to_string(),
        note,
    }))
}

/// Remove a note (DELETE /cases/{id}/notes/{note_id})
pub async fn delete_note(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((case_id, note_id)): Path<(i64, i64)>,
) -> Result<Json<serde_json::Value>, BackendError> {
    access::require(&user, Action::WriteNote)?;

    if !db::delete_note(&state.db_pool, case_id, note_id).await? {
        return Err(BackendError::not_found("Note not found"));
    }

    tracing::info!("User {} deleted note {} on case {}", user.user_id, note_id, case_id);
    Ok(Json(serde_json::json!({ "msg": "Note deleted successfully" })))
}
