/**
 * Case Documents
 *
 * Metadata of files attached to a case or to one of its messages. The
 * bytes themselves live in external storage; `file_path` points there.
 * Anyone who may view the case may list and register documents.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;

use crate::backend::access;
use crate::backend::cases::find_case;
use crate::backend::error::BackendError;
use crate::backend::middleware::{ApiJson, AuthUser};
use crate::backend::server::config::begin_write;
use crate::backend::server::state::AppState;
use crate::shared::error::require_fields;

const DOCUMENT_SELECT: &str = r#"
    SELECT d.id, d.case_id, d.message_id, d.uploaded_by_id, u.name AS uploaded_by_name,
           d.filename, d.file_path, d.file_size, d.mime_type, d.created_at
    FROM documents d
    JOIN users u ON u.id = d.uploaded_by_id
"#;

#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct DocumentRecord {
    pub id: i64,
    pub case_id: Option<i64>,
    pub message_id: Option<i64>,
    pub uploaded_by_id: i64,
    pub uploaded_by_name: String,
    pub filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterDocumentRequest {
    pub filename: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub message_id: Option<i64>,
}

pub async fn list_case_documents<'e, E>(executor: E, case_id: i64) -> Result<Vec<DocumentRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, DocumentRecord>(&format!(
        "{DOCUMENT_SELECT} WHERE d.case_id = ? ORDER BY d.created_at DESC, d.id DESC"
    ))
    .bind(case_id)
    .fetch_all(executor)
    .await
}

/// Documents of a case (GET /cases/{id}/documents)
pub async fn list_documents(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
) -> Result<Json<Vec<DocumentRecord>>, BackendError> {
    let case = find_case(&state, case_id).await?;
    access::ensure_can_view_case(&user, case.client_id)?;
    Ok(Json(list_case_documents(&state.db_pool, case_id).await?))
}

/// Register an uploaded file (POST /cases/{id}/documents)
///
/// # Errors
///
/// * `400 Bad Request` - Missing metadata, negative size, or a
///   `message_id` from another case
pub async fn register_document(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
    ApiJson(request): ApiJson<RegisterDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentRecord>), BackendError> {
    require_fields(&[
        ("filename", request.filename.as_deref()),
        ("file_path", request.file_path.as_deref()),
        ("mime_type", request.mime_type.as_deref()),
    ])?;
    let file_size = request
        .file_size
        .ok_or_else(|| BackendError::validation("Missing required fields: file_size"))?;
    if file_size < 0 {
        return Err(BackendError::validation("file_size cannot be negative"));
    }

    let case = find_case(&state, case_id).await?;
    access::ensure_can_view_case(&user, case.client_id)?;

    let mut tx = begin_write(&state.db_pool).await?;

    if let Some(message_id) = request.message_id {
        let owner: Option<i64> = sqlx::query_scalar("SELECT case_id FROM messages WHERE id = ?")
            .bind(message_id)
            .fetch_optional(&mut *tx)
            .await?;
        if owner != Some(case_id) {
            return Err(BackendError::validation("message_id does not belong to this case"));
        }
    }

    let document_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO documents (case_id, message_id, uploaded_by_id, filename, file_path, file_size, mime_type, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(case_id)
    .bind(request.message_id)
    .bind(user.user_id)
    .bind(request.filename.as_deref().map(str::trim))
    .bind(request.file_path.as_deref().map(str::trim))
    .bind(file_size)
    .bind(request.mime_type.as_deref().map(str::trim))
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    let document = sqlx::query_as::<_, DocumentRecord>(&format!("{DOCUMENT_SELECT} WHERE d.id = ?"))
        .bind(document_id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("Document {} registered on case {} by user {}", document.filename, case_id, user.user_id);
    Ok((StatusCode::CREATED, Json(document)))
}
