/**
 * Case Deadlines
 *
 * Dated reminders on a case. Case viewers read them in due-date order;
 * staff create and edit them.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;

use crate::backend::access::{self, Action};
use crate::backend::appointments::schedule::parse_timestamp;
use crate::backend::cases::find_case;
use crate::backend::error::BackendError;
use crate::backend::middleware::{ApiJson, AuthUser};
use crate::backend::server::config::begin_write;
use crate::backend::server::state::AppState;
use crate::shared::error::require_fields;

const DEADLINE_COLUMNS: &str = "id, case_id, title, due_date, is_completed, created_at";

#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct DeadlineRecord {
    pub id: i64,
    pub case_id: i64,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeadlineRequest {
    pub title: Option<String>,
    pub due_date: Option<String>,
    pub is_completed: Option<bool>,
}

async fn fetch_deadline<'e, E>(executor: E, case_id: i64, id: i64) -> Result<Option<DeadlineRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, DeadlineRecord>(&format!(
        "SELECT {DEADLINE_COLUMNS} FROM deadlines WHERE id = ? AND case_id = ?"
    ))
    .bind(id)
    .bind(case_id)
    .fetch_optional(executor)
    .await
}

/// Deadlines of a case, soonest first (GET /cases/{id}/deadlines)
pub async fn list_deadlines(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
) -> Result<Json<Vec<DeadlineRecord>>, BackendError> {
    let case = find_case(&state, case_id).await?;
    access::ensure_can_view_case(&user, case.client_id)?;

    let deadlines = sqlx::query_as::<_, DeadlineRecord>(&format!(
        "SELECT {DEADLINE_COLUMNS} FROM deadlines WHERE case_id = ? ORDER BY due_date ASC, id ASC"
    ))
    .bind(case_id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(deadlines))
}

/// Add a deadline (POST /cases/{id}/deadlines)
pub async fn create_deadline(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(case_id): Path<i64>,
    ApiJson(request): ApiJson<DeadlineRequest>,
) -> Result<(StatusCode, Json<DeadlineRecord>), BackendError> {
    access::require(&user, Action::ManageDeadlines)?;
    require_fields(&[
        ("title", request.title.as_deref()),
        ("due_date", request.due_date.as_deref()),
    ])?;
    let due_date = parse_timestamp("due_date", request.due_date.as_deref().unwrap_or_default())?;
    find_case(&state, case_id).await?;

    let deadline = sqlx::query_as::<_, DeadlineRecord>(&format!(
        r#"
        INSERT INTO deadlines (case_id, title, due_date, is_completed, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {DEADLINE_COLUMNS}
        "#
    ))
    .bind(case_id)
    .bind(request.title.as_deref().map(str::trim))
    .bind(due_date)
    .bind(request.is_completed.unwrap_or(false))
    .bind(Utc::now())
    .fetch_one(&state.db_pool)
    .await?;

    tracing::info!("Deadline '{}' added to case {} by user {}", deadline.title, case_id, user.user_id);
    Ok((StatusCode::CREATED, Json(deadline)))
}

/// Edit or complete a deadline (PUT /cases/{id}/deadlines/{deadline_id})
pub async fn update_deadline(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((case_id, deadline_id)): Path<(i64, i64)>,
    ApiJson(request): ApiJson<DeadlineRequest>,
) -> Result<Json<DeadlineRecord>, BackendError> {
    access::require(&user, Action::ManageDeadlines)?;

    let title = request.title.as_deref().map(str::trim);
    if title == Some("") {
        return Err(BackendError::validation("Deadline title cannot be empty"));
    }
    let due_date = request
        .due_date
        .as_deref()
        .map(|raw| parse_timestamp("due_date", raw))
        .transpose()?;

    let mut tx = begin_write(&state.db_pool).await?;
    let result = sqlx::query(
        r#"
        UPDATE deadlines SET
            title = COALESCE(?, title),
            due_date = COALESCE(?, due_date),
            is_completed = COALESCE(?, is_completed)
        WHERE id = ? AND case_id = ?
        "#,
    )
    .bind(title)
    .bind(due_date)
    .bind(request.is_completed)
    .bind(deadline_id)
    .bind(case_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(BackendError::not_found("Deadline not found"));
    }
    let deadline = fetch_deadline(&mut *tx, case_id, deadline_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Deadline not found"))?;
    tx.commit().await?;

    tracing::info!("Deadline {} on case {} updated by user {}", deadline_id, case_id, user.user_id);
    Ok(Json(deadline))
}
