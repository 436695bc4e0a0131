//! Case note queries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteExecutor;

const NOTE_SELECT: &str = r#"
    SELECT n.id, n.case_id, n.author_id, u.name AS author_name, n.content, n.is_private,
           n.created_at, n.updated_at
    FROM case_notes n
    JOIN users u ON u.id = n.author_id
"#;

/// Note row with its author's name
#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct NoteRecord {
    pub id: i64,
    pub case_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub content: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn insert_note<'e, E>(
    executor: E,
    case_id: i64,
    author_id: i64,
    content: &str,
    is_private: bool,
) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = Utc::now();
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO case_notes (case_id, author_id, content, is_private, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(case_id)
    .bind(author_id)
    .bind(content)
    .bind(is_private)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// A note, only if it belongs to `case_id`
pub async fn get_note<'e, E>(executor: E, case_id: i64, note_id: i64) -> Result<Option<NoteRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, NoteRecord>(&format!("{NOTE_SELECT} WHERE n.id = ? AND n.case_id = ?"))
        .bind(note_id)
        .bind(case_id)
        .fetch_optional(executor)
        .await
}

/// All notes of a case, newest first
pub async fn list_notes<'e, E>(executor: E, case_id: i64) -> Result<Vec<NoteRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, NoteRecord>(&format!(
        "{NOTE_SELECT} WHERE n.case_id = ? ORDER BY n.created_at DESC, n.id DESC"
    ))
    .bind(case_id)
    .fetch_all(executor)
    .await
}

/// Returns whether the note existed on that case
pub async fn update_note<'e, E>(
    executor: E,
    case_id: i64,
    note_id: i64,
    content: Option<&str>,
    is_private: Option<bool>,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE case_notes SET
            content = COALESCE(?, content),
            is_private = COALESCE(?, is_private),
            updated_at = ?
        WHERE id = ? AND case_id = ?
        "#,
    )
    .bind(content)
    .bind(is_private)
    .bind(Utc::now())
    .bind(note_id)
    .bind(case_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_note<'e, E>(executor: E, case_id: i64, note_id: i64) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM case_notes WHERE id = ? AND case_id = ?")
        .bind(note_id)
        .bind(case_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
