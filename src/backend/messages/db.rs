//! Message queries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

const MESSAGE_SELECT: &str = r#"
    SELECT m.id, m.case_id, m.sender_id, s.name AS sender_name,
           m.recipient_id, r.name AS recipient_name,
           m.content, m.is_read, m.created_at
    FROM messages m
    JOIN users s ON s.id = m.sender_id
    JOIN users r ON r.id = m.recipient_id
"#;

/// Message row with both parties' names
#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: i64,
    pub case_id: i64,
    pub sender_id: i64,
    pub sender_name: String,
    pub recipient_id: i64,
    pub recipient_name: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-case summary of the caller's correspondence
#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct ConversationSummary {
    pub case_id: i64,
    pub case_number: String,
    pub case_title: String,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}

pub async fn insert_message<'e, E>(
    executor: E,
    case_id: i64,
    sender_id: i64,
    recipient_id: i64,
    content: &str,
) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO messages (case_id, sender_id, recipient_id, content, is_read, created_at)
        VALUES (?, ?, ?, ?, 0, ?)
        RETURNING id
        "#,
    )
    .bind(case_id)
    .bind(sender_id)
    .bind(recipient_id)
    .bind(content)
    .bind(Utc::now())
    .fetch_one(executor)
    .await
}

pub async fn get_message<'e, E>(executor: E, id: i64) -> Result<Option<MessageRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, MessageRecord>(&format!("{MESSAGE_SELECT} WHERE m.id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Messages newest first, optionally limited to one case
pub async fn list_messages<'e, E>(executor: E, case_id: Option<i64>) -> Result<Vec<MessageRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(MESSAGE_SELECT);
    if let Some(case_id) = case_id {
        query.push(" WHERE m.case_id = ").push_bind(case_id);
    }
    query.push(" ORDER BY m.created_at DESC, m.id DESC");

    query.build_query_as::<MessageRecord>().fetch_all(executor).await
}

pub async fn mark_read<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE messages SET is_read = 1 WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn unread_count<'e, E>(executor: E, user_id: i64) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE recipient_id = ? AND is_read = 0")
        .bind(user_id)
        .fetch_one(executor)
        .await
}

/// Cases the user has sent or received messages on, most recent first
pub async fn conversations<'e, E>(executor: E, user_id: i64) -> Result<Vec<ConversationSummary>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ConversationSummary>(
        r#"
        SELECT c.id AS case_id, c.case_number, c.title AS case_title,
               last.content AS last_message, last.created_at AS last_message_at,
               (SELECT COUNT(*) FROM messages u
                WHERE u.case_id = c.id AND u.recipient_id = ?1 AND u.is_read = 0) AS unread_count
        FROM cases c
        JOIN messages last ON last.id = (
            SELECT m.id FROM messages m
            WHERE m.case_id = c.id AND (m.sender_id = ?1 OR m.recipient_id = ?1)
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT 1
        )
        ORDER BY last.created_at DESC, last.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}
