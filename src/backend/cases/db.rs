/**
 * Case Database Operations
 *
 * # Case numbers
 *
 * `case_sequences` holds one counter row per (prefix, year). Creating a
 * case bumps that row with a single upsert as the first statement of the
 * creation transaction, which takes SQLite's write lock, so concurrent
 * creators queue on the lock instead of reading the same "last" value.
 * The first case of a year seeds the counter from any existing case
 * numbers, and a counter that has fallen behind the table is pulled
 * forward the same way.
 *
 * `cases.case_number` is UNIQUE as well; a collision rolls the attempt
 * back and retries a bounded number of times.
 */

use super::types::{CaseChanges, CaseFilter, CaseRecord, CaseStatistics, NewCase};
use crate::backend::error::is_unique_violation;
use crate::backend::server::config::begin_write;
use crate::shared::{CaseNumber, CaseStatus, Priority};
use chrono::{Datelike, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};
use std::collections::BTreeMap;

const MAX_NUMBER_ATTEMPTS: usize = 5;

const CASE_SELECT: &str = r#"
    SELECT c.id, c.case_number, c.title, c.description, c.category, c.status, c.priority,
           c.client_id, cl.name AS client_name,
           c.assigned_to_id, st.name AS assigned_to_name,
           c.created_at, c.updated_at
    FROM cases c
    JOIN users cl ON cl.id = c.client_id
    LEFT JOIN users st ON st.id = c.assigned_to_id
"#;

/// Reserve the next sequence number for `prefix` in `year`
///
/// Must run inside the transaction that inserts the case.
pub async fn next_sequence<'e, E>(executor: E, prefix: &str, year: i32) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let head = CaseNumber::year_head(prefix, year);
    // '.' sorts right after '-', bounding the index range to this year's numbers
    let upper = format!("{}.", head.trim_end_matches('-'));

    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO case_sequences (prefix, year, last_value)
        VALUES (?1, ?2, (
            SELECT COALESCE(MAX(CAST(substr(case_number, ?3) AS INTEGER)), 0) + 1
            FROM cases
            WHERE case_number > ?4 AND case_number < ?5
        ))
        ON CONFLICT (prefix, year) DO UPDATE
            SET last_value = MAX(case_sequences.last_value + 1, excluded.last_value)
        RETURNING last_value
        "#,
    )
    .bind(prefix)
    .bind(year)
    .bind(head.len() as i64 + 1)
    .bind(&head)
    .bind(&upper)
    .fetch_one(executor)
    .await
}

async fn insert_row(conn: &mut SqliteConnection, number: &CaseNumber, new_case: &NewCase) -> Result<i64, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO cases (case_number, title, description, category, status, priority, client_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(number.to_string())
    .bind(&new_case.title)
    .bind(&new_case.description)
    .bind(new_case.category)
    .bind(CaseStatus::Pending)
    .bind(new_case.priority)
    .bind(new_case.client_id)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await
}

/// Create a case with the next number of the current UTC year
///
/// # Errors
///
/// Returns the store error of the last attempt once the retries for
/// colliding case numbers are used up.
pub async fn insert_case(pool: &SqlitePool, prefix: &str, new_case: NewCase) -> Result<CaseRecord, sqlx::Error> {
    let year = Utc::now().year();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let mut tx = begin_write(pool).await?;

        let sequence = next_sequence(&mut *tx, prefix, year).await?;
        let number = CaseNumber::new(prefix, year, u32::try_from(sequence).unwrap_or(u32::MAX));

        match insert_row(&mut tx, &number, &new_case).await {
            Ok(id) => {
                let record = get_case(&mut *tx, id).await?.ok_or(sqlx::Error::RowNotFound)?;
                tx.commit().await?;
                tracing::info!("Created case {} for client {}", record.case_number, record.client_id);
                return Ok(record);
            }
            Err(e) if is_unique_violation(&e) && attempt < MAX_NUMBER_ATTEMPTS => {
                tracing::warn!("Case number {} already taken (attempt {}), retrying", number, attempt);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Get case by ID
pub async fn get_case<'e, E>(executor: E, id: i64) -> Result<Option<CaseRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, CaseRecord>(&format!("{CASE_SELECT} WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// List cases matching the filter, newest first
pub async fn list_cases<'e, E>(executor: E, filter: &CaseFilter) -> Result<Vec<CaseRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(CASE_SELECT);
    query.push(" WHERE 1 = 1");

    if let Some(status) = filter.status {
        query.push(" AND c.status = ").push_bind(status);
    }
    if let Some(category) = filter.category {
        query.push(" AND c.category = ").push_bind(category);
    }
    if let Some(priority) = filter.priority {
        query.push(" AND c.priority = ").push_bind(priority);
    }
    if let Some(assignee) = filter.assigned_to_id {
        query.push(" AND c.assigned_to_id = ").push_bind(assignee);
    }
    if let Some(client) = filter.client_id {
        query.push(" AND c.client_id = ").push_bind(client);
    }
    query.push(" ORDER BY c.created_at DESC, c.id DESC");

    query.build_query_as::<CaseRecord>().fetch_all(executor).await
}

/// Apply staff changes and return the updated case
pub async fn update_case(
    conn: &mut SqliteConnection,
    id: i64,
    changes: &CaseChanges,
) -> Result<Option<CaseRecord>, sqlx::Error> {
    let (assign, assignee) = match changes.assigned_to_id {
        Some(target) => (true, target),
        None => (false, None),
    };

    let result = sqlx::query(
        r#"
        UPDATE cases SET
            status = COALESCE(?, status),
            priority = COALESCE(?, priority),
            assigned_to_id = CASE WHEN ? THEN ? ELSE assigned_to_id END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(changes.status)
    .bind(changes.priority)
    .bind(assign)
    .bind(assignee)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_case(&mut *conn, id).await
}

/// Counts by status and priority, optionally restricted to one client
pub async fn case_statistics(
    pool: &SqlitePool,
    client_id: Option<i64>,
    assignee_id: Option<i64>,
) -> Result<CaseStatistics, sqlx::Error> {
    let status_counts: Vec<(CaseStatus, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM cases WHERE (?1 IS NULL OR client_id = ?1) GROUP BY status",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    let priority_counts: Vec<(Priority, i64)> = sqlx::query_as(
        "SELECT priority, COUNT(*) FROM cases WHERE (?1 IS NULL OR client_id = ?1) GROUP BY priority",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    let my_cases = match assignee_id {
        Some(staff_id) => Some(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cases WHERE assigned_to_id = ?")
                .bind(staff_id)
                .fetch_one(pool)
                .await?,
        ),
        None => None,
    };

    let mut by_status: BTreeMap<String, i64> = CaseStatus::ALL.iter().map(|s| (s.to_string(), 0)).collect();
    for (status, count) in &status_counts {
        by_status.insert(status.to_string(), *count);
    }

    let mut by_priority: BTreeMap<String, i64> = Priority::ALL.iter().map(|p| (p.to_string(), 0)).collect();
    for (priority, count) in priority_counts {
        by_priority.insert(priority.to_string(), count);
    }

    Ok(CaseStatistics {
        total: status_counts.iter().map(|(_, n)| n).sum(),
        by_status,
        by_priority,
        my_cases,
    })
}
