//! Appointment queries.

use super::types::{AppointmentFilter, AppointmentPatch, AppointmentRecord, AppointmentStats, NewAppointment};
use crate::shared::AppointmentStatus;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

const APPOINTMENT_SELECT: &str = r#"
    SELECT a.id, a.title, a.description, a.start_datetime, a.end_datetime, a.duration,
           a.appointment_type, a.location, a.meeting_link, a.needs_manual_link, a.link_attempts,
           a.status, a.client_id, cl.name AS client_name, cl.email AS client_email,
           a.attorney_id, att.name AS attorney_name, att.email AS attorney_email,
           a.case_id, a.notes, a.created_by_id, a.created_at, a.updated_at
    FROM appointments a
    JOIN users cl ON cl.id = a.client_id
    JOIN users att ON att.id = a.attorney_id
"#;

pub async fn insert_appointment<'e, E>(executor: E, new: &NewAppointment) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = Utc::now();
    sqlx::query_scalar(
        r#"
        INSERT INTO appointments (
            title, description, start_datetime, end_datetime, duration, appointment_type,
            location, meeting_link, status, client_id, attorney_id, case_id, notes,
            created_by_id, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.start_datetime)
    .bind(new.end_datetime)
    .bind(new.duration)
    .bind(new.appointment_type)
    .bind(&new.location)
    .bind(&new.meeting_link)
    .bind(new.status)
    .bind(new.client_id)
    .bind(new.attorney_id)
    .bind(new.case_id)
    .bind(&new.notes)
    .bind(new.created_by_id)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn get_appointment<'e, E>(executor: E, id: i64) -> Result<Option<AppointmentRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, AppointmentRecord>(&format!("{APPOINTMENT_SELECT} WHERE a.id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Matching appointments, latest start first
pub async fn list_appointments<'e, E>(
    executor: E,
    filter: &AppointmentFilter,
) -> Result<Vec<AppointmentRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("{APPOINTMENT_SELECT} WHERE 1 = 1"));

    if let Some(client_id) = filter.client_id {
        query.push(" AND a.client_id = ").push_bind(client_id);
    }
    if let Some(attorney_id) = filter.attorney_id {
        query.push(" AND a.attorney_id = ").push_bind(attorney_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND a.status = ").push_bind(status);
    }
    if let Some(from) = filter.starts_from {
        query.push(" AND a.start_datetime >= ").push_bind(from);
    }
    if let Some(before) = filter.starts_before {
        query.push(" AND a.start_datetime < ").push_bind(before);
    }
    query.push(" ORDER BY a.start_datetime DESC, a.id DESC");

    query.build_query_as::<AppointmentRecord>().fetch_all(executor).await
}

/// Apply a partial update; returns whether the row exists
///
/// Setting a meeting link clears the manual-follow-up flag.
pub async fn update_appointment<'e, E>(
    executor: E,
    id: i64,
    patch: &AppointmentPatch,
    duration: Option<i64>,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE appointments SET
            title = COALESCE(?1, title),
            description = COALESCE(?2, description),
            start_datetime = COALESCE(?3, start_datetime),
            end_datetime = COALESCE(?4, end_datetime),
            duration = COALESCE(?5, duration),
            appointment_type = COALESCE(?6, appointment_type),
            location = COALESCE(?7, location),
            meeting_link = COALESCE(?8, meeting_link),
            needs_manual_link = CASE WHEN ?8 IS NOT NULL THEN 0 ELSE needs_manual_link END,
            status = COALESCE(?9, status),
            attorney_id = COALESCE(?10, attorney_id),
            notes = COALESCE(?11, notes),
            updated_at = ?12
        WHERE id = ?13
        "#,
    )
    .bind(&patch.title)
    .bind(&patch.description)
    .bind(patch.start_datetime)
    .bind(patch.end_datetime)
    .bind(duration)
    .bind(patch.appointment_type)
    .bind(&patch.location)
    .bind(&patch.meeting_link)
    .bind(patch.status)
    .bind(patch.attorney_id)
    .bind(&patch.notes)
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Store a generated link and count the attempt
pub async fn record_link<'e, E>(executor: E, id: i64, link: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE appointments
        SET meeting_link = ?, needs_manual_link = 0, link_attempts = link_attempts + 1, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(link)
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Count a failed generation attempt
pub async fn record_link_failure<'e, E>(executor: E, id: i64, needs_manual_link: bool) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE appointments
        SET link_attempts = link_attempts + 1,
            needs_manual_link = CASE WHEN ? THEN 1 ELSE needs_manual_link END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(needs_manual_link)
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn set_status<'e, E>(executor: E, id: i64, status: AppointmentStatus) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE appointments SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_appointment<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Dashboard counters over the appointments a principal can see
///
/// # Arguments
///
/// * `now` - Reference instant for `upcoming`
/// * `month` - `[start, end)` of the current calendar month
/// * `client_id`, `attorney_id` - Scope; `None` means unrestricted
pub async fn appointment_stats<'e, E>(
    executor: E,
    now: DateTime<Utc>,
    month: (DateTime<Utc>, DateTime<Utc>),
    client_id: Option<i64>,
    attorney_id: Option<i64>,
) -> Result<AppointmentStats, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, AppointmentStats>(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN start_datetime > ?1 AND status IN ('pending', 'confirmed') THEN 1 ELSE 0 END), 0)
                AS upcoming,
            COALESCE(SUM(CASE WHEN start_datetime >= ?2 AND start_datetime < ?3 THEN 1 ELSE 0 END), 0)
                AS this_month,
            COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed,
            COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending
        FROM appointments
        WHERE (?4 IS NULL OR client_id = ?4)
          AND (?5 IS NULL OR attorney_id = ?5)
        "#,
    )
    .bind(now)
    .bind(month.0)
    .bind(month.1)
    .bind(client_id)
    .bind(attorney_id)
    .fetch_one(executor)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support;
    use crate::shared::{AppointmentType, Role};
    use chrono::{Duration, TimeZone};

    fn new_appointment(client_id: i64, attorney_id: i64, start: DateTime<Utc>, status: AppointmentStatus) -> NewAppointment {
        NewAppointment {
            title: "Consultation".to_string(),
            description: None,
            start_datetime: start,
            end_datetime: start + Duration::minutes(30),
            duration: 30,
            appointment_type: AppointmentType::Phone,
            location: None,
            meeting_link: None,
            status,
            client_id,
            attorney_id,
            case_id: None,
            notes: None,
            created_by_id: client_id,
        }
    }

    #[tokio::test]
    async fn test_insert_and_filter() {
        let ctx = test_support::context().await;
        let client = test_support::seed_user(&ctx.state, "c@x.com", Role::Client).await;
        let lawyer = test_support::seed_user(&ctx.state, "l@x.com", Role::CaseManager).await;
        let pool = &ctx.state.db_pool;

        let january = Utc.with_ymd_and_hms(2031, 1, 15, 9, 0, 0).unwrap();
        let march = Utc.with_ymd_and_hms(2031, 3, 15, 9, 0, 0).unwrap();
        let first = insert_appointment(pool, &new_appointment(client.user_id, lawyer.user_id, january, AppointmentStatus::Pending))
            .await
            .unwrap();
        insert_appointment(pool, &new_appointment(client.user_id, lawyer.user_id, march, AppointmentStatus::Confirmed))
            .await
            .unwrap();

        let record = get_appointment(pool, first).await.unwrap().unwrap();
        assert_eq!(record.client_name, "c");
        assert_eq!(record.attorney_email, "l@x.com");
        assert_eq!(record.link_attempts, 0);

        let all = list_appointments(pool, &AppointmentFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].start_datetime, march);

        let filter = AppointmentFilter {
            starts_before: Some(Utc.with_ymd_and_hms(2031, 2, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let early = list_appointments(pool, &filter).await.unwrap();
        assert_eq!(early.len(), 1);
        assert_eq!(early[0].id, first);
    }

    #[tokio::test]
    async fn test_link_bookkeeping() {
        let ctx = test_support::context().await;
        let client = test_support::seed_user(&ctx.state, "c@x.com", Role::Client).await;
        let lawyer = test_support::seed_user(&ctx.state, "l@x.com", Role::CaseManager).await;
        let pool = &ctx.state.db_pool;
        let start = Utc::now() + Duration::days(2);

        let id = insert_appointment(pool, &new_appointment(client.user_id, lawyer.user_id, start, AppointmentStatus::Confirmed))
            .await
            .unwrap();

        record_link_failure(pool, id, true).await.unwrap();
        let failed = get_appointment(pool, id).await.unwrap().unwrap();
        assert!(failed.needs_manual_link);
        assert_eq!(failed.link_attempts, 1);

        record_link(pool, id, "https://meet.test/a").await.unwrap();
        let linked = get_appointment(pool, id).await.unwrap().unwrap();
        assert!(!linked.needs_manual_link);
        assert_eq!(linked.link_attempts, 2);
        assert_eq!(linked.meeting_link.as_deref(), Some("https://meet.test/a"));
    }

    #[tokio::test]
    async fn test_stats_scope() {
        let ctx = test_support::context().await;
        let client = test_support::seed_user(&ctx.state, "c@x.com", Role::Client).await;
        let other = test_support::seed_user(&ctx.state, "o@x.com", Role::Client).await;
        let lawyer = test_support::seed_user(&ctx.state, "l@x.com", Role::CaseManager).await;
        let pool = &ctx.state.db_pool;

        let now = Utc.with_ymd_and_hms(2031, 6, 10, 12, 0, 0).unwrap();
        let month = (
            Utc.with_ymd_and_hms(2031, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2031, 7, 1, 0, 0, 0).unwrap(),
        );
        for (owner, start, status) in [
            (client.user_id, now + Duration::days(1), AppointmentStatus::Pending),
            (client.user_id, now - Duration::days(3), AppointmentStatus::Completed),
            (other.user_id, now + Duration::days(40), AppointmentStatus::Confirmed),
        ] {
            insert_appointment(pool, &new_appointment(owner, lawyer.user_id, start, status)).await.unwrap();
        }

        let mine = appointment_stats(pool, now, month, Some(client.user_id), None).await.unwrap();
        assert_eq!(
            mine,
            AppointmentStats {
                upcoming: 1,
                this_month: 2,
                completed: 1,
                pending: 1,
            }
        );

        let everything = appointment_stats(pool, now, month, None, None).await.unwrap();
        assert_eq!(everything.upcoming, 2);
        assert_eq!(everything.this_month, 2);
    }
}
