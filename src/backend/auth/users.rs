/**
 * User Model and Database Operations
 *
 * Query functions accept any SQLite executor, so they run the same way
 * against the pool or inside an open transaction (`&mut *tx`).
 */

use crate::shared::Role;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

const USER_COLUMNS: &str =
    "id, email, password_hash, name, phone, role, email_verified, created_at, updated_at";

/// User row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// bcrypt hash, never serialized
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            role: user.role,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

/// Compact user reference embedded in other payloads
#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Fields for a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub email_verified: bool,
}

/// Partial update of a user; `None` leaves a column unchanged
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

/// List filter for user administration
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Case-insensitive substring of name or email
    pub search: Option<String>,
}

/// Create a new user
///
/// # Errors
///
/// A duplicate email surfaces as a unique-constraint violation.
pub async fn create_user<'e, E>(executor: E, new_user: NewUser) -> Result<User, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = Utc::now();
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password_hash, name, phone, role, email_verified, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(new_user.email.trim().to_lowercase())
    .bind(&new_user.password_hash)
    .bind(new_user.name.trim())
    .bind(&new_user.phone)
    .bind(new_user.role)
    .bind(new_user.email_verified)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Get user by email (case-insensitive)
pub async fn get_user_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email.trim().to_lowercase())
        .fetch_optional(executor)
        .await
}

/// Get user by ID
pub async fn get_user_by_id<'e, E>(executor: E, id: i64) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// List users, newest first
pub async fn list_users<'e, E>(executor: E, filter: &UserFilter) -> Result<Vec<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1"));

    if let Some(role) = filter.role {
        query.push(" AND role = ").push_bind(role);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        query
            .push(" AND (lower(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR lower(email) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    query.push(" ORDER BY created_at DESC, id DESC");

    query.build_query_as::<User>().fetch_all(executor).await
}

/// Users holding one of the given roles, ordered by name
pub async fn list_users_with_roles<'e, E>(executor: E, roles: &[Role]) -> Result<Vec<UserSummary>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id, name, email, role FROM users WHERE role IN (");
    let mut separated = query.separated(", ");
    for role in roles {
        separated.push_bind(*role);
    }
    separated.push_unseparated(") ORDER BY name, id");

    query.build_query_as::<UserSummary>().fetch_all(executor).await
}

/// Apply a partial update and return the new row
pub async fn update_user<'e, E>(executor: E, id: i64, changes: &UserChanges) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            email = COALESCE(?, email),
            name = COALESCE(?, name),
            phone = COALESCE(?, phone),
            role = COALESCE(?, role),
            password_hash = COALESCE(?, password_hash),
            updated_at = ?
        WHERE id = ?
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(changes.email.as_ref().map(|e| e.trim().to_lowercase()))
    .bind(changes.name.as_deref().map(str::trim))
    .bind(&changes.phone)
    .bind(changes.role)
    .bind(&changes.password_hash)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Flip the verification flag and return the new row
pub async fn toggle_verified<'e, E>(executor: E, id: i64) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET email_verified = NOT email_verified, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Hard delete; returns whether a row was removed
///
/// # Errors
///
/// Fails with a foreign-key violation while cases, messages or
/// appointments still reference the user.
pub async fn delete_user<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: "Test User".to_string(),
            phone: None,
            role,
            email_verified: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_normalizes_email() {
        let ctx = test_support::context().await;
        let pool = &ctx.state.db_pool;

        let created = create_user(pool, new_user("  Alice@Example.com ", Role::Client)).await.unwrap();
        assert_eq!(created.email, "alice@example.com");

        let found = get_user_by_email(pool, "ALICE@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, Role::Client);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let ctx = test_support::context().await;
        let pool = &ctx.state.db_pool;

        create_user(pool, new_user("a@x.com", Role::Client)).await.unwrap();
        let err = create_user(pool, new_user("a@x.com", Role::Viewer)).await.unwrap_err();
        assert!(crate::backend::error::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_list_users_filters() {
        let ctx = test_support::context().await;
        let pool = &ctx.state.db_pool;

        create_user(pool, new_user("client@x.com", Role::Client)).await.unwrap();
        create_user(pool, new_user("manager@x.com", Role::CaseManager)).await.unwrap();

        let managers = list_users(pool, &UserFilter { role: Some(Role::CaseManager), search: None })
            .await
            .unwrap();
        assert_eq!(managers.len(), 1);
        assert_eq!(managers[0].email, "manager@x.com");

        let searched = list_users(pool, &UserFilter { role: None, search: Some("CLIENT".to_string()) })
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].email, "client@x.com");
    }

    #[tokio::test]
    async fn test_update_and_toggle() {
        let ctx = test_support::context().await;
        let pool = &ctx.state.db_pool;

        let user = create_user(pool, new_user("u@x.com", Role::Viewer)).await.unwrap();
        let changes = UserChanges {
            role: Some(Role::ContentEditor),
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = update_user(pool, user.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.role, Role::ContentEditor);
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, "u@x.com");

        let toggled = toggle_verified(pool, user.id).await.unwrap().unwrap();
        assert!(toggled.email_verified);
        assert!(!toggle_verified(pool, user.id).await.unwrap().unwrap().email_verified);
    }

    #[tokio::test]
    async fn test_list_users_with_roles() {
        let ctx = test_support::context().await;
        let pool = &ctx.state.db_pool;

        create_user(pool, new_user("c@x.com", Role::Client)).await.unwrap();
        create_user(pool, new_user("m@x.com", Role::CaseManager)).await.unwrap();
        create_user(pool, new_user("s@x.com", Role::SuperAdmin)).await.unwrap();

        let staff = list_users_with_roles(pool, &[Role::CaseManager, Role::SuperAdmin]).await.unwrap();
        assert_eq!(staff.len(), 2);
        assert!(staff.iter().all(|u| u.role.is_staff()));
    }
}
