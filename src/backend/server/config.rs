/**
 * Server Configuration
 *
 * Loads `AppConfig` from environment variables (a `.env` file is honoured
 * through `dotenv`) and opens the SQLite pool the rest of the backend
 * shares.
 *
 * # Configuration Sources
 *
 * | Variable | Default |
 * |---|---|
 * | `DATABASE_URL` | `sqlite://casedesk.db` |
 * | `SERVER_PORT` | `5001` |
 * | `JWT_SECRET_KEY` or `JWT_SECRET` | development secret (warned) |
 * | `JWT_ACCESS_TOKEN_EXPIRES_MINUTES` | `60` |
 * | `CASE_ID_PREFIX` | `1000HILLS` |
 * | `CASE_STATUS_POLICY` | `open` |
 * | `CORS_ORIGINS` | `http://localhost:3000,http://127.0.0.1:3000` |
 * | `BCRYPT_COST` | `bcrypt::DEFAULT_COST` |
 * | `MEETING_BASE_URL` | `https://meet.google.com` |
 * | `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `MAIL_FROM` | unset |
 * | `ADMIN_EMAIL`, `ADMIN_PASSWORD`, `ADMIN_NAME` | unset |
 *
 * # Error Handling
 *
 * Unlike optional integrations, malformed values are fatal: a port that is
 * not a number or an unknown status policy stops startup with a
 * `ConfigError`.
 */

use crate::backend::cases::lifecycle::StatusPolicy;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Transaction;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "casedesk-dev-secret-change-me";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}

/// Outgoing mail settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Super admin created on startup when absent
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub case_id_prefix: String,
    pub case_status_policy: StatusPolicy,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
    pub meeting_base_url: String,
    pub smtp: Option<SmtpSettings>,
    pub bootstrap_admin: Option<AdminSeed>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://casedesk.db".to_string(),
            server_port: 5001,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_minutes: 60,
            case_id_prefix: "1000HILLS".to_string(),
            case_status_policy: StatusPolicy::Open,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            bcrypt_cost: bcrypt::DEFAULT_COST,
            meeting_base_url: "https://meet.google.com".to_string(),
            smtp: None,
            bootstrap_admin: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let server_port = match get("SERVER_PORT") {
            Some(raw) => parse_value("SERVER_PORT", &raw)?,
            None => defaults.server_port,
        };

        let jwt_secret = match get("JWT_SECRET_KEY").or_else(|| get("JWT_SECRET")) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET_KEY not set, using the development secret");
                defaults.jwt_secret
            }
        };

        let token_ttl_minutes: i64 = match get("JWT_ACCESS_TOKEN_EXPIRES_MINUTES") {
            Some(raw) => parse_value("JWT_ACCESS_TOKEN_EXPIRES_MINUTES", &raw)?,
            None => defaults.token_ttl_minutes,
        };
        if token_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                name: "JWT_ACCESS_TOKEN_EXPIRES_MINUTES",
                reason: "must be positive".to_string(),
            });
        }

        let case_status_policy = match get("CASE_STATUS_POLICY") {
            Some(raw) => StatusPolicy::from_str(&raw).map_err(|e| ConfigError::InvalidValue {
                name: "CASE_STATUS_POLICY",
                reason: e.to_string(),
            })?,
            None => defaults.case_status_policy,
        };

        let cors_origins = match get("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => defaults.cors_origins,
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => parse_value("BCRYPT_COST", &raw)?,
            None => defaults.bcrypt_cost,
        };

        let smtp = match get("SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host,
                username: get("SMTP_USERNAME"),
                password: get("SMTP_PASSWORD"),
                from: get("MAIL_FROM").ok_or(ConfigError::MissingValue("MAIL_FROM"))?,
            }),
            None => None,
        };

        let bootstrap_admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password,
                name: get("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            }),
            (Some(_), None) => return Err(ConfigError::MissingValue("ADMIN_PASSWORD")),
            _ => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            server_port,
            jwt_secret,
            token_ttl_minutes,
            case_id_prefix: get("CASE_ID_PREFIX").unwrap_or(defaults.case_id_prefix),
            case_status_policy,
            cors_origins,
            bcrypt_cost,
            meeting_base_url: get("MEETING_BASE_URL").unwrap_or(defaults.meeting_base_url),
            smtp,
            bootstrap_admin,
        })
    }
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        name,
        reason: e.to_string(),
    })
}

/// Open the SQLite pool and run migrations
///
/// The database file is created when missing. Connections run in WAL mode
/// with foreign keys enforced and wait up to five seconds for a write lock
/// before giving up.
///
/// # Arguments
///
/// * `database_url` - `sqlite://` URL of the store
///
/// # Errors
///
/// Returns the connection or migration error; the server cannot run
/// without its store.
pub async fn load_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database ready");

    Ok(pool)
}

/// Open a transaction that takes the write lock up front.
///
/// A deferred SQLite transaction that reads before writing cannot wait
/// for the lock when it upgrades; it fails with `SQLITE_BUSY` if another
/// writer committed in between. `BEGIN IMMEDIATE` waits on the busy
/// timeout instead.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server_port, 5001);
        assert_eq!(config.case_id_prefix, "1000HILLS");
        assert_eq!(config.case_status_policy, StatusPolicy::Open);
        assert_eq!(config.token_ttl_minutes, 60);
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.smtp.is_none());
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SERVER_PORT", "8080"),
            ("JWT_SECRET", "fallback"),
            ("JWT_SECRET_KEY", "primary"),
            ("CASE_ID_PREFIX", "ACME"),
            ("CASE_STATUS_POLICY", "strict"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("BCRYPT_COST", "4"),
        ]))
        .unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.jwt_secret, "primary");
        assert_eq!(config.case_id_prefix, "ACME");
        assert_eq!(config.case_status_policy, StatusPolicy::Strict);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.bcrypt_cost, 4);
    }

    #[test]
    fn test_invalid_port_is_fatal() {
        let err = AppConfig::from_lookup(lookup(&[("SERVER_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "SERVER_PORT", .. }));
    }

    #[test]
    fn test_unknown_policy_is_fatal() {
        let err = AppConfig::from_lookup(lookup(&[("CASE_STATUS_POLICY", "lenient")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "CASE_STATUS_POLICY", .. }));
    }

    #[test]
    fn test_smtp_requires_sender() {
        let err = AppConfig::from_lookup(lookup(&[("SMTP_HOST", "smtp.example.com")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue("MAIL_FROM")));
    }

    #[test]
    fn test_admin_seed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ADMIN_EMAIL", "root@example.com"),
            ("ADMIN_PASSWORD", "supersecret"),
        ]))
        .unwrap();
        let seed = config.bootstrap_admin.unwrap();
        assert_eq!(seed.email, "root@example.com");
        assert_eq!(seed.name, "Administrator");
    }
}
