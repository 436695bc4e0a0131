//! Database test fixtures
//!
//! Every test gets its own SQLite file inside a temp directory; the
//! directory (and the store with it) is removed when the fixture drops.

use casedesk::backend::server::config::{load_database, AppConfig};
use sqlx::SqlitePool;
use tempfile::TempDir;

pub struct TestDatabase {
    dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn url(&self) -> String {
        format!("sqlite://{}", self.dir.path().join("casedesk.db").display())
    }

    /// Configuration pointing at this store, with fast hashing
    pub fn config(&self) -> AppConfig {
        AppConfig {
            database_url: self.url(),
            bcrypt_cost: 4,
            ..AppConfig::default()
        }
    }

    /// Open the store and apply migrations
    pub async fn pool(&self) -> SqlitePool {
        load_database(&self.url()).await.expect("Failed to open test database")
    }
}
