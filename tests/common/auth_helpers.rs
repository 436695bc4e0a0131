//! Application and user fixtures
//!
//! `TestApp` builds the real router over a throwaway store with a seeded
//! super admin. Clients sign up through `/auth/register`; staff are
//! created by the admin through `/admin/users`, so every fixture user
//! went through the same paths a real one would.

use std::sync::Arc;

use axum_test::TestServer;
use casedesk::backend::integrations::MeetingLinkProvider;
use casedesk::backend::routes::create_router;
use casedesk::backend::server::config::{AdminSeed, AppConfig};
use casedesk::backend::server::state::AppState;
use serde_json::json;

use super::database::TestDatabase;

pub const ADMIN_EMAIL: &str = "admin@casedesk.test";
pub const PASSWORD: &str = "password123";

/// A signed-in test user
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn auth(&self) -> String {
        auth_header(&self.token)
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _db: TestDatabase,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::build(|config| config, None, false).await
    }

    pub async fn spawn_with(configure: impl FnOnce(AppConfig) -> AppConfig) -> Self {
        Self::build(configure, None, false).await
    }

    /// Use a specific meeting link provider
    pub async fn spawn_with_links(links: Arc<dyn MeetingLinkProvider>) -> Self {
        Self::build(|config| config, Some(links), false).await
    }

    /// Serve over a real socket, needed for WebSocket upgrades
    pub async fn spawn_http() -> Self {
        Self::build(|config| config, None, true).await
    }

    async fn build(
        configure: impl FnOnce(AppConfig) -> AppConfig,
        links: Option<Arc<dyn MeetingLinkProvider>>,
        http: bool,
    ) -> Self {
        let db = TestDatabase::new();
        let mut config = configure(db.config());
        config.bootstrap_admin = Some(AdminSeed {
            email: ADMIN_EMAIL.to_string(),
            password: PASSWORD.to_string(),
            name: "Admin".to_string(),
        });

        let seed = config.bootstrap_admin.clone().expect("seed");
        let pool = db.pool().await;
        casedesk::backend::server::init::ensure_super_admin(&pool, &seed, config.bcrypt_cost)
            .await
            .expect("Failed to seed admin");

        let mut state = AppState::new(pool, config);
        if let Some(links) = links {
            state = state.with_meeting_links(links);
        }

        let router = create_router(state.clone());
        let server = if http {
            TestServer::builder().http_transport().build(router)
        } else {
            TestServer::new(router)
        }
        .expect("Failed to start test server");

        Self { server, state, _db: db }
    }

    pub async fn login(&self, email: &str) -> TestUser {
        let response = self
            .server
            .post("/auth/login")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        TestUser {
            id: body["user_id"].as_i64().expect("user_id"),
            email: email.to_string(),
            token: body["access_token"].as_str().expect("access_token").to_string(),
        }
    }

    pub async fn admin(&self) -> TestUser {
        self.login(ADMIN_EMAIL).await
    }

    /// Self-registered client
    pub async fn register_client(&self, email: &str) -> TestUser {
        let response = self
            .server
            .post("/auth/register")
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "name": email.split('@').next().unwrap_or(email),
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        self.login(email).await
    }

    /// User with any role, created by the admin
    pub async fn create_user(&self, email: &str, role: &str) -> TestUser {
        let admin = self.admin().await;
        let response = self
            .server
            .post("/admin/users")
            .add_header("Authorization", admin.auth())
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "name": email.split('@').next().unwrap_or(email),
                "role": role,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        self.login(email).await
    }

    pub async fn case_manager(&self, email: &str) -> TestUser {
        self.create_user(email, "CASE_MANAGER").await
    }

    /// Submit a case as `client`; returns the case JSON
    pub async fn submit_case(&self, client: &TestUser, title: &str) -> serde_json::Value {
        let response = self
            .server
            .post("/cases")
            .add_header("Authorization", client.auth())
            .json(&json!({
                "title": title,
                "description": "Details of the matter",
                "category": "FAMILY_LAW",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["case"].clone()
    }

    /// Assign a case as staff
    pub async fn assign(&self, staff: &TestUser, case_id: i64, assignee: i64) {
        self.server
            .put(&format!("/cases/admin/{}", case_id))
            .add_header("Authorization", staff.auth())
            .json(&json!({ "assigned_to_id": assignee }))
            .await
            .assert_status_ok();
    }
}

/// Create authorization header value
pub fn auth_header(token: &str) -> String {
    format!("Bearer {}", token)
}
