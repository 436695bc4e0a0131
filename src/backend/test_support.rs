//! Unit test fixtures
//!
//! Each context owns a fresh SQLite file in a temp directory with all
//! migrations applied. Collaborators default to deterministic fakes.

use crate::backend::auth::users::{self, NewUser};
use crate::backend::cases::db as case_db;
use crate::backend::cases::types::{CaseRecord, NewCase};
use crate::backend::integrations::{IntegrationError, MeetingLinkProvider, MeetingRequest, Notice, Notifier};
use crate::backend::middleware::AuthenticatedUser;
use crate::backend::server::config::{load_database, AppConfig};
use crate::backend::server::state::AppState;
use crate::shared::{CaseCategory, Priority, Role};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const PASSWORD: &str = "password123";

pub struct TestContext {
    pub state: AppState,
    pub links: Arc<ScriptedLinks>,
    pub notifier: Arc<RecordingNotifier>,
    _dir: TempDir,
}

pub async fn context() -> TestContext {
    context_with(AppConfig::default()).await
}

pub async fn context_with(mut config: AppConfig) -> TestContext {
    let dir = tempfile::tempdir().expect("temp dir");
    config.database_url = format!("sqlite://{}", dir.path().join("test.db").display());
    config.bcrypt_cost = 4;

    let pool = load_database(&config.database_url).await.expect("test database");
    let links = Arc::new(ScriptedLinks::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::new(pool, config)
        .with_meeting_links(links.clone())
        .with_notifier(notifier.clone());

    TestContext {
        state,
        links,
        notifier,
        _dir: dir,
    }
}

pub async fn seed_user(state: &AppState, email: &str, role: Role) -> AuthenticatedUser {
    let user = users::create_user(
        &state.db_pool,
        NewUser {
            email: email.to_string(),
            password_hash: bcrypt::hash(PASSWORD, 4).expect("hash"),
            name: email.split('@').next().unwrap_or(email).to_string(),
            phone: None,
            role,
            email_verified: false,
        },
    )
    .await
    .expect("seed user");

    AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    }
}

pub async fn token_for(state: &AppState, user_id: i64) -> String {
    let user = users::get_user_by_id(&state.db_pool, user_id)
        .await
        .expect("lookup")
        .expect("user exists");
    state.session_keys.issue(&user).expect("token")
}

pub async fn seed_case(state: &AppState, client_id: i64, assigned_to_id: Option<i64>) -> CaseRecord {
    let record = case_db::insert_case(
        &state.db_pool,
        &state.config.case_id_prefix,
        NewCase {
            title: "Boundary dispute".to_string(),
            description: "Neighbour moved the fence".to_string(),
            category: CaseCategory::PropertyLaw,
            priority: Priority::Medium,
            client_id,
        },
    )
    .await
    .expect("seed case");

    match assigned_to_id {
        Some(staff_id) => {
            sqlx::query("UPDATE cases SET assigned_to_id = ? WHERE id = ?")
                .bind(staff_id)
                .bind(record.id)
                .execute(&state.db_pool)
                .await
                .expect("assign");
            case_db::get_case(&state.db_pool, record.id)
                .await
                .expect("reload")
                .expect("case exists")
        }
        None => record,
    }
}

/// Meeting link provider whose failures can be switched on and off
#[derive(Default)]
pub struct ScriptedLinks {
    failing: std::sync::atomic::AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedLinks {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MeetingLinkProvider for ScriptedLinks {
    async fn create_link(&self, request: MeetingRequest<'_>) -> Result<String, IntegrationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(IntegrationError::Unavailable("meeting provider offline".to_string()));
        }
        Ok(format!("https://meet.test/appt-{}-{}", request.appointment_id, n))
    }
}

/// Notifier that records every notice and can be made to fail
#[derive(Default)]
pub struct RecordingNotifier {
    failing: std::sync::atomic::AtomicBool,
    sent: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Notice> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: Notice) -> Result<(), IntegrationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IntegrationError::Unavailable("mail relay offline".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notice);
        }
        Ok(())
    }
}
