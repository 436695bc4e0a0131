/**
 * Application State Management
 *
 * `AppState` is the single state container handed to every handler and to
 * every realtime session. It holds:
 * - the SQLite pool
 * - the loaded configuration
 * - token signing keys
 * - the realtime case groups
 * - the external collaborators (meeting links, notifications)
 *
 * Collaborators are trait objects so tests can swap in failing or
 * recording implementations with `with_meeting_links` / `with_notifier`.
 *
 * # State Extraction
 *
 * `FromRef` implementations let handlers extract just the piece they need,
 * e.g. `State(pool): State<SqlitePool>`.
 */

use crate::backend::auth::sessions::SessionKeys;
use crate::backend::integrations::{
    GoogleMeetLinks, LogNotifier, MeetingLinkProvider, Notifier, SmtpNotifier,
};
use crate::backend::realtime::CaseGroups;
use crate::backend::server::config::AppConfig;
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Relational store
    pub db_pool: SqlitePool,

    /// Loaded configuration
    pub config: Arc<AppConfig>,

    /// Bearer token signing and verification keys
    pub session_keys: SessionKeys,

    /// Realtime broadcast groups, keyed by case and by user
    pub case_groups: CaseGroups,

    /// Meeting link generation
    pub meeting_links: Arc<dyn MeetingLinkProvider>,

    /// Best-effort notifications to users
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Build state from a ready pool and configuration
    ///
    /// The notifier is SMTP-backed when `SMTP_HOST` is configured and the
    /// transport can be built, otherwise notifications are only logged.
    pub fn new(db_pool: SqlitePool, config: AppConfig) -> Self {
        let session_keys = SessionKeys::new(&config.jwt_secret, config.token_ttl_minutes);
        let meeting_links: Arc<dyn MeetingLinkProvider> =
            Arc::new(GoogleMeetLinks::new(config.meeting_base_url.clone()));

        let notifier: Arc<dyn Notifier> = match &config.smtp {
            Some(settings) => match SmtpNotifier::from_settings(settings) {
                Ok(smtp) => {
                    tracing::info!("Notifications will be sent through {}", settings.host);
                    Arc::new(smtp)
                }
                Err(e) => {
                    tracing::warn!("SMTP transport unavailable, notifications will only be logged: {}", e);
                    Arc::new(LogNotifier)
                }
            },
            None => Arc::new(LogNotifier),
        };

        Self {
            db_pool,
            config: Arc::new(config),
            session_keys,
            case_groups: CaseGroups::new(),
            meeting_links,
            notifier,
        }
    }

    /// Replace the meeting link provider
    pub fn with_meeting_links(mut self, provider: Arc<dyn MeetingLinkProvider>) -> Self {
        self.meeting_links = provider;
        self
    }

    /// Replace the notifier
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.session_keys.clone()
    }
}

impl FromRef<AppState> for CaseGroups {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.case_groups.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
