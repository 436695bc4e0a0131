/**
 * User Notifications
 *
 * Notifications are best-effort: callers log and swallow any error a
 * `Notifier` returns. `LogNotifier` is the default when no SMTP relay is
 * configured.
 */

use super::IntegrationError;
use crate::backend::server::config::SmtpSettings;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// A single outbound notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: Notice) -> Result<(), IntegrationError>;
}

/// Writes notices to the log instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: Notice) -> Result<(), IntegrationError> {
        tracing::info!("Notification to {} <{}>: {}", notice.to_name, notice.to_email, notice.subject);
        tracing::debug!("Notification body: {}", notice.body);
        Ok(())
    }
}

/// Delivers notices through an SMTP relay
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build the relay transport
    ///
    /// # Errors
    ///
    /// Fails when the relay host or the sender address is malformed.
    pub fn from_settings(settings: &SmtpSettings) -> Result<Self, IntegrationError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| IntegrationError::Rejected(format!("invalid MAIL_FROM '{}': {}", settings.from, e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| IntegrationError::Unavailable(format!("SMTP relay {}: {}", settings.host, e)))?;

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, notice: Notice) -> Result<(), IntegrationError> {
        let to: Mailbox = format!("{} <{}>", notice.to_name, notice.to_email)
            .parse()
            .map_err(|e| IntegrationError::Rejected(format!("invalid recipient {}: {}", notice.to_email, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notice.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(notice.body)
            .map_err(|e| IntegrationError::Rejected(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| IntegrationError::Unavailable(e.to_string()))?;

        tracing::info!("Mail sent to {}", notice.to_email);
        Ok(())
    }
}
