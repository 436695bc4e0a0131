/**
 * Meeting Link Generation
 *
 * The default provider mints Google-Meet-shaped room codes
 * (`abc-defg-hij`) under a configurable base URL. A calendar-backed
 * provider would implement the same trait.
 */

use super::IntegrationError;
use async_trait::async_trait;

/// What a provider needs to know to create a room
#[derive(Debug, Clone, Copy)]
pub struct MeetingRequest<'a> {
    pub appointment_id: i64,
    pub title: &'a str,
}

#[async_trait]
pub trait MeetingLinkProvider: Send + Sync {
    /// Create a joinable meeting URL
    async fn create_link(&self, request: MeetingRequest<'_>) -> Result<String, IntegrationError>;
}

/// Room codes under a fixed base URL
#[derive(Debug, Clone)]
pub struct GoogleMeetLinks {
    base_url: String,
}

impl GoogleMeetLinks {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn room_code() -> String {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        let letters: String = hex
            .bytes()
            .take(10)
            .map(|b| (b'a' + (b % 26)) as char)
            .collect();
        format!("{}-{}-{}", &letters[..3], &letters[3..7], &letters[7..10])
    }
}

#[async_trait]
impl MeetingLinkProvider for GoogleMeetLinks {
    async fn create_link(&self, request: MeetingRequest<'_>) -> Result<String, IntegrationError> {
        if self.base_url.is_empty() {
            return Err(IntegrationError::Rejected("no meeting base URL configured".to_string()));
        }
        let link = format!("{}/{}", self.base_url, Self::room_code());
        tracing::info!("Generated meeting link for appointment {} ({})", request.appointment_id, request.title);
        Ok(link)
    }
}
