//! Appointment rows, request bodies and their validation.

use super::schedule::{parse_timestamp, validate_window};
use crate::shared::error::require_fields;
use crate::shared::{AppointmentStatus, AppointmentType, SharedError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Appointment row joined with both parties
#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct AppointmentRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    /// Minutes
    pub duration: i64,
    pub appointment_type: AppointmentType,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub needs_manual_link: bool,
    #[serde(skip_serializing)]
    pub link_attempts: i64,
    pub status: AppointmentStatus,
    pub client_id: i64,
    pub client_name: String,
    #[serde(skip_serializing)]
    pub client_email: String,
    pub attorney_id: i64,
    pub attorney_name: String,
    #[serde(skip_serializing)]
    pub attorney_email: String,
    pub case_id: Option<i64>,
    pub notes: Option<String>,
    pub created_by_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentRecord {
    /// Confirmed video call that still has no link
    pub fn is_missing_link(&self) -> bool {
        self.appointment_type == AppointmentType::Video
            && self.status == AppointmentStatus::Confirmed
            && self.meeting_link.is_none()
    }
}

/// Fully resolved appointment ready to insert
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub title: String,
    pub description: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub duration: i64,
    pub appointment_type: AppointmentType,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub status: AppointmentStatus,
    pub client_id: i64,
    pub attorney_id: i64,
    pub case_id: Option<i64>,
    pub notes: Option<String>,
    pub created_by_id: i64,
}

/// `POST /api/appointments` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAppointmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub appointment_type: Option<String>,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub status: Option<String>,
    pub client_id: Option<i64>,
    pub attorney_id: Option<i64>,
    pub case_id: Option<i64>,
    pub notes: Option<String>,
}

/// Creation fields after parsing, before the parties are resolved
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentDraft {
    pub title: String,
    pub description: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub duration: i64,
    pub appointment_type: AppointmentType,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub client_id: Option<i64>,
    pub attorney_id: Option<i64>,
    pub case_id: Option<i64>,
    pub notes: Option<String>,
}

impl CreateAppointmentRequest {
    /// Check required fields, parse timestamps and enumerations, and
    /// validate the time window
    pub fn validate(self) -> Result<AppointmentDraft, SharedError> {
        require_fields(&[
            ("title", self.title.as_deref()),
            ("start_datetime", self.start_datetime.as_deref()),
            ("end_datetime", self.end_datetime.as_deref()),
        ])?;

        let start = parse_timestamp("start_datetime", self.start_datetime.as_deref().unwrap_or_default())?;
        let end = parse_timestamp("end_datetime", self.end_datetime.as_deref().unwrap_or_default())?;
        let duration = validate_window(start, end)?;

        Ok(AppointmentDraft {
            title: self.title.unwrap_or_default().trim().to_string(),
            description: non_blank(self.description),
            start_datetime: start,
            end_datetime: end,
            duration,
            appointment_type: parse_optional(self.appointment_type.as_deref())?.unwrap_or(AppointmentType::Video),
            location: non_blank(self.location),
            meeting_link: non_blank(self.meeting_link).map(validate_meeting_link).transpose()?,
            status: parse_optional(self.status.as_deref())?,
            client_id: self.client_id,
            attorney_id: self.attorney_id,
            case_id: self.case_id,
            notes: non_blank(self.notes),
        })
    }
}

/// `PUT /api/appointments/{id}` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub appointment_type: Option<String>,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub status: Option<String>,
    pub attorney_id: Option<i64>,
    pub notes: Option<String>,
}

/// Parsed partial update; `None` leaves a column unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub appointment_type: Option<AppointmentType>,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub attorney_id: Option<i64>,
    pub notes: Option<String>,
}

impl AppointmentPatch {
    /// Fields only staff may set
    pub fn staff_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.attorney_id.is_some() {
            fields.push("attorney_id");
        }
        if self.location.is_some() {
            fields.push("location");
        }
        if self.meeting_link.is_some() {
            fields.push("meeting_link");
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl UpdateAppointmentRequest {
    pub fn validate(self) -> Result<AppointmentPatch, SharedError> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(SharedError::validation("title", "Title cannot be empty"));
        }

        Ok(AppointmentPatch {
            title: non_blank(self.title),
            description: non_blank(self.description),
            start_datetime: self
                .start_datetime
                .as_deref()
                .map(|raw| parse_timestamp("start_datetime", raw))
                .transpose()?,
            end_datetime: self
                .end_datetime
                .as_deref()
                .map(|raw| parse_timestamp("end_datetime", raw))
                .transpose()?,
            appointment_type: parse_optional(self.appointment_type.as_deref())?,
            location: non_blank(self.location),
            meeting_link: non_blank(self.meeting_link).map(validate_meeting_link).transpose()?,
            status: parse_optional(self.status.as_deref())?,
            attorney_id: self.attorney_id,
            notes: non_blank(self.notes),
        })
    }
}

/// Query string of `GET /api/appointments`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentQuery {
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// List filter; every field narrows the result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub client_id: Option<i64>,
    pub attorney_id: Option<i64>,
    pub status: Option<AppointmentStatus>,
    /// Inclusive lower bound on the start time
    pub starts_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the start time
    pub starts_before: Option<DateTime<Utc>>,
}

impl AppointmentQuery {
    /// A bare `end_date` covers that whole day.
    pub fn validate(self) -> Result<AppointmentFilter, SharedError> {
        let starts_before = match self.end_date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let parsed = parse_timestamp("end_date", raw)?;
                if raw.len() == "YYYY-MM-DD".len() {
                    Some(parsed + Duration::days(1))
                } else {
                    Some(parsed + Duration::seconds(1))
                }
            }
            None => None,
        };

        Ok(AppointmentFilter {
            status: parse_optional(self.status.as_deref())?,
            starts_from: self
                .start_date
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|raw| parse_timestamp("start_date", raw))
                .transpose()?,
            starts_before,
            ..Default::default()
        })
    }
}

/// `{msg, appointment, warning?}` body of appointment mutations
#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    pub msg: String,
    pub appointment: AppointmentRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentList {
    pub appointments: Vec<AppointmentRecord>,
    pub count: usize,
}

impl From<Vec<AppointmentRecord>> for AppointmentList {
    fn from(appointments: Vec<AppointmentRecord>) -> Self {
        Self {
            count: appointments.len(),
            appointments,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, sqlx::FromRow)]
pub struct AppointmentStats {
    pub upcoming: i64,
    pub this_month: i64,
    pub completed: i64,
    pub pending: i64,
}

/// Manual meeting links must be https URLs
pub fn validate_meeting_link(raw: String) -> Result<String, SharedError> {
    let link = raw.trim();
    match link.strip_prefix("https://") {
        Some(rest) if !rest.is_empty() => Ok(link.to_string()),
        _ => Err(SharedError::validation("meeting_link", "Meeting link must be an https:// URL")),
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>, SharedError>
where
    T: std::str::FromStr<Err = SharedError>,
{
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::parse).transpose()
}
