//! Case request/response types and their validation.

use crate::backend::middleware::json::present;
use crate::shared::error::require_fields;
use crate::shared::{CaseCategory, CaseStatus, Priority, SharedError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Case row joined with client and assignee names
#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct CaseRecord {
    pub id: i64,
    pub case_number: String,
    pub title: String,
    pub description: String,
    pub category: CaseCategory,
    pub status: CaseStatus,
    pub priority: Priority,
    pub client_id: i64,
    pub client_name: String,
    pub assigned_to_id: Option<i64>,
    pub assigned_to_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields of a new case
#[derive(Debug, Clone)]
pub struct NewCase {
    pub title: String,
    pub description: String,
    pub category: CaseCategory,
    pub priority: Priority,
    pub client_id: i64,
}

/// Partial update applied by staff
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseChanges {
    pub status: Option<CaseStatus>,
    pub priority: Option<Priority>,
    /// `Some(None)` unassigns
    pub assigned_to_id: Option<Option<i64>>,
}

impl CaseChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.assigned_to_id.is_none()
    }
}

/// List filter; every field narrows the result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub category: Option<CaseCategory>,
    pub priority: Option<Priority>,
    pub assigned_to_id: Option<i64>,
    pub client_id: Option<i64>,
}

/// `POST /cases` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCaseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

impl CreateCaseRequest {
    /// Check required fields and parse the enumerations
    pub fn validate(self, client_id: i64) -> Result<NewCase, SharedError> {
        require_fields(&[
            ("title", self.title.as_deref()),
            ("category", self.category.as_deref()),
            ("description", self.description.as_deref()),
        ])?;

        let category: CaseCategory = self.category.as_deref().unwrap_or_default().parse()?;
        let priority = match self.priority.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => raw.parse()?,
            None => Priority::default(),
        };

        Ok(NewCase {
            title: self.title.unwrap_or_default().trim().to_string(),
            description: self.description.unwrap_or_default().trim().to_string(),
            category,
            priority,
            client_id,
        })
    }
}

/// `PUT /cases/admin/{id}` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCaseRequest {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub assigned_to_id: Option<Option<i64>>,
}

impl UpdateCaseRequest {
    pub fn validate(self) -> Result<CaseChanges, SharedError> {
        Ok(CaseChanges {
            status: parse_optional(self.status.as_deref())?,
            priority: parse_optional(self.priority.as_deref())?,
            assigned_to_id: self.assigned_to_id,
        })
    }
}

/// Query string of the staff case listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseFilterQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub assigned_to_id: Option<i64>,
    pub client_id: Option<i64>,
}

fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>, SharedError>
where
    T: std::str::FromStr<Err = SharedError>,
{
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::parse).transpose()
}

impl CaseFilterQuery {
    pub fn validate(self) -> Result<CaseFilter, SharedError> {
        Ok(CaseFilter {
            status: parse_optional(self.status.as_deref())?,
            category: parse_optional(self.category.as_deref())?,
            priority: parse_optional(self.priority.as_deref())?,
            assigned_to_id: self.assigned_to_id,
            client_id: self.client_id,
        })
    }
}

/// `{msg, case}` body of case mutations
#[derive(Debug, Serialize)]
pub struct CaseResponse {
    pub msg: String,
    pub case: CaseRecord,
}

/// Case counts visible to one principal
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CaseStatistics {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_priority: BTreeMap<String, i64>,
    /// Cases assigned to the requesting staff member
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_cases: Option<i64>,
}
