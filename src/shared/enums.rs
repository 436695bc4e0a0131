//! Closed Enumerations
//!
//! Every enumerated field that crosses the wire or lands in the store is
//! defined here: user roles, case category/status/priority and the
//! appointment type/status pair.
//!
//! # Parsing
//!
//! Request bodies carry these values as plain strings. They are never
//! coerced implicitly; handlers call `str::parse` and get back either the
//! typed value or a `SharedError::ValidationError` naming the offending
//! field and the accepted values. Parsing trims surrounding whitespace and
//! ignores ASCII case, so `"property_law"` and `"PROPERTY_LAW"` are the
//! same category.
//!
//! # Storage
//!
//! Each enum derives `sqlx::Type` and is stored as its canonical text form
//! (`as_str`). Case enums use SCREAMING_SNAKE_CASE; appointment enums use
//! snake_case.

use crate::shared::error::SharedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generates the canonical string table, `Display` and `FromStr` for a
/// closed enum.
macro_rules! closed_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical text form, as stored and serialized.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = SharedError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let candidate = raw.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.as_str().eq_ignore_ascii_case(candidate))
                    .ok_or_else(|| {
                        let accepted: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        SharedError::validation(
                            $field,
                            format!("'{}' is not one of {}", candidate, accepted.join(", ")),
                        )
                    })
            }
        }
    };
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    CaseManager,
    ContentEditor,
    SuperAdmin,
    Viewer,
}

closed_enum!(Role, "role", {
    Client => "CLIENT",
    CaseManager => "CASE_MANAGER",
    ContentEditor => "CONTENT_EDITOR",
    SuperAdmin => "SUPER_ADMIN",
    Viewer => "VIEWER",
});

impl Role {
    /// Roles that work cases: they may be assigned, author notes and
    /// read any case.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::CaseManager | Role::SuperAdmin)
    }
}

/// Area of law a case belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseCategory {
    Immigration,
    FamilyLaw,
    CriminalDefense,
    CivilLitigation,
    CorporateLaw,
    PropertyLaw,
    EmploymentLaw,
    Other,
}

closed_enum!(CaseCategory, "category", {
    Immigration => "IMMIGRATION",
    FamilyLaw => "FAMILY_LAW",
    CriminalDefense => "CRIMINAL_DEFENSE",
    CivilLitigation => "CIVIL_LITIGATION",
    CorporateLaw => "CORPORATE_LAW",
    PropertyLaw => "PROPERTY_LAW",
    EmploymentLaw => "EMPLOYMENT_LAW",
    Other => "OTHER",
});

/// Case lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Pending,
    InProgress,
    AwaitingClient,
    Resolved,
    Closed,
}

closed_enum!(CaseStatus, "status", {
    Pending => "PENDING",
    InProgress => "IN_PROGRESS",
    AwaitingClient => "AWAITING_CLIENT",
    Resolved => "RESOLVED",
    Closed => "CLOSED",
});

/// Case priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

closed_enum!(Priority, "priority", {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Urgent => "URGENT",
});

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// How an appointment takes place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AppointmentType {
    Video,
    InPerson,
    Phone,
}

closed_enum!(AppointmentType, "appointment_type", {
    Video => "video",
    InPerson => "in_person",
    Phone => "phone",
});

/// Appointment workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Rescheduled,
}

closed_enum!(AppointmentStatus, "status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
    Rescheduled => "rescheduled",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive_and_trimmed() {
        assert_eq!("property_law".parse::<CaseCategory>().unwrap(), CaseCategory::PropertyLaw);
        assert_eq!("  URGENT ".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!("In_Person".parse::<AppointmentType>().unwrap(), AppointmentType::InPerson);
    }

    #[test]
    fn test_parse_rejects_unknown_variant() {
        let err = "ARCHIVED".parse::<CaseStatus>().unwrap_err();
        match err {
            SharedError::ValidationError { field, message } => {
                assert_eq!(field, "status");
                assert!(message.contains("ARCHIVED"));
                assert!(message.contains("AWAITING_CLIENT"));
            }
            _ => panic!("Expected ValidationError"),
        }
    }

    #[test]
    fn test_serde_matches_canonical_text() {
        for role in Role::ALL {
            let json = serde_json::to_string(role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        let json = serde_json::to_string(&AppointmentStatus::Rescheduled).unwrap();
        assert_eq!(json, "\"rescheduled\"");
    }

    #[test]
    fn test_staff_roles() {
        assert!(Role::CaseManager.is_staff());
        assert!(Role::SuperAdmin.is_staff());
        assert!(!Role::Client.is_staff());
        assert!(!Role::ContentEditor.is_staff());
        assert!(!Role::Viewer.is_staff());
    }

    #[test]
    fn test_default_priority() {
        assert_eq!(Priority::default(), Priority::Medium);
    }
}
