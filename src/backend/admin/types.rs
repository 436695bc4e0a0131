//! User administration bodies.

use crate::backend::auth::handlers::types::{validate_email, validate_password};
use crate::backend::auth::users::{UserChanges, UserProfile};
use crate::shared::error::require_fields;
use crate::shared::{Role, SharedError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `POST /admin/users` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

/// Account fields checked and ready to hash
#[derive(Debug, Clone)]
pub struct ValidatedUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl CreateUserRequest {
    /// Role defaults to CLIENT.
    pub fn validate(self) -> Result<ValidatedUser, SharedError> {
        require_fields(&[
            ("email", self.email.as_deref()),
            ("password", self.password.as_deref()),
            ("name", self.name.as_deref()),
        ])?;

        let email = self.email.unwrap_or_default();
        let password = self.password.unwrap_or_default();
        validate_email(&email)?;
        validate_password(&password)?;

        let role = match self.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => raw.parse()?,
            None => Role::Client,
        };

        Ok(ValidatedUser {
            email: email.trim().to_lowercase(),
            password,
            name: self.name.unwrap_or_default().trim().to_string(),
            phone: self.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            role,
        })
    }
}

/// `PUT /admin/users/{id}` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

/// Parsed update; the password is still plain text
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub changes: UserChanges,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserUpdate, SharedError> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(SharedError::validation("name", "cannot be empty"));
        }

        let role = self
            .role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::parse::<Role>)
            .transpose()?;

        Ok(UserUpdate {
            changes: UserChanges {
                email: self.email,
                name: self.name,
                phone: self.phone,
                role,
                password_hash: None,
            },
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserProfile>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub msg: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserCounts {
    pub total: i64,
    pub by_role: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CaseCounts {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AppointmentCounts {
    pub total: i64,
    pub upcoming: i64,
}

/// `GET /admin/stats` body
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SystemStats {
    pub users: UserCounts,
    pub cases: CaseCounts,
    pub appointments: AppointmentCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults_to_client() {
        let user = CreateUserRequest {
            email: Some("New@Firm.com".to_string()),
            password: Some("longenough".to_string()),
            name: Some("New".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(user.role, Role::Client);
        assert_eq!(user.email, "new@firm.com");
    }

    #[test]
    fn test_create_rejects_unknown_role() {
        let err = CreateUserRequest {
            email: Some("a@x.com".to_string()),
            password: Some("longenough".to_string()),
            name: Some("A".to_string()),
            role: Some("PARTNER".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, SharedError::ValidationError { ref field, .. } if field == "role"));
    }

    #[test]
    fn test_update_checks_password_length() {
        let err = UpdateUserRequest {
            password: Some("short".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, SharedError::ValidationError { ref field, .. } if field == "password"));
    }
}
