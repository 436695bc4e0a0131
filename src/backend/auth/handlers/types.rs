/**
 * Authentication Request/Response Types
 */

use crate::shared::error::{require_fields, SharedError};
use crate::shared::Role;
use serde::{Deserialize, Serialize};

/// Minimum password length for any account
pub const MIN_PASSWORD_LEN: usize = 8;

/// Registration request
///
/// Fields are optional at the wire level so that a missing field is
/// reported as a 400 listing every absent field.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Validated registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, SharedError> {
        require_fields(&[
            ("email", self.email.as_deref()),
            ("password", self.password.as_deref()),
            ("name", self.name.as_deref()),
        ])?;

        let email = self.email.unwrap_or_default();
        let password = self.password.unwrap_or_default();
        validate_email(&email)?;
        validate_password(&password)?;

        Ok(Registration {
            email: email.trim().to_lowercase(),
            password,
            name: self.name.unwrap_or_default().trim().to_string(),
            phone: self.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        })
    }
}

pub fn validate_email(email: &str) -> Result<(), SharedError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(SharedError::validation("email", "must be a valid email address")),
    }
}

pub fn validate_password(password: &str) -> Result<(), SharedError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(SharedError::validation(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

/// Registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub msg: String,
    pub user_id: i64,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_role: Role,
    pub user_id: i64,
    pub user_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: Option<&str>, password: Option<&str>, name: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: email.map(String::from),
            password: password.map(String::from),
            name: name.map(String::from),
            phone: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        let registration = request(Some(" A@X.com "), Some("password1"), Some(" Ann ")).validate().unwrap();
        assert_eq!(registration.email, "a@x.com");
        assert_eq!(registration.name, "Ann");
    }

    #[test]
    fn test_validate_missing_fields() {
        let err = request(None, Some("password1"), None).validate().unwrap_err();
        assert_eq!(err, SharedError::missing(["email", "name"]));
    }

    #[test]
    fn test_validate_bad_email() {
        let err = request(Some("not-an-email"), Some("password1"), Some("Ann")).validate().unwrap_err();
        assert!(matches!(err, SharedError::ValidationError { ref field, .. } if field == "email"));
    }

    #[test]
    fn test_validate_short_password() {
        let err = request(Some("a@x.com"), Some("short"), Some("Ann")).validate().unwrap_err();
        assert!(matches!(err, SharedError::ValidationError { ref field, .. } if field == "password"));
    }
}
