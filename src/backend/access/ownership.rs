/**
 * Ownership Rules
 *
 * Per-entity checks layered on top of role gates. Staff bypass ownership
 * for reads; everybody else only reaches entities where they are the
 * designated client (or, for appointments, the attorney).
 */

use super::policy::{permits, Action};
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthenticatedUser;

/// Case client or staff
pub fn can_view_case(principal: &AuthenticatedUser, client_id: i64) -> bool {
    permits(principal, Action::ListAllCases) || principal.user_id == client_id
}

/// `Forbidden` unless `can_view_case`
pub fn ensure_can_view_case(principal: &AuthenticatedUser, client_id: i64) -> Result<(), BackendError> {
    if can_view_case(principal, client_id) {
        Ok(())
    } else {
        tracing::warn!("User {} denied access to a case of client {}", principal.user_id, client_id);
        Err(BackendError::forbidden("You do not have access to this case"))
    }
}

/// Private notes are staff-only; public notes follow case visibility.
pub fn can_view_note(principal: &AuthenticatedUser, case_client_id: i64, is_private: bool) -> bool {
    if is_private {
        permits(principal, Action::ViewAllNotes)
    } else {
        can_view_case(principal, case_client_id)
    }
}

/// Staff, the appointment's client or its attorney
pub fn can_access_appointment(principal: &AuthenticatedUser, client_id: i64, attorney_id: i64) -> bool {
    permits(principal, Action::ManageAppointments)
        || principal.user_id == client_id
        || principal.user_id == attorney_id
}

/// `Forbidden` unless `can_access_appointment`
pub fn ensure_can_access_appointment(
    principal: &AuthenticatedUser,
    client_id: i64,
    attorney_id: i64,
) -> Result<(), BackendError> {
    if can_access_appointment(principal, client_id, attorney_id) {
        Ok(())
    } else {
        tracing::warn!("User {} denied access to an appointment", principal.user_id);
        Err(BackendError::forbidden("You do not have access to this appointment"))
    }
}

/// Refuse user-management actions aimed at the caller's own account
///
/// # Arguments
///
/// * `principal` - Acting user
/// * `target_id` - Account being changed
/// * `what` - Verb phrase for the error, e.g. "delete your own account"
pub fn ensure_not_self(principal: &AuthenticatedUser, target_id: i64, what: &str) -> Result<(), BackendError> {
    if principal.user_id == target_id {
        tracing::warn!("User {} attempted to {}", principal.user_id, what);
        Err(BackendError::forbidden(format!("You cannot {}", what)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Role;

    fn principal(user_id: i64, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id,
            email: format!("u{}@x.com", user_id),
            name: format!("U{}", user_id),
            role,
        }
    }

    #[test]
    fn test_case_visibility() {
        assert!(can_view_case(&principal(1, Role::Client), 1));
        assert!(!can_view_case(&principal(2, Role::Client), 1));
        assert!(!can_view_case(&principal(2, Role::Viewer), 1));
        assert!(can_view_case(&principal(3, Role::CaseManager), 1));
        assert!(can_view_case(&principal(4, Role::SuperAdmin), 1));
    }

    #[test]
    fn test_private_notes_never_reach_clients() {
        let owner = principal(1, Role::Client);
        assert!(!can_view_note(&owner, 1, true));
        assert!(can_view_note(&owner, 1, false));
        assert!(!can_view_note(&principal(2, Role::Client), 1, false));
        assert!(can_view_note(&principal(3, Role::CaseManager), 1, true));
    }

    #[test]
    fn test_appointment_access() {
        assert!(can_access_appointment(&principal(1, Role::Client), 1, 9));
        assert!(can_access_appointment(&principal(9, Role::Viewer), 1, 9));
        assert!(!can_access_appointment(&principal(2, Role::Client), 1, 9));
        assert!(can_access_appointment(&principal(5, Role::CaseManager), 1, 9));
    }

    #[test]
    fn test_self_carve_out() {
        let admin = principal(7, Role::SuperAdmin);
        assert!(ensure_not_self(&admin, 7, "delete your own account").is_err());
        assert!(ensure_not_self(&admin, 8, "delete your own account").is_ok());
    }
}
