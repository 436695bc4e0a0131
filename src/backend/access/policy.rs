/**
 * Authorization Policy
 *
 * One declarative table maps each guarded capability (`Action`) to the
 * roles allowed to perform it. Handlers never compare roles inline; they
 * call `require(principal, Action::X)` for role gates and the ownership
 * helpers in `ownership.rs` for per-entity rules.
 */

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthenticatedUser;
use crate::shared::Role;

/// Case-working roles
pub const STAFF: &[Role] = &[Role::CaseManager, Role::SuperAdmin];

const EVERYONE: &[Role] = &[
    Role::Client,
    Role::CaseManager,
    Role::ContentEditor,
    Role::SuperAdmin,
    Role::Viewer,
];

const SUPER_ADMIN: &[Role] = &[Role::SuperAdmin];

const BOOKING: &[Role] = &[Role::Client, Role::CaseManager, Role::SuperAdmin];

/// Guarded capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SubmitCase,
    ListAllCases,
    UpdateCase,
    CloseCase,
    ViewAllNotes,
    WriteNote,
    ManageDeadlines,
    ListAllMessages,
    MessageClients,
    BookAppointment,
    ManageAppointments,
    DeleteAppointment,
    RegenerateMeetingLink,
    ListCaseManagers,
    ManageUsers,
    ViewSystemStats,
}

impl Action {
    /// Roles allowed to perform this action
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Action::SubmitCase => EVERYONE,
            Action::BookAppointment => BOOKING,
            Action::ListAllCases
            | Action::UpdateCase
            | Action::CloseCase
            | Action::ViewAllNotes
            | Action::WriteNote
            | Action::ManageDeadlines
            | Action::ListAllMessages
            | Action::MessageClients
            | Action::ManageAppointments
            | Action::DeleteAppointment
            | Action::RegenerateMeetingLink
            | Action::ListCaseManagers => STAFF,
            Action::ManageUsers | Action::ViewSystemStats => SUPER_ADMIN,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Action::SubmitCase => "submit cases",
            Action::ListAllCases => "list all cases",
            Action::UpdateCase => "update cases",
            Action::CloseCase => "close cases",
            Action::ViewAllNotes => "read private notes",
            Action::WriteNote => "author case notes",
            Action::ManageDeadlines => "manage deadlines",
            Action::ListAllMessages => "list all messages",
            Action::MessageClients => "message clients on any case",
            Action::BookAppointment => "book appointments",
            Action::ManageAppointments => "manage appointment details",
            Action::DeleteAppointment => "delete appointments",
            Action::RegenerateMeetingLink => "regenerate meeting links",
            Action::ListCaseManagers => "list case managers",
            Action::ManageUsers => "manage users",
            Action::ViewSystemStats => "view system statistics",
        }
    }
}

/// Does the principal's role satisfy the allowed set?
pub fn authorize(principal: &AuthenticatedUser, allowed_roles: &[Role]) -> bool {
    allowed_roles.contains(&principal.role)
}

/// Non-failing form of `require`, for branching on scope rather than refusing
pub fn permits(principal: &AuthenticatedUser, action: Action) -> bool {
    authorize(principal, action.allowed_roles())
}

/// Role gate for an action
///
/// # Errors
///
/// `Forbidden` when the principal's role is not allowed.
pub fn require(principal: &AuthenticatedUser, action: Action) -> Result<(), BackendError> {
    if permits(principal, action) {
        Ok(())
    } else {
        tracing::warn!(
            "User {} ({}) denied: may not {}",
            principal.user_id,
            principal.role,
            action.describe()
        );
        Err(BackendError::forbidden(format!(
            "Your role is not permitted to {}",
            action.describe()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn principal(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: 1,
            email: "p@x.com".to_string(),
            name: "P".to_string(),
            role,
        }
    }

    #[test]
    fn test_authorize_membership() {
        assert!(authorize(&principal(Role::CaseManager), STAFF));
        assert!(!authorize(&principal(Role::Viewer), STAFF));
        assert!(!authorize(&principal(Role::Client), &[]));
    }

    #[test]
    fn test_staff_actions() {
        for role in [Role::Client, Role::ContentEditor, Role::Viewer] {
            assert!(require(&principal(role), Action::UpdateCase).is_err());
            assert!(require(&principal(role), Action::WriteNote).is_err());
        }
        for role in [Role::CaseManager, Role::SuperAdmin] {
            assert!(require(&principal(role), Action::UpdateCase).is_ok());
            assert!(require(&principal(role), Action::WriteNote).is_ok());
        }
    }

    #[test]
    fn test_user_management_is_super_admin_only() {
        assert!(require(&principal(Role::SuperAdmin), Action::ManageUsers).is_ok());
        let err = require(&principal(Role::CaseManager), Action::ManageUsers).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_any_role_may_submit_case() {
        for role in Role::ALL {
            assert!(require(&principal(*role), Action::SubmitCase).is_ok());
        }
    }

    #[test]
    fn test_staff_scopes_follow_table() {
        for action in [Action::ViewAllNotes, Action::ManageAppointments, Action::MessageClients] {
            assert!(permits(&principal(Role::CaseManager), action));
            assert!(permits(&principal(Role::SuperAdmin), action));
            assert!(!permits(&principal(Role::Client), action));
            assert!(!permits(&principal(Role::Viewer), action));
        }
    }

    #[test]
    fn test_booking_excludes_content_roles() {
        assert!(require(&principal(Role::Client), Action::BookAppointment).is_ok());
        assert!(require(&principal(Role::Viewer), Action::BookAppointment).is_err());
        assert!(require(&principal(Role::ContentEditor), Action::BookAppointment).is_err());
    }
}
