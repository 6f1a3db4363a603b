//! Role capabilities
//!
//! A single capability table keyed by (role, capability), consulted once
//! per operation. Object-level ownership checks live on `User::can_edit`.

use crate::models::{AiModule, User, UserRole};
use crate::services::error::{ServiceError, ServiceResult};

/// What an operation requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create a new module
    CreateModule,
    /// Mutate modules owned by other users
    EditAnyModule,
    /// Approve, reject, block and unblock modules
    Moderate,
    /// See modules in every moderation status
    ViewAllStatuses,
    /// Read the user-activity analytics
    ViewUserAnalytics,
    /// Read the system-info endpoint
    ViewSystemInfo,
}

/// The capability table.
pub fn role_allows(role: UserRole, capability: Capability) -> bool {
    use Capability::*;

    match role {
        UserRole::Guest => false,
        UserRole::User => matches!(capability, CreateModule),
        UserRole::Admin => matches!(
            capability,
            CreateModule | EditAnyModule | Moderate | ViewAllStatuses | ViewUserAnalytics
                | ViewSystemInfo
        ),
    }
}

/// Check a capability for an active user, failing closed.
pub fn ensure(user: &User, capability: Capability) -> ServiceResult<()> {
    if user.is_blocked {
        return Err(ServiceError::forbidden("Account is blocked"));
    }
    if !role_allows(user.role, capability) {
        return Err(ServiceError::forbidden(match capability {
            Capability::Moderate => "Only administrators can moderate modules",
            Capability::ViewUserAnalytics => "Only administrators can view user analytics",
            Capability::ViewSystemInfo => "Only administrators can view system info",
            _ => "Insufficient permissions",
        }));
    }
    Ok(())
}

/// Check that the user may mutate the given module.
pub fn ensure_can_edit(user: &User, module: &AiModule) -> ServiceResult<()> {
    if user.is_blocked {
        return Err(ServiceError::forbidden("Account is blocked"));
    }
    if !user.can_edit(module.created_by) {
        return Err(ServiceError::forbidden(
            "You don't have permission to modify this module",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: UserRole) -> User {
        User::new(
            "u".to_string(),
            "u@e.com".to_string(),
            "h".to_string(),
            role,
        )
    }

    #[test]
    fn test_capability_matrix() {
        use Capability::*;

        let all = [
            CreateModule,
            EditAnyModule,
            Moderate,
            ViewAllStatuses,
            ViewUserAnalytics,
            ViewSystemInfo,
        ];

        for capability in all {
            assert!(!role_allows(UserRole::Guest, capability), "guests can do nothing");
            assert!(role_allows(UserRole::Admin, capability), "admins can do everything");
        }

        assert!(role_allows(UserRole::User, CreateModule));
        for capability in [EditAnyModule, Moderate, ViewAllStatuses, ViewUserAnalytics, ViewSystemInfo] {
            assert!(!role_allows(UserRole::User, capability));
        }
    }

    #[test]
    fn test_blocked_user_fails_closed() {
        let mut admin = user(UserRole::Admin);
        admin.is_blocked = true;
        assert!(ensure(&admin, Capability::Moderate).is_err());
    }

    #[test]
    fn test_ensure_can_edit() {
        let mut owner = user(UserRole::User);
        owner.id = 1;
        let mut other = user(UserRole::User);
        other.id = 2;
        let mut admin = user(UserRole::Admin);
        admin.id = 3;

        let mut module = AiModule::new(
            "M".to_string(),
            "m".to_string(),
            "C".to_string(),
            "Russia".to_string(),
            1,
            "d".to_string(),
            1,
        );
        module.created_at = Utc::now();

        assert!(ensure_can_edit(&owner, &module).is_ok());
        assert!(ensure_can_edit(&other, &module).is_err());
        assert!(ensure_can_edit(&admin, &module).is_ok());
    }
}
