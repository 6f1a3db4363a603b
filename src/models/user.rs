//! User model
//!
//! This module defines the User entity and related types.
//! Users own AI modules, likes and audit entries; their role drives the
//! capability checks in `services::permissions`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// Blocked accounts cannot authenticate or appear in listings
    pub is_blocked: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password`.
    pub fn new(username: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            role,
            is_blocked: false,
            first_name: String::new(),
            last_name: String::new(),
            organization: String::new(),
            country: String::new(),
            phone: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Check if the user can mutate content owned by `owner_id`.
    ///
    /// Admins can edit anything; everyone else only their own records.
    pub fn can_edit(&self, owner_id: i64) -> bool {
        self.is_admin() || self.id == owner_id
    }

    /// Check if the user may act at all (not blocked)
    pub fn is_active(&self) -> bool {
        !self.is_blocked
    }
}

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Unauthenticated read-only visitor
    Guest,
    /// Regular registered user
    User,
    /// Administrator with moderation rights
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Guest => write!(f, "guest"),
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "guest" => Ok(UserRole::Guest),
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

/// Input for updating the caller's own profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: UserRole) -> User {
        User::new(
            "testuser".to_string(),
            "test@example.com".to_string(),
            "hash".to_string(),
            role,
        )
    }

    #[test]
    fn test_user_is_admin() {
        assert!(user_with_role(UserRole::Admin).is_admin());
        assert!(!user_with_role(UserRole::User).is_admin());
        assert!(!user_with_role(UserRole::Guest).is_admin());
    }

    #[test]
    fn test_user_can_edit() {
        let mut admin = user_with_role(UserRole::Admin);
        admin.id = 1;
        let mut user = user_with_role(UserRole::User);
        user.id = 2;

        assert!(admin.can_edit(2));
        assert!(admin.can_edit(999));
        assert!(user.can_edit(2));
        assert!(!user.can_edit(1));
    }

    #[test]
    fn test_user_role_round_trip() {
        for role in [UserRole::Guest, UserRole::User, UserRole::Admin] {
            assert_eq!(UserRole::from_str(&role.to_string()).unwrap(), role);
        }
        assert!(UserRole::from_str("editor").is_err());
    }

    #[test]
    fn test_blocked_user_is_not_active() {
        let mut user = user_with_role(UserRole::User);
        assert!(user.is_active());
        user.is_blocked = true;
        assert!(!user.is_active());
    }
}
