//! User service
//!
//! Registration with synchronous validation, profile management, password
//! change and the public user read surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repositories::{PublicationRepository, UserFilter, UserRepository};
use crate::models::{
    AuditAction, CreateUserInput, EntityRef, ListParams, NewAuditEntry, PagedResult,
    UpdateProfileInput, User, UserRole,
};
use crate::services::audit::AuditService;
use crate::services::email::EmailService;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::password::{hash_password, validate_strength, verify_password};

/// Aggregate numbers for a user's public stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccountStats {
    pub total_modules: i64,
    pub total_likes_received: i64,
    pub total_publications: i64,
    pub member_since: DateTime<Utc>,
}

/// User service
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    publications: Arc<dyn PublicationRepository>,
    audit: Arc<AuditService>,
    email: Arc<EmailService>,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        publications: Arc<dyn PublicationRepository>,
        audit: Arc<AuditService>,
        email: Arc<EmailService>,
    ) -> Self {
        Self {
            repo,
            publications,
            audit,
            email,
        }
    }

    /// Register a new account.
    ///
    /// Required fields, username/email uniqueness and password strength
    /// are all validated before anything is persisted.
    pub async fn register(&self, input: CreateUserInput) -> ServiceResult<User> {
        for (value, field) in [
            (&input.username, "username"),
            (&input.email, "email"),
            (&input.password, "password"),
            (&input.first_name, "first_name"),
            (&input.last_name, "last_name"),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::validation(format!("{} is required", field)));
            }
        }

        if self.repo.username_exists(input.username.trim()).await? {
            return Err(ServiceError::validation("Username already exists"));
        }
        if self.repo.email_exists(input.email.trim()).await? {
            return Err(ServiceError::validation("Email already exists"));
        }
        validate_strength(&input.password)?;

        let mut user = User::new(
            input.username.trim().to_string(),
            input.email.trim().to_string(),
            hash_password(&input.password)?,
            UserRole::User,
        );
        user.first_name = input.first_name.trim().to_string();
        user.last_name = input.last_name.trim().to_string();
        user.organization = input.organization;
        user.country = input.country;
        user.phone = input.phone;

        let user = self.repo.create(&user).await?;

        self.audit
            .log(
                NewAuditEntry::new(EntityRef::user(user.id), AuditAction::Create)
                    .by(user.id)
                    .with_comment("Registered"),
            )
            .await;
        self.email.send_welcome(&user).await;

        Ok(user)
    }

    /// User by ID; blocked accounts read as absent.
    pub async fn get_public(&self, id: i64) -> ServiceResult<User> {
        self.repo
            .get(id)
            .await?
            .filter(|u| !u.is_blocked)
            .ok_or_else(|| ServiceError::not_found(format!("User not found: {}", id)))
    }

    /// Public user listing
    pub async fn list(
        &self,
        filter: &UserFilter,
        params: &ListParams,
    ) -> ServiceResult<PagedResult<User>> {
        Ok(self.repo.list(filter, params).await?)
    }

    /// Update the caller's own profile.
    pub async fn update_profile(
        &self,
        user: &User,
        input: UpdateProfileInput,
    ) -> ServiceResult<User> {
        let mut updated = user.clone();

        if let Some(email) = input.email {
            let email = email.trim().to_string();
            if email.is_empty() {
                return Err(ServiceError::validation("email is required"));
            }
            if email != user.email && self.repo.email_exists(&email).await? {
                return Err(ServiceError::validation("Email already exists"));
            }
            updated.email = email;
        }
        if let Some(first_name) = input.first_name {
            updated.first_name = first_name;
        }
        if let Some(last_name) = input.last_name {
            updated.last_name = last_name;
        }
        if let Some(organization) = input.organization {
            updated.organization = organization;
        }
        if let Some(country) = input.country {
            updated.country = country;
        }
        if let Some(phone) = input.phone {
            updated.phone = phone;
        }

        self.repo.update(&updated).await?;

        self.audit
            .log(
                NewAuditEntry::new(EntityRef::user(user.id), AuditAction::Update)
                    .by(user.id)
                    .with_comment("Profile updated"),
            )
            .await;

        self.repo
            .get(user.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User vanished during update"))
    }

    /// Change the caller's password, verifying the current one first.
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        if !verify_password(current_password, &user.password_hash)? {
            return Err(ServiceError::validation("Current password is incorrect"));
        }
        validate_strength(new_password)?;

        self.repo
            .set_password(user.id, &hash_password(new_password)?)
            .await?;
        Ok(())
    }

    /// Aggregates for a user's public stats endpoint.
    pub async fn account_stats(&self, id: i64) -> ServiceResult<UserAccountStats> {
        let user = self.get_public(id).await?;

        Ok(UserAccountStats {
            total_modules: self.repo.module_count(id).await?,
            total_likes_received: self.repo.likes_received(id).await?,
            total_publications: self.publications.count_for_creator(id).await?,
            member_since: user.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailConfig;
    use crate::db::repositories::{
        SqlxAuditRepository, SqlxPublicationRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> UserService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxPublicationRepository::boxed(pool.clone()),
            Arc::new(AuditService::new(SqlxAuditRepository::boxed(pool))),
            Arc::new(EmailService::new(EmailConfig::default())),
        )
    }

    fn registration(username: &str) -> CreateUserInput {
        CreateUserInput {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "sensible-pass1".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            organization: String::new(),
            country: String::new(),
            phone: String::new(),
        }
    }

    #[tokio::test]
    async fn test_register_happy_path() {
        let service = setup().await;
        let user = service.register(registration("alice")).await.unwrap();
        assert_eq!(user.role, UserRole::User);
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let service = setup().await;
        service.register(registration("bob")).await.unwrap();

        assert!(matches!(
            service.register(registration("bob")).await,
            Err(ServiceError::Validation(_))
        ));

        let mut same_email = registration("bob2");
        same_email.email = "bob@example.com".to_string();
        assert!(service.register(same_email).await.is_err());
    }

    #[tokio::test]
    async fn test_register_validates_fields_and_password() {
        let service = setup().await;

        let mut missing = registration("x");
        missing.first_name = String::new();
        assert!(service.register(missing).await.is_err());

        let mut weak = registration("y");
        weak.password = "12345678".to_string();
        assert!(matches!(
            service.register(weak).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let service = setup().await;
        let user = service.register(registration("carol")).await.unwrap();

        assert!(service
            .change_password(&user, "wrong-password", "new-pass-123a")
            .await
            .is_err());
        service
            .change_password(&user, "sensible-pass1", "new-pass-123a")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_profile_checks_email_uniqueness() {
        let service = setup().await;
        service.register(registration("dan")).await.unwrap();
        let eve = service.register(registration("eve")).await.unwrap();

        let conflict = service
            .update_profile(
                &eve,
                UpdateProfileInput {
                    email: Some("dan@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(conflict.is_err());

        let updated = service
            .update_profile(
                &eve,
                UpdateProfileInput {
                    organization: Some("MSU".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.organization, "MSU");
    }

    #[tokio::test]
    async fn test_account_stats() {
        let service = setup().await;
        let user = service.register(registration("frank")).await.unwrap();
        let stats = service.account_stats(user.id).await.unwrap();
        assert_eq!(stats.total_modules, 0);
        assert_eq!(stats.total_publications, 0);
    }
}
