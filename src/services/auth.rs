//! JWT authentication
//!
//! HS256 access/refresh token pairs. Refresh tokens rotate on use and can
//! be blacklisted by jti (logout); access tokens are short-lived and
//! verified statelessly except for the user lookup.

use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::repositories::{RevokedTokenRepository, UserRepository};
use crate::models::User;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::password::verify_password;

/// Token kind discriminator inside the claims
const TOKEN_TYPE_ACCESS: &str = "access";
const TOKEN_TYPE_REFRESH: &str = "refresh";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    pub username: String,
    pub role: String,
    /// "access" or "refresh"
    pub token_type: String,
    /// Token id, used for refresh blacklisting
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// An issued access/refresh pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn RevokedTokenRepository>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn RevokedTokenRepository>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            tokens,
            config,
        }
    }

    /// Verify credentials and issue a token pair.
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<(User, TokenPair)> {
        let user = self
            .users
            .by_username(username)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("Invalid username or password"))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(ServiceError::unauthorized("Invalid username or password"));
        }
        if user.is_blocked {
            return Err(ServiceError::forbidden("Account is blocked"));
        }

        let pair = self.issue_pair(&user)?;
        Ok((user, pair))
    }

    /// Issue a fresh access/refresh pair for the user.
    pub fn issue_pair(&self, user: &User) -> ServiceResult<TokenPair> {
        let access = self.issue(user, TOKEN_TYPE_ACCESS, self.config.access_ttl_seconds)?;
        let refresh = self.issue(user, TOKEN_TYPE_REFRESH, self.config.refresh_ttl_seconds)?;
        Ok(TokenPair { access, refresh })
    }

    /// Rotate a refresh token: validate it, blacklist its jti, issue a new
    /// pair.
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<(User, TokenPair)> {
        let claims = self.decode_checked(refresh_token, TOKEN_TYPE_REFRESH)?;

        if self.tokens.is_revoked(&claims.jti).await? {
            return Err(ServiceError::unauthorized("Token has been revoked"));
        }

        let user = self
            .users
            .get(claims.sub)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("User no longer exists"))?;
        if user.is_blocked {
            return Err(ServiceError::forbidden("Account is blocked"));
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or_else(Utc::now);
        self.tokens.revoke(&claims.jti, expires_at).await?;

        let pair = self.issue_pair(&user)?;
        Ok((user, pair))
    }

    /// Validate any token and return its claims (verify endpoint).
    pub fn verify(&self, token: &str) -> ServiceResult<Claims> {
        self.decode(token)
    }

    /// Authenticate a request: decode an access token and load its user.
    pub async fn authenticate(&self, access_token: &str) -> ServiceResult<User> {
        let claims = self.decode_checked(access_token, TOKEN_TYPE_ACCESS)?;

        let user = self
            .users
            .get(claims.sub)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("User no longer exists"))?;
        if user.is_blocked {
            return Err(ServiceError::forbidden("Account is blocked"));
        }
        Ok(user)
    }

    /// Blacklist a refresh token (logout).
    pub async fn logout(&self, refresh_token: &str) -> ServiceResult<()> {
        let claims = self.decode_checked(refresh_token, TOKEN_TYPE_REFRESH)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or_else(Utc::now);
        self.tokens.revoke(&claims.jti, expires_at).await?;
        Ok(())
    }

    fn issue(&self, user: &User, token_type: &str, ttl_seconds: u64) -> ServiceResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.to_string(),
            token_type: token_type.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_seconds as i64)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to sign token: {}", e)))
    }

    fn decode(&self, token: &str) -> ServiceResult<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| ServiceError::unauthorized("Invalid or expired token"))?;
        Ok(data.claims)
    }

    fn decode_checked(&self, token: &str, expected_type: &str) -> ServiceResult<Claims> {
        let claims = self.decode(token)?;
        if claims.token_type != expected_type {
            return Err(ServiceError::unauthorized(format!(
                "Expected {} token",
                expected_type
            )));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxRevokedTokenRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::UserRole;
    use crate::services::password::hash_password;

    async fn setup() -> (AuthService, User) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let users = SqlxUserRepository::boxed(pool.clone());
        let user = users
            .create(&User::new(
                "alice".to_string(),
                "alice@example.com".to_string(),
                hash_password("correct-horse1").unwrap(),
                UserRole::User,
            ))
            .await
            .unwrap();

        let service = AuthService::new(
            users,
            SqlxRevokedTokenRepository::boxed(pool),
            AuthConfig::default(),
        );
        (service, user)
    }

    #[tokio::test]
    async fn test_login_and_authenticate() {
        let (service, user) = setup().await;

        let (logged_in, pair) = service.login("alice", "correct-horse1").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let authed = service.authenticate(&pair.access).await.unwrap();
        assert_eq!(authed.username, "alice");

        // Refresh tokens do not authenticate requests
        assert!(service.authenticate(&pair.refresh).await.is_err());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (service, _) = setup().await;
        assert!(matches!(
            service.login("alice", "wrong").await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(service.login("nobody", "whatever").await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_blacklists() {
        let (service, _) = setup().await;
        let (_, pair) = service.login("alice", "correct-horse1").await.unwrap();

        let (_, new_pair) = service.refresh(&pair.refresh).await.unwrap();
        assert_ne!(new_pair.refresh, pair.refresh);

        // The old refresh token is now blacklisted
        assert!(matches!(
            service.refresh(&pair.refresh).await,
            Err(ServiceError::Unauthorized(_))
        ));
        // The new one still works
        assert!(service.refresh(&new_pair.refresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_blacklists() {
        let (service, _) = setup().await;
        let (_, pair) = service.login("alice", "correct-horse1").await.unwrap();

        service.logout(&pair.refresh).await.unwrap();
        assert!(service.refresh(&pair.refresh).await.is_err());
    }

    #[tokio::test]
    async fn test_verify_reports_claims() {
        let (service, user) = setup().await;
        let pair = service.issue_pair(&user).unwrap();

        let claims = service.verify(&pair.access).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.token_type, "access");
        assert!(service.verify("garbage").is_err());
    }
}
