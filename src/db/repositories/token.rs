//! Revoked token repository
//!
//! Backs the logout blacklist: refresh tokens are identified by their jti
//! claim and stay revoked until they would have expired anyway.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Revoked token repository trait
#[async_trait]
pub trait RevokedTokenRepository: Send + Sync {
    /// Blacklist a token id until its natural expiry
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// Whether the token id is blacklisted
    async fn is_revoked(&self, jti: &str) -> Result<bool>;

    /// Drop entries whose tokens have expired; returns how many were removed
    async fn purge_expired(&self) -> Result<u64>;
}

/// SQLx-based revoked token repository implementation
pub struct SqlxRevokedTokenRepository {
    pool: SqlitePool,
}

impl SqlxRevokedTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn RevokedTokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RevokedTokenRepository for SqlxRevokedTokenRepository {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO revoked_tokens (jti, expires_at, revoked_at) VALUES (?, ?, ?)",
        )
        .bind(jti)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to revoke token")?;
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM revoked_tokens WHERE jti = ? LIMIT 1")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check token revocation")?;
        Ok(row.is_some())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to purge expired tokens")?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    #[tokio::test]
    async fn test_revoke_and_check() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxRevokedTokenRepository::new(pool);

        assert!(!repo.is_revoked("abc").await.unwrap());
        repo.revoke("abc", Utc::now() + Duration::hours(1)).await.unwrap();
        assert!(repo.is_revoked("abc").await.unwrap());
        // Revoking twice is harmless
        repo.revoke("abc", Utc::now() + Duration::hours(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxRevokedTokenRepository::new(pool);

        repo.revoke("old", Utc::now() - Duration::hours(1)).await.unwrap();
        repo.revoke("fresh", Utc::now() + Duration::hours(1)).await.unwrap();

        assert_eq!(repo.purge_expired().await.unwrap(), 1);
        assert!(!repo.is_revoked("old").await.unwrap());
        assert!(repo.is_revoked("fresh").await.unwrap());
    }
}
