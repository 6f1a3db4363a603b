//! Audit service
//!
//! Thin wrapper over the audit repository. Logging an action must never
//! break the operation that triggered it, so failures are swallowed with a
//! warning; reads propagate errors normally.

use std::sync::Arc;

use crate::db::repositories::AuditRepository;
use crate::models::{AuditAction, AuditEntry, EntityRef, NewAuditEntry};
use crate::services::error::ServiceResult;

/// Audit service
pub struct AuditService {
    repo: Arc<dyn AuditRepository>,
}

impl AuditService {
    pub fn new(repo: Arc<dyn AuditRepository>) -> Self {
        Self { repo }
    }

    /// Append an entry; failures are logged, never returned.
    pub async fn log(&self, entry: NewAuditEntry) {
        let action = entry.action;
        let entity = entry.entity;
        if let Err(e) = self.repo.append(&entry).await {
            tracing::warn!(
                "Failed to write audit entry ({} on {:?}): {}",
                action,
                entity,
                e
            );
        }
    }

    /// Entries for one entity, newest first
    pub async fn for_entity(&self, entity: EntityRef, limit: i64) -> ServiceResult<Vec<AuditEntry>> {
        Ok(self.repo.for_entity(entity, limit).await?)
    }

    /// Number of entries with the given action for an entity
    pub async fn count_actions(&self, entity: EntityRef, action: AuditAction) -> ServiceResult<i64> {
        Ok(self.repo.count_actions(entity, action).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxAuditRepository;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_log_and_read() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES ('a', 'a@e.com', 'h', CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let service = AuditService::new(SqlxAuditRepository::boxed(pool));
        service
            .log(NewAuditEntry::new(EntityRef::module(1), AuditAction::Approve).by(1))
            .await;

        let entries = service.for_entity(EntityRef::module(1), 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            service
                .count_actions(EntityRef::module(1), AuditAction::Approve)
                .await
                .unwrap(),
            1
        );
    }
}
