//! Audit log repository
//!
//! Append-only. Entries are never updated or deleted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{AuditAction, AuditEntry, EntityKind, EntityRef, NewAuditEntry};

/// Audit repository trait
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Append an entry
    async fn append(&self, entry: &NewAuditEntry) -> Result<AuditEntry>;

    /// Entries for one entity, newest first
    async fn for_entity(&self, entity: EntityRef, limit: i64) -> Result<Vec<AuditEntry>>;

    /// Entries performed by one user, newest first
    async fn for_performer(&self, user_id: i64, limit: i64) -> Result<Vec<AuditEntry>>;

    /// Number of entries with the given action for an entity
    async fn count_actions(&self, entity: EntityRef, action: AuditAction) -> Result<i64>;
}

/// SQLx-based audit repository implementation
pub struct SqlxAuditRepository {
    pool: SqlitePool,
}

impl SqlxAuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn AuditRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AuditRepository for SqlxAuditRepository {
    async fn append(&self, entry: &NewAuditEntry) -> Result<AuditEntry> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO audit_log
                (entity_kind, entity_id, action, performed_by, timestamp,
                 comment, old_values, new_values, ip_address)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.entity.kind.as_str())
        .bind(entry.entity.id)
        .bind(entry.action.as_str())
        .bind(entry.performed_by)
        .bind(now)
        .bind(&entry.comment)
        .bind(entry.old_values.to_string())
        .bind(entry.new_values.to_string())
        .bind(&entry.ip_address)
        .execute(&self.pool)
        .await
        .context("Failed to append audit entry")?;

        Ok(AuditEntry {
            id: result.last_insert_rowid(),
            entity: entry.entity,
            action: entry.action,
            performed_by: entry.performed_by,
            timestamp: now,
            comment: entry.comment.clone(),
            old_values: entry.old_values.clone(),
            new_values: entry.new_values.clone(),
            ip_address: entry.ip_address.clone(),
        })
    }

    async fn for_entity(&self, entity: EntityRef, limit: i64) -> Result<Vec<AuditEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM audit_log WHERE entity_kind = ? AND entity_id = ? \
             ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(entity.kind.as_str())
        .bind(entity.id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to read audit entries")?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn for_performer(&self, user_id: i64, limit: i64) -> Result<Vec<AuditEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM audit_log WHERE performed_by = ? \
             ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to read performer audit entries")?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn count_actions(&self, entity: EntityRef, action: AuditAction) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS c FROM audit_log \
             WHERE entity_kind = ? AND entity_id = ? AND action = ?",
        )
        .bind(entity.kind.as_str())
        .bind(entity.id)
        .bind(action.as_str())
        .fetch_one(&self.pool)
        .await
        .context("Failed to count audit actions")?;
        Ok(row.get("c"))
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<AuditEntry> {
    let kind_str: String = row.get("entity_kind");
    let kind = EntityKind::from_str(&kind_str)
        .with_context(|| format!("Unknown entity kind in audit log: {}", kind_str))?;
    let action_str: String = row.get("action");
    let action = AuditAction::from_str(&action_str)
        .with_context(|| format!("Unknown audit action: {}", action_str))?;
    let old_values: String = row.get("old_values");
    let new_values: String = row.get("new_values");

    Ok(AuditEntry {
        id: row.get("id"),
        entity: EntityRef {
            kind,
            id: row.get("entity_id"),
        },
        action,
        performed_by: row.get("performed_by"),
        timestamp: row.get("timestamp"),
        comment: row.get("comment"),
        old_values: serde_json::from_str(&old_values).unwrap_or_else(|_| serde_json::json!({})),
        new_values: serde_json::from_str(&new_values).unwrap_or_else(|_| serde_json::json!({})),
        ip_address: row.get("ip_address"),
    })
}
