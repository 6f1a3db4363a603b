//! Module file repository
//!
//! Persistence for file metadata; the stored blobs themselves are handled
//! by `services::file`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{AiModuleFile, FileType};

/// Module file repository trait
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn create(&self, file: &AiModuleFile) -> Result<AiModuleFile>;

    async fn get(&self, id: i64) -> Result<Option<AiModuleFile>>;

    /// Files of one module, newest first
    async fn for_module(&self, module_id: i64) -> Result<Vec<AiModuleFile>>;

    /// Delete the metadata row, returning it so the caller can remove the
    /// stored blob.
    async fn delete(&self, id: i64) -> Result<Option<AiModuleFile>>;
}

/// SQLx-based file repository implementation
pub struct SqlxFileRepository {
    pool: SqlitePool,
}

impl SqlxFileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn FileRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FileRepository for SqlxFileRepository {
    async fn create(&self, file: &AiModuleFile) -> Result<AiModuleFile> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO module_files
                (module_id, name, path, file_type, description, size, uploaded_by, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(file.module_id)
        .bind(&file.name)
        .bind(&file.path)
        .bind(file.file_type.as_str())
        .bind(&file.description)
        .bind(file.size)
        .bind(file.uploaded_by)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create module file")?;

        let mut created = file.clone();
        created.id = result.last_insert_rowid();
        created.uploaded_at = now;
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<AiModuleFile>> {
        let row = sqlx::query("SELECT * FROM module_files WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get module file")?;

        row.map(|r| row_to_file(&r)).transpose()
    }

    async fn for_module(&self, module_id: i64) -> Result<Vec<AiModuleFile>> {
        let rows = sqlx::query(
            "SELECT * FROM module_files WHERE module_id = ? ORDER BY uploaded_at DESC, id DESC",
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list module files")?;

        rows.iter().map(row_to_file).collect()
    }

    async fn delete(&self, id: i64) -> Result<Option<AiModuleFile>> {
        let file = self.get(id).await?;
        if file.is_some() {
            sqlx::query("DELETE FROM module_files WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await
                .context("Failed to delete module file")?;
        }
        Ok(file)
    }
}

fn row_to_file(row: &sqlx::sqlite::SqliteRow) -> Result<AiModuleFile> {
    let type_str: String = row.get("file_type");
    let file_type = FileType::from_str(&type_str)
        .with_context(|| format!("Unknown file type in database: {}", type_str))?;

    Ok(AiModuleFile {
        id: row.get("id"),
        module_id: row.get("module_id"),
        name: row.get("name"),
        path: row.get("path"),
        file_type,
        description: row.get("description"),
        size: row.get("size"),
        uploaded_by: row.get("uploaded_by"),
        uploaded_at: row.get("uploaded_at"),
    })
}
