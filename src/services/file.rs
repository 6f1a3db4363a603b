//! Module file service
//!
//! Stores uploaded blobs under the configured upload directory (sharded by
//! year/month), computes sizes, and keeps the metadata rows and blobs in
//! step: deleting a record always removes the underlying file.

use chrono::{Datelike, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::FileRepository;
use crate::models::{
    AiModule, AiModuleFile, AuditAction, EntityRef, FileType, NewAuditEntry, User,
};
use crate::services::audit::AuditService;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::permissions::ensure_can_edit;

/// Module file service
pub struct FileService {
    repo: Arc<dyn FileRepository>,
    audit: Arc<AuditService>,
    upload_dir: PathBuf,
    max_size_bytes: u64,
}

impl FileService {
    pub fn new(
        repo: Arc<dyn FileRepository>,
        audit: Arc<AuditService>,
        upload_dir: PathBuf,
        max_size_bytes: u64,
    ) -> Self {
        Self {
            repo,
            audit,
            upload_dir,
            max_size_bytes,
        }
    }

    /// Files of one module
    pub async fn list(&self, module_id: i64) -> ServiceResult<Vec<AiModuleFile>> {
        Ok(self.repo.for_module(module_id).await?)
    }

    /// File by ID, scoped to a module
    pub async fn get(&self, module_id: i64, file_id: i64) -> ServiceResult<AiModuleFile> {
        let file = self
            .repo
            .get(file_id)
            .await?
            .filter(|f| f.module_id == module_id)
            .ok_or_else(|| ServiceError::not_found(format!("File not found: {}", file_id)))?;
        Ok(file)
    }

    /// Store an uploaded file for a module.
    ///
    /// The caller must be allowed to edit the module. The blob lands under
    /// `<upload_dir>/<year>/<month>/<uuid>_<name>`; the recorded size is
    /// computed from the payload.
    pub async fn store(
        &self,
        user: &User,
        module: &AiModule,
        name: &str,
        file_type: FileType,
        description: String,
        data: &[u8],
    ) -> ServiceResult<AiModuleFile> {
        ensure_can_edit(user, module)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("File name is required"));
        }
        if data.is_empty() {
            return Err(ServiceError::validation("File is empty"));
        }
        if data.len() as u64 > self.max_size_bytes {
            return Err(ServiceError::validation(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.max_size_bytes
            )));
        }

        let now = Utc::now();
        let safe_name = sanitize_file_name(name);
        let relative = format!(
            "{:04}/{:02}/{}_{}",
            now.year(),
            now.month(),
            Uuid::new_v4().simple(),
            safe_name
        );

        let full_path = self.upload_dir.join(&relative);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create upload directory: {}", e))?;
        }
        tokio::fs::write(&full_path, data)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to store uploaded file: {}", e))?;

        let record = AiModuleFile {
            id: 0,
            module_id: module.id,
            name: name.to_string(),
            path: relative,
            file_type,
            description,
            size: data.len() as i64,
            uploaded_by: Some(user.id),
            uploaded_at: now,
        };

        let created = match self.repo.create(&record).await {
            Ok(created) => created,
            Err(e) => {
                // Don't leave an orphaned blob behind
                let _ = tokio::fs::remove_file(&full_path).await;
                return Err(e.into());
            }
        };

        self.audit
            .log(
                NewAuditEntry::new(EntityRef::module_file(created.id), AuditAction::Create)
                    .by(user.id)
                    .with_comment(format!("Uploaded '{}' to module '{}'", created.name, module.name)),
            )
            .await;

        Ok(created)
    }

    /// Delete a file record and its stored blob.
    pub async fn delete(
        &self,
        user: &User,
        module: &AiModule,
        file_id: i64,
    ) -> ServiceResult<()> {
        ensure_can_edit(user, module)?;

        // Validate the file belongs to the module before touching anything
        self.get(module.id, file_id).await?;

        let Some(deleted) = self.repo.delete(file_id).await? else {
            return Err(ServiceError::not_found(format!("File not found: {}", file_id)));
        };
        self.remove_blob(&deleted).await;

        self.audit
            .log(
                NewAuditEntry::new(EntityRef::module_file(file_id), AuditAction::Delete)
                    .by(user.id)
                    .with_comment(format!("Deleted '{}' from module '{}'", deleted.name, module.name)),
            )
            .await;

        Ok(())
    }

    /// Remove a stored blob from disk; a missing blob is only logged.
    pub async fn remove_blob(&self, file: &AiModuleFile) {
        let path = self.upload_dir.join(&file.path);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove stored file {}: {}", path.display(), e);
        }
    }
}

/// Keep file names path-safe: strip directories, replace odd characters.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxAuditRepository, SqlxFileRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::UserRole;

    async fn setup(dir: PathBuf) -> (FileService, User, AiModule) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES ('owner', 'o@e.com', 'h', CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO modules (name, slug, company, country, params_count,
             short_description, created_by, created_at, updated_at)
             VALUES ('M', 'm', 'c', 'Russia', 1, 'd', 1, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let service = FileService::new(
            SqlxFileRepository::boxed(pool.clone()),
            Arc::new(AuditService::new(SqlxAuditRepository::boxed(pool))),
            dir,
            1024 * 1024,
        );

        let mut user = User::new(
            "owner".to_string(),
            "o@e.com".to_string(),
            "h".to_string(),
            UserRole::User,
        );
        user.id = 1;

        let mut module = AiModule::new(
            "M".to_string(),
            "m".to_string(),
            "c".to_string(),
            "Russia".to_string(),
            1,
            "d".to_string(),
            1,
        );
        module.id = 1;

        (service, user, module)
    }

    #[tokio::test]
    async fn test_store_and_delete_removes_blob() {
        let dir = tempfile::tempdir().unwrap();
        let (service, user, module) = setup(dir.path().to_path_buf()).await;

        let stored = service
            .store(&user, &module, "weights.bin", FileType::Model, String::new(), b"12345")
            .await
            .unwrap();
        assert_eq!(stored.size, 5);

        let blob_path = dir.path().join(&stored.path);
        assert!(blob_path.exists());

        service.delete(&user, &module, stored.id).await.unwrap();
        assert!(!blob_path.exists(), "blob must be removed with the record");
        assert!(service.list(module.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_rejects_non_owner() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _, module) = setup(dir.path().to_path_buf()).await;

        let mut stranger = User::new(
            "stranger".to_string(),
            "s@e.com".to_string(),
            "h".to_string(),
            UserRole::User,
        );
        stranger.id = 42;

        let result = service
            .store(&stranger, &module, "x.txt", FileType::Doc, String::new(), b"data")
            .await;
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_store_validations() {
        let dir = tempfile::tempdir().unwrap();
        let (service, user, module) = setup(dir.path().to_path_buf()).await;

        assert!(service
            .store(&user, &module, "", FileType::Doc, String::new(), b"data")
            .await
            .is_err());
        assert!(service
            .store(&user, &module, "x.txt", FileType::Doc, String::new(), b"")
            .await
            .is_err());

        let huge = vec![0u8; 2 * 1024 * 1024];
        assert!(service
            .store(&user, &module, "x.bin", FileType::Model, String::new(), &huge)
            .await
            .is_err());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("weights.bin"), "weights.bin");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my file (1).txt"), "my_file__1_.txt");
    }
}
