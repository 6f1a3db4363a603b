//! Module service
//!
//! Business rules for the registry entity: slug generation, creation with
//! nested detail/tags/publications, the moderation state machine, likes,
//! similar-module suggestions and visibility rules.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::{CacheLayer, MemoryCache, TTL_SIMILAR};
use crate::db::repositories::{
    ModuleFilter, ModuleRepository, ModuleVisibility, PublicationRepository, UserRepository,
};
use crate::models::{
    AiModule, AiModuleDetail, AiModuleFile, AuditAction, CreateModuleInput, EntityRef, ListParams,
    ModuleStatus, ModuleWithMeta, NewAuditEntry, PagedResult, Publication, TagWithCategory,
    UpdateModuleInput, User,
};
use crate::services::audit::AuditService;
use crate::services::email::EmailService;
use crate::services::enrich::{
    derive_field, EnrichedValue, AVAILABILITY_CATEGORY, USAGE_STATUS_CATEGORY,
};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::file::FileService;
use crate::services::permissions::{ensure, ensure_can_edit, Capability};
use crate::services::slug::{slug_candidates, slugify};
use crate::services::tag::TagService;

/// Maximum slug length for modules
const SLUG_MAX_LENGTH: usize = 255;
/// Number of similar modules returned
const SIMILAR_LIMIT: i64 = 5;

/// Outcome of a like/unlike call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: i64,
    pub message: String,
}

/// Everything the detail view needs, assembled in one place
#[derive(Debug, Clone)]
pub struct ModuleFull {
    pub module: ModuleWithMeta,
    pub detail: Option<AiModuleDetail>,
    pub tags: Vec<TagWithCategory>,
    pub publications: Vec<Publication>,
    pub files: Vec<AiModuleFile>,
    pub is_liked: bool,
    pub availability: Option<EnrichedValue>,
    pub usage_status: Option<EnrichedValue>,
}

/// A module with its derived export columns resolved
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub module: ModuleWithMeta,
    pub tags: Vec<String>,
    pub created_by_name: String,
    pub publications_count: i64,
}

/// Module service
pub struct ModuleService {
    modules: Arc<dyn ModuleRepository>,
    publications: Arc<dyn PublicationRepository>,
    users: Arc<dyn UserRepository>,
    tags: Arc<TagService>,
    files: Arc<FileService>,
    audit: Arc<AuditService>,
    email: Arc<EmailService>,
    cache: Arc<MemoryCache>,
}

impl ModuleService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        modules: Arc<dyn ModuleRepository>,
        publications: Arc<dyn PublicationRepository>,
        users: Arc<dyn UserRepository>,
        tags: Arc<TagService>,
        files: Arc<FileService>,
        audit: Arc<AuditService>,
        email: Arc<EmailService>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self {
            modules,
            publications,
            users,
            tags,
            files,
            audit,
            email,
            cache,
        }
    }

    // ========================================================================
    // Visibility
    // ========================================================================

    /// Apply the caller's visibility to a filter. Non-admins only see
    /// published modules (plus their own) and cannot filter by status.
    pub fn effective_filter(&self, user: Option<&User>, mut filter: ModuleFilter) -> ModuleFilter {
        match user {
            Some(u) if u.is_admin() => {
                filter.visibility = ModuleVisibility::All;
            }
            Some(u) => {
                filter.visibility = ModuleVisibility::PublicOrOwn(u.id);
                filter.status = None;
            }
            None => {
                filter.visibility = ModuleVisibility::PublicOnly;
                filter.status = None;
            }
        }
        filter
    }

    fn is_visible_to(module: &AiModule, user: Option<&User>) -> bool {
        if module.status == ModuleStatus::Active {
            return true;
        }
        match user {
            Some(u) => u.is_admin() || u.id == module.created_by,
            None => false,
        }
    }

    /// Module by ID, honoring visibility. Invisible modules read as absent.
    pub async fn get_visible(&self, user: Option<&User>, id: i64) -> ServiceResult<AiModule> {
        let module = self
            .modules
            .get(id)
            .await?
            .filter(|m| Self::is_visible_to(m, user))
            .ok_or_else(|| ServiceError::not_found(format!("Module not found: {}", id)))?;
        Ok(module)
    }

    /// Module by slug, honoring visibility.
    pub async fn get_by_slug_visible(
        &self,
        user: Option<&User>,
        slug: &str,
    ) -> ServiceResult<AiModule> {
        let module = self
            .modules
            .get_by_slug(slug)
            .await?
            .filter(|m| Self::is_visible_to(m, user))
            .ok_or_else(|| ServiceError::not_found(format!("Module not found: {}", slug)))?;
        Ok(module)
    }

    /// Filtered, paginated listing with the caller's visibility applied.
    pub async fn list(
        &self,
        user: Option<&User>,
        filter: ModuleFilter,
        params: &ListParams,
    ) -> ServiceResult<PagedResult<ModuleWithMeta>> {
        let filter = self.effective_filter(user, filter);
        Ok(self.modules.list(&filter, params).await?)
    }

    /// Active tags for a page of modules, keyed by module id.
    pub async fn tags_for_modules(
        &self,
        module_ids: &[i64],
    ) -> ServiceResult<Vec<(i64, TagWithCategory)>> {
        Ok(self.modules.tags_for_modules(module_ids).await?)
    }

    /// Assemble the full detail view for one module.
    pub async fn full(&self, user: Option<&User>, id: i64) -> ServiceResult<ModuleFull> {
        let module = self.get_visible(user, id).await?;
        let like_count = self.modules.like_count(id).await?;
        let detail = self.modules.get_detail(id).await?;
        let tags = self.modules.tags_for_module(id).await?;
        let publications = self.publications.for_module(id).await?;
        let files = self.files.list(id).await?;
        let is_liked = match user {
            Some(u) => self.modules.is_liked(u.id, id).await?,
            None => false,
        };

        let categories = self.tags.categories().await?;
        let (ability_text, usage_text) = detail
            .as_ref()
            .map(|d| (d.ability.clone(), d.usage_status.clone()))
            .unwrap_or_default();
        let availability = derive_field(&tags, &categories, AVAILABILITY_CATEGORY, &ability_text);
        let usage_status = derive_field(&tags, &categories, USAGE_STATUS_CATEGORY, &usage_text);

        Ok(ModuleFull {
            module: ModuleWithMeta { module, like_count },
            detail,
            tags,
            publications,
            files,
            is_liked,
            availability,
            usage_status,
        })
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Create a module in draft status owned by the caller.
    pub async fn create(
        &self,
        user: &User,
        input: CreateModuleInput,
        ip: Option<String>,
    ) -> ServiceResult<AiModule> {
        ensure(user, Capability::CreateModule)?;
        validate_required(&input)?;
        self.tags.validate_assignment(&input.tag_ids).await?;

        let slug = self.generate_slug(&input.name).await?;
        let mut module = AiModule::new(
            input.name.trim().to_string(),
            slug,
            input.company.trim().to_string(),
            input.country.trim().to_string(),
            input.params_count,
            input.short_description.trim().to_string(),
            user.id,
        );
        module.meta_description = input.meta_description;
        module.version = input.version;
        module.license = input.license;

        let module = self.modules.create(&module).await?;

        if let Some(detail) = &input.details {
            self.modules.upsert_detail(module.id, detail).await?;
        }
        if !input.tag_ids.is_empty() {
            self.modules
                .replace_tags(module.id, &input.tag_ids, Some(user.id))
                .await?;
        }
        for publication_input in &input.publications {
            if publication_input.title.trim().is_empty() {
                continue;
            }
            let mut publication =
                Publication::new(module.id, publication_input.title.trim().to_string());
            publication.authors = publication_input.authors.clone();
            publication.journal_conference = publication_input.journal_conference.clone();
            publication.publication_date = publication_input.publication_date;
            publication.doi = publication_input.doi.clone();
            publication.url = publication_input.url.clone();
            publication.citation_count = publication_input.citation_count;
            publication.added_by = Some(user.id);
            self.publications.create(&publication).await?;
        }

        self.audit
            .log(
                NewAuditEntry::new(EntityRef::module(module.id), AuditAction::Create)
                    .by(user.id)
                    .with_comment(format!("Created AI module '{}'", module.name))
                    .from_ip(ip),
            )
            .await;

        Ok(module)
    }

    /// Update a module. The slug never changes, even when the name does.
    pub async fn update(
        &self,
        user: &User,
        id: i64,
        input: UpdateModuleInput,
        ip: Option<String>,
    ) -> ServiceResult<AiModule> {
        let mut module = self
            .modules
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Module not found: {}", id)))?;
        ensure_can_edit(user, &module)?;

        if !input.has_changes() {
            return Ok(module);
        }
        if let Some(params_count) = input.params_count {
            if params_count <= 0 {
                return Err(ServiceError::validation(
                    "Parameters count must be greater than 0",
                ));
            }
        }
        if let Some(tag_ids) = &input.tag_ids {
            self.tags.validate_assignment(tag_ids).await?;
        }

        let mut changed = Vec::new();
        apply_field(&mut module.name, input.name, "name", &mut changed);
        apply_field(&mut module.company, input.company, "company", &mut changed);
        apply_field(&mut module.country, input.country, "country", &mut changed);
        if let Some(params_count) = input.params_count {
            if module.params_count != params_count {
                module.params_count = params_count;
                changed.push("params_count");
            }
        }
        apply_field(
            &mut module.short_description,
            input.short_description,
            "short_description",
            &mut changed,
        );
        apply_field(
            &mut module.meta_description,
            input.meta_description,
            "meta_description",
            &mut changed,
        );
        apply_field(&mut module.version, input.version, "version", &mut changed);
        apply_field(&mut module.license, input.license, "license", &mut changed);

        self.modules.update(&module).await?;

        if let Some(detail) = &input.details {
            self.modules.upsert_detail(module.id, detail).await?;
            changed.push("details");
        }
        if let Some(tag_ids) = &input.tag_ids {
            self.modules
                .replace_tags(module.id, tag_ids, Some(user.id))
                .await?;
            changed.push("tags");
            self.cache.delete(&similar_key(module.id)).await?;
        }

        if !changed.is_empty() {
            self.audit
                .log(
                    NewAuditEntry::new(EntityRef::module(module.id), AuditAction::Update)
                        .by(user.id)
                        .with_values(
                            serde_json::json!({}),
                            serde_json::json!({ "changed": changed }),
                        )
                        .from_ip(ip),
                )
                .await;
        }

        self.modules
            .get(module.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Module vanished during update"))
    }

    /// Delete a module with everything attached to it, including stored
    /// file blobs.
    pub async fn delete(&self, user: &User, id: i64, ip: Option<String>) -> ServiceResult<()> {
        let module = self
            .modules
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Module not found: {}", id)))?;
        ensure_can_edit(user, &module)?;

        let files = self.files.list(id).await?;
        self.modules.delete(id).await?;
        for file in &files {
            self.files.remove_blob(file).await;
        }
        self.cache.delete(&similar_key(id)).await?;

        self.audit
            .log(
                NewAuditEntry::new(EntityRef::module(id), AuditAction::Delete)
                    .by(user.id)
                    .with_comment(format!("Deleted AI module '{}'", module.name))
                    .from_ip(ip),
            )
            .await;

        Ok(())
    }

    // ========================================================================
    // Moderation state machine
    // ========================================================================

    /// Submit a draft (or rejected) module for review.
    pub async fn submit(&self, user: &User, id: i64, ip: Option<String>) -> ServiceResult<AiModule> {
        let mut module = self
            .modules
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Module not found: {}", id)))?;
        ensure_can_edit(user, &module)?;

        if !matches!(module.status, ModuleStatus::Draft | ModuleStatus::Rejected) {
            return Err(ServiceError::conflict(
                "Only draft or rejected modules can be submitted for review",
            ));
        }

        let old_status = module.status;
        module.status = ModuleStatus::OnReview;
        self.modules.update(&module).await?;

        self.audit
            .log(
                NewAuditEntry::new(EntityRef::module(id), AuditAction::Update)
                    .by(user.id)
                    .with_comment("Submitted for review")
                    .with_values(
                        serde_json::json!({ "status": old_status.as_str() }),
                        serde_json::json!({ "status": module.status.as_str() }),
                    )
                    .from_ip(ip),
            )
            .await;

        Ok(module)
    }

    /// Approve a module under review. Admin only; any other source status
    /// is a conflict and mutates nothing.
    pub async fn approve(
        &self,
        user: &User,
        id: i64,
        comment: Option<String>,
        ip: Option<String>,
    ) -> ServiceResult<AiModule> {
        ensure(user, Capability::Moderate)?;

        let mut module = self
            .modules
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Module not found: {}", id)))?;

        if module.status != ModuleStatus::OnReview {
            return Err(ServiceError::conflict(
                "Only modules under review can be approved",
            ));
        }

        module.status = ModuleStatus::Active;
        module.published_at = Some(Utc::now());
        self.modules.update(&module).await?;

        self.audit
            .log(
                NewAuditEntry::new(EntityRef::module(id), AuditAction::Approve)
                    .by(user.id)
                    .with_comment(comment.unwrap_or_default())
                    .with_values(
                        serde_json::json!({ "status": "on_review" }),
                        serde_json::json!({ "status": "active" }),
                    )
                    .from_ip(ip),
            )
            .await;

        self.invalidate_aggregates().await;

        if let Some(creator) = self.users.get(module.created_by).await? {
            self.email.notify_module_approved(&creator, &module).await;
        }

        Ok(module)
    }

    /// Reject a module under review. Admin only; a non-empty comment is
    /// mandatory and is recorded in the audit log.
    pub async fn reject(
        &self,
        user: &User,
        id: i64,
        comment: &str,
        ip: Option<String>,
    ) -> ServiceResult<AiModule> {
        ensure(user, Capability::Moderate)?;

        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ServiceError::validation("Comment is required for rejection"));
        }

        let mut module = self
            .modules
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Module not found: {}", id)))?;

        if module.status != ModuleStatus::OnReview {
            return Err(ServiceError::conflict(
                "Only modules under review can be rejected",
            ));
        }

        module.status = ModuleStatus::Rejected;
        self.modules.update(&module).await?;

        self.audit
            .log(
                NewAuditEntry::new(EntityRef::module(id), AuditAction::Reject)
                    .by(user.id)
                    .with_comment(comment)
                    .with_values(
                        serde_json::json!({ "status": "on_review" }),
                        serde_json::json!({ "status": "rejected" }),
                    )
                    .from_ip(ip),
            )
            .await;

        if let Some(creator) = self.users.get(module.created_by).await? {
            self.email
                .notify_module_rejected(&creator, &module, comment)
                .await;
        }

        Ok(module)
    }

    /// Take a published module out of public view.
    pub async fn block(&self, user: &User, id: i64, ip: Option<String>) -> ServiceResult<AiModule> {
        self.toggle_block(user, id, ip, true).await
    }

    /// Restore a blocked module to public view.
    pub async fn unblock(&self, user: &User, id: i64, ip: Option<String>) -> ServiceResult<AiModule> {
        self.toggle_block(user, id, ip, false).await
    }

    async fn toggle_block(
        &self,
        user: &User,
        id: i64,
        ip: Option<String>,
        block: bool,
    ) -> ServiceResult<AiModule> {
        ensure(user, Capability::Moderate)?;

        let mut module = self
            .modules
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Module not found: {}", id)))?;

        let (expected, next, action) = if block {
            (ModuleStatus::Active, ModuleStatus::Blocked, AuditAction::Block)
        } else {
            (ModuleStatus::Blocked, ModuleStatus::Active, AuditAction::Unblock)
        };

        if module.status != expected {
            return Err(ServiceError::conflict(format!(
                "Only {} modules can be {}",
                expected.as_str(),
                if block { "blocked" } else { "unblocked" }
            )));
        }

        module.status = next;
        self.modules.update(&module).await?;

        self.audit
            .log(
                NewAuditEntry::new(EntityRef::module(id), action)
                    .by(user.id)
                    .with_values(
                        serde_json::json!({ "status": expected.as_str() }),
                        serde_json::json!({ "status": next.as_str() }),
                    )
                    .from_ip(ip),
            )
            .await;

        self.invalidate_aggregates().await;
        Ok(module)
    }

    // ========================================================================
    // Likes
    // ========================================================================

    /// Like a module. A second like from the same user is an idempotent
    /// no-op reported as "already liked".
    pub async fn like(&self, user: &User, id: i64, ip: Option<String>) -> ServiceResult<LikeOutcome> {
        let module = self.get_visible(Some(user), id).await?;

        let created = self.modules.add_like(user.id, module.id).await?;
        if created {
            self.audit
                .log(
                    NewAuditEntry::new(EntityRef::module(id), AuditAction::Like)
                        .by(user.id)
                        .from_ip(ip),
                )
                .await;
        }

        Ok(LikeOutcome {
            liked: true,
            like_count: self.modules.like_count(id).await?,
            message: if created {
                "Module liked successfully".to_string()
            } else {
                "Already liked".to_string()
            },
        })
    }

    /// Remove a like.
    pub async fn unlike(
        &self,
        user: &User,
        id: i64,
        ip: Option<String>,
    ) -> ServiceResult<LikeOutcome> {
        let module = self.get_visible(Some(user), id).await?;

        let removed = self.modules.remove_like(user.id, module.id).await?;
        if removed {
            self.audit
                .log(
                    NewAuditEntry::new(EntityRef::module(id), AuditAction::Unlike)
                        .by(user.id)
                        .from_ip(ip),
                )
                .await;
        }

        Ok(LikeOutcome {
            liked: false,
            like_count: self.modules.like_count(id).await?,
            message: if removed {
                "Like removed successfully".to_string()
            } else {
                "Not liked".to_string()
            },
        })
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    /// Active modules sharing tags with the given one, cached for an hour.
    pub async fn similar(&self, user: Option<&User>, id: i64) -> ServiceResult<Vec<ModuleWithMeta>> {
        self.get_visible(user, id).await?;

        let key = similar_key(id);
        if let Some(cached) = self.cache.get::<Vec<ModuleWithMeta>>(&key).await? {
            return Ok(cached);
        }

        let similar = self.modules.similar(id, SIMILAR_LIMIT).await?;
        self.cache.set(&key, &similar, TTL_SIMILAR).await?;
        Ok(similar)
    }

    /// Rows for the export surface, with derived columns resolved.
    pub async fn export_rows(
        &self,
        user: Option<&User>,
        filter: ModuleFilter,
    ) -> ServiceResult<Vec<ExportRow>> {
        let filter = self.effective_filter(user, filter);
        let modules = self.modules.list_all(&filter).await?;

        let ids: Vec<i64> = modules.iter().map(|m| m.module.id).collect();
        let mut tags_by_module: std::collections::HashMap<i64, Vec<String>> =
            std::collections::HashMap::new();
        for (module_id, tag) in self.modules.tags_for_modules(&ids).await? {
            tags_by_module.entry(module_id).or_default().push(tag.tag.name);
        }

        let mut rows = Vec::with_capacity(modules.len());
        for module in modules {
            let created_by_name = self
                .users
                .get(module.module.created_by)
                .await?
                .map(|u| u.username)
                .unwrap_or_default();
            let publications_count =
                self.publications.for_module(module.module.id).await?.len() as i64;
            let tags = tags_by_module.remove(&module.module.id).unwrap_or_default();
            rows.push(ExportRow {
                module,
                tags,
                created_by_name,
                publications_count,
            });
        }
        Ok(rows)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Derive a unique slug from the name: transliterated slugify plus a
    /// numeric suffix on collision. Set once at creation, never changed.
    async fn generate_slug(&self, name: &str) -> ServiceResult<String> {
        let base = slugify(name, SLUG_MAX_LENGTH.saturating_sub(12));
        for candidate in slug_candidates(&base) {
            if !self.modules.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        unreachable!("slug_candidates is infinite")
    }

    async fn invalidate_aggregates(&self) {
        if let Err(e) = self.cache.delete_pattern("analytics:*").await {
            tracing::warn!("Failed to invalidate analytics cache: {}", e);
        }
        if let Err(e) = self.cache.delete_pattern("modules:similar:*").await {
            tracing::warn!("Failed to invalidate similar cache: {}", e);
        }
    }
}

fn similar_key(id: i64) -> String {
    format!("modules:similar:{}", id)
}

fn validate_required(input: &CreateModuleInput) -> ServiceResult<()> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::validation("Name is required"));
    }
    if input.company.trim().is_empty() {
        return Err(ServiceError::validation("Company is required"));
    }
    if input.country.trim().is_empty() {
        return Err(ServiceError::validation("Country is required"));
    }
    if input.short_description.trim().is_empty() {
        return Err(ServiceError::validation("Short description is required"));
    }
    if input.params_count <= 0 {
        return Err(ServiceError::validation(
            "Parameters count must be greater than 0",
        ));
    }
    Ok(())
}

fn apply_field(
    target: &mut String,
    value: Option<String>,
    name: &'static str,
    changed: &mut Vec<&'static str>,
) {
    if let Some(value) = value {
        if *target != value {
            *target = value;
            changed.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::{CacheConfig, EmailConfig};
    use crate::db::repositories::{
        SqlxAuditRepository, SqlxFileRepository, SqlxModuleRepository,
        SqlxPublicationRepository, SqlxTagRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Tag, TagCategory, UserRole};

    struct Harness {
        service: ModuleService,
        tags: Arc<TagService>,
        audit: Arc<AuditService>,
        owner: User,
        admin: User,
        _upload_dir: tempfile::TempDir,
    }

    async fn setup() -> Harness {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let users = SqlxUserRepository::boxed(pool.clone());
        let owner = users
            .create(&User::new(
                "owner".to_string(),
                "owner@example.com".to_string(),
                "h".to_string(),
                UserRole::User,
            ))
            .await
            .unwrap();
        let admin = users
            .create(&User::new(
                "admin".to_string(),
                "admin@example.com".to_string(),
                "h".to_string(),
                UserRole::Admin,
            ))
            .await
            .unwrap();

        let cache = create_cache(&CacheConfig::default());
        let audit = Arc::new(AuditService::new(SqlxAuditRepository::boxed(pool.clone())));
        let tags = Arc::new(TagService::new(
            SqlxTagRepository::boxed(pool.clone()),
            cache.clone(),
        ));
        let upload_dir = tempfile::tempdir().unwrap();
        let files = Arc::new(FileService::new(
            SqlxFileRepository::boxed(pool.clone()),
            audit.clone(),
            upload_dir.path().to_path_buf(),
            1024 * 1024,
        ));
        let email = Arc::new(EmailService::new(EmailConfig::default()));

        let service = ModuleService::new(
            SqlxModuleRepository::boxed(pool.clone()),
            SqlxPublicationRepository::boxed(pool.clone()),
            users,
            tags.clone(),
            files,
            audit.clone(),
            email,
            cache,
        );

        Harness {
            service,
            tags,
            audit,
            owner,
            admin,
            _upload_dir: upload_dir,
        }
    }

    fn create_input(name: &str) -> CreateModuleInput {
        CreateModuleInput {
            name: name.to_string(),
            company: "Sber".to_string(),
            country: "Russia".to_string(),
            params_count: 1_000_000,
            short_description: "A test module".to_string(),
            meta_description: String::new(),
            version: "1.0".to_string(),
            license: "MIT".to_string(),
            details: None,
            tag_ids: Vec::new(),
            publications: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_generates_unique_slugs() {
        let h = setup().await;

        let first = h.service.create(&h.owner, create_input("GigaChat"), None).await.unwrap();
        let second = h.service.create(&h.owner, create_input("GigaChat"), None).await.unwrap();
        let third = h.service.create(&h.owner, create_input("GigaChat"), None).await.unwrap();

        assert_eq!(first.slug, "gigachat");
        assert_eq!(second.slug, "gigachat-2");
        assert_eq!(third.slug, "gigachat-3");
        assert_eq!(first.status, ModuleStatus::Draft);
    }

    #[tokio::test]
    async fn test_slug_immutable_on_update() {
        let h = setup().await;
        let module = h.service.create(&h.owner, create_input("GigaChat"), None).await.unwrap();

        let updated = h
            .service
            .update(
                &h.owner,
                module.id,
                UpdateModuleInput {
                    name: Some("GigaChat v2".to_string()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "GigaChat v2");
        assert_eq!(updated.slug, "gigachat", "slug must never change");

        // Re-saving without a name change keeps the slug as well
        let unchanged = h
            .service
            .update(&h.owner, module.id, UpdateModuleInput::default(), None)
            .await
            .unwrap();
        assert_eq!(unchanged.slug, "gigachat");
    }

    #[tokio::test]
    async fn test_create_validations() {
        let h = setup().await;

        let mut bad = create_input("X");
        bad.params_count = 0;
        assert!(matches!(
            h.service.create(&h.owner, bad, None).await,
            Err(ServiceError::Validation(_))
        ));

        let mut no_name = create_input("");
        no_name.name = "  ".to_string();
        assert!(h.service.create(&h.owner, no_name, None).await.is_err());
    }

    #[tokio::test]
    async fn test_moderation_happy_path() {
        let h = setup().await;
        let module = h.service.create(&h.owner, create_input("M"), None).await.unwrap();

        let submitted = h.service.submit(&h.owner, module.id, None).await.unwrap();
        assert_eq!(submitted.status, ModuleStatus::OnReview);

        let approved = h.service.approve(&h.admin, module.id, None, None).await.unwrap();
        assert_eq!(approved.status, ModuleStatus::Active);
        assert!(approved.published_at.is_some());

        let approvals = h
            .audit
            .count_actions(EntityRef::module(module.id), AuditAction::Approve)
            .await
            .unwrap();
        assert_eq!(approvals, 1);
    }

    #[tokio::test]
    async fn test_approve_fails_closed() {
        let h = setup().await;
        let module = h.service.create(&h.owner, create_input("M"), None).await.unwrap();

        // Non-admin cannot approve even a module under review
        h.service.submit(&h.owner, module.id, None).await.unwrap();
        assert!(matches!(
            h.service.approve(&h.owner, module.id, None, None).await,
            Err(ServiceError::Forbidden(_))
        ));

        // Approval from any status other than on_review is a conflict
        h.service.approve(&h.admin, module.id, None, None).await.unwrap();
        for _ in 0..2 {
            let result = h.service.approve(&h.admin, module.id, None, None).await;
            assert!(matches!(result, Err(ServiceError::Conflict(_))));
        }

        // Status was not mutated by the failed attempts
        let current = h.service.get_visible(Some(&h.admin), module.id).await.unwrap();
        assert_eq!(current.status, ModuleStatus::Active);
    }

    #[tokio::test]
    async fn test_reject_requires_comment() {
        let h = setup().await;
        let module = h.service.create(&h.owner, create_input("M"), None).await.unwrap();
        h.service.submit(&h.owner, module.id, None).await.unwrap();

        assert!(matches!(
            h.service.reject(&h.admin, module.id, "   ", None).await,
            Err(ServiceError::Validation(_))
        ));
        // Status untouched by the failed rejection
        let current = h.service.get_visible(Some(&h.admin), module.id).await.unwrap();
        assert_eq!(current.status, ModuleStatus::OnReview);

        let rejected = h
            .service
            .reject(&h.admin, module.id, "missing license info", None)
            .await
            .unwrap();
        assert_eq!(rejected.status, ModuleStatus::Rejected);

        let entries = h
            .audit
            .for_entity(EntityRef::module(module.id), 10)
            .await
            .unwrap();
        let reject_entry = entries.iter().find(|e| e.action == AuditAction::Reject).unwrap();
        assert_eq!(reject_entry.comment, "missing license info");

        // A rejected module can be resubmitted
        let resubmitted = h.service.submit(&h.owner, module.id, None).await.unwrap();
        assert_eq!(resubmitted.status, ModuleStatus::OnReview);
    }

    #[tokio::test]
    async fn test_block_unblock_cycle() {
        let h = setup().await;
        let module = h.service.create(&h.owner, create_input("M"), None).await.unwrap();
        h.service.submit(&h.owner, module.id, None).await.unwrap();
        h.service.approve(&h.admin, module.id, None, None).await.unwrap();

        let blocked = h.service.block(&h.admin, module.id, None).await.unwrap();
        assert_eq!(blocked.status, ModuleStatus::Blocked);
        assert!(h.service.block(&h.admin, module.id, None).await.is_err());

        let restored = h.service.unblock(&h.admin, module.id, None).await.unwrap();
        assert_eq!(restored.status, ModuleStatus::Active);
    }

    #[tokio::test]
    async fn test_like_idempotent() {
        let h = setup().await;
        let module = h.service.create(&h.owner, create_input("M"), None).await.unwrap();
        h.service.submit(&h.owner, module.id, None).await.unwrap();
        h.service.approve(&h.admin, module.id, None, None).await.unwrap();

        let first = h.service.like(&h.owner, module.id, None).await.unwrap();
        assert!(first.liked);
        assert_eq!(first.like_count, 1);
        assert_eq!(first.message, "Module liked successfully");

        let second = h.service.like(&h.owner, module.id, None).await.unwrap();
        assert!(second.liked);
        assert_eq!(second.like_count, 1, "still exactly one like record");
        assert_eq!(second.message, "Already liked");

        let removed = h.service.unlike(&h.owner, module.id, None).await.unwrap();
        assert!(!removed.liked);
        assert_eq!(removed.like_count, 0);

        let again = h.service.unlike(&h.owner, module.id, None).await.unwrap();
        assert_eq!(again.message, "Not liked");
    }

    #[tokio::test]
    async fn test_visibility_rules() {
        let h = setup().await;
        let module = h.service.create(&h.owner, create_input("Hidden"), None).await.unwrap();

        // Anonymous callers cannot see drafts
        assert!(h.service.get_visible(None, module.id).await.is_err());
        // The owner and admins can
        assert!(h.service.get_visible(Some(&h.owner), module.id).await.is_ok());
        assert!(h.service.get_visible(Some(&h.admin), module.id).await.is_ok());

        // Other users cannot mutate someone else's module
        let mut stranger = User::new(
            "stranger".to_string(),
            "s@example.com".to_string(),
            "h".to_string(),
            UserRole::User,
        );
        stranger.id = 999;
        assert!(matches!(
            h.service
                .update(&stranger, module.id, UpdateModuleInput::default(), None)
                .await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_create_with_tags_and_detail() {
        let h = setup().await;

        let category = h
            .tags
            .create_category(&TagCategory::new("Type".to_string(), "type".to_string()))
            .await
            .unwrap();
        let tag = h
            .tags
            .create_tag(&Tag::new(category.id, "NLP".to_string(), "nlp".to_string()))
            .await
            .unwrap();

        let mut input = create_input("Tagged");
        input.tag_ids = vec![tag.id];
        input.details = Some(crate::models::DetailInput {
            description: "Long description".to_string(),
            ability: "Open".to_string(),
            ..Default::default()
        });

        let module = h.service.create(&h.owner, input, None).await.unwrap();

        let full = h.service.full(Some(&h.owner), module.id).await.unwrap();
        assert_eq!(full.tags.len(), 1);
        assert_eq!(full.detail.as_ref().unwrap().description, "Long description");

        // Unknown tags are rejected up front
        let mut bad = create_input("Bad tags");
        bad.tag_ids = vec![9999];
        assert!(h.service.create(&h.owner, bad, None).await.is_err());
    }

    #[tokio::test]
    async fn test_full_fallback_enrichment() {
        let h = setup().await;

        h.tags
            .create_category(&TagCategory::new(
                "Availability".to_string(),
                "availability".to_string(),
            ))
            .await
            .unwrap();

        let mut input = create_input("Legacy");
        input.details = Some(crate::models::DetailInput {
            ability: "Открытый".to_string(),
            ..Default::default()
        });
        let module = h.service.create(&h.owner, input, None).await.unwrap();

        let full = h.service.full(Some(&h.owner), module.id).await.unwrap();
        let availability = full.availability.unwrap();
        assert_eq!(availability.id, 0, "fallback synthesizes the placeholder id");
        assert_eq!(availability.value, "Открытый");
        assert_eq!(availability.display, "otkrytyy");
        assert!(full.usage_status.is_none());
    }

    #[tokio::test]
    async fn test_export_rows() {
        let h = setup().await;
        let module = h.service.create(&h.owner, create_input("Exported"), None).await.unwrap();
        h.service.submit(&h.owner, module.id, None).await.unwrap();
        h.service.approve(&h.admin, module.id, None, None).await.unwrap();

        let rows = h
            .service
            .export_rows(None, ModuleFilter::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].created_by_name, "owner");
        assert_eq!(rows[0].publications_count, 0);
    }
}
