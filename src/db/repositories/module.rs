//! Module repository
//!
//! Database operations for AI modules: CRUD, the composed list filter the
//! catalog search uses, detail records, likes, tag assignment and the
//! similar-modules query.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::sync::Arc;

use crate::models::{
    AiModule, AiModuleDetail, DetailInput, ListParams, ModuleStatus, ModuleWithMeta, PagedResult,
    Tag, TagWithCategory,
};

/// Which modules a query may see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleVisibility {
    /// No restriction (admin)
    All,
    /// Published modules only (anonymous)
    #[default]
    PublicOnly,
    /// Published modules plus the given user's own (authenticated non-admin)
    PublicOrOwn(i64),
}

/// Sort order for module listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleOrdering {
    #[default]
    CreatedAtDesc,
    CreatedAtAsc,
    NameAsc,
    NameDesc,
    ParamsCountAsc,
    ParamsCountDesc,
    LikeCountAsc,
    LikeCountDesc,
}

impl ModuleOrdering {
    /// Parse a DRF-style ordering parameter, e.g. `-created_at` or `name`.
    pub fn from_param(param: &str) -> Option<Self> {
        match param.trim() {
            "created_at" => Some(Self::CreatedAtAsc),
            "-created_at" => Some(Self::CreatedAtDesc),
            "name" => Some(Self::NameAsc),
            "-name" => Some(Self::NameDesc),
            "params_count" => Some(Self::ParamsCountAsc),
            "-params_count" => Some(Self::ParamsCountDesc),
            "like_count" => Some(Self::LikeCountAsc),
            "-like_count" => Some(Self::LikeCountDesc),
            _ => None,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Self::CreatedAtDesc => "m.created_at DESC",
            Self::CreatedAtAsc => "m.created_at ASC",
            Self::NameAsc => "m.name COLLATE NOCASE ASC",
            Self::NameDesc => "m.name COLLATE NOCASE DESC",
            Self::ParamsCountAsc => "m.params_count ASC",
            Self::ParamsCountDesc => "m.params_count DESC",
            Self::LikeCountAsc => "like_count ASC",
            Self::LikeCountDesc => "like_count DESC",
        }
    }
}

/// Composed filter for module listings.
///
/// All present predicates combine conjunctively; `tags_any` is the
/// disjunctive tag mode (at least one of the given tags), `tags_all` the
/// conjunctive one (every given tag).
#[derive(Debug, Clone, Default)]
pub struct ModuleFilter {
    pub visibility: ModuleVisibility,
    /// Explicit status filter (only honored for admins by the service layer)
    pub status: Option<ModuleStatus>,
    /// Case-insensitive name contains
    pub name: Option<String>,
    /// Disjunctive contains over name, company, descriptions and tag names
    pub search: Option<String>,
    pub country: Option<String>,
    pub countries: Vec<String>,
    pub companies: Vec<String>,
    pub tags_any: Vec<i64>,
    pub tags_all: Vec<i64>,
    pub ability: Vec<String>,
    pub usage_status: Vec<String>,
    pub has_publications: Option<bool>,
    pub min_likes: Option<i64>,
    pub created_by: Option<i64>,
    pub ordering: ModuleOrdering,
}

/// Module repository trait
#[async_trait]
pub trait ModuleRepository: Send + Sync {
    /// Insert a new module
    async fn create(&self, module: &AiModule) -> Result<AiModule>;

    /// Get module by ID
    async fn get(&self, id: i64) -> Result<Option<AiModule>>;

    /// Get module by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<AiModule>>;

    /// Check whether a slug is already taken
    async fn slug_exists(&self, slug: &str) -> Result<bool>;

    /// Persist all mutable fields of the module
    async fn update(&self, module: &AiModule) -> Result<()>;

    /// Delete a module; detail, tags, likes, publications and file rows
    /// cascade. Returns false if the module did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Filtered, paginated listing with like counts
    async fn list(&self, filter: &ModuleFilter, params: &ListParams)
        -> Result<PagedResult<ModuleWithMeta>>;

    /// Filtered listing without pagination (export)
    async fn list_all(&self, filter: &ModuleFilter) -> Result<Vec<ModuleWithMeta>>;

    /// Number of likes on a module
    async fn like_count(&self, module_id: i64) -> Result<i64>;

    /// Record a like; returns false when the (user, module) pair already
    /// exists, which makes concurrent duplicates harmless.
    async fn add_like(&self, user_id: i64, module_id: i64) -> Result<bool>;

    /// Remove a like; returns false when there was none
    async fn remove_like(&self, user_id: i64, module_id: i64) -> Result<bool>;

    /// Whether the user has liked the module
    async fn is_liked(&self, user_id: i64, module_id: i64) -> Result<bool>;

    /// Fetch the detail record, if any
    async fn get_detail(&self, module_id: i64) -> Result<Option<AiModuleDetail>>;

    /// Create the detail record on first submission, update it afterwards
    async fn upsert_detail(&self, module_id: i64, input: &DetailInput) -> Result<AiModuleDetail>;

    /// Replace the full tag set of a module inside one transaction, so
    /// concurrent readers never observe an empty set.
    async fn replace_tags(
        &self,
        module_id: i64,
        tag_ids: &[i64],
        assigned_by: Option<i64>,
    ) -> Result<()>;

    /// Active tags assigned to a module, with category names
    async fn tags_for_module(&self, module_id: i64) -> Result<Vec<TagWithCategory>>;

    /// Active tags for a set of modules in one query, keyed by module id
    async fn tags_for_modules(&self, module_ids: &[i64]) -> Result<Vec<(i64, TagWithCategory)>>;

    /// Active modules sharing tags with the given one, most shared first
    async fn similar(&self, module_id: i64, limit: i64) -> Result<Vec<ModuleWithMeta>>;
}

/// SQLx-based module repository implementation
pub struct SqlxModuleRepository {
    pool: SqlitePool,
}

impl SqlxModuleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn ModuleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ModuleRepository for SqlxModuleRepository {
    async fn create(&self, module: &AiModule) -> Result<AiModule> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO modules
                (name, slug, company, country, params_count, short_description,
                 status, created_by, created_at, updated_at, published_at,
                 meta_description, version, license)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&module.name)
        .bind(&module.slug)
        .bind(&module.company)
        .bind(&module.country)
        .bind(module.params_count)
        .bind(&module.short_description)
        .bind(module.status.as_str())
        .bind(module.created_by)
        .bind(now)
        .bind(now)
        .bind(module.published_at)
        .bind(&module.meta_description)
        .bind(&module.version)
        .bind(&module.license)
        .execute(&self.pool)
        .await
        .context("Failed to create module")?;

        let mut created = module.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<AiModule>> {
        let row = sqlx::query("SELECT * FROM modules WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get module by ID")?;

        row.map(|r| row_to_module(&r)).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<AiModule>> {
        let row = sqlx::query("SELECT * FROM modules WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get module by slug")?;

        row.map(|r| row_to_module(&r)).transpose()
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM modules WHERE slug = ? LIMIT 1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check slug")?;
        Ok(row.is_some())
    }

    async fn update(&self, module: &AiModule) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE modules SET
                name = ?, company = ?, country = ?, params_count = ?,
                short_description = ?, status = ?, updated_at = ?,
                published_at = ?, meta_description = ?, version = ?, license = ?
            WHERE id = ?
            "#,
        )
        .bind(&module.name)
        .bind(&module.company)
        .bind(&module.country)
        .bind(module.params_count)
        .bind(&module.short_description)
        .bind(module.status.as_str())
        .bind(Utc::now())
        .bind(module.published_at)
        .bind(&module.meta_description)
        .bind(&module.version)
        .bind(&module.license)
        .bind(module.id)
        .execute(&self.pool)
        .await
        .context("Failed to update module")?;

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM modules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete module")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        filter: &ModuleFilter,
        params: &ListParams,
    ) -> Result<PagedResult<ModuleWithMeta>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS c FROM modules m WHERE 1=1");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count modules")?
            .get("c");

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT m.*, (SELECT COUNT(*) FROM module_likes ml WHERE ml.module_id = m.id) AS like_count \
             FROM modules m WHERE 1=1",
        );
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ").push(filter.ordering.sql());
        qb.push(" LIMIT ").push_bind(params.limit());
        qb.push(" OFFSET ").push_bind(params.offset());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list modules")?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row_to_module_with_meta(&row)?);
        }

        Ok(PagedResult::new(items, total, params))
    }

    async fn list_all(&self, filter: &ModuleFilter) -> Result<Vec<ModuleWithMeta>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT m.*, (SELECT COUNT(*) FROM module_likes ml WHERE ml.module_id = m.id) AS like_count \
             FROM modules m WHERE 1=1",
        );
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ").push(filter.ordering.sql());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list modules for export")?;

        rows.iter().map(row_to_module_with_meta).collect()
    }

    async fn like_count(&self, module_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS c FROM module_likes WHERE module_id = ?")
            .bind(module_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count likes")?;
        Ok(row.get("c"))
    }

    async fn add_like(&self, user_id: i64, module_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO module_likes (user_id, module_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(module_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to add like")?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_like(&self, user_id: i64, module_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM module_likes WHERE user_id = ? AND module_id = ?")
            .bind(user_id)
            .bind(module_id)
            .execute(&self.pool)
            .await
            .context("Failed to remove like")?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_liked(&self, user_id: i64, module_id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM module_likes WHERE user_id = ? AND module_id = ? LIMIT 1")
            .bind(user_id)
            .bind(module_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check like")?;
        Ok(row.is_some())
    }

    async fn get_detail(&self, module_id: i64) -> Result<Option<AiModuleDetail>> {
        let row = sqlx::query("SELECT * FROM module_details WHERE module_id = ?")
            .bind(module_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get module detail")?;

        row.map(|r| row_to_detail(&r)).transpose()
    }

    async fn upsert_detail(&self, module_id: i64, input: &DetailInput) -> Result<AiModuleDetail> {
        sqlx::query(
            r#"
            INSERT INTO module_details
                (module_id, description, technical_info, architecture,
                 training_data_description, metrics, supported_languages,
                 requirements, installation_guide, ability, usage_status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (module_id) DO UPDATE SET
                description = excluded.description,
                technical_info = excluded.technical_info,
                architecture = excluded.architecture,
                training_data_description = excluded.training_data_description,
                metrics = excluded.metrics,
                supported_languages = excluded.supported_languages,
                requirements = excluded.requirements,
                installation_guide = excluded.installation_guide,
                ability = excluded.ability,
                usage_status = excluded.usage_status
            "#,
        )
        .bind(module_id)
        .bind(&input.description)
        .bind(&input.technical_info)
        .bind(&input.architecture)
        .bind(&input.training_data_description)
        .bind(input.metrics.to_string())
        .bind(input.supported_languages.to_string())
        .bind(&input.requirements)
        .bind(&input.installation_guide)
        .bind(&input.ability)
        .bind(&input.usage_status)
        .execute(&self.pool)
        .await
        .context("Failed to upsert module detail")?;

        self.get_detail(module_id)
            .await?
            .context("Detail record missing after upsert")
    }

    async fn replace_tags(
        &self,
        module_id: i64,
        tag_ids: &[i64],
        assigned_by: Option<i64>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM module_tags WHERE module_id = ?")
            .bind(module_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear module tags")?;

        let now = Utc::now();
        for tag_id in tag_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO module_tags (module_id, tag_id, assigned_by, assigned_at) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(module_id)
            .bind(tag_id)
            .bind(assigned_by)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to assign tag")?;
        }

        tx.commit().await.context("Failed to commit tag replacement")?;
        Ok(())
    }

    async fn tags_for_module(&self, module_id: i64) -> Result<Vec<TagWithCategory>> {
        let rows = sqlx::query(
            r#"
            SELECT t.*, c.name AS category_name
            FROM module_tags mt
            JOIN tags t ON t.id = mt.tag_id
            JOIN tag_categories c ON c.id = t.category_id
            WHERE mt.module_id = ? AND t.is_active = 1
            ORDER BY c.sort_order, t.name
            "#,
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get module tags")?;

        rows.iter().map(row_to_tag_with_category).collect()
    }

    async fn tags_for_modules(&self, module_ids: &[i64]) -> Result<Vec<(i64, TagWithCategory)>> {
        if module_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT mt.module_id, t.*, c.name AS category_name \
             FROM module_tags mt \
             JOIN tags t ON t.id = mt.tag_id \
             JOIN tag_categories c ON c.id = t.category_id \
             WHERE t.is_active = 1 AND mt.module_id IN (",
        );
        let mut sep = qb.separated(", ");
        for id in module_ids {
            sep.push_bind(id);
        }
        sep.push_unseparated(") ORDER BY c.sort_order, t.name");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to get tags for modules")?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push((row.get("module_id"), row_to_tag_with_category(row)?));
        }
        Ok(out)
    }

    async fn similar(&self, module_id: i64, limit: i64) -> Result<Vec<ModuleWithMeta>> {
        let rows = sqlx::query(
            r#"
            SELECT m.*,
                   (SELECT COUNT(*) FROM module_likes ml WHERE ml.module_id = m.id) AS like_count,
                   COUNT(DISTINCT mt.tag_id) AS shared_tags
            FROM modules m
            JOIN module_tags mt ON mt.module_id = m.id
            WHERE mt.tag_id IN (SELECT tag_id FROM module_tags WHERE module_id = ?)
              AND m.id != ?
              AND m.status = 'active'
            GROUP BY m.id
            ORDER BY shared_tags DESC, like_count DESC
            LIMIT ?
            "#,
        )
        .bind(module_id)
        .bind(module_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to find similar modules")?;

        rows.iter().map(row_to_module_with_meta).collect()
    }
}

// ============================================================================
// Filter composition
// ============================================================================

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ModuleFilter) {
    match filter.visibility {
        ModuleVisibility::All => {}
        ModuleVisibility::PublicOnly => {
            qb.push(" AND m.status = 'active'");
        }
        ModuleVisibility::PublicOrOwn(user_id) => {
            qb.push(" AND (m.status = 'active' OR m.created_by = ");
            qb.push_bind(user_id);
            qb.push(")");
        }
    }

    if let Some(status) = filter.status {
        qb.push(" AND m.status = ");
        qb.push_bind(status.as_str());
    }

    if let Some(name) = &filter.name {
        qb.push(" AND m.name LIKE ");
        qb.push_bind(format!("%{}%", name));
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (m.name LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR m.company LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR m.short_description LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(
            " OR EXISTS (SELECT 1 FROM module_details d WHERE d.module_id = m.id AND (d.description LIKE ",
        );
        qb.push_bind(pattern.clone());
        qb.push(" OR d.technical_info LIKE ");
        qb.push_bind(pattern.clone());
        qb.push("))");
        qb.push(
            " OR EXISTS (SELECT 1 FROM module_tags mt JOIN tags t ON t.id = mt.tag_id \
             WHERE mt.module_id = m.id AND t.name LIKE ",
        );
        qb.push_bind(pattern);
        qb.push("))");
    }

    if let Some(country) = &filter.country {
        qb.push(" AND m.country = ");
        qb.push_bind(country.clone());
    }

    if !filter.countries.is_empty() {
        qb.push(" AND m.country IN (");
        let mut sep = qb.separated(", ");
        for c in &filter.countries {
            sep.push_bind(c.clone());
        }
        sep.push_unseparated(")");
    }

    if !filter.companies.is_empty() {
        qb.push(" AND m.company IN (");
        let mut sep = qb.separated(", ");
        for c in &filter.companies {
            sep.push_bind(c.clone());
        }
        sep.push_unseparated(")");
    }

    if !filter.tags_any.is_empty() {
        qb.push(" AND m.id IN (SELECT module_id FROM module_tags WHERE tag_id IN (");
        let mut sep = qb.separated(", ");
        for id in &filter.tags_any {
            sep.push_bind(*id);
        }
        sep.push_unseparated("))");
    }

    if !filter.tags_all.is_empty() {
        qb.push(" AND m.id IN (SELECT module_id FROM module_tags WHERE tag_id IN (");
        let mut sep = qb.separated(", ");
        for id in &filter.tags_all {
            sep.push_bind(*id);
        }
        sep.push_unseparated(") GROUP BY module_id HAVING COUNT(DISTINCT tag_id) = ");
        qb.push_bind(filter.tags_all.len() as i64);
        qb.push(")");
    }

    if !filter.ability.is_empty() {
        qb.push(" AND EXISTS (SELECT 1 FROM module_details d WHERE d.module_id = m.id AND d.ability IN (");
        let mut sep = qb.separated(", ");
        for a in &filter.ability {
            sep.push_bind(a.clone());
        }
        sep.push_unseparated("))");
    }

    if !filter.usage_status.is_empty() {
        qb.push(" AND EXISTS (SELECT 1 FROM module_details d WHERE d.module_id = m.id AND d.usage_status IN (");
        let mut sep = qb.separated(", ");
        for s in &filter.usage_status {
            sep.push_bind(s.clone());
        }
        sep.push_unseparated("))");
    }

    match filter.has_publications {
        Some(true) => {
            qb.push(" AND EXISTS (SELECT 1 FROM publications p WHERE p.module_id = m.id)");
        }
        Some(false) => {
            qb.push(" AND NOT EXISTS (SELECT 1 FROM publications p WHERE p.module_id = m.id)");
        }
        None => {}
    }

    if let Some(min_likes) = filter.min_likes {
        qb.push(" AND (SELECT COUNT(*) FROM module_likes ml WHERE ml.module_id = m.id) >= ");
        qb.push_bind(min_likes);
    }

    if let Some(created_by) = filter.created_by {
        qb.push(" AND m.created_by = ");
        qb.push_bind(created_by);
    }
}

// ============================================================================
// Row mappers
// ============================================================================

fn row_to_module(row: &sqlx::sqlite::SqliteRow) -> Result<AiModule> {
    let status_str: String = row.get("status");
    let status = ModuleStatus::from_str(&status_str)
        .with_context(|| format!("Unknown module status in database: {}", status_str))?;

    Ok(AiModule {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        company: row.get("company"),
        country: row.get("country"),
        params_count: row.get("params_count"),
        short_description: row.get("short_description"),
        status,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        published_at: row.get("published_at"),
        meta_description: row.get("meta_description"),
        version: row.get("version"),
        license: row.get("license"),
    })
}

fn row_to_module_with_meta(row: &sqlx::sqlite::SqliteRow) -> Result<ModuleWithMeta> {
    Ok(ModuleWithMeta {
        module: row_to_module(row)?,
        like_count: row.get("like_count"),
    })
}

fn row_to_detail(row: &sqlx::sqlite::SqliteRow) -> Result<AiModuleDetail> {
    let metrics: String = row.get("metrics");
    let languages: String = row.get("supported_languages");

    Ok(AiModuleDetail {
        id: row.get("id"),
        module_id: row.get("module_id"),
        description: row.get("description"),
        technical_info: row.get("technical_info"),
        architecture: row.get("architecture"),
        training_data_description: row.get("training_data_description"),
        metrics: serde_json::from_str(&metrics).unwrap_or_else(|_| serde_json::json!({})),
        supported_languages: serde_json::from_str(&languages)
            .unwrap_or_else(|_| serde_json::json!([])),
        requirements: row.get("requirements"),
        installation_guide: row.get("installation_guide"),
        ability: row.get("ability"),
        usage_status: row.get("usage_status"),
    })
}

fn row_to_tag_with_category(row: &sqlx::sqlite::SqliteRow) -> Result<TagWithCategory> {
    Ok(TagWithCategory {
        tag: Tag {
            id: row.get("id"),
            category_id: row.get("category_id"),
            name: row.get("name"),
            slug: row.get("slug"),
            description: row.get("description"),
            color: row.get("color"),
            is_active: row.get("is_active"),
            created_by: row.get("created_by"),
            approved_by: row.get("approved_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        category_name: row.get("category_name"),
    })
}
