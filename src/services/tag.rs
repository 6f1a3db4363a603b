//! Tag taxonomy service
//!
//! Read surface for tags and categories, alias-aware category resolution,
//! popularity with caching and assignment validation (active tags only,
//! per-category count bounds).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{CacheLayer, MemoryCache, TTL_TAGS};
use crate::db::repositories::{TagFilter, TagRepository};
use crate::models::{ListParams, PagedResult, Tag, TagCategory, TagWithUsage};
use crate::services::error::{ServiceError, ServiceResult};

/// A category together with its active tags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithTags {
    pub category: TagCategory,
    pub tags: Vec<TagWithUsage>,
}

/// Tag service
pub struct TagService {
    repo: Arc<dyn TagRepository>,
    cache: Arc<MemoryCache>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    /// Filtered, paginated tag listing
    pub async fn list(
        &self,
        filter: &TagFilter,
        params: &ListParams,
    ) -> ServiceResult<PagedResult<TagWithUsage>> {
        Ok(self.repo.list(filter, params).await?)
    }

    /// Tag by ID
    pub async fn get(&self, id: i64) -> ServiceResult<Tag> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Tag not found: {}", id)))
    }

    /// Most used active tags, cached for the popularity window.
    pub async fn popular(&self, limit: i64) -> ServiceResult<Vec<TagWithUsage>> {
        let key = format!("tags:popular:{}", limit);
        if let Some(cached) = self.cache.get::<Vec<TagWithUsage>>(&key).await? {
            return Ok(cached);
        }

        let tags = self.repo.popular(limit).await?;
        self.cache.set(&key, &tags, TTL_TAGS).await?;
        Ok(tags)
    }

    /// All active categories ordered by weight
    pub async fn categories(&self) -> ServiceResult<Vec<TagCategory>> {
        Ok(self.repo.list_categories(true).await?)
    }

    /// Active categories with their active tags
    pub async fn by_category(&self) -> ServiceResult<Vec<CategoryWithTags>> {
        let categories = self.repo.list_categories(true).await?;
        let mut result = Vec::with_capacity(categories.len());
        for category in categories {
            let tags = self.repo.by_category(category.id).await?;
            result.push(CategoryWithTags { category, tags });
        }
        Ok(result)
    }

    /// Resolve a category by canonical name, slug or legacy alias.
    pub async fn find_category(&self, name: &str) -> ServiceResult<Option<TagCategory>> {
        // Exact canonical match is cheap; fall back to the alias scan.
        if let Some(category) = self.repo.category_by_name(name).await? {
            return Ok(Some(category));
        }
        let categories = self.repo.list_categories(true).await?;
        Ok(categories.into_iter().find(|c| c.matches_name(name)))
    }

    /// Validate a tag assignment for a module.
    ///
    /// Every referenced tag must exist and be active, and for every
    /// category present in the selection the per-category min/max bounds
    /// must hold. Returns the resolved tags on success.
    pub async fn validate_assignment(&self, tag_ids: &[i64]) -> ServiceResult<Vec<Tag>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut unique: Vec<i64> = tag_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let tags = self.repo.get_many(&unique).await?;
        let active: Vec<Tag> = tags.into_iter().filter(|t| t.is_active).collect();
        if active.len() != unique.len() {
            return Err(ServiceError::validation(
                "Some tags do not exist or are inactive",
            ));
        }

        let mut per_category: HashMap<i64, i64> = HashMap::new();
        for tag in &active {
            *per_category.entry(tag.category_id).or_insert(0) += 1;
        }

        for (category_id, count) in per_category {
            let category = self
                .repo
                .category_by_id(category_id)
                .await?
                .ok_or_else(|| ServiceError::validation("Tag references a missing category"))?;

            if category.min_tags > 0 && count < category.min_tags {
                return Err(ServiceError::validation(format!(
                    "Category '{}' requires at least {} tags",
                    category.name, category.min_tags
                )));
            }
            if count > category.max_tags {
                return Err(ServiceError::validation(format!(
                    "Category '{}' allows maximum {} tags",
                    category.name, category.max_tags
                )));
            }
        }

        Ok(active)
    }

    /// Create a category (import tooling and tests)
    pub async fn create_category(&self, category: &TagCategory) -> ServiceResult<TagCategory> {
        Ok(self.repo.create_category(category).await?)
    }

    /// Create a tag (import tooling and tests)
    pub async fn create_tag(&self, tag: &Tag) -> ServiceResult<Tag> {
        let created = self.repo.create(tag).await?;
        self.cache.delete_pattern("tags:popular:*").await?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::SqlxTagRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> TagService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        TagService::new(
            SqlxTagRepository::boxed(pool),
            create_cache(&CacheConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_find_category_by_alias() {
        let service = setup().await;

        let mut category = TagCategory::new("Availability".to_string(), "availability".to_string());
        category.aliases = vec!["Доступность".to_string()];
        service.create_category(&category).await.unwrap();

        assert!(service.find_category("Availability").await.unwrap().is_some());
        assert!(service.find_category("availability").await.unwrap().is_some());
        assert!(service.find_category("Доступность").await.unwrap().is_some());
        assert!(service.find_category("Nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_validate_assignment_rejects_inactive() {
        let service = setup().await;
        let category = service
            .create_category(&TagCategory::new("Type".to_string(), "type".to_string()))
            .await
            .unwrap();

        let mut inactive = Tag::new(category.id, "Old".to_string(), "old".to_string());
        inactive.is_active = false;
        let inactive = service.create_tag(&inactive).await.unwrap();
        let active = service
            .create_tag(&Tag::new(category.id, "New".to_string(), "new".to_string()))
            .await
            .unwrap();

        assert!(service.validate_assignment(&[active.id]).await.is_ok());
        assert!(matches!(
            service.validate_assignment(&[inactive.id]).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(service.validate_assignment(&[active.id, 9999]).await.is_err());
    }

    #[tokio::test]
    async fn test_validate_assignment_category_bounds() {
        let service = setup().await;

        let mut strict = TagCategory::new("Strict".to_string(), "strict".to_string());
        strict.min_tags = 2;
        strict.max_tags = 2;
        let strict = service.create_category(&strict).await.unwrap();

        let t1 = service
            .create_tag(&Tag::new(strict.id, "A".to_string(), "a".to_string()))
            .await
            .unwrap();
        let t2 = service
            .create_tag(&Tag::new(strict.id, "B".to_string(), "b".to_string()))
            .await
            .unwrap();
        let t3 = service
            .create_tag(&Tag::new(strict.id, "C".to_string(), "c".to_string()))
            .await
            .unwrap();

        assert!(service.validate_assignment(&[t1.id]).await.is_err(), "below min");
        assert!(service.validate_assignment(&[t1.id, t2.id]).await.is_ok());
        assert!(
            service.validate_assignment(&[t1.id, t2.id, t3.id]).await.is_err(),
            "above max"
        );
    }

    #[tokio::test]
    async fn test_empty_assignment_is_valid() {
        let service = setup().await;
        assert!(service.validate_assignment(&[]).await.unwrap().is_empty());
    }
}
