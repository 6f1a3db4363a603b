//! Tag repository
//!
//! Database operations for the two-level tag taxonomy: categories, tags,
//! usage counts and popularity queries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::sync::Arc;

use crate::models::{ListParams, PagedResult, Tag, TagCategory, TagWithUsage};

/// Filter for tag listings
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    /// Case-insensitive name contains
    pub name: Option<String>,
    pub category_id: Option<i64>,
    /// Only active tags (the public default)
    pub active_only: bool,
    /// Minimum number of modules using the tag
    pub min_usage: Option<i64>,
}

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Insert a new category
    async fn create_category(&self, category: &TagCategory) -> Result<TagCategory>;

    /// All categories ordered by sort weight, optionally active only
    async fn list_categories(&self, active_only: bool) -> Result<Vec<TagCategory>>;

    /// Category by ID
    async fn category_by_id(&self, id: i64) -> Result<Option<TagCategory>>;

    /// Category by exact canonical name
    async fn category_by_name(&self, name: &str) -> Result<Option<TagCategory>>;

    /// Insert a new tag
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// Tag by ID
    async fn get(&self, id: i64) -> Result<Option<Tag>>;

    /// Tags by IDs; missing IDs are simply absent from the result
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Tag>>;

    /// Tag by slug within a category
    async fn get_by_slug_in_category(&self, category_id: i64, slug: &str) -> Result<Option<Tag>>;

    /// Filtered, paginated listing with usage counts
    async fn list(&self, filter: &TagFilter, params: &ListParams)
        -> Result<PagedResult<TagWithUsage>>;

    /// Most used active tags
    async fn popular(&self, limit: i64) -> Result<Vec<TagWithUsage>>;

    /// Active tags of one category with usage counts, ordered by name
    async fn by_category(&self, category_id: i64) -> Result<Vec<TagWithUsage>>;

    /// Soft-delete a tag
    async fn deactivate(&self, id: i64) -> Result<bool>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: SqlitePool,
}

impl SqlxTagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

const TAG_WITH_USAGE_SELECT: &str =
    "SELECT t.*, c.name AS category_name, \
     (SELECT COUNT(*) FROM module_tags mt WHERE mt.tag_id = t.id) AS usage_count \
     FROM tags t JOIN tag_categories c ON c.id = t.category_id";

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create_category(&self, category: &TagCategory) -> Result<TagCategory> {
        let aliases = serde_json::to_string(&category.aliases)
            .context("Failed to serialize category aliases")?;

        let result = sqlx::query(
            r#"
            INSERT INTO tag_categories
                (name, slug, description, sort_order, is_active, aliases, min_tags, max_tags)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.sort_order)
        .bind(category.is_active)
        .bind(aliases)
        .bind(category.min_tags)
        .bind(category.max_tags)
        .execute(&self.pool)
        .await
        .context("Failed to create tag category")?;

        let mut created = category.clone();
        created.id = result.last_insert_rowid();
        Ok(created)
    }

    async fn list_categories(&self, active_only: bool) -> Result<Vec<TagCategory>> {
        let sql = if active_only {
            "SELECT * FROM tag_categories WHERE is_active = 1 ORDER BY sort_order, name"
        } else {
            "SELECT * FROM tag_categories ORDER BY sort_order, name"
        };

        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tag categories")?;

        rows.iter().map(row_to_category).collect()
    }

    async fn category_by_id(&self, id: i64) -> Result<Option<TagCategory>> {
        let row = sqlx::query("SELECT * FROM tag_categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get tag category")?;

        row.map(|r| row_to_category(&r)).transpose()
    }

    async fn category_by_name(&self, name: &str) -> Result<Option<TagCategory>> {
        let row = sqlx::query("SELECT * FROM tag_categories WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get tag category by name")?;

        row.map(|r| row_to_category(&r)).transpose()
    }

    async fn create(&self, tag: &Tag) -> Result<Tag> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO tags
                (category_id, name, slug, description, color, is_active,
                 created_by, approved_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tag.category_id)
        .bind(&tag.name)
        .bind(&tag.slug)
        .bind(&tag.description)
        .bind(&tag.color)
        .bind(tag.is_active)
        .bind(tag.created_by)
        .bind(tag.approved_by)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create tag")?;

        let mut created = tag.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT * FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get tag by ID")?;

        row.map(|r| row_to_tag(&r)).transpose()
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Tag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM tags WHERE id IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
        sep.push_unseparated(")");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to get tags by IDs")?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn get_by_slug_in_category(&self, category_id: i64, slug: &str) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT * FROM tags WHERE category_id = ? AND slug = ?")
            .bind(category_id)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get tag by slug")?;

        row.map(|r| row_to_tag(&r)).transpose()
    }

    async fn list(
        &self,
        filter: &TagFilter,
        params: &ListParams,
    ) -> Result<PagedResult<TagWithUsage>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) AS c FROM tags t JOIN tag_categories c2 ON c2.id = t.category_id WHERE 1=1",
        );
        push_tag_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count tags")?
            .get("c");

        let mut qb = QueryBuilder::<Sqlite>::new(TAG_WITH_USAGE_SELECT);
        qb.push(" WHERE 1=1");
        push_tag_filters(&mut qb, filter);
        qb.push(" ORDER BY c.sort_order, t.name");
        qb.push(" LIMIT ").push_bind(params.limit());
        qb.push(" OFFSET ").push_bind(params.offset());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tags")?;

        let items = rows
            .iter()
            .map(row_to_tag_with_usage)
            .collect::<Result<Vec<_>>>()?;
        Ok(PagedResult::new(items, total, params))
    }

    async fn popular(&self, limit: i64) -> Result<Vec<TagWithUsage>> {
        let sql = format!(
            "{} WHERE t.is_active = 1 ORDER BY usage_count DESC, t.name ASC LIMIT ?",
            TAG_WITH_USAGE_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to get popular tags")?;

        rows.iter().map(row_to_tag_with_usage).collect()
    }

    async fn by_category(&self, category_id: i64) -> Result<Vec<TagWithUsage>> {
        let sql = format!(
            "{} WHERE t.is_active = 1 AND t.category_id = ? ORDER BY t.name",
            TAG_WITH_USAGE_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to get tags by category")?;

        rows.iter().map(row_to_tag_with_usage).collect()
    }

    async fn deactivate(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE tags SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to deactivate tag")?;

        Ok(result.rows_affected() > 0)
    }
}

fn push_tag_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &TagFilter) {
    if filter.active_only {
        qb.push(" AND t.is_active = 1");
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND t.category_id = ");
        qb.push_bind(category_id);
    }
    if let Some(name) = &filter.name {
        qb.push(" AND t.name LIKE ");
        qb.push_bind(format!("%{}%", name));
    }
    if let Some(min_usage) = filter.min_usage {
        qb.push(" AND (SELECT COUNT(*) FROM module_tags mt WHERE mt.tag_id = t.id) >= ");
        qb.push_bind(min_usage);
    }
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<TagCategory> {
    let aliases: String = row.get("aliases");
    Ok(TagCategory {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        sort_order: row.get("sort_order"),
        is_active: row.get("is_active"),
        aliases: serde_json::from_str(&aliases).unwrap_or_default(),
        min_tags: row.get("min_tags"),
        max_tags: row.get("max_tags"),
    })
}

fn row_to_tag(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    Ok(Tag {
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
    })
}

fn row_to_tag_with_usage(row: &sqlx::sqlite::SqliteRow) -> Result<TagWithUsage> {
    Ok(TagWithUsage {
        tag: row_to_tag(row)?,
        category_name: row.get("category_name"),
        usage_count: row.get("usage_count"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlitePool {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_category_with_aliases_round_trip() {
        let pool = setup().await;
        let repo = SqlxTagRepository::new(pool);

        let mut category = TagCategory::new("Availability".to_string(), "availability".to_string());
        category.aliases = vec!["Доступность".to_string()];
        let created = repo.create_category(&category).await.unwrap();
        assert!(created.id > 0);

        let fetched = repo.category_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.aliases, vec!["Доступность".to_string()]);
        assert!(fetched.matches_name("доступность"));
    }

    #[tokio::test]
    async fn test_unique_slug_per_category() {
        let pool = setup().await;
        let repo = SqlxTagRepository::new(pool);

        let cat_a = repo
            .create_category(&TagCategory::new("A".to_string(), "a".to_string()))
            .await
            .unwrap();
        let cat_b = repo
            .create_category(&TagCategory::new("B".to_string(), "b".to_string()))
            .await
            .unwrap();

        repo.create(&Tag::new(cat_a.id, "NLP".to_string(), "nlp".to_string()))
            .await
            .unwrap();
        // Same slug in another category is fine
        repo.create(&Tag::new(cat_b.id, "NLP".to_string(), "nlp".to_string()))
            .await
            .unwrap();
        // Duplicate within the same category violates the constraint
        let dup = repo
            .create(&Tag::new(cat_a.id, "NLP2".to_string(), "nlp".to_string()))
            .await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_popular_orders_by_usage() {
        let pool = setup().await;
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES ('u', 'u@e.com', 'h', CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let repo = SqlxTagRepository::new(pool.clone());
        let cat = repo
            .create_category(&TagCategory::new("Type".to_string(), "type".to_string()))
            .await
            .unwrap();
        let hot = repo
            .create(&Tag::new(cat.id, "Hot".to_string(), "hot".to_string()))
            .await
            .unwrap();
        let cold = repo
            .create(&Tag::new(cat.id, "Cold".to_string(), "cold".to_string()))
            .await
            .unwrap();

        for i in 0..2 {
            sqlx::query(
                "INSERT INTO modules (name, slug, company, country, params_count,
                 short_description, created_by, created_at, updated_at)
                 VALUES ('m', ?, 'c', 'Russia', 1, 'd', 1, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
            )
            .bind(format!("m-{}", i))
            .execute(&pool)
            .await
            .unwrap();
            sqlx::query(
                "INSERT INTO module_tags (module_id, tag_id, assigned_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
            )
            .bind(i + 1)
            .bind(hot.id)
            .execute(&pool)
            .await
            .unwrap();
        }

        let popular = repo.popular(10).await.unwrap();
        assert_eq!(popular[0].tag.id, hot.id);
        assert_eq!(popular[0].usage_count, 2);
        let cold_entry = popular.iter().find(|t| t.tag.id == cold.id).unwrap();
        assert_eq!(cold_entry.usage_count, 0);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let pool = setup().await;
        let repo = SqlxTagRepository::new(pool);

        let cat = repo
            .create_category(&TagCategory::new("Type".to_string(), "type".to_string()))
            .await
            .unwrap();
        repo.create(&Tag::new(cat.id, "Speech".to_string(), "speech".to_string()))
            .await
            .unwrap();
        let inactive = repo
            .create(&Tag::new(cat.id, "Old".to_string(), "old".to_string()))
            .await
            .unwrap();
        repo.deactivate(inactive.id).await.unwrap();

        let active = repo
            .list(
                &TagFilter {
                    active_only: true,
                    ..Default::default()
                },
                &ListParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(active.total, 1);

        let by_name = repo
            .list(
                &TagFilter {
                    name: Some("spee".to_string()),
                    ..Default::default()
                },
                &ListParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_name.total, 1);
        assert_eq!(by_name.items[0].tag.slug, "speech");
    }
}
