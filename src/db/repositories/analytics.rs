//! Analytics repository
//!
//! Pure aggregation queries backing the analytics read endpoints. Result
//! structs are serializable so the service layer can cache them as JSON.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::sync::Arc;

/// Count per country
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryCount {
    pub country: String,
    pub count: i64,
}

/// Count per tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCount {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub count: i64,
}

/// Count per status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Short module reference used in "most liked" listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleBrief {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub like_count: i64,
}

/// System-wide overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewStats {
    pub total_modules: i64,
    pub total_users: i64,
    pub total_publications: i64,
    pub total_likes: i64,
    pub new_modules_month: i64,
    pub new_users_month: i64,
    pub top_countries: Vec<CountryCount>,
    pub top_tags: Vec<TagCount>,
}

/// Parameter-count bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamRange {
    pub label: String,
    pub count: i64,
}

/// Module trend statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleStats {
    pub total_count: i64,
    pub status_distribution: Vec<StatusCount>,
    pub by_country: Vec<CountryCount>,
    pub parameter_ranges: Vec<ParamRange>,
    pub avg_params: f64,
    pub avg_likes: f64,
    pub total_likes: i64,
    pub most_liked: Vec<ModuleBrief>,
}

/// Per-category tag usage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryUsage {
    pub id: i64,
    pub name: String,
    pub tags_count: i64,
    pub total_usage: i64,
}

/// Tag usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagStats {
    pub categories: Vec<CategoryUsage>,
    pub popular_tags: Vec<TagCount>,
    pub unused_tags_count: i64,
    pub total_tags: i64,
}

/// Count per role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

/// Contributor with module count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub id: i64,
    pub username: String,
    pub modules_count: i64,
}

/// User activity statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub total_users: i64,
    pub blocked_users: i64,
    pub new_users_week: i64,
    pub role_distribution: Vec<RoleCount>,
    pub country_activity: Vec<CountryCount>,
    pub top_contributors: Vec<Contributor>,
}

/// Per-country breakdown of modules and likes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryBreakdown {
    pub country: String,
    pub module_count: i64,
    pub like_count: i64,
}

/// Analytics repository trait
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn overview(&self) -> Result<OverviewStats>;

    /// Module statistics over active modules, optionally narrowed by
    /// country and creation date range.
    async fn module_stats(
        &self,
        country: Option<&str>,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Result<ModuleStats>;

    async fn tag_stats(&self) -> Result<TagStats>;

    async fn user_stats(&self) -> Result<UserStats>;

    async fn country_breakdown(&self) -> Result<Vec<CountryBreakdown>>;
}

/// SQLx-based analytics repository implementation
pub struct SqlxAnalyticsRepository {
    pool: SqlitePool,
}

impl SqlxAnalyticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn AnalyticsRepository> {
        Arc::new(Self::new(pool))
    }

    async fn scalar(&self, sql: &str) -> Result<i64> {
        let row = sqlx::query(sql)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed aggregate query: {}", sql))?;
        Ok(row.get(0))
    }
}

#[async_trait]
impl AnalyticsRepository for SqlxAnalyticsRepository {
    async fn overview(&self) -> Result<OverviewStats> {
        let month_ago = Utc::now() - Duration::days(30);

        let total_modules = self
            .scalar("SELECT COUNT(*) FROM modules WHERE status = 'active'")
            .await?;
        let total_users = self
            .scalar("SELECT COUNT(*) FROM users WHERE is_blocked = 0")
            .await?;
        let total_publications = self.scalar("SELECT COUNT(*) FROM publications").await?;
        let total_likes = self.scalar("SELECT COUNT(*) FROM module_likes").await?;

        let new_modules_month: i64 = sqlx::query(
            "SELECT COUNT(*) AS c FROM modules WHERE status = 'active' AND created_at >= ?",
        )
        .bind(month_ago)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count new modules")?
        .get("c");

        let new_users_month: i64 =
            sqlx::query("SELECT COUNT(*) AS c FROM users WHERE is_blocked = 0 AND created_at >= ?")
                .bind(month_ago)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count new users")?
                .get("c");

        let top_countries = sqlx::query(
            "SELECT country, COUNT(*) AS c FROM modules WHERE status = 'active' \
             GROUP BY country ORDER BY c DESC LIMIT 5",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate top countries")?
        .iter()
        .map(|r| CountryCount {
            country: r.get("country"),
            count: r.get("c"),
        })
        .collect();

        let top_tags = sqlx::query(
            "SELECT t.id, t.name, tc.name AS category, COUNT(mt.id) AS c \
             FROM tags t \
             JOIN tag_categories tc ON tc.id = t.category_id \
             LEFT JOIN module_tags mt ON mt.tag_id = t.id \
             GROUP BY t.id ORDER BY c DESC LIMIT 10",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate top tags")?
        .iter()
        .map(|r| TagCount {
            id: r.get("id"),
            name: r.get("name"),
            category: r.get("category"),
            count: r.get("c"),
        })
        .collect();

        Ok(OverviewStats {
            total_modules,
            total_users,
            total_publications,
            total_likes,
            new_modules_month,
            new_users_month,
            top_countries,
            top_tags,
        })
    }

    async fn module_stats(
        &self,
        country: Option<&str>,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Result<ModuleStats> {
        let push_scope = |qb: &mut QueryBuilder<'_, Sqlite>| {
            qb.push(" m.status = 'active'");
            if let Some(country) = country {
                qb.push(" AND m.country = ");
                qb.push_bind(country.to_string());
            }
            if let Some(from) = date_from {
                qb.push(" AND date(m.created_at) >= ");
                qb.push_bind(from);
            }
            if let Some(to) = date_to {
                qb.push(" AND date(m.created_at) <= ");
                qb.push_bind(to);
            }
        };

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS c FROM modules m WHERE");
        push_scope(&mut count_qb);
        let total_count: i64 = count_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count modules in scope")?
            .get("c");

        // Status distribution is global by design: it shows the moderation
        // pipeline, not the filtered slice.
        let status_distribution = sqlx::query(
            "SELECT status, COUNT(*) AS c FROM modules GROUP BY status ORDER BY c DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate statuses")?
        .iter()
        .map(|r| StatusCount {
            status: r.get("status"),
            count: r.get("c"),
        })
        .collect();

        let mut by_country_qb = QueryBuilder::<Sqlite>::new(
            "SELECT m.country, COUNT(*) AS c FROM modules m WHERE",
        );
        push_scope(&mut by_country_qb);
        by_country_qb.push(" GROUP BY m.country ORDER BY c DESC LIMIT 10");
        let by_country = by_country_qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to aggregate countries")?
            .iter()
            .map(|r| CountryCount {
                country: r.get("country"),
                count: r.get("c"),
            })
            .collect();

        const BUCKETS: [(&str, i64, Option<i64>); 4] = [
            ("< 1M", 0, Some(1_000_000)),
            ("1M - 10M", 1_000_000, Some(10_000_000)),
            ("10M - 100M", 10_000_000, Some(100_000_000)),
            ("> 100M", 100_000_000, None),
        ];
        let mut parameter_ranges = Vec::with_capacity(BUCKETS.len());
        for (label, lo, hi) in BUCKETS {
            let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS c FROM modules m WHERE");
            push_scope(&mut qb);
            qb.push(" AND m.params_count >= ");
            qb.push_bind(lo);
            if let Some(hi) = hi {
                qb.push(" AND m.params_count < ");
                qb.push_bind(hi);
            }
            let count: i64 = qb
                .build()
                .fetch_one(&self.pool)
                .await
                .context("Failed to bucket parameter counts")?
                .get("c");
            parameter_ranges.push(ParamRange {
                label: label.to_string(),
                count,
            });
        }

        let mut avg_qb = QueryBuilder::<Sqlite>::new(
            "SELECT COALESCE(AVG(m.params_count), 0.0) AS avg_params, \
             COALESCE(AVG((SELECT COUNT(*) FROM module_likes ml WHERE ml.module_id = m.id)), 0.0) AS avg_likes, \
             COALESCE(SUM((SELECT COUNT(*) FROM module_likes ml WHERE ml.module_id = m.id)), 0) AS total_likes \
             FROM modules m WHERE",
        );
        push_scope(&mut avg_qb);
        let avg_row = avg_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to compute averages")?;

        let mut liked_qb = QueryBuilder::<Sqlite>::new(
            "SELECT m.id, m.name, m.company, \
             (SELECT COUNT(*) FROM module_likes ml WHERE ml.module_id = m.id) AS like_count \
             FROM modules m WHERE",
        );
        push_scope(&mut liked_qb);
        liked_qb.push(" ORDER BY like_count DESC LIMIT 5");
        let most_liked = liked_qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to find most liked modules")?
            .iter()
            .map(|r| ModuleBrief {
                id: r.get("id"),
                name: r.get("name"),
                company: r.get("company"),
                like_count: r.get("like_count"),
            })
            .collect();

        Ok(ModuleStats {
            total_count,
            status_distribution,
            by_country,
            parameter_ranges,
            avg_params: avg_row.get("avg_params"),
            avg_likes: avg_row.get("avg_likes"),
            total_likes: avg_row.get("total_likes"),
            most_liked,
        })
    }

    async fn tag_stats(&self) -> Result<TagStats> {
        let categories = sqlx::query(
            "SELECT c.id, c.name, \
             (SELECT COUNT(*) FROM tags t WHERE t.category_id = c.id AND t.is_active = 1) AS tags_count, \
             (SELECT COUNT(*) FROM module_tags mt JOIN tags t ON t.id = mt.tag_id \
              WHERE t.category_id = c.id AND t.is_active = 1) AS total_usage \
             FROM tag_categories c WHERE c.is_active = 1 ORDER BY c.sort_order, c.name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate tag categories")?
        .iter()
        .map(|r| CategoryUsage {
            id: r.get("id"),
            name: r.get("name"),
            tags_count: r.get("tags_count"),
            total_usage: r.get("total_usage"),
        })
        .collect();

        let popular_tags = sqlx::query(
            "SELECT t.id, t.name, tc.name AS category, COUNT(mt.id) AS c \
             FROM tags t \
             JOIN tag_categories tc ON tc.id = t.category_id \
             LEFT JOIN module_tags mt ON mt.tag_id = t.id \
             WHERE t.is_active = 1 \
             GROUP BY t.id ORDER BY c DESC LIMIT 15",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate popular tags")?
        .iter()
        .map(|r| TagCount {
            id: r.get("id"),
            name: r.get("name"),
            category: r.get("category"),
            count: r.get("c"),
        })
        .collect();

        let unused_tags_count = self
            .scalar(
                "SELECT COUNT(*) FROM tags t WHERE t.is_active = 1 \
                 AND NOT EXISTS (SELECT 1 FROM module_tags mt WHERE mt.tag_id = t.id)",
            )
            .await?;
        let total_tags = self
            .scalar("SELECT COUNT(*) FROM tags WHERE is_active = 1")
            .await?;

        Ok(TagStats {
            categories,
            popular_tags,
            unused_tags_count,
            total_tags,
        })
    }

    async fn user_stats(&self) -> Result<UserStats> {
        let week_ago = Utc::now() - Duration::days(7);

        let total_users = self
            .scalar("SELECT COUNT(*) FROM users WHERE is_blocked = 0")
            .await?;
        let blocked_users = self
            .scalar("SELECT COUNT(*) FROM users WHERE is_blocked = 1")
            .await?;

        let new_users_week: i64 =
            sqlx::query("SELECT COUNT(*) AS c FROM users WHERE is_blocked = 0 AND created_at >= ?")
                .bind(week_ago)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count new users")?
                .get("c");

        let role_distribution = sqlx::query(
            "SELECT role, COUNT(*) AS c FROM users WHERE is_blocked = 0 GROUP BY role",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate roles")?
        .iter()
        .map(|r| RoleCount {
            role: r.get("role"),
            count: r.get("c"),
        })
        .collect();

        let country_activity = sqlx::query(
            "SELECT country, COUNT(*) AS c FROM users \
             WHERE is_blocked = 0 AND country != '' \
             GROUP BY country ORDER BY c DESC LIMIT 10",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate user countries")?
        .iter()
        .map(|r| CountryCount {
            country: r.get("country"),
            count: r.get("c"),
        })
        .collect();

        let top_contributors = sqlx::query(
            "SELECT u.id, u.username, \
             (SELECT COUNT(*) FROM modules m WHERE m.created_by = u.id AND m.status = 'active') AS mc \
             FROM users u WHERE u.is_blocked = 0 ORDER BY mc DESC LIMIT 10",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate contributors")?
        .iter()
        .map(|r| Contributor {
            id: r.get("id"),
            username: r.get("username"),
            modules_count: r.get("mc"),
        })
        .collect();

        Ok(UserStats {
            total_users,
            blocked_users,
            new_users_week,
            role_distribution,
            country_activity,
            top_contributors,
        })
    }

    async fn country_breakdown(&self) -> Result<Vec<CountryBreakdown>> {
        let rows = sqlx::query(
            "SELECT m.country, COUNT(DISTINCT m.id) AS mc, COUNT(ml.id) AS lc \
             FROM modules m \
             LEFT JOIN module_likes ml ON ml.module_id = m.id \
             WHERE m.status = 'active' \
             GROUP BY m.country ORDER BY mc DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate country breakdown")?;

        Ok(rows
            .iter()
            .map(|r| CountryBreakdown {
                country: r.get("country"),
                module_count: r.get("mc"),
                like_count: r.get("lc"),
            })
            .collect())
    }
}
