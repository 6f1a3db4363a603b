//! Analytics service
//!
//! Read-only aggregations with caching on the fixed-window endpoints. The
//! parameterized module-trends query is served fresh; overview, tag and
//! country aggregates tolerate staleness within their windows.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::cache::{CacheLayer, MemoryCache, TTL_STATS, TTL_TAGS};
use crate::db::repositories::analytics::{
    CountryBreakdown, ModuleStats, OverviewStats, TagStats, UserStats,
};
use crate::db::repositories::AnalyticsRepository;
use crate::services::error::ServiceResult;

/// Analytics service
pub struct AnalyticsService {
    repo: Arc<dyn AnalyticsRepository>,
    cache: Arc<MemoryCache>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn AnalyticsRepository>, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    /// System overview, cached for 15 minutes.
    pub async fn overview(&self) -> ServiceResult<OverviewStats> {
        const KEY: &str = "analytics:overview";
        if let Some(cached) = self.cache.get::<OverviewStats>(KEY).await? {
            return Ok(cached);
        }

        let stats = self.repo.overview().await?;
        self.cache.set(KEY, &stats, TTL_STATS).await?;
        Ok(stats)
    }

    /// Module trends, optionally narrowed by country and date range.
    pub async fn module_stats(
        &self,
        country: Option<&str>,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> ServiceResult<ModuleStats> {
        // Unfiltered trends are requested constantly; cache just that shape.
        if country.is_none() && date_from.is_none() && date_to.is_none() {
            const KEY: &str = "analytics:modules";
            if let Some(cached) = self.cache.get::<ModuleStats>(KEY).await? {
                return Ok(cached);
            }
            let stats = self.repo.module_stats(None, None, None).await?;
            self.cache.set(KEY, &stats, TTL_STATS).await?;
            return Ok(stats);
        }

        Ok(self.repo.module_stats(country, date_from, date_to).await?)
    }

    /// Tag usage, cached for 30 minutes.
    pub async fn tag_stats(&self) -> ServiceResult<TagStats> {
        const KEY: &str = "analytics:tags";
        if let Some(cached) = self.cache.get::<TagStats>(KEY).await? {
            return Ok(cached);
        }

        let stats = self.repo.tag_stats().await?;
        self.cache.set(KEY, &stats, TTL_TAGS).await?;
        Ok(stats)
    }

    /// User activity. Admin-gated at the API layer, not cached.
    pub async fn user_stats(&self) -> ServiceResult<UserStats> {
        Ok(self.repo.user_stats().await?)
    }

    /// Per-country breakdown, cached for 15 minutes.
    pub async fn country_breakdown(&self) -> ServiceResult<Vec<CountryBreakdown>> {
        const KEY: &str = "analytics:countries";
        if let Some(cached) = self.cache.get::<Vec<CountryBreakdown>>(KEY).await? {
            return Ok(cached);
        }

        let stats = self.repo.country_breakdown().await?;
        self.cache.set(KEY, &stats, TTL_STATS).await?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::SqlxAnalyticsRepository;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_overview_is_cached() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let service = AnalyticsService::new(
            SqlxAnalyticsRepository::boxed(pool.clone()),
            create_cache(&CacheConfig::default()),
        );

        let before = service.overview().await.unwrap();
        assert_eq!(before.total_modules, 0);

        // Insert a module behind the cache's back; the cached snapshot wins
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES ('u', 'u@e.com', 'h', CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO modules (name, slug, company, country, params_count,
             short_description, status, created_by, created_at, updated_at)
             VALUES ('m', 'm', 'c', 'Russia', 1, 'd', 'active', 1, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let after = service.overview().await.unwrap();
        assert_eq!(after.total_modules, 0, "stale within the cache window");
    }

    #[tokio::test]
    async fn test_filtered_module_stats_bypass_cache() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let service = AnalyticsService::new(
            SqlxAnalyticsRepository::boxed(pool),
            create_cache(&CacheConfig::default()),
        );

        let stats = service.module_stats(Some("Russia"), None, None).await.unwrap();
        assert_eq!(stats.total_count, 0);
    }
}
