//! Country reference repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::Country;

/// Country repository trait
#[async_trait]
pub trait CountryRepository: Send + Sync {
    /// All countries ordered by name
    async fn list(&self) -> Result<Vec<Country>>;

    /// BRICS member countries only
    async fn brics(&self) -> Result<Vec<Country>>;

    async fn by_name(&self, name: &str) -> Result<Option<Country>>;

    /// Insert or update a country keyed by name
    async fn upsert(&self, country: &Country) -> Result<Country>;
}

/// SQLx-based country repository implementation
pub struct SqlxCountryRepository {
    pool: SqlitePool,
}

impl SqlxCountryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn CountryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CountryRepository for SqlxCountryRepository {
    async fn list(&self) -> Result<Vec<Country>> {
        let rows = sqlx::query("SELECT * FROM countries ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list countries")?;

        rows.iter().map(row_to_country).collect()
    }

    async fn brics(&self) -> Result<Vec<Country>> {
        let rows = sqlx::query("SELECT * FROM countries WHERE is_brics_member = 1 ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list BRICS countries")?;

        rows.iter().map(row_to_country).collect()
    }

    async fn by_name(&self, name: &str) -> Result<Option<Country>> {
        let row = sqlx::query("SELECT * FROM countries WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get country")?;

        row.map(|r| row_to_country(&r)).transpose()
    }

    async fn upsert(&self, country: &Country) -> Result<Country> {
        sqlx::query(
            r#"
            INSERT INTO countries (name, code, is_brics_member, flag_emoji)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (name) DO UPDATE SET
                code = excluded.code,
                is_brics_member = excluded.is_brics_member,
                flag_emoji = excluded.flag_emoji
            "#,
        )
        .bind(&country.name)
        .bind(&country.code)
        .bind(country.is_brics_member)
        .bind(&country.flag_emoji)
        .execute(&self.pool)
        .await
        .context("Failed to upsert country")?;

        self.by_name(&country.name)
            .await?
            .context("Country missing after upsert")
    }
}

fn row_to_country(row: &sqlx::sqlite::SqliteRow) -> Result<Country> {
    Ok(Country {
        id: row.get("id"),
        name: row.get("name"),
        code: row.get("code"),
        is_brics_member: row.get("is_brics_member"),
        flag_emoji: row.get("flag_emoji"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_upsert_and_brics_filter() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxCountryRepository::new(pool);

        repo.upsert(&Country::new("Brazil".to_string(), "BRA".to_string()))
            .await
            .unwrap();
        let mut usa = Country::new("United States".to_string(), "USA".to_string());
        usa.is_brics_member = false;
        repo.upsert(&usa).await.unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 2);
        let brics = repo.brics().await.unwrap();
        assert_eq!(brics.len(), 1);
        assert_eq!(brics[0].code, "BRA");

        // Upsert updates in place
        let mut brazil = Country::new("Brazil".to_string(), "BRA".to_string());
        brazil.flag_emoji = "🇧🇷".to_string();
        let updated = repo.upsert(&brazil).await.unwrap();
        assert_eq!(updated.flag_emoji, "🇧🇷");
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }
}
