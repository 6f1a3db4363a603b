//! Publication repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::sync::Arc;

use crate::models::{ListParams, PagedResult, Publication};

/// Filter for publication listings
#[derive(Debug, Clone, Default)]
pub struct PublicationFilter {
    /// Case-insensitive title contains
    pub title: Option<String>,
    /// Case-insensitive authors contains
    pub authors: Option<String>,
    /// Case-insensitive venue contains
    pub journal_conference: Option<String>,
    pub module_id: Option<i64>,
    /// Case-insensitive module name contains
    pub module_name: Option<String>,
    pub published_after: Option<NaiveDate>,
    pub published_before: Option<NaiveDate>,
    pub published_year: Option<i32>,
}

/// Publication repository trait
#[async_trait]
pub trait PublicationRepository: Send + Sync {
    async fn create(&self, publication: &Publication) -> Result<Publication>;

    async fn get(&self, id: i64) -> Result<Option<Publication>>;

    /// Filtered, paginated listing ordered by publication date descending
    async fn list(
        &self,
        filter: &PublicationFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Publication>>;

    /// All publications of one module
    async fn for_module(&self, module_id: i64) -> Result<Vec<Publication>>;

    /// Number of publications across a user's modules
    async fn count_for_creator(&self, user_id: i64) -> Result<i64>;
}

/// SQLx-based publication repository implementation
pub struct SqlxPublicationRepository {
    pool: SqlitePool,
}

impl SqlxPublicationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn PublicationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PublicationRepository for SqlxPublicationRepository {
    async fn create(&self, publication: &Publication) -> Result<Publication> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO publications
                (module_id, title, authors, journal_conference, publication_date,
                 doi, url, citation_count, added_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(publication.module_id)
        .bind(&publication.title)
        .bind(&publication.authors)
        .bind(&publication.journal_conference)
        .bind(publication.publication_date)
        .bind(&publication.doi)
        .bind(&publication.url)
        .bind(publication.citation_count)
        .bind(publication.added_by)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create publication")?;

        let mut created = publication.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<Publication>> {
        let row = sqlx::query("SELECT * FROM publications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get publication")?;

        row.map(|r| row_to_publication(&r)).transpose()
    }

    async fn list(
        &self,
        filter: &PublicationFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Publication>> {
        let mut count_qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS c FROM publications p WHERE 1=1");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count publications")?
            .get("c");

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT p.* FROM publications p WHERE 1=1");
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY p.publication_date DESC, p.id DESC");
        qb.push(" LIMIT ").push_bind(params.limit());
        qb.push(" OFFSET ").push_bind(params.offset());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list publications")?;

        let items = rows
            .iter()
            .map(row_to_publication)
            .collect::<Result<Vec<_>>>()?;
        Ok(PagedResult::new(items, total, params))
    }

    async fn for_module(&self, module_id: i64) -> Result<Vec<Publication>> {
        let rows = sqlx::query(
            "SELECT * FROM publications WHERE module_id = ? ORDER BY publication_date DESC, id DESC",
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get module publications")?;

        rows.iter().map(row_to_publication).collect()
    }

    async fn count_for_creator(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS c FROM publications p \
             JOIN modules m ON m.id = p.module_id WHERE m.created_by = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count creator publications")?;
        Ok(row.get("c"))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PublicationFilter) {
    if let Some(title) = &filter.title {
        qb.push(" AND p.title LIKE ");
        qb.push_bind(format!("%{}%", title));
    }
    if let Some(authors) = &filter.authors {
        qb.push(" AND p.authors LIKE ");
        qb.push_bind(format!("%{}%", authors));
    }
    if let Some(venue) = &filter.journal_conference {
        qb.push(" AND p.journal_conference LIKE ");
        qb.push_bind(format!("%{}%", venue));
    }
    if let Some(module_id) = filter.module_id {
        qb.push(" AND p.module_id = ");
        qb.push_bind(module_id);
    }
    if let Some(module_name) = &filter.module_name {
        qb.push(" AND p.module_id IN (SELECT id FROM modules WHERE name LIKE ");
        qb.push_bind(format!("%{}%", module_name));
        qb.push(")");
    }
    if let Some(after) = filter.published_after {
        qb.push(" AND p.publication_date >= ");
        qb.push_bind(after);
    }
    if let Some(before) = filter.published_before {
        qb.push(" AND p.publication_date <= ");
        qb.push_bind(before);
    }
    if let Some(year) = filter.published_year {
        qb.push(" AND strftime('%Y', p.publication_date) = ");
        qb.push_bind(format!("{:04}", year));
    }
}

fn row_to_publication(row: &sqlx::sqlite::SqliteRow) -> Result<Publication> {
    Ok(Publication {
        id: row.get("id"),
        module_id: row.get("module_id"),
        title: row.get("title"),
        authors: row.get("authors"),
        journal_conference: row.get("journal_conference"),
        publication_date: row.get("publication_date"),
        doi: row.get("doi"),
        url: row.get("url"),
        citation_count: row.get("citation_count"),
        added_by: row.get("added_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlitePool {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES ('u', 'u@e.com', 'h', CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO modules (name, slug, company, country, params_count,
             short_description, created_by, created_at, updated_at)
             VALUES ('m', 'm', 'c', 'Russia', 1, 'd', 1, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    fn sample(module_id: i64, title: &str, year: i32) -> Publication {
        let mut publication = Publication::new(module_id, title.to_string());
        publication.publication_date = NaiveDate::from_ymd_opt(year, 6, 1);
        publication
    }

    #[tokio::test]
    async fn test_create_and_list_ordering() {
        let pool = setup().await;
        let repo = SqlxPublicationRepository::new(pool);

        repo.create(&sample(1, "Older", 2019)).await.unwrap();
        repo.create(&sample(1, "Newer", 2023)).await.unwrap();

        let result = repo
            .list(&PublicationFilter::default(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(result.total, 2);
        assert_eq!(result.items[0].title, "Newer");
    }

    #[tokio::test]
    async fn test_date_filters() {
        let pool = setup().await;
        let repo = SqlxPublicationRepository::new(pool);

        repo.create(&sample(1, "Old", 2018)).await.unwrap();
        repo.create(&sample(1, "New", 2024)).await.unwrap();

        let after = repo
            .list(
                &PublicationFilter {
                    published_after: NaiveDate::from_ymd_opt(2020, 1, 1),
                    ..Default::default()
                },
                &ListParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(after.total, 1);
        assert_eq!(after.items[0].title, "New");

        let year = repo
            .list(
                &PublicationFilter {
                    published_year: Some(2018),
                    ..Default::default()
                },
                &ListParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(year.total, 1);
        assert_eq!(year.items[0].title, "Old");
    }

    #[tokio::test]
    async fn test_count_for_creator() {
        let pool = setup().await;
        let repo = SqlxPublicationRepository::new(pool);

        repo.create(&sample(1, "P1", 2020)).await.unwrap();
        repo.create(&sample(1, "P2", 2021)).await.unwrap();

        assert_eq!(repo.count_for_creator(1).await.unwrap(), 2);
        assert_eq!(repo.count_for_creator(99).await.unwrap(), 0);
    }
}
