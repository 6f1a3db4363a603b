//! Bulk CSV import for publications.
//!
//! Usage: `cargo run --bin import-publications -- <csv_file>`
//!
//! Expected columns: module_slug, title, authors, journal_conference,
//! publication_date (YYYY-MM-DD), doi, url, citation_count. Rows are
//! processed independently: a failing row is logged and skipped.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;

use airegistry::config::Config;
use airegistry::db::repositories::{
    ModuleRepository, PublicationRepository, SqlxModuleRepository, SqlxPublicationRepository,
    SqlxUserRepository, UserRepository,
};
use airegistry::db::{self, migrations};
use airegistry::models::Publication;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "import_publications=info,airegistry=info".into()),
        )
        .init();

    let csv_file = std::env::args()
        .nth(1)
        .context("Usage: import-publications <csv_file>")?;

    let config = Config::load(Path::new("config.toml"))?;
    let pool = db::create_pool(&config.database).await?;
    migrations::run_migrations(&pool).await?;

    let users = SqlxUserRepository::boxed(pool.clone());
    let modules = SqlxModuleRepository::boxed(pool.clone());
    let publications = SqlxPublicationRepository::boxed(pool.clone());

    let admin = users
        .first_admin()
        .await?
        .map(|u| u.id)
        .context("No admin user found; create one before importing")?;

    let mut reader = csv::Reader::from_path(&csv_file)
        .with_context(|| format!("Failed to open CSV file: {}", csv_file))?;
    let headers = reader.headers().context("Failed to read CSV header")?.clone();

    let mut imported = 0usize;
    let mut failed = 0usize;

    for (row_num, record) in reader.records().enumerate() {
        let row_num = row_num + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Row {}: unreadable record: {}", row_num, e);
                failed += 1;
                continue;
            }
        };

        match import_row(&modules, &publications, admin, &headers, &record).await {
            Ok(title) => {
                imported += 1;
                tracing::info!("Row {}: imported '{}'", row_num, title);
            }
            Err(e) => {
                failed += 1;
                tracing::error!("Row {}: {:#}", row_num, e);
            }
        }
    }

    tracing::info!("Import finished: {} imported, {} failed", imported, failed);
    Ok(())
}

async fn import_row(
    modules: &Arc<dyn ModuleRepository>,
    publications: &Arc<dyn PublicationRepository>,
    admin_id: i64,
    headers: &csv::StringRecord,
    record: &csv::StringRecord,
) -> Result<String> {
    let field = |name: &str| -> String {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .and_then(|i| record.get(i))
            .unwrap_or_default()
            .trim()
            .to_string()
    };

    let module_slug = field("module_slug");
    if module_slug.is_empty() {
        anyhow::bail!("missing required column 'module_slug'");
    }
    let title = field("title");
    if title.is_empty() {
        anyhow::bail!("missing required column 'title'");
    }

    let module = modules
        .get_by_slug(&module_slug)
        .await?
        .with_context(|| format!("module '{}' not found", module_slug))?;

    let publication_date = match field("publication_date").as_str() {
        "" => None,
        raw => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("invalid publication_date: {}", raw))?,
        ),
    };

    let citation_count: i64 = match field("citation_count").as_str() {
        "" => 0,
        raw => raw
            .parse()
            .with_context(|| format!("invalid citation_count: {}", raw))?,
    };

    let mut publication = Publication::new(module.id, title.clone());
    publication.authors = field("authors");
    publication.journal_conference = field("journal_conference");
    publication.publication_date = publication_date;
    publication.doi = field("doi");
    publication.url = field("url");
    publication.citation_count = citation_count;
    publication.added_by = Some(admin_id);

    publications.create(&publication).await?;
    Ok(title)
}
