//! Bulk CSV import for AI modules.
//!
//! Usage: `cargo run --bin import-modules -- <csv_file>`
//!
//! Expected columns: name, company, country, params_count,
//! short_description, version, license, service_types, application_areas,
//! technology_types, availability, usage_status, description.
//! The three *_types columns take semicolon-separated tag names; tags and
//! their categories are created on demand. Rows are processed
//! independently: a failing row is logged and skipped.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use airegistry::config::Config;
use airegistry::db::repositories::{
    ModuleRepository, SqlxModuleRepository, SqlxTagRepository, SqlxUserRepository, TagRepository,
    UserRepository,
};
use airegistry::db::{self, migrations};
use airegistry::models::{AiModule, DetailInput, ModuleStatus, Tag, TagCategory};
use airegistry::services::slug::{slug_candidates, slugify};

/// The taxonomy categories the legacy sheet maps onto, with the localized
/// header names kept as aliases.
const SEED_CATEGORIES: [(&str, &str, &str); 5] = [
    ("Service type", "service-type", "Тип сервиса (Услуги)"),
    ("Application area", "application-area", "Область применения"),
    ("Technology type", "technology-type", "Тип технологии"),
    ("Availability", "availability", "Доступность"),
    ("Usage status", "usage-status", "Статус использования"),
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "import_modules=info,airegistry=info".into()),
        )
        .init();

    let csv_file = std::env::args()
        .nth(1)
        .context("Usage: import-modules <csv_file>")?;

    let config = Config::load(Path::new("config.toml"))?;
    let pool = db::create_pool(&config.database).await?;
    migrations::run_migrations(&pool).await?;

    let users = SqlxUserRepository::boxed(pool.clone());
    let modules = SqlxModuleRepository::boxed(pool.clone());
    let tags = SqlxTagRepository::boxed(pool.clone());

    let admin = users
        .first_admin()
        .await?
        .map(|u| u.id)
        .context("No admin user found; create one before importing")?;

    seed_categories(&tags).await?;

    let mut reader = csv::Reader::from_path(&csv_file)
        .with_context(|| format!("Failed to open CSV file: {}", csv_file))?;
    let headers = reader.headers().context("Failed to read CSV header")?.clone();

    let mut imported = 0usize;
    let mut failed = 0usize;

    for (row_num, record) in reader.records().enumerate() {
        let row_num = row_num + 2; // 1-based, after the header row
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Row {}: unreadable record: {}", row_num, e);
                failed += 1;
                continue;
            }
        };

        match import_row(&modules, &tags, admin, &headers, &record).await {
            Ok(name) => {
                imported += 1;
                tracing::info!("Row {}: imported '{}'", row_num, name);
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

async fn seed_categories(tags: &Arc<dyn TagRepository>) -> Result<()> {
    for (name, slug, alias) in SEED_CATEGORIES {
        if tags.category_by_name(name).await?.is_none() {
            let mut category = TagCategory::new(name.to_string(), slug.to_string());
            category.aliases = vec![alias.to_string()];
            tags.create_category(&category).await?;
            tracing::info!("Created tag category '{}'", name);
        }
    }
    Ok(())
}

async fn import_row(
    modules: &Arc<dyn ModuleRepository>,
    tags: &Arc<dyn TagRepository>,
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

    let name = field("name");
    if name.is_empty() {
        anyhow::bail!("missing required column 'name'");
    }
    let company = field("company");
    if company.is_empty() {
        anyhow::bail!("missing required column 'company'");
    }
    let country = field("country");
    if country.is_empty() {
        anyhow::bail!("missing required column 'country'");
    }

    let params_count: i64 = match field("params_count").as_str() {
        "" => 1_000_000_000, // Legacy sheets carry no parameter counts
        raw => raw
            .replace('_', "")
            .parse()
            .with_context(|| format!("invalid params_count: {}", raw))?,
    };
    if params_count <= 0 {
        anyhow::bail!("params_count must be positive");
    }

    let slug = unique_slug(modules, &name).await?;
    let mut module = AiModule::new(
        name.clone(),
        slug,
        company,
        country,
        params_count,
        truncate(&field("short_description"), 500),
        admin_id,
    );
    // Imported records are part of the published catalog
    module.status = ModuleStatus::Active;
    module.published_at = Some(chrono::Utc::now());
    module.version = field("version");
    module.license = field("license");

    let module = modules.create(&module).await?;

    let detail = DetailInput {
        description: field("description"),
        technical_info: field("short_description"),
        ability: field("availability"),
        usage_status: field("usage_status"),
        ..Default::default()
    };
    modules.upsert_detail(module.id, &detail).await?;

    let mut tag_ids = Vec::new();
    for (column, category_name) in [
        ("service_types", "Service type"),
        ("application_areas", "Application area"),
        ("technology_types", "Technology type"),
        ("availability", "Availability"),
        ("usage_status", "Usage status"),
    ] {
        for tag_name in field(column).split(';') {
            let tag_name = tag_name.trim();
            if tag_name.is_empty() {
                continue;
            }
            tag_ids.push(get_or_create_tag(tags, category_name, tag_name).await?);
        }
    }
    if !tag_ids.is_empty() {
        modules.replace_tags(module.id, &tag_ids, Some(admin_id)).await?;
    }

    Ok(name)
}

async fn unique_slug(modules: &Arc<dyn ModuleRepository>, name: &str) -> Result<String> {
    let base = slugify(name, 240);
    for candidate in slug_candidates(&base) {
        if !modules.slug_exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    unreachable!("slug_candidates is infinite")
}

async fn get_or_create_tag(
    tags: &Arc<dyn TagRepository>,
    category_name: &str,
    tag_name: &str,
) -> Result<i64> {
    let category = tags
        .category_by_name(category_name)
        .await?
        .with_context(|| format!("category '{}' missing", category_name))?;

    let slug = slugify(tag_name, 240);
    if let Some(existing) = tags.get_by_slug_in_category(category.id, &slug).await? {
        return Ok(existing.id);
    }

    let tag = tags
        .create(&Tag::new(category.id, tag_name.to_string(), slug))
        .await?;
    Ok(tag.id)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
