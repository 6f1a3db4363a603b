//! Database migrations
//!
//! Code-based migrations embedded in the binary for single-binary
//! deployment. Each migration is a versioned block of SQL statements;
//! applied versions are tracked in the `schema_migrations` table so
//! `run_migrations` is idempotent.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique, sequential version number
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements, split on `;`
    pub up: &'static str,
}

/// All migrations for the registry schema.
pub const MIGRATIONS: &[Migration] = &[
    // Migration 1: users
    Migration {
        version: 1,
        name: "create_users",
        up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(10) NOT NULL DEFAULT 'user',
                is_blocked INTEGER NOT NULL DEFAULT 0,
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                organization VARCHAR(255) NOT NULL DEFAULT '',
                country VARCHAR(100) NOT NULL DEFAULT '',
                phone VARCHAR(20) NOT NULL DEFAULT '',
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
    },
    // Migration 2: countries reference directory
    Migration {
        version: 2,
        name: "create_countries",
        up: r#"
            CREATE TABLE IF NOT EXISTS countries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                code VARCHAR(3) NOT NULL UNIQUE,
                is_brics_member INTEGER NOT NULL DEFAULT 1,
                flag_emoji VARCHAR(10) NOT NULL DEFAULT ''
            );
        "#,
    },
    // Migration 3: tag taxonomy
    Migration {
        version: 3,
        name: "create_tag_taxonomy",
        up: r#"
            CREATE TABLE IF NOT EXISTS tag_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL UNIQUE,
                slug VARCHAR(255) NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                aliases TEXT NOT NULL DEFAULT '[]',
                min_tags INTEGER NOT NULL DEFAULT 0,
                max_tags INTEGER NOT NULL DEFAULT 10
            );
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_id INTEGER NOT NULL,
                name VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                color VARCHAR(7) NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_by INTEGER,
                approved_by INTEGER,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                FOREIGN KEY (category_id) REFERENCES tag_categories(id) ON DELETE CASCADE,
                FOREIGN KEY (created_by) REFERENCES users(id) ON DELETE SET NULL,
                FOREIGN KEY (approved_by) REFERENCES users(id) ON DELETE SET NULL,
                UNIQUE (category_id, slug)
            );
            CREATE INDEX IF NOT EXISTS idx_tags_category_active ON tags(category_id, is_active);
            CREATE INDEX IF NOT EXISTS idx_tags_slug ON tags(slug);
        "#,
    },
    // Migration 4: modules and details
    Migration {
        version: 4,
        name: "create_modules",
        up: r#"
            CREATE TABLE IF NOT EXISTS modules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                company VARCHAR(255) NOT NULL,
                country VARCHAR(100) NOT NULL,
                params_count BIGINT NOT NULL,
                short_description TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                created_by INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                published_at TIMESTAMP,
                meta_description TEXT NOT NULL DEFAULT '',
                version VARCHAR(50) NOT NULL DEFAULT '',
                license VARCHAR(100) NOT NULL DEFAULT '',
                FOREIGN KEY (created_by) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_modules_status_created ON modules(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_modules_country ON modules(country);
            CREATE INDEX IF NOT EXISTS idx_modules_slug ON modules(slug);
            CREATE TABLE IF NOT EXISTS module_details (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module_id INTEGER NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                technical_info TEXT NOT NULL DEFAULT '',
                architecture TEXT NOT NULL DEFAULT '',
                training_data_description TEXT NOT NULL DEFAULT '',
                metrics TEXT NOT NULL DEFAULT '{}',
                supported_languages TEXT NOT NULL DEFAULT '[]',
                requirements TEXT NOT NULL DEFAULT '',
                installation_guide TEXT NOT NULL DEFAULT '',
                ability VARCHAR(255) NOT NULL DEFAULT '',
                usage_status VARCHAR(255) NOT NULL DEFAULT '',
                FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE
            );
        "#,
    },
    // Migration 5: module tags and likes
    Migration {
        version: 5,
        name: "create_module_tags_and_likes",
        up: r#"
            CREATE TABLE IF NOT EXISTS module_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                assigned_by INTEGER,
                assigned_at TIMESTAMP NOT NULL,
                FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
                FOREIGN KEY (assigned_by) REFERENCES users(id) ON DELETE SET NULL,
                UNIQUE (module_id, tag_id)
            );
            CREATE INDEX IF NOT EXISTS idx_module_tags_module ON module_tags(module_id, tag_id);
            CREATE TABLE IF NOT EXISTS module_likes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                module_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE,
                UNIQUE (user_id, module_id)
            );
            CREATE INDEX IF NOT EXISTS idx_module_likes_module ON module_likes(module_id);
        "#,
    },
    // Migration 6: publications
    Migration {
        version: 6,
        name: "create_publications",
        up: r#"
            CREATE TABLE IF NOT EXISTS publications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module_id INTEGER NOT NULL,
                title VARCHAR(500) NOT NULL,
                authors TEXT NOT NULL DEFAULT '',
                journal_conference VARCHAR(255) NOT NULL DEFAULT '',
                publication_date DATE,
                doi VARCHAR(100) NOT NULL DEFAULT '',
                url TEXT NOT NULL DEFAULT '',
                citation_count INTEGER NOT NULL DEFAULT 0,
                added_by INTEGER,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE,
                FOREIGN KEY (added_by) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_publications_date ON publications(publication_date);
            CREATE INDEX IF NOT EXISTS idx_publications_doi ON publications(doi);
        "#,
    },
    // Migration 7: module files
    Migration {
        version: 7,
        name: "create_module_files",
        up: r#"
            CREATE TABLE IF NOT EXISTS module_files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module_id INTEGER NOT NULL,
                name VARCHAR(255) NOT NULL,
                path TEXT NOT NULL,
                file_type VARCHAR(10) NOT NULL DEFAULT 'other',
                description TEXT NOT NULL DEFAULT '',
                size BIGINT NOT NULL DEFAULT 0,
                uploaded_by INTEGER,
                uploaded_at TIMESTAMP NOT NULL,
                FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE,
                FOREIGN KEY (uploaded_by) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_module_files_module_type ON module_files(module_id, file_type);
        "#,
    },
    // Migration 8: audit log
    Migration {
        version: 8,
        name: "create_audit_log",
        up: r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_kind VARCHAR(20) NOT NULL,
                entity_id INTEGER NOT NULL,
                action VARCHAR(20) NOT NULL,
                performed_by INTEGER,
                timestamp TIMESTAMP NOT NULL,
                comment TEXT NOT NULL DEFAULT '',
                old_values TEXT NOT NULL DEFAULT '{}',
                new_values TEXT NOT NULL DEFAULT '{}',
                ip_address VARCHAR(45),
                FOREIGN KEY (performed_by) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_audit_entity ON audit_log(entity_kind, entity_id);
            CREATE INDEX IF NOT EXISTS idx_audit_performer ON audit_log(performed_by, timestamp);
            CREATE INDEX IF NOT EXISTS idx_audit_action ON audit_log(action, timestamp);
        "#,
    },
    // Migration 9: revoked refresh tokens
    Migration {
        version: 9,
        name: "create_revoked_tokens",
        up: r#"
            CREATE TABLE IF NOT EXISTS revoked_tokens (
                jti VARCHAR(64) PRIMARY KEY,
                expires_at TIMESTAMP NOT NULL,
                revoked_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_revoked_tokens_expires ON revoked_tokens(expires_at);
        "#,
    },
];

/// Apply all pending migrations, returning how many ran.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = applied_versions(pool).await?;
    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied.contains(&migration.version) {
            tracing::info!("Applying migration {}: {}", migration.version, migration.name);
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Check whether all known migrations have been applied
pub async fn is_up_to_date(pool: &SqlitePool) -> Result<bool> {
    create_migrations_table(pool).await?;
    let applied = applied_versions(pool).await?;
    Ok(MIGRATIONS.iter().all(|m| applied.contains(&m.version)))
}

async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create schema_migrations table")?;
    Ok(())
}

async fn applied_versions(pool: &SqlitePool) -> Result<Vec<i32>> {
    let rows = sqlx::query("SELECT version FROM schema_migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows.iter().map(|r| r.get::<i64, _>("version") as i32).collect())
}

async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
        .bind(migration.version as i64)
        .bind(migration.name)
        .execute(pool)
        .await
        .context("Failed to record migration")?;

    Ok(())
}

fn truncate_sql(sql: &str) -> String {
    let trimmed = sql.trim();
    if trimmed.len() > 80 {
        format!("{}...", &trimmed[..80])
    } else {
        trimmed.to_string()
    }
}

fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.unwrap();
        let count = run_migrations(&pool).await.unwrap();
        assert_eq!(count, MIGRATIONS.len());
        assert!(is_up_to_date(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_run_migrations_idempotent() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let second = run_migrations(&pool).await.unwrap();
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn test_migration_versions_unique_and_ordered() {
        let mut last = 0;
        for migration in MIGRATIONS {
            assert!(migration.version > last, "versions must be strictly increasing");
            last = migration.version;
        }
    }

    #[tokio::test]
    async fn test_modules_table_created() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();

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
    }

    #[tokio::test]
    async fn test_like_uniqueness_enforced() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();

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

        sqlx::query("INSERT INTO module_likes (user_id, module_id, created_at) VALUES (1, 1, CURRENT_TIMESTAMP)")
            .execute(&pool)
            .await
            .unwrap();
        let dup = sqlx::query(
            "INSERT INTO module_likes (user_id, module_id, created_at) VALUES (1, 1, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await;
        assert!(dup.is_err(), "duplicate like must violate the unique constraint");
    }
}
