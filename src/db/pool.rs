//! Database connection pool
//!
//! The registry targets single-binary deployment on SQLite. This module
//! provides the pool factory, directory bootstrap for file-based databases
//! and an in-memory pool for tests.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;

/// Create a SQLite connection pool from configuration.
///
/// For file-based databases the parent directory is created if missing and
/// the connection URL gets `mode=rwc` so the database file is created on
/// first start. Foreign keys are enabled for every connection pulled from
/// the pool's initial connection.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let url = &config.url;

    // Ensure the database directory exists for file-based SQLite
    if !url.starts_with(":memory:") && !url.starts_with("sqlite::memory:") {
        let path = url.strip_prefix("sqlite:").unwrap_or(url);
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }
    }

    let connection_url = if url.starts_with("sqlite:") {
        if url.contains('?') {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        }
    } else if url == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{}?mode=rwc", url)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .connect(&connection_url)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .context("Failed to enable foreign keys")?;

    Ok(pool)
}

/// Check if the database connection is healthy
pub async fn ping(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Database ping failed")?;
    Ok(())
}

/// Create an in-memory pool for tests.
///
/// A single connection is used so the in-memory database is shared across
/// all queries issued through the pool.
pub async fn create_test_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .context("Failed to create in-memory pool")?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .context("Failed to enable foreign keys")?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_pool_ping() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        ping(&pool).await.expect("Ping should succeed");
    }

    #[tokio::test]
    async fn test_memory_pool_execute() {
        let pool = create_test_pool().await.expect("Failed to create pool");

        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .execute(&pool)
            .await
            .expect("Failed to create table");

        let result = sqlx::query("INSERT INTO t (name) VALUES ('x')")
            .execute(&pool)
            .await
            .expect("Failed to insert");
        assert_eq!(result.rows_affected(), 1);
    }

    #[tokio::test]
    async fn test_file_pool_creates_directories() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("registry.db");

        let config = DatabaseConfig {
            url: db_path.to_string_lossy().to_string(),
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        ping(&pool).await.expect("Ping should succeed");
        assert!(db_path.exists());
    }
}
