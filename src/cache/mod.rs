//! Cache layer
//!
//! In-process caching for the read-heavy aggregate views (analytics,
//! popular tags, similar-module suggestions). Staleness up to the entry's
//! TTL window is accepted by design.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

/// Cache layer trait.
///
/// Generic methods keep call sites typed; implementations store values as
/// serialized JSON.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with a per-entry TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration)
        -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values whose key matches a glob-style pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

pub use memory::MemoryCache;

/// Create the cache instance from configuration.
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    Arc::new(MemoryCache::with_capacity_and_ttl(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}

/// Cache TTL for system overview and module statistics
pub const TTL_STATS: Duration = Duration::from_secs(15 * 60);
/// Cache TTL for tag popularity and tag analytics
pub const TTL_TAGS: Duration = Duration::from_secs(30 * 60);
/// Cache TTL for similar-module suggestions
pub const TTL_SIMILAR: Duration = Duration::from_secs(60 * 60);
