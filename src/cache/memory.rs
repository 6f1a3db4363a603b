//! In-memory cache implementation using moka
//!
//! Thread-safe cache with per-entry TTL and glob-style pattern deletion.
//! Values are stored as JSON strings so any serializable type fits.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Default TTL cap for cache entries (1 hour)
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache entry wrapper storing serialized JSON plus its own expiry.
///
/// moka's global time_to_live acts as the hard upper bound; the per-entry
/// deadline handles the shorter windows.
#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T, ttl: Duration) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
            expires_at: Instant::now() + ttl,
        })
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// In-memory cache using moka
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    default_ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryCache {
    /// Create a new memory cache with default settings
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a new memory cache with custom capacity and TTL cap
    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(default_ttl)
            .build();

        Self { cache, default_ttl }
    }

    /// Current number of entries
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Glob-style key matching: `*` matches any run, `?` one character
    fn pattern_matches(pattern: &str, key: &str) -> bool {
        let pattern_chars: Vec<char> = pattern.chars().collect();
        let key_chars: Vec<char> = key.chars().collect();
        Self::glob_match(&pattern_chars, &key_chars, 0, 0)
    }

    fn glob_match(pattern: &[char], key: &[char], pi: usize, ki: usize) -> bool {
        if pi == pattern.len() {
            return ki == key.len();
        }

        match pattern[pi] {
            '*' => {
                if Self::glob_match(pattern, key, pi + 1, ki) {
                    return true;
                }
                ki < key.len() && Self::glob_match(pattern, key, pi, ki + 1)
            }
            '?' => ki < key.len() && Self::glob_match(pattern, key, pi + 1, ki + 1),
            p => ki < key.len() && key[ki] == p && Self::glob_match(pattern, key, pi + 1, ki + 1),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) if entry.is_expired() => {
                self.cache.invalidate(key).await;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.deserialize()?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let ttl = ttl.min(self.default_ttl);
        let entry = CacheEntry::new(value, ttl)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(k, _)| Self::pattern_matches(pattern, k))
            .map(|(k, _)| k.as_ref().clone())
            .collect();

        for key in keys {
            self.cache.invalidate(&key).await;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryCache::new();
        cache.set("a", &42i64, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get::<i64>("a").await.unwrap(), Some(42));

        cache.delete("a").await.unwrap();
        assert_eq!(cache.get::<i64>("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_per_entry_expiry() {
        let cache = MemoryCache::new();
        cache
            .set("short", &"x".to_string(), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get::<String>("short").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = MemoryCache::new();
        cache.set("modules:similar:1", &1i64, Duration::from_secs(60)).await.unwrap();
        cache.set("modules:similar:2", &2i64, Duration::from_secs(60)).await.unwrap();
        cache.set("tags:popular", &3i64, Duration::from_secs(60)).await.unwrap();

        cache.delete_pattern("modules:similar:*").await.unwrap();
        assert_eq!(cache.get::<i64>("modules:similar:1").await.unwrap(), None);
        assert_eq!(cache.get::<i64>("modules:similar:2").await.unwrap(), None);
        assert_eq!(cache.get::<i64>("tags:popular").await.unwrap(), Some(3));
    }

    #[test]
    fn test_glob_matching() {
        assert!(MemoryCache::pattern_matches("a:*", "a:1"));
        assert!(MemoryCache::pattern_matches("a:*", "a:"));
        assert!(MemoryCache::pattern_matches("a:?", "a:1"));
        assert!(!MemoryCache::pattern_matches("a:?", "a:12"));
        assert!(!MemoryCache::pattern_matches("b:*", "a:1"));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCache::new();
        cache.set("a", &1i64, Duration::from_secs(60)).await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.get::<i64>("a").await.unwrap(), None);
    }
}
