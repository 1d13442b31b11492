//! In-memory cache implementation using moka
//!
//! Fast, thread-safe in-process cache with TTL expiration and glob-style
//! pattern matching for bulk invalidation.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Default TTL for cache entries (5 minutes)
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache entry storing the value as serialized JSON, so any serializable
/// type can share one cache instance.
#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// In-memory cache using moka's async cache with a cache-wide TTL.
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
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a memory cache with custom capacity and TTL
    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(default_ttl)
            .support_invalidation_closures()
            .build();

        Self { cache, default_ttl }
    }

    /// Glob-style key matching: `*` matches any run of characters, `?`
    /// matches exactly one.
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
                // Match zero characters, then one-or-more
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
            Some(entry) => {
                let value = entry.deserialize()?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let entry = CacheEntry::new(value)?;

        // moka's time_to_live is cache-wide; the per-call ttl is advisory
        // and capped by the configured TTL.
        let _ = ttl;
        self.cache.insert(key.to_string(), entry).await;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    /// Delete all values whose key matches a glob-style pattern.
    /// Walks every entry, so patterns are for invalidation, not lookups.
    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let keys_to_delete: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| Self::pattern_matches(pattern, key.as_ref()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in keys_to_delete {
            self.cache.invalidate(&key).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();

        cache
            .set("key1", &"value1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new();

        let result: Option<String> = cache.get("nonexistent").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();

        cache
            .set("key1", &"value1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.delete("key1").await.unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete_pattern_star() {
        let cache = MemoryCache::new();

        cache
            .set("articles:1", &"a1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("articles:2", &"a2".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("stats:admin", &"s".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        cache.delete_pattern("articles:*").await.unwrap();

        let a1: Option<String> = cache.get("articles:1").await.unwrap();
        let a2: Option<String> = cache.get("articles:2").await.unwrap();
        let stats: Option<String> = cache.get("stats:admin").await.unwrap();

        assert_eq!(a1, None);
        assert_eq!(a2, None);
        assert_eq!(stats, Some("s".to_string()));
    }

    #[tokio::test]
    async fn test_delete_pattern_question_mark() {
        let cache = MemoryCache::new();

        cache
            .set("user:1:profile", &"p1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("user:10:profile", &"p10".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        cache.delete_pattern("user:?:profile").await.unwrap();

        let p1: Option<String> = cache.get("user:1:profile").await.unwrap();
        let p10: Option<String> = cache.get("user:10:profile").await.unwrap();

        assert_eq!(p1, None);
        // "10" is two characters, so "?" does not match it
        assert_eq!(p10, Some("p10".to_string()));
    }

    #[tokio::test]
    async fn test_complex_types() {
        let cache = MemoryCache::new();

        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Snapshot {
            id: i64,
            title: String,
        }

        let snapshot = Snapshot {
            id: 1,
            title: "Finals week survival guide".to_string(),
        };

        cache
            .set("article:1", &snapshot, Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<Snapshot> = cache.get("article:1").await.unwrap();
        assert_eq!(result, Some(snapshot));
    }

    #[test]
    fn test_pattern_matches() {
        assert!(MemoryCache::pattern_matches("articles:*", "articles:123"));
        assert!(MemoryCache::pattern_matches("articles:*", "articles:"));
        assert!(MemoryCache::pattern_matches("*:123", "articles:123"));
        assert!(MemoryCache::pattern_matches("*", "anything"));
        assert!(!MemoryCache::pattern_matches("articles:*", "users:123"));

        assert!(MemoryCache::pattern_matches("user:?:profile", "user:1:profile"));
        assert!(!MemoryCache::pattern_matches("user:?:profile", "user:10:profile"));

        assert!(MemoryCache::pattern_matches("user:*:?", "user:123:a"));

        assert!(MemoryCache::pattern_matches("exact", "exact"));
        assert!(!MemoryCache::pattern_matches("exact", "exactx"));
        assert!(!MemoryCache::pattern_matches("exactx", "exact"));
    }

    #[tokio::test]
    async fn test_overwrite_existing_key() {
        let cache = MemoryCache::new();

        cache
            .set("key1", &"value1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("key1", &"value2".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value2".to_string()));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(20))]

            /// Any entry expires once the configured TTL has passed.
            #[test]
            fn property_cache_ttl_expiration(
                key in "[a-z]{1,10}",
                value in "[a-z]{1,100}"
            ) {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let ttl = Duration::from_millis(10);
                    let cache = MemoryCache::with_capacity_and_ttl(1000, ttl);

                    cache.set(&key, &value, ttl).await.unwrap();

                    let result: Option<String> = cache.get(&key).await.unwrap();
                    prop_assert_eq!(result, Some(value.clone()));

                    tokio::time::sleep(Duration::from_millis(50)).await;
                    cache.cache.run_pending_tasks().await;

                    let result_after_ttl: Option<String> = cache.get(&key).await.unwrap();
                    prop_assert_eq!(result_after_ttl, None);

                    Ok(())
                })?;
            }

            /// A cache miss filled from the source is served from cache on the
            /// next read without touching the source again.
            #[test]
            fn property_cache_miss_then_hit(
                key in "[a-z]{1,10}",
                value in "[a-z]{1,100}"
            ) {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let cache = MemoryCache::new();
                    let ttl = Duration::from_secs(60);

                    let miss: Option<String> = cache.get(&key).await.unwrap();
                    prop_assert_eq!(miss, None);

                    cache.set(&key, &value, ttl).await.unwrap();

                    let hit: Option<String> = cache.get(&key).await.unwrap();
                    prop_assert_eq!(hit, Some(value.clone()));

                    Ok(())
                })?;
            }
        }
    }
}
