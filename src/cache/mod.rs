//! Cache layer
//!
//! In-process caching for hot read paths (article listings, admin stats).
//! Backed by moka; the `Cache` enum is the runtime-polymorphic handle the
//! services hold, since `CacheLayer` has generic methods and cannot be a
//! trait object.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

/// Cache layer trait
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob-style pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;
}

pub use memory::MemoryCache;

/// Unified cache handle.
///
/// Single-variant today; the enum keeps the dispatch seam so a distributed
/// backend can slot in without touching the services.
#[derive(Debug)]
pub enum Cache {
    /// In-memory cache using moka
    Memory(MemoryCache),
}

#[async_trait]
impl CacheLayer for Cache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self {
            Cache::Memory(cache) => cache.get(key).await,
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.delete(key).await,
        }
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.delete_pattern(pattern).await,
        }
    }
}

/// Create a cache instance from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<Cache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    let cache = MemoryCache::with_capacity_and_ttl(config.capacity, ttl);
    Arc::new(Cache::Memory(cache))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_cache() {
        let config = CacheConfig::default();
        let cache = create_cache(&config);

        cache
            .set("test_key", &"test_value".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<String> = cache.get("test_key").await.unwrap();
        assert_eq!(result, Some("test_value".to_string()));
    }

    #[tokio::test]
    async fn test_create_cache_honors_config() {
        let config = CacheConfig {
            ttl_seconds: 1800,
            capacity: 100,
        };
        let cache = create_cache(&config);

        cache
            .set("key", &"value".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(result, Some("value".to_string()));
    }
}
