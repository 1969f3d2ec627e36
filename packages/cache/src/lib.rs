#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Read-through cache port for detail, list, statistics and overview
//! views.
//!
//! The cache is advisory. Callers go through [`get_json`] and
//! [`set_json`], which log and swallow adapter failures so a broken cache
//! degrades to a miss instead of failing the request.

pub mod key;
pub mod memory;
pub mod redis_cache;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use key::CacheKey;
pub use memory::MemoryCache;
pub use redis_cache::{RedisCache, RedisConfig};

/// TTL for single-record views.
pub const DETAIL_TTL: Duration = Duration::from_secs(3_600);

/// TTL for statistics, overviews, dashboard lists and the first list page.
pub const SUMMARY_TTL: Duration = Duration::from_secs(300);

/// Errors from a cache adapter.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Redis command or connection error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Key/value store with per-key TTL. Values are serialized JSON.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Stores `value` under `key` for `ttl`.
    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Returns the stored value, or `None` if absent or expired.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Deletes every key given. Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> Result<(), CacheError>;

    /// Whether `key` currently holds a live value.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Connectivity probe.
    async fn ping(&self) -> Result<(), CacheError>;
}

/// Reads and decodes `key`. Any adapter or decode failure is a miss.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn Cache, key: &CacheKey) -> Option<T> {
    let key = key.to_string();
    match cache.get_raw(&key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Discarding undecodable cache entry {key}: {e}");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::warn!("Cache read failed for {key}: {e}");
            None
        }
    }
}

/// Encodes and stores `value`. Failures are logged and swallowed.
pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn Cache,
    key: &CacheKey,
    value: &T,
    ttl: Duration,
) {
    let key = key.to_string();
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Could not encode cache entry {key}: {e}");
            return;
        }
    };

    if let Err(e) = cache.set_raw(&key, raw, ttl).await {
        log::warn!("Cache write failed for {key}: {e}");
    }
}

/// Deletes `keys` by exact name. Failures are logged and swallowed.
pub async fn invalidate(cache: &dyn Cache, keys: &[CacheKey]) {
    let keys = keys.iter().map(ToString::to_string).collect::<Vec<_>>();
    if let Err(e) = cache.delete(&keys).await {
        log::warn!("Cache invalidation failed for {}: {e}", keys.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use works_portal_report_models::Domain;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stats {
        total: i64,
    }

    #[tokio::test]
    async fn json_round_trips_through_the_cache() {
        let cache = MemoryCache::new();
        let key = CacheKey::Stats(Domain::Road);

        set_json(&cache, &key, &Stats { total: 3 }, SUMMARY_TTL).await;

        assert_eq!(get_json::<Stats>(&cache, &key).await, Some(Stats { total: 3 }));
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let cache = MemoryCache::new();
        let key = CacheKey::Stats(Domain::Water);
        cache
            .set_raw(&key.to_string(), "not json".into(), SUMMARY_TTL)
            .await
            .unwrap();

        assert_eq!(get_json::<Stats>(&cache, &key).await, None);
    }

    #[tokio::test]
    async fn invalidate_removes_exact_keys_only() {
        let cache = MemoryCache::new();
        let list = CacheKey::List(Domain::Road);
        let other = CacheKey::List(Domain::Water);
        set_json(&cache, &list, &1, SUMMARY_TTL).await;
        set_json(&cache, &other, &2, SUMMARY_TTL).await;

        invalidate(&cache, &[list.clone()]).await;

        assert!(!cache.exists(&list.to_string()).await.unwrap());
        assert!(cache.exists(&other.to_string()).await.unwrap());
    }
}
