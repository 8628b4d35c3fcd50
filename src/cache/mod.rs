//! Cache-aside layer fronting search results and autocomplete suggestions.
//!
//! The [`CacheMedium`] trait is the thin contract required of the backing
//! key-value store: string get, set-with-expiry, and delete-by-prefix.
//! [`SearchCache`] owns everything above that contract: key derivation,
//! JSON serialization, the uniform TTL, and the degrade-to-miss policy.
//!
//! # Degrade-to-miss
//!
//! A failing or slow cache must never fail a search. Every medium error,
//! decode error, or per-operation timeout is logged at warn level and
//! converted to a miss (reads) or a no-op (writes and invalidation). This
//! is a deliberate, tested code path, not a side effect of broad error
//! handling.

pub mod memory;
pub mod redis;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::models::{SearchResult, SortMode};

/// Key prefix for cached search result pages.
pub const SEARCH_PREFIX: &str = "search:";
/// Key prefix for cached autocomplete suggestion lists.
pub const SUGGEST_PREFIX: &str = "autocomplete:";

/// Minimal contract required of a cache backend.
///
/// Keys are opaque strings to the medium; expiry is set at write time and
/// an expired entry must behave as absent.
#[async_trait]
pub trait CacheMedium: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
    /// Remove every entry whose key starts with `prefix`, returning the
    /// number removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64>;
}

/// Construct the configured cache medium.
pub async fn build_medium(config: &CacheConfig) -> Result<Arc<dyn CacheMedium>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(memory::MemoryMedium::new())),
        "redis" => Ok(Arc::new(redis::RedisMedium::connect(&config.url).await?)),
        other => anyhow::bail!("Unknown cache backend: '{}'. Must be memory or redis.", other),
    }
}

/// The cache-aside layer.
///
/// Cheap to clone; the medium is shared behind an `Arc`.
#[derive(Clone)]
pub struct SearchCache {
    medium: Arc<dyn CacheMedium>,
    ttl: Duration,
    op_timeout: Duration,
}

impl SearchCache {
    pub fn new(medium: Arc<dyn CacheMedium>, ttl: Duration, op_timeout: Duration) -> Self {
        Self {
            medium,
            ttl,
            op_timeout,
        }
    }

    /// Key for one search result page. Lowercased so textually-equal
    /// queries of different case collide onto the same entry.
    pub fn search_key(query: &str, page: i64, page_size: i64, sort: SortMode) -> String {
        format!(
            "{SEARCH_PREFIX}{}:{}:{}:{}",
            query.to_lowercase(),
            page,
            page_size,
            sort.as_str()
        )
    }

    /// Key for one autocomplete prefix.
    pub fn suggest_key(prefix: &str) -> String {
        format!("{SUGGEST_PREFIX}{}", prefix.to_lowercase())
    }

    pub async fn get_search(&self, key: &str) -> Option<SearchResult> {
        let raw = self.get_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(result) => {
                debug!(key, "search cache hit");
                Some(result)
            }
            Err(e) => {
                warn!(key, error = %e, "cached search entry undecodable; treating as miss");
                None
            }
        }
    }

    pub async fn set_search(&self, key: &str, result: &SearchResult) {
        match serde_json::to_string(result) {
            Ok(raw) => self.set_raw(key, &raw).await,
            Err(e) => warn!(key, error = %e, "failed to serialize search result for cache"),
        }
    }

    pub async fn get_suggestions(&self, key: &str) -> Option<Vec<String>> {
        let raw = self.get_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(list) => {
                debug!(key, "suggestion cache hit");
                Some(list)
            }
            Err(e) => {
                warn!(key, error = %e, "cached suggestion entry undecodable; treating as miss");
                None
            }
        }
    }

    pub async fn set_suggestions(&self, key: &str, suggestions: &[String]) {
        match serde_json::to_string(suggestions) {
            Ok(raw) => self.set_raw(key, &raw).await,
            Err(e) => warn!(key, error = %e, "failed to serialize suggestions for cache"),
        }
    }

    /// Drop every entry under `prefix`. Failures are logged and swallowed;
    /// a missed invalidation only extends staleness until TTL expiry.
    pub async fn invalidate(&self, prefix: &str) {
        match tokio::time::timeout(self.op_timeout, self.medium.delete_prefix(prefix)).await {
            Ok(Ok(dropped)) => debug!(prefix, dropped, "cache invalidated"),
            Ok(Err(e)) => warn!(prefix, error = %e, "cache invalidation failed"),
            Err(_) => warn!(prefix, "cache invalidation timed out"),
        }
    }

    /// Drop both the search-keyed and suggestion-keyed entries. Called
    /// after any catalog mutation.
    pub async fn invalidate_all(&self) {
        self.invalidate(SEARCH_PREFIX).await;
        self.invalidate(SUGGEST_PREFIX).await;
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        match tokio::time::timeout(self.op_timeout, self.medium.get(key)).await {
            Ok(Ok(value)) => {
                if value.is_none() {
                    debug!(key, "cache miss");
                }
                value
            }
            Ok(Err(e)) => {
                warn!(key, error = %e, "cache read failed; treating as miss");
                None
            }
            Err(_) => {
                warn!(key, "cache read timed out; treating as miss");
                None
            }
        }
    }

    async fn set_raw(&self, key: &str, value: &str) {
        match tokio::time::timeout(self.op_timeout, self.medium.set_with_ttl(key, value, self.ttl))
            .await
        {
            Ok(Ok(())) => debug!(key, "cache set"),
            Ok(Err(e)) => warn!(key, error = %e, "cache write failed; entry dropped"),
            Err(_) => warn!(key, "cache write timed out; entry dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortMode;

    /// A medium that fails every operation, for exercising degrade-to-miss.
    struct FailingMedium;

    #[async_trait]
    impl CacheMedium for FailingMedium {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            anyhow::bail!("cache down")
        }
        async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
            anyhow::bail!("cache down")
        }
        async fn delete_prefix(&self, _prefix: &str) -> Result<u64> {
            anyhow::bail!("cache down")
        }
    }

    fn failing_cache() -> SearchCache {
        SearchCache::new(
            Arc::new(FailingMedium),
            Duration::from_secs(60),
            Duration::from_millis(50),
        )
    }

    #[test]
    fn search_key_normalizes_case() {
        let a = SearchCache::search_key("Wireless Mouse", 1, 20, SortMode::Relevance);
        let b = SearchCache::search_key("wireless mouse", 1, 20, SortMode::Relevance);
        assert_eq!(a, b);
        assert!(a.starts_with(SEARCH_PREFIX));
    }

    #[test]
    fn search_key_distinguishes_parameters() {
        let base = SearchCache::search_key("mouse", 1, 20, SortMode::Relevance);
        assert_ne!(base, SearchCache::search_key("mouse", 2, 20, SortMode::Relevance));
        assert_ne!(base, SearchCache::search_key("mouse", 1, 10, SortMode::Relevance));
        assert_ne!(base, SearchCache::search_key("mouse", 1, 20, SortMode::PriceAsc));
    }

    #[test]
    fn suggest_key_normalizes_case() {
        assert_eq!(
            SearchCache::suggest_key("PoL"),
            SearchCache::suggest_key("pol")
        );
    }

    #[tokio::test]
    async fn failing_medium_degrades_to_miss() {
        let cache = failing_cache();
        let key = SearchCache::search_key("mouse", 1, 20, SortMode::Relevance);
        assert!(cache.get_search(&key).await.is_none());

        // Writes and invalidation swallow the failure too.
        let result = SearchResult {
            products: Vec::new(),
            total: 0,
            page: 1,
            page_size: 20,
            total_pages: 0,
        };
        cache.set_search(&key, &result).await;
        cache.invalidate_all().await;
    }

    #[tokio::test]
    async fn undecodable_entry_degrades_to_miss() {
        let medium = Arc::new(memory::MemoryMedium::new());
        medium
            .set_with_ttl("search:bad", "not json", Duration::from_secs(60))
            .await
            .unwrap();
        let cache = SearchCache::new(medium, Duration::from_secs(60), Duration::from_millis(50));
        assert!(cache.get_search("search:bad").await.is_none());
    }
}
