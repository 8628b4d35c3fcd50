//! Relevance-ranked search over the product catalog.
//!
//! The engine operates entirely through the [`ProductStore`] trait and the
//! cache-aside layer, with no database or configuration dependencies of its
//! own. Dependencies are injected at construction time.
//!
//! # Ranking Algorithm
//!
//! 1. Probe the cache under the normalized (query, page, page_size, sort)
//!    key; a hit is returned unchanged.
//! 2. On miss, fetch substring matches once per field in fixed weight order:
//!    title=5, category=4, brand=3, sku=2, product_type=1.
//! 3. Deduplicate by product id; a product keeps the weight of the
//!    highest-weighted field it matched (max, not sum), and that field is
//!    its `matched` attribution.
//! 4. Sort by score (desc), then rating (desc); the sort is stable, so
//!    further ties keep store-iteration order, which callers must treat as
//!    unspecified.
//! 5. A non-relevance sort mode re-sorts the whole list by the requested
//!    key, discarding relevance order entirely.
//! 6. Slice the requested page window, clamping past-the-end windows to
//!    empty, and write the page back through the cache.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;

use crate::cache::SearchCache;
use crate::error::EngineError;
use crate::models::{
    total_pages, Product, RelevanceScore, SearchField, SearchResult, SortMode,
};
use crate::store::{ProductStore, RATING_THEN_PRICE};

/// Products at or above this rating qualify as top-rated.
const TOP_RATED_MIN: f64 = 4.5;

/// Per-field caps applied to suggestion sources before deduplication,
/// in priority order. The fixed 5/3/2 split keeps suggestions diverse
/// across field types instead of letting titles crowd out everything.
const SUGGEST_SOURCES: [(SearchField, usize); 3] = [
    (SearchField::Title, 5),
    (SearchField::Category, 3),
    (SearchField::Brand, 2),
];

/// The relevance search engine.
///
/// Stateless between calls; every invocation is an independent sequence of
/// store and cache round-trips. Cheap to clone.
#[derive(Clone)]
pub struct SearchEngine {
    store: Arc<dyn ProductStore>,
    cache: SearchCache,
    store_timeout: Duration,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn ProductStore>, cache: SearchCache, store_timeout: Duration) -> Self {
        Self {
            store,
            cache,
            store_timeout,
        }
    }

    /// Run a relevance-ranked, paginated search.
    ///
    /// The caller guarantees a non-empty query and in-range `page` /
    /// `page_size`; the boundary layer rejects anything else before the
    /// engine runs. An empty result page (total=0) is a valid, cacheable
    /// outcome, not an error.
    pub async fn search(
        &self,
        query: &str,
        page: i64,
        page_size: i64,
        sort: SortMode,
    ) -> Result<SearchResult, EngineError> {
        let needle = query.trim().to_lowercase();
        let key = SearchCache::search_key(&needle, page, page_size, sort);

        if let Some(hit) = self.cache.get_search(&key).await {
            return Ok(hit);
        }

        let mut ranked = self.ranked_matches(&needle).await?;
        let total = ranked.len() as i64;

        apply_sort(&mut ranked, sort);

        let products = page_window(&ranked, page, page_size)
            .iter()
            .map(|r| r.product.clone())
            .collect();

        let result = SearchResult {
            products,
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        };

        self.cache.set_search(&key, &result).await;
        Ok(result)
    }

    /// Autocomplete: distinct title/category/brand values starting with
    /// `prefix`, merged 5/3/2, deduplicated, truncated to `limit`.
    pub async fn suggest(&self, prefix: &str, limit: usize) -> Result<Vec<String>, EngineError> {
        let prefix = prefix.trim().to_lowercase();
        let key = SearchCache::suggest_key(&prefix);

        if let Some(hit) = self.cache.get_suggestions(&key).await {
            return Ok(hit);
        }

        let mut sources = Vec::with_capacity(SUGGEST_SOURCES.len());
        for (field, cap) in SUGGEST_SOURCES {
            let values = self
                .store_call(self.store.distinct_with_prefix(field, &prefix))
                .await?;
            sources.push((values, cap));
        }

        let suggestions = merge_suggestions(sources, limit);
        self.cache.set_suggestions(&key, &suggestions).await;
        Ok(suggestions)
    }

    /// Browse one category: exact match, rating desc then price asc.
    /// Uncached; this is a direct store read, not a relevance computation.
    pub async fn products_by_category(
        &self,
        category: &str,
        page: i64,
        page_size: i64,
    ) -> Result<SearchResult, EngineError> {
        self.browse(SearchField::Category, category, page, page_size)
            .await
    }

    /// Browse one brand: exact match, rating desc then price asc. Uncached.
    pub async fn products_by_brand(
        &self,
        brand: &str,
        page: i64,
        page_size: i64,
    ) -> Result<SearchResult, EngineError> {
        self.browse(SearchField::Brand, brand, page, page_size).await
    }

    /// Products rated 4.5 or higher, best first, truncated to `limit`.
    pub async fn top_rated(&self, limit: i64) -> Result<Vec<Product>, EngineError> {
        self.store_call(
            self.store
                .find_rating_at_least(TOP_RATED_MIN, &RATING_THEN_PRICE, limit),
        )
        .await
    }

    async fn ranked_matches(&self, needle: &str) -> Result<Vec<RelevanceScore>, EngineError> {
        let mut per_field = Vec::with_capacity(SearchField::RANKED.len());
        for field in SearchField::RANKED {
            let matches = self
                .store_call(self.store.find_containing(field, needle))
                .await?;
            per_field.push((field, matches));
        }
        Ok(rank(per_field))
    }

    async fn browse(
        &self,
        field: SearchField,
        value: &str,
        page: i64,
        page_size: i64,
    ) -> Result<SearchResult, EngineError> {
        let offset = (page - 1) * page_size;
        let products = self
            .store_call(
                self.store
                    .find_exact(field, value, &RATING_THEN_PRICE, offset, page_size),
            )
            .await?;
        let total = self
            .store_call(self.store.count_exact(field, value))
            .await?;

        Ok(SearchResult {
            products,
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        })
    }

    /// Bound one store round-trip by the configured timeout. An elapsed
    /// timeout surfaces as [`EngineError::StoreUnavailable`], never as a
    /// partial result.
    async fn store_call<T>(
        &self,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, EngineError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(EngineError::StoreUnavailable(e)),
            Err(_) => Err(EngineError::StoreUnavailable(anyhow!(
                "store call timed out after {:?}",
                self.store_timeout
            ))),
        }
    }
}

/// Deduplicate per-field match sets and rank the survivors.
///
/// `per_field` must be in descending weight order; the first field that
/// matched a product wins both the score and the `matched` attribution.
pub fn rank(per_field: Vec<(SearchField, Vec<Product>)>) -> Vec<RelevanceScore> {
    let mut seen = HashSet::new();
    let mut ranked = Vec::new();

    for (field, products) in per_field {
        for product in products {
            if seen.insert(product.id) {
                ranked.push(RelevanceScore {
                    score: field.weight(),
                    matched: field,
                    product,
                });
            }
        }
    }

    // Stable sort: equal (score, rating) pairs keep store-iteration order.
    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.product.rating.total_cmp(&a.product.rating))
    });

    ranked
}

/// Re-sort a ranked list by the requested key. Any mode other than
/// `Relevance` is a total order over the requested key; relevance order is
/// discarded, not refined.
pub fn apply_sort(ranked: &mut [RelevanceScore], sort: SortMode) {
    match sort {
        SortMode::Relevance => {}
        SortMode::PriceAsc => {
            ranked.sort_by(|a, b| a.product.price.total_cmp(&b.product.price));
        }
        SortMode::PriceDesc => {
            ranked.sort_by(|a, b| b.product.price.total_cmp(&a.product.price));
        }
        SortMode::Rating => {
            ranked.sort_by(|a, b| b.product.rating.total_cmp(&a.product.rating));
        }
        SortMode::Newest => {
            ranked.sort_by(|a, b| b.product.created_at.cmp(&a.product.created_at));
        }
    }
}

/// Slice the page window `[(page-1)*page_size, page*page_size)`, clamped
/// to empty when the window starts past the end of the list.
pub fn page_window(ranked: &[RelevanceScore], page: i64, page_size: i64) -> &[RelevanceScore] {
    let start = ((page - 1) * page_size).max(0) as usize;
    if start >= ranked.len() {
        return &[];
    }
    let end = (start + page_size.max(0) as usize).min(ranked.len());
    &ranked[start..end]
}

/// Merge capped suggestion sources in priority order, deduplicating while
/// preserving first occurrence, truncated to `limit`.
///
/// Caps are applied before deduplication so the priority order stays
/// deterministic.
pub fn merge_suggestions(sources: Vec<(Vec<String>, usize)>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for (values, cap) in sources {
        for value in values.into_iter().take(cap) {
            if merged.len() == limit {
                return merged;
            }
            if seen.insert(value.clone()) {
                merged.push(value);
            }
        }
    }

    merged
}
