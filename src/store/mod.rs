//! Storage abstraction for the product catalog.
//!
//! The [`ProductStore`] trait defines all storage operations needed by the
//! relevance engine and the ingestion coordinator, enabling pluggable
//! backends (SQLite, in-memory test doubles).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Product, SearchField};

/// A sort key usable in ordered retrieval, composable into a multi-key
/// ordering (e.g. rating descending, then price ascending).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Price,
    Rating,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

pub type SortSpec = (SortColumn, SortDir);

/// The fixed ordering used by the browse and top-rated paths.
pub const RATING_THEN_PRICE: [SortSpec; 2] = [
    (SortColumn::Rating, SortDir::Desc),
    (SortColumn::Price, SortDir::Asc),
];

/// Outcome of one unordered batch write.
///
/// Duplicate-key rejections are a per-record condition, not a batch
/// failure; any other failure aborts the batch and surfaces as `Err`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchWrite {
    pub inserted: u64,
    pub duplicates: u64,
}

/// Abstract storage backend for the product catalog.
///
/// All operations are async (via `async-trait`). In-memory implementations
/// return immediately-ready futures.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_containing`](ProductStore::find_containing) | Case-insensitive substring match on one field |
/// | [`find_exact`](ProductStore::find_exact) | Exact-match lookup with ordering and pagination |
/// | [`count_exact`](ProductStore::count_exact) | Count of exact matches |
/// | [`distinct_with_prefix`](ProductStore::distinct_with_prefix) | Distinct field values starting with a prefix |
/// | [`find_rating_at_least`](ProductStore::find_rating_at_least) | Rating-threshold retrieval |
/// | [`count_all`](ProductStore::count_all) | Total catalog size |
/// | [`insert_batch`](ProductStore::insert_batch) | Unordered bulk insert with duplicate classification |
/// | [`delete_all`](ProductStore::delete_all) | Bulk clear |
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products whose `field` value contains `needle` anywhere,
    /// case-insensitively. `needle` is already lowercased by the caller and
    /// must be treated as a literal, never as a pattern.
    async fn find_containing(&self, field: SearchField, needle: &str) -> Result<Vec<Product>>;

    /// Products whose `field` value equals `value` exactly, ordered by
    /// `sort` keys in sequence, sliced to `[offset, offset + limit)`.
    async fn find_exact(
        &self,
        field: SearchField,
        value: &str,
        sort: &[SortSpec],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Product>>;

    /// Count of products whose `field` value equals `value` exactly.
    async fn count_exact(&self, field: SearchField, value: &str) -> Result<i64>;

    /// Distinct values of `field` starting with `prefix` (case-insensitive,
    /// anchored at the start), in ascending value order. `prefix` is
    /// lowercased by the caller and treated as a literal.
    async fn distinct_with_prefix(&self, field: SearchField, prefix: &str) -> Result<Vec<String>>;

    /// Products with `rating >= min_rating`, ordered by `sort`, truncated
    /// to `limit`.
    async fn find_rating_at_least(
        &self,
        min_rating: f64,
        sort: &[SortSpec],
        limit: i64,
    ) -> Result<Vec<Product>>;

    /// Total number of products in the catalog.
    async fn count_all(&self) -> Result<i64>;

    /// Insert every record in `batch`, unordered: a duplicate-key rejection
    /// of one record must not prevent the rest of the batch from landing.
    /// Returns `Err` only for non-duplicate failures, which fail the batch
    /// as a whole.
    async fn insert_batch(&self, batch: &[Product]) -> Result<BatchWrite>;

    /// Delete every product, returning the number removed.
    async fn delete_all(&self) -> Result<u64>;
}
