//! In-memory [`ProductStore`] implementation for tests and ephemeral runs.
//!
//! Uses a `Vec` behind `std::sync::RwLock` for thread safety. Matching is
//! plain `to_lowercase`/`contains`, which is the reference semantics the
//! SQLite backend's escaped LIKE queries must agree with.

use std::collections::BTreeSet;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Product, SearchField};

use super::{BatchWrite, ProductStore, SortColumn, SortDir, SortSpec};

/// In-memory store for tests and ephemeral environments.
pub struct MemoryStore {
    products: RwLock<Vec<Product>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_by(a: &Product, b: &Product, sort: &[SortSpec]) -> std::cmp::Ordering {
    for (column, dir) in sort {
        let ord = match column {
            SortColumn::Price => a.price.total_cmp(&b.price),
            SortColumn::Rating => a.rating.total_cmp(&b.rating),
            SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let ord = match dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        };
        if ord != std::cmp::Ordering::Equal {
            return ord;
        }
    }
    std::cmp::Ordering::Equal
}

fn page(mut items: Vec<Product>, offset: i64, limit: i64) -> Vec<Product> {
    let offset = offset.max(0) as usize;
    let limit = limit.max(0) as usize;
    if offset >= items.len() {
        return Vec::new();
    }
    items.drain(..offset);
    items.truncate(limit);
    items
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find_containing(&self, field: SearchField, needle: &str) -> Result<Vec<Product>> {
        let products = self.products.read().unwrap();
        Ok(products
            .iter()
            .filter(|p| field.value_of(p).to_lowercase().contains(needle))
            .cloned()
            .collect())
    }

    async fn find_exact(
        &self,
        field: SearchField,
        value: &str,
        sort: &[SortSpec],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Product>> {
        let products = self.products.read().unwrap();
        let mut matches: Vec<Product> = products
            .iter()
            .filter(|p| field.value_of(p) == value)
            .cloned()
            .collect();
        matches.sort_by(|a, b| compare_by(a, b, sort));
        Ok(page(matches, offset, limit))
    }

    async fn count_exact(&self, field: SearchField, value: &str) -> Result<i64> {
        let products = self.products.read().unwrap();
        Ok(products.iter().filter(|p| field.value_of(p) == value).count() as i64)
    }

    async fn distinct_with_prefix(
        &self,
        field: SearchField,
        prefix: &str,
    ) -> Result<Vec<String>> {
        let products = self.products.read().unwrap();
        let distinct: BTreeSet<String> = products
            .iter()
            .map(|p| field.value_of(p).to_string())
            .filter(|v| v.to_lowercase().starts_with(prefix))
            .collect();
        Ok(distinct.into_iter().collect())
    }

    async fn find_rating_at_least(
        &self,
        min_rating: f64,
        sort: &[SortSpec],
        limit: i64,
    ) -> Result<Vec<Product>> {
        let products = self.products.read().unwrap();
        let mut matches: Vec<Product> = products
            .iter()
            .filter(|p| p.rating >= min_rating)
            .cloned()
            .collect();
        matches.sort_by(|a, b| compare_by(a, b, sort));
        matches.truncate(limit.max(0) as usize);
        Ok(matches)
    }

    async fn count_all(&self) -> Result<i64> {
        Ok(self.products.read().unwrap().len() as i64)
    }

    async fn insert_batch(&self, batch: &[Product]) -> Result<BatchWrite> {
        let mut products = self.products.write().unwrap();
        let mut write = BatchWrite::default();
        for record in batch {
            let collides = products
                .iter()
                .any(|p| p.id == record.id || p.sku == record.sku);
            if collides {
                write.duplicates += 1;
            } else {
                products.push(record.clone());
                write.inserted += 1;
            }
        }
        Ok(write)
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut products = self.products.write().unwrap();
        let deleted = products.len() as u64;
        products.clear();
        Ok(deleted)
    }
}
