//! Batch ingestion coordinator.
//!
//! Writes validated product records into the store in bounded batches and
//! keeps the cache coherent: every catalog mutation ends by dropping all
//! search- and suggestion-keyed cache entries, even when nothing was
//! inserted (a prior clear may have emptied the store).
//!
//! # Batch semantics
//!
//! Each batch is written unordered: a duplicate-key rejection of one record
//! leaves the rest of the batch intact and is counted against `duplicates`.
//! Any other failure is terminal for that batch only; all of its records
//! count against `errors`, there is no retry, and subsequent batches still
//! proceed. A run therefore never fails for partial outcomes; the caller
//! inspects the returned counters.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::cache::SearchCache;
use crate::error::EngineError;
use crate::models::{IngestReport, Product};
use crate::store::ProductStore;

/// Coordinates bulk writes into the product store.
#[derive(Clone)]
pub struct Ingestor {
    store: Arc<dyn ProductStore>,
    cache: SearchCache,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(store: Arc<dyn ProductStore>, cache: SearchCache, batch_size: usize) -> Self {
        Self {
            store,
            cache,
            batch_size,
        }
    }

    /// Run one load: batch-write every record, then invalidate the cache.
    ///
    /// Errs only for run-aborting conditions (empty validated input);
    /// partial per-batch failures are reported in the counters.
    pub async fn load_records(&self, records: Vec<Product>) -> Result<IngestReport, EngineError> {
        if records.is_empty() {
            return Err(EngineError::EmptyIngest);
        }

        let started = Instant::now();

        if let Ok(existing) = self.store.count_all().await {
            if existing > 0 {
                info!(existing, "catalog already populated; colliding records will be skipped");
            }
        }

        let (inserted, duplicates, errors) = self.write_batches(&records).await;

        // Unconditional: stale pages must not outlive the data they
        // describe, whatever this run's outcome was.
        self.cache.invalidate_all().await;

        let report = IngestReport {
            inserted,
            duplicates,
            errors,
            duration_secs: started.elapsed().as_secs_f64(),
        };
        info!(
            inserted = report.inserted,
            duplicates = report.duplicates,
            errors = report.errors,
            "load run complete"
        );
        Ok(report)
    }

    /// Raw bulk insert: batch-write `products`, invalidate the cache, and
    /// return how many records landed.
    pub async fn bulk_insert(&self, products: &[Product]) -> Result<u64, EngineError> {
        if products.is_empty() {
            return Err(EngineError::EmptyIngest);
        }

        let (inserted, _, _) = self.write_batches(products).await;
        self.cache.invalidate_all().await;
        Ok(inserted)
    }

    /// Delete every product, then invalidate the cache.
    pub async fn clear_all(&self) -> Result<u64, EngineError> {
        let deleted = self
            .store
            .delete_all()
            .await
            .map_err(EngineError::StoreUnavailable)?;
        self.cache.invalidate_all().await;
        Ok(deleted)
    }

    async fn write_batches(&self, records: &[Product]) -> (u64, u64, u64) {
        let mut inserted = 0u64;
        let mut duplicates = 0u64;
        let mut errors = 0u64;

        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            match self.store.insert_batch(batch).await {
                Ok(write) => {
                    inserted += write.inserted;
                    duplicates += write.duplicates;
                    info!(
                        batch = index + 1,
                        inserted = write.inserted,
                        duplicates = write.duplicates,
                        "batch written"
                    );
                }
                Err(e) => {
                    errors += batch.len() as u64;
                    warn!(batch = index + 1, error = %e, "batch failed; continuing with next");
                }
            }
        }

        (inserted, duplicates, errors)
    }
}
