//! Error types for the search and ingestion core.
//!
//! Cache trouble is deliberately absent here: the cache-aside layer absorbs
//! every cache-medium failure and degrades to a miss (see [`crate::cache`]).
//! Partial ingestion failures are likewise not errors; they are reported in
//! the counters of [`crate::models::IngestReport`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed caller input (empty query, out-of-range page or limit).
    /// Produced by the boundary before the core runs; never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A product store round-trip failed or timed out. Surfaced to the
    /// caller as a failed operation; retry policy is the caller's.
    #[error("product store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),

    /// A load run received zero validated records. Fatal for that run only.
    #[error("no valid records to ingest")]
    EmptyIngest,
}
