//! # storefront-search
//!
//! **Relevance-ranked product catalog search with cache-aside reads and
//! batch CSV ingestion.**
//!
//! storefront-search serves keyword search, autocomplete, and
//! category/brand browsing over a product catalog, fronted by a TTL cache
//! and repopulated by a batch CSV ingestion path.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌──────────┐
//! │ CSV Feed │──▶│  Ingestor    │──▶│  SQLite   │
//! │          │   │ 1000/batch  │   │ products  │
//! └──────────┘   └──────┬──────┘   └────┬─────┘
//!                       │ invalidate    │
//!                       ▼               ▼
//!                 ┌──────────┐    ┌──────────┐
//!                 │  Cache   │◀──▶│  Search   │
//!                 │ (TTL 1h) │    │  Engine   │
//!                 └──────────┘    └────┬─────┘
//!                                      │
//!                        ┌─────────────┤
//!                        ▼             ▼
//!                   ┌──────────┐ ┌──────────┐
//!                   │   CLI    │ │   HTTP   │
//!                   │  (sfs)   │ │  (axum)  │
//!                   └──────────┘ └──────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. The **CSV source** ([`csv_source`]) sanitizes supplier feed rows into
//!    validated [`models::Product`] records.
//! 2. The **ingestion coordinator** ([`ingest`]) writes them into the store
//!    in bounded unordered batches, classifying duplicates per record, then
//!    drops every cached search and suggestion entry.
//! 3. The **relevance engine** ([`search`]) serves queries cache-aside:
//!    probe the cache, on miss run weighted multi-field matching through
//!    the [`store::ProductStore`] trait, rank, paginate, and write the page
//!    back through the cache.
//! 4. Results are exposed via the **CLI** (`sfs`) and the **HTTP server**
//!    ([`server`]).
//!
//! ## Relevance Model
//!
//! | Field | Weight |
//! |-------|--------|
//! | title | 5 |
//! | category | 4 |
//! | brand | 3 |
//! | sku | 2 |
//! | product_type | 1 |
//!
//! A product scores the weight of the highest-weighted field containing the
//! query (case-insensitive substring, matched literally), appears once per
//! result list, and ties break on rating.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types: `Product`, `SearchResult`, `SortMode`, `IngestReport` |
//! | [`error`] | Typed core errors (invalid request, store unavailable, empty ingest) |
//! | [`store`] | `ProductStore` trait and the in-memory implementation |
//! | [`sqlite_store`] | SQLite `ProductStore` backend |
//! | [`cache`] | Cache-aside layer: `CacheMedium` trait, Redis and memory media |
//! | [`search`] | Weighted multi-field relevance engine, suggestions, browsing |
//! | [`ingest`] | Batch ingestion coordinator with cache invalidation |
//! | [`csv_source`] | CSV feed parsing and row sanitization |
//! | [`server`] | JSON HTTP server (Axum) with CORS |
//! | [`stats`] | Catalog statistics |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//!
//! ## Configuration
//!
//! storefront-search is configured via a TOML file (default:
//! `config/storefront.toml`). See [`config`] for all available options and
//! [`config::load_config`] for validation rules.

pub mod cache;
pub mod config;
pub mod csv_source;
pub mod db;
pub mod error;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod search;
pub mod server;
pub mod sqlite_store;
pub mod stats;
pub mod store;

pub use error::EngineError;
pub use models::{Product, SearchResult, SortMode};
pub use search::SearchEngine;
pub use store::ProductStore;
