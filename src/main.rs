//! # storefront-search CLI (`sfs`)
//!
//! The `sfs` binary is the operational interface for storefront-search. It
//! provides commands for database initialization, catalog loading, search,
//! autocomplete, browsing, and starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! sfs --config ./config/storefront.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sfs init` | Create the SQLite database and run schema migrations |
//! | `sfs load [file]` | Ingest a CSV catalog feed |
//! | `sfs search "<query>"` | Search the catalog |
//! | `sfs suggest <prefix>` | Autocomplete suggestions |
//! | `sfs browse <category\|brand> <value>` | Browse by exact category or brand |
//! | `sfs top` | Top-rated products |
//! | `sfs stats` | Catalog statistics |
//! | `sfs clear` | Delete all products |
//! | `sfs serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use storefront_search::cache::{self, SearchCache};
use storefront_search::config::{self, Config};
use storefront_search::csv_source;
use storefront_search::db;
use storefront_search::ingest::Ingestor;
use storefront_search::migrate;
use storefront_search::models::{Product, SortMode};
use storefront_search::search::SearchEngine;
use storefront_search::server;
use storefront_search::sqlite_store::SqliteStore;
use storefront_search::stats;
use storefront_search::store::ProductStore;

/// storefront-search CLI — relevance-ranked product catalog search with
/// cache-aside reads and batch CSV ingestion.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/storefront.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "sfs",
    about = "storefront-search — relevance-ranked product catalog search",
    version,
    long_about = "storefront-search serves keyword search, autocomplete, and category/brand \
    browsing over a product catalog, fronted by a TTL cache and repopulated by a batch CSV \
    ingestion path."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/storefront.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the products table, and its
    /// indexes. This command is idempotent — running it multiple times is
    /// safe.
    Init,

    /// Ingest a CSV catalog feed.
    ///
    /// Parses and sanitizes the feed, writes the valid records in
    /// unordered batches (duplicates skipped per record), and invalidates
    /// the search and suggestion caches.
    Load {
        /// Path to the CSV file. Defaults to `[ingest].csv_path`.
        file: Option<PathBuf>,
    },

    /// Search the catalog.
    ///
    /// Runs the weighted multi-field relevance ranking and prints one
    /// result page.
    Search {
        /// The search query string.
        query: String,

        /// Page number (1-based).
        #[arg(long, default_value_t = 1)]
        page: i64,

        /// Results per page.
        #[arg(long)]
        limit: Option<i64>,

        /// Result order: `relevance`, `price_asc`, `price_desc`, `rating`,
        /// or `newest`.
        #[arg(long, default_value = "relevance")]
        sort: String,
    },

    /// Autocomplete suggestions for a prefix (at least 2 characters).
    Suggest {
        /// The prefix to complete.
        prefix: String,

        /// Maximum number of suggestions.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Browse products by exact category or brand.
    Browse {
        /// Which field to browse: `category` or `brand`.
        field: String,

        /// The exact value to look up.
        value: String,

        /// Page number (1-based).
        #[arg(long, default_value_t = 1)]
        page: i64,

        /// Results per page.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Top-rated products (rating 4.5 or higher).
    Top {
        /// Maximum number of products.
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Catalog statistics.
    Stats,

    /// Delete all products and invalidate the cache.
    Clear,

    /// Start the HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// search, suggestion, browse, and admin endpoints.
    Serve,
}

/// Construct the store, cache, engine, and ingestor from config.
async fn open_runtime(
    config: &Config,
) -> anyhow::Result<(sqlx::SqlitePool, SearchEngine, Ingestor)> {
    let pool = db::connect(config).await?;
    let store: Arc<dyn ProductStore> = Arc::new(SqliteStore::new(pool.clone()));

    let medium = cache::build_medium(&config.cache).await?;
    let search_cache = SearchCache::new(
        medium,
        Duration::from_secs(config.cache.ttl_secs),
        Duration::from_millis(config.cache.op_timeout_ms),
    );

    let engine = SearchEngine::new(
        store.clone(),
        search_cache.clone(),
        Duration::from_millis(config.search.store_timeout_ms),
    );
    let ingestor = Ingestor::new(store, search_cache, config.ingest.batch_size);

    Ok((pool, engine, ingestor))
}

/// Check CLI pagination arguments and resolve the effective page size.
fn validate_page_args(page: i64, limit: Option<i64>, cfg: &Config) -> anyhow::Result<i64> {
    if page < 1 {
        anyhow::bail!("page must be greater than 0");
    }
    let limit = limit.unwrap_or(cfg.search.default_page_size);
    if limit < 1 || limit > cfg.search.max_page_size {
        anyhow::bail!("limit must be between 1 and {}", cfg.search.max_page_size);
    }
    Ok(limit)
}

fn print_product_line(index: usize, product: &Product) {
    println!(
        "{}. {} — {} (${:.2}, rating {:.1})",
        index + 1,
        product.title,
        product.brand,
        product.price,
        product.rating
    );
    println!(
        "    category: {} / {}   sku: {}   stock: {}",
        product.category, product.product_type, product.sku, product.stock
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_search=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Load { file } => {
            let path = file.unwrap_or_else(|| cfg.ingest.csv_path.clone());
            let records = csv_source::read_products(&path)?;
            println!("Parsed {} valid records from {}", records.len(), path.display());

            let (pool, _, ingestor) = open_runtime(&cfg).await?;
            let report = ingestor.load_records(records).await?;

            println!("load complete");
            println!("  inserted:   {}", report.inserted);
            println!("  duplicates: {}", report.duplicates);
            println!("  errors:     {}", report.errors);
            println!("  duration:   {:.2}s", report.duration_secs);
            pool.close().await;
        }
        Commands::Search {
            query,
            page,
            limit,
            sort,
        } => {
            if query.trim().is_empty() {
                anyhow::bail!("query must not be empty");
            }
            let sort = SortMode::parse(&sort).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown sort mode: {}. Use relevance, price_asc, price_desc, rating, or newest.",
                    sort
                )
            })?;
            let limit = validate_page_args(page, limit, &cfg)?;

            let (pool, engine, _) = open_runtime(&cfg).await?;
            let result = engine.search(&query, page, limit, sort).await?;

            if result.products.is_empty() {
                println!("No results.");
            } else {
                for (i, product) in result.products.iter().enumerate() {
                    print_product_line(i, product);
                }
                println!();
                println!(
                    "page {}/{} ({} matches)",
                    result.page, result.total_pages, result.total
                );
            }
            pool.close().await;
        }
        Commands::Suggest { prefix, limit } => {
            if prefix.trim().len() < 2 {
                anyhow::bail!("prefix must be at least 2 characters");
            }

            let (pool, engine, _) = open_runtime(&cfg).await?;
            let suggestions = engine.suggest(&prefix, limit).await?;

            if suggestions.is_empty() {
                println!("No suggestions.");
            } else {
                for suggestion in &suggestions {
                    println!("{}", suggestion);
                }
            }
            pool.close().await;
        }
        Commands::Browse {
            field,
            value,
            page,
            limit,
        } => {
            let limit = validate_page_args(page, limit, &cfg)?;
            let (pool, engine, _) = open_runtime(&cfg).await?;

            let result = match field.as_str() {
                "category" => engine.products_by_category(&value, page, limit).await?,
                "brand" => engine.products_by_brand(&value, page, limit).await?,
                other => anyhow::bail!("Unknown browse field: {}. Use category or brand.", other),
            };

            if result.products.is_empty() {
                println!("No results.");
            } else {
                for (i, product) in result.products.iter().enumerate() {
                    print_product_line(i, product);
                }
                println!();
                println!(
                    "page {}/{} ({} matches)",
                    result.page, result.total_pages, result.total
                );
            }
            pool.close().await;
        }
        Commands::Top { limit } => {
            let (pool, engine, _) = open_runtime(&cfg).await?;
            let products = engine.top_rated(limit).await?;

            if products.is_empty() {
                println!("No results.");
            } else {
                for (i, product) in products.iter().enumerate() {
                    print_product_line(i, product);
                }
            }
            pool.close().await;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Clear => {
            let (pool, _, ingestor) = open_runtime(&cfg).await?;
            let deleted = ingestor.clear_all().await?;
            println!("Deleted {} products.", deleted);
            pool.close().await;
        }
        Commands::Serve => {
            let (pool, engine, ingestor) = open_runtime(&cfg).await?;
            server::run_server(&cfg, engine, ingestor, pool).await?;
        }
    }

    Ok(())
}
