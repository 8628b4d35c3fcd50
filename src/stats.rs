//! Catalog statistics and health overview.
//!
//! Provides a quick summary of what's indexed: product counts, distinct
//! category and brand counts, and database size. Used by `sfs stats` and
//! `GET /admin/stats` to give confidence that loads are working as
//! expected.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Snapshot of catalog shape, serializable for the HTTP stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_products: i64,
    pub categories: i64,
    pub brands: i64,
    pub in_stock: i64,
    pub db_size_bytes: u64,
}

/// Gather catalog statistics from the database.
pub async fn collect(pool: &SqlitePool, config: &Config) -> Result<CatalogStats> {
    let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;

    let categories: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT category) FROM products")
        .fetch_one(pool)
        .await?;

    let brands: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT brand) FROM products")
        .fetch_one(pool)
        .await?;

    let in_stock: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE stock > 0")
        .fetch_one(pool)
        .await?;

    let db_size_bytes = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(CatalogStats {
        total_products,
        categories,
        brands,
        in_stock,
        db_size_bytes,
    })
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let stats = collect(&pool, config).await?;

    println!("storefront-search — Catalog Stats");
    println!("=================================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(stats.db_size_bytes));
    println!();
    println!("  Products:    {}", stats.total_products);
    println!("  Categories:  {}", stats.categories);
    println!("  Brands:      {}", stats.brands);
    println!("  In stock:    {}", stats.in_stock);
    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
