//! SQLite-backed [`ProductStore`] implementation.
//!
//! Maps each [`ProductStore`] operation to SQL against the products table.
//! Substring and prefix matches go through [`escape_like`] so the query
//! text is always matched as a literal, even when it contains `%`, `_`,
//! or `\`.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::{Product, SearchField};
use crate::store::{BatchWrite, ProductStore, SortColumn, SortDir, SortSpec};

/// SQLite implementation of the [`ProductStore`] trait.
///
/// Wraps a [`SqlitePool`] and translates every trait method into one or
/// more SQL statements. Sort orders and column names are built from typed
/// enums, never from caller strings.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE metacharacters so the needle matches literally under
/// `ESCAPE '\'`.
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn order_clause(sort: &[SortSpec]) -> String {
    if sort.is_empty() {
        return "id ASC".to_string();
    }
    let keys: Vec<String> = sort
        .iter()
        .map(|(column, dir)| {
            let column = match column {
                SortColumn::Price => "price",
                SortColumn::Rating => "rating",
                SortColumn::CreatedAt => "created_at",
            };
            let dir = match dir {
                SortDir::Asc => "ASC",
                SortDir::Desc => "DESC",
            };
            format!("{} {}", column, dir)
        })
        .collect();
    keys.join(", ")
}

const PRODUCT_COLUMNS: &str =
    "id, title, brand, category, product_type, description, price, stock, sku, rating, created_at";

fn product_from_row(row: &SqliteRow) -> Product {
    Product {
        id: row.get("id"),
        title: row.get("title"),
        brand: row.get("brand"),
        category: row.get("category"),
        product_type: row.get("product_type"),
        description: row.get("description"),
        price: row.get("price"),
        stock: row.get("stock"),
        sku: row.get("sku"),
        rating: row.get("rating"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ProductStore for SqliteStore {
    async fn find_containing(&self, field: SearchField, needle: &str) -> Result<Vec<Product>> {
        let sql = format!(
            r#"SELECT {PRODUCT_COLUMNS} FROM products WHERE LOWER({}) LIKE '%' || ? || '%' ESCAPE '\'"#,
            field.column()
        );
        let rows = sqlx::query(&sql)
            .bind(escape_like(needle))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn find_exact(
        &self,
        field: SearchField,
        value: &str,
        sort: &[SortSpec],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {} = ? ORDER BY {} LIMIT ? OFFSET ?",
            field.column(),
            order_clause(sort)
        );
        let rows = sqlx::query(&sql)
            .bind(value)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn count_exact(&self, field: SearchField, value: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM products WHERE {} = ?", field.column());
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn distinct_with_prefix(
        &self,
        field: SearchField,
        prefix: &str,
    ) -> Result<Vec<String>> {
        let column = field.column();
        let sql = format!(
            r#"SELECT DISTINCT {column} FROM products WHERE LOWER({column}) LIKE ? || '%' ESCAPE '\' ORDER BY {column} ASC"#,
        );
        let rows = sqlx::query(&sql)
            .bind(escape_like(prefix))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn find_rating_at_least(
        &self,
        min_rating: f64,
        sort: &[SortSpec],
        limit: i64,
    ) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE rating >= ? ORDER BY {} LIMIT ?",
            order_clause(sort)
        );
        let rows = sqlx::query(&sql)
            .bind(min_rating)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn count_all(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_batch(&self, batch: &[Product]) -> Result<BatchWrite> {
        // Unordered: each record is its own statement, so one duplicate
        // never blocks the rest of the batch. The batch as a whole is not
        // atomic; SQLite's per-statement atomicity is the only guarantee.
        let mut write = BatchWrite::default();
        for record in batch {
            let result = sqlx::query(
                r#"
                INSERT INTO products (id, title, brand, category, product_type,
                                      description, price, stock, sku, rating, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.id)
            .bind(&record.title)
            .bind(&record.brand)
            .bind(&record.category)
            .bind(&record.product_type)
            .bind(&record.description)
            .bind(record.price)
            .bind(record.stock)
            .bind(&record.sku)
            .bind(record.rating)
            .bind(record.created_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => write.inserted += 1,
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    write.duplicates += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(write)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM products")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_leaves_plain_text_alone() {
        assert_eq!(escape_like("wireless mouse"), "wireless mouse");
    }

    #[test]
    fn escape_like_escapes_metacharacters() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like(r"c:\d"), r"c:\\d");
    }

    #[test]
    fn order_clause_composes_keys() {
        assert_eq!(
            order_clause(&crate::store::RATING_THEN_PRICE),
            "rating DESC, price ASC"
        );
        assert_eq!(order_clause(&[]), "id ASC");
    }
}
