//! CSV catalog feed parsing and row sanitization.
//!
//! Supplier feeds arrive with inconsistent header casing (`title`/`Title`,
//! `Product Type`/`product_type`), stray whitespace, and currency symbols
//! in price columns. This module normalizes all of that into validated
//! [`Product`] records; a row missing any of the required string fields
//! (title, brand, category, product_type, sku) is skipped with a warning
//! and never reaches the store.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::models::Product;

/// Read and sanitize a CSV catalog feed into validated products.
///
/// `id` comes from an `id` column when the feed carries one, otherwise the
/// 1-based row ordinal; `created_at` is stamped with the parse time.
pub fn read_products(path: &Path) -> Result<Vec<Product>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let now = chrono::Utc::now().timestamp();
    let mut products = Vec::new();
    let mut row_count = 0u64;

    for record in reader.deserialize::<HashMap<String, String>>() {
        let row = record.with_context(|| format!("CSV parse error at row {}", row_count + 1))?;
        row_count += 1;

        match sanitize_row(&row, row_count, now) {
            Some(product) => products.push(product),
            None => warn!(row = row_count, "invalid product row skipped"),
        }
    }

    Ok(products)
}

fn sanitize_row(row: &HashMap<String, String>, ordinal: u64, now: i64) -> Option<Product> {
    let title = text_field(row, &["title", "Title"])?;
    let category = text_field(row, &["category", "Category"])?;
    let brand = text_field(row, &["brand", "Brand"])?;
    let product_type = text_field(row, &["product_type", "ProductType", "Product Type"])?;
    let sku = text_field(row, &["sku", "SKU"])?;

    let id = text_field(row, &["id", "Id", "ID"])
        .and_then(|raw| raw.parse::<i64>().ok())
        .unwrap_or(ordinal as i64);

    Some(Product {
        id,
        title,
        brand,
        category,
        product_type,
        description: text_field(row, &["description", "Description"]).unwrap_or_default(),
        price: parse_price(row).unwrap_or(0.0),
        stock: text_field(row, &["stock", "Stock"])
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|stock| *stock >= 0)
            .unwrap_or(0),
        sku,
        rating: text_field(row, &["rating", "Rating"])
            .and_then(|raw| raw.parse::<f64>().ok())
            .map(|rating| rating.clamp(0.0, 5.0))
            .unwrap_or(0.0),
        created_at: now,
    })
}

/// First non-empty value among the header variants, trimmed.
fn text_field(row: &HashMap<String, String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| row.get(*name))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Parse a price cell, dropping currency symbols and thousands separators.
/// Negative or unparseable values are rejected.
fn parse_price(row: &HashMap<String, String>) -> Option<f64> {
    let raw = text_field(row, &["price", "Price"])?;
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().ok().filter(|price| *price >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse_csv(content: &str) -> Vec<Product> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        read_products(file.path()).unwrap()
    }

    #[test]
    fn parses_well_formed_rows() {
        let products = parse_csv(
            "id,title,brand,category,product_type,sku,price,rating,stock\n\
             10,Wireless Mouse,Logitech,Electronics,peripheral,LOG-001,$24.99,4.5,12\n",
        );
        assert_eq!(products.len(), 1);
        let p = &products[0];
        assert_eq!(p.id, 10);
        assert_eq!(p.title, "Wireless Mouse");
        assert_eq!(p.price, 24.99);
        assert_eq!(p.rating, 4.5);
        assert_eq!(p.stock, 12);
    }

    #[test]
    fn accepts_alternate_header_casing() {
        let products = parse_csv(
            "Title,Brand,Category,Product Type,SKU,Price\n\
             Desk Lamp,Philips,Home,lighting,PHI-77,19\n",
        );
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product_type, "lighting");
        assert_eq!(products[0].sku, "PHI-77");
    }

    #[test]
    fn skips_rows_missing_required_fields() {
        let products = parse_csv(
            "title,brand,category,product_type,sku\n\
             Good,Acme,Toys,toy,ACM-1\n\
             ,Acme,Toys,toy,ACM-2\n\
             NoSku,Acme,Toys,toy,\n",
        );
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].sku, "ACM-1");
    }

    #[test]
    fn assigns_row_ordinal_when_id_missing() {
        let products = parse_csv(
            "title,brand,category,product_type,sku\n\
             A,Acme,Toys,toy,ACM-1\n\
             B,Acme,Toys,toy,ACM-2\n",
        );
        assert_eq!(products[0].id, 1);
        assert_eq!(products[1].id, 2);
    }

    #[test]
    fn sanitizes_price_and_clamps_rating() {
        let products = parse_csv(
            "title,brand,category,product_type,sku,price,rating\n\
             A,Acme,Toys,toy,ACM-1,\"1,299.00\",7.2\n\
             B,Acme,Toys,toy,ACM-2,free,\n",
        );
        assert_eq!(products[0].price, 1299.00);
        assert_eq!(products[0].rating, 5.0);
        assert_eq!(products[1].price, 0.0);
        assert_eq!(products[1].rating, 0.0);
    }
}
