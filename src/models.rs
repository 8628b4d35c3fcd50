//! Core data models used throughout storefront-search.
//!
//! These types represent the products, relevance rankings, and result pages
//! that flow through the search and ingestion pipeline.

use serde::{Deserialize, Serialize};

/// A catalog product as stored and served.
///
/// `id` and `sku` are each unique across the store. Records are created
/// exclusively by the ingestion path from validated external rows and are
/// never mutated in place by the search path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub brand: String,
    pub category: String,
    pub product_type: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub sku: String,
    pub rating: f64,
    pub created_at: i64,
}

/// The catalog fields the relevance engine matches against, in descending
/// weight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Title,
    Category,
    Brand,
    Sku,
    ProductType,
}

impl SearchField {
    /// All searchable fields, highest weight first. Iteration order matters:
    /// deduplication attributes a product to the first field that matched.
    pub const RANKED: [SearchField; 5] = [
        SearchField::Title,
        SearchField::Category,
        SearchField::Brand,
        SearchField::Sku,
        SearchField::ProductType,
    ];

    /// Fixed relevance weight of a match on this field.
    pub fn weight(self) -> i64 {
        match self {
            SearchField::Title => 5,
            SearchField::Category => 4,
            SearchField::Brand => 3,
            SearchField::Sku => 2,
            SearchField::ProductType => 1,
        }
    }

    /// Column name in the products table.
    pub fn column(self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Category => "category",
            SearchField::Brand => "brand",
            SearchField::Sku => "sku",
            SearchField::ProductType => "product_type",
        }
    }

    /// The field's value on a given product.
    pub fn value_of(self, product: &Product) -> &str {
        match self {
            SearchField::Title => &product.title,
            SearchField::Category => &product.category,
            SearchField::Brand => &product.brand,
            SearchField::Sku => &product.sku,
            SearchField::ProductType => &product.product_type,
        }
    }
}

/// Result ordering requested by the caller.
///
/// `Relevance` keeps the weighted-match ranking; every other mode re-sorts
/// the full match list by the named key, discarding relevance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Rating,
    Newest,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::PriceAsc => "price_asc",
            SortMode::PriceDesc => "price_desc",
            SortMode::Rating => "rating",
            SortMode::Newest => "newest",
        }
    }

    /// Parse the wire form (`relevance`, `price_asc`, `price_desc`,
    /// `rating`, `newest`).
    pub fn parse(s: &str) -> Option<SortMode> {
        match s {
            "relevance" => Some(SortMode::Relevance),
            "price_asc" => Some(SortMode::PriceAsc),
            "price_desc" => Some(SortMode::PriceDesc),
            "rating" => Some(SortMode::Rating),
            "newest" => Some(SortMode::Newest),
            _ => None,
        }
    }
}

/// A product's rank within one search invocation: the weight of the
/// highest-weighted field that matched, and which field that was.
/// Transient; never persisted or cached.
#[derive(Debug, Clone)]
pub struct RelevanceScore {
    pub product: Product,
    pub score: i64,
    pub matched: SearchField,
}

/// One page of results plus pagination metadata.
///
/// `total` is the match count before pagination; `total_pages` is
/// `ceil(total / page_size)`, zero when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// Aggregate outcome of one ingestion run.
///
/// `inserted + duplicates + errors` accounts for every input record;
/// a run with failed batches still completes and reports them here.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub inserted: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub duration_secs: f64,
}

/// Compute the page count for a total match count.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + page_size - 1) / page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_weights_strictly_descend() {
        let weights: Vec<i64> = SearchField::RANKED.iter().map(|f| f.weight()).collect();
        for pair in weights.windows(2) {
            assert!(pair[0] > pair[1], "weights must strictly descend: {:?}", weights);
        }
    }

    #[test]
    fn sort_mode_round_trips() {
        for mode in [
            SortMode::Relevance,
            SortMode::PriceAsc,
            SortMode::PriceDesc,
            SortMode::Rating,
            SortMode::Newest,
        ] {
            assert_eq!(SortMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(SortMode::parse("cheapest"), None);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(5, 1), 5);
    }
}
