//! Sellable products and their unit prices

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Unit price in rupiah, PPN included.
    pub price: i64,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// Catalog written on first read.
pub fn default_products() -> Vec<Product> {
    vec![Product::new("prod-lpg-3kg", "LPG 3kg", 16_000)]
}
