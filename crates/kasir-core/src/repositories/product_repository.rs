//! Product catalog repository

use std::sync::Arc;

use kasir_shared::constants::PRODUCTS_KEY;
use tracing::{info, warn};

use super::key_value_store::{write_json, KeyValueStore, StorageError};
use crate::domain::product::{default_products, Product};

pub struct ProductRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ProductRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// An absent catalog is seeded with the defaults. A corrupt one reads as
    /// empty and is left untouched.
    pub fn list(&self) -> Result<Vec<Product>, StorageError> {
        let Some(raw) = self.store.get(PRODUCTS_KEY)? else {
            let defaults = default_products();
            write_json(self.store.as_ref(), PRODUCTS_KEY, &defaults)?;
            info!("Seeded {} default product(s)", defaults.len());
            return Ok(defaults);
        };
        match serde_json::from_str(&raw) {
            Ok(products) => Ok(products),
            Err(e) => {
                warn!(error = %e, "Product catalog unreadable");
                Ok(Vec::new())
            }
        }
    }

    pub fn save_all(&self, products: &[Product]) -> Result<(), StorageError> {
        write_json(self.store.as_ref(), PRODUCTS_KEY, products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemStore;

    #[test]
    fn test_first_read_seeds_catalog() {
        let store = MemStore::shared();
        let repo = ProductRepository::new(store.clone());
        let products = repo.list().unwrap();
        assert_eq!(products, vec![Product::new("prod-lpg-3kg", "LPG 3kg", 16_000)]);
        assert!(store.raw(PRODUCTS_KEY).unwrap().contains("prod-lpg-3kg"));
    }

    #[test]
    fn test_corrupt_catalog_reads_empty_without_reseeding() {
        let store = MemStore::shared();
        store.set(PRODUCTS_KEY, "{oops").unwrap();
        let repo = ProductRepository::new(store.clone());
        assert!(repo.list().unwrap().is_empty());
        assert_eq!(store.raw(PRODUCTS_KEY).as_deref(), Some("{oops"));
    }
}
