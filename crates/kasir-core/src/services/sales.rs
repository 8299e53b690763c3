// ============================================================================
// Kasir Core - Sales Entry
// File: crates/kasir-core/src/services/sales.rs
// Description: Product catalog pricing and product sales written to the ledger
// ============================================================================

use std::sync::Arc;

use chrono::NaiveDate;
use kasir_shared::constants::{is_known_pt, MAX_AMOUNT};
use kasir_shared::now_ms;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::domain::category::SALES_CATEGORY;
use crate::domain::{Product, TaxMeta, Transaction, TransactionDraft};
use crate::error::DomainError;
use crate::repositories::{KeyValueStore, ProductRepository, StorageError};
use crate::services::ledger::TransactionLedger;

const MSG_BAD_PRICE: &str = "Harga tidak valid";
const MSG_NO_PRODUCT: &str = "Produk tidak ditemukan";
/// Sales rows keep the token the entry screen has always written.
const SALES_TYPE_TOKEN: &str = "income";

#[derive(Debug, Clone)]
pub struct SaleEntry {
    pub date: NaiveDate,
    pub pt: String,
    pub product_id: String,
    pub quantity: u32,
    /// Buyer or pangkalan name, may be blank.
    pub buyer: String,
    pub payment_method: String,
}

pub struct SalesService {
    products: ProductRepository,
    ledger: Arc<TransactionLedger>,
}

impl SalesService {
    pub fn new(store: Arc<dyn KeyValueStore>, ledger: Arc<TransactionLedger>) -> Self {
        Self {
            products: ProductRepository::new(store),
            ledger,
        }
    }

    pub fn products(&self) -> Result<Vec<Product>, StorageError> {
        self.products.list()
    }

    pub fn update_product_price(&self, product_id: &str, price: i64) -> Result<Product, DomainError> {
        if !(0..=MAX_AMOUNT).contains(&price) {
            return Err(DomainError::Validation(MSG_BAD_PRICE.to_string()));
        }
        let mut products = self.products.list()?;
        let product = products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| DomainError::NotFound(MSG_NO_PRODUCT.to_string()))?;
        product.price = price;
        let updated = product.clone();
        self.products.save_all(&products)?;
        info!("Price of {} set to {}", updated.id, updated.price);
        Ok(updated)
    }

    /// Writes one income row priced from the catalog. The unit price is
    /// PPN-inclusive, so the row carries its DPP split.
    pub fn record_sale(&self, entry: SaleEntry) -> Result<Transaction, DomainError> {
        if entry.quantity == 0 {
            return Err(DomainError::Validation("Jumlah terjual harus > 0".to_string()));
        }
        if !is_known_pt(&entry.pt) {
            return Err(DomainError::Validation(format!("PT tidak dikenal: {}", entry.pt)));
        }
        let product = self
            .products
            .list()?
            .into_iter()
            .find(|p| p.id == entry.product_id)
            .ok_or_else(|| DomainError::NotFound(MSG_NO_PRODUCT.to_string()))?;
        let amount = product
            .price
            .checked_mul(i64::from(entry.quantity))
            .ok_or_else(|| DomainError::Validation("Nominal terlalu besar".to_string()))?;

        let buyer = entry.buyer.trim().to_string();
        let mut desc = format!("Penjualan {} x {}", product.name, entry.quantity);
        if !buyer.is_empty() {
            desc.push_str(&format!(" - {}", buyer));
        }

        let mut draft = TransactionDraft::new(entry.date, entry.pt, SALES_TYPE_TOKEN, amount)
            .with_desc(desc)
            .with_category(SALES_CATEGORY)
            .with_payment_method(entry.payment_method)
            .with_created_at(now_ms())
            .with_meta(TaxMeta::ppn_inclusive(amount));
        draft.extra.insert("buyer".to_string(), Value::String(buyer));

        let sale = self.ledger.add(draft)?;
        info!(amount = sale.amount, "Recorded sale of {} for {}", product.id, sale.pt);
        Ok(sale)
    }
}

/// One day of sales, newest first. Sums saturate at the `i64` bounds.
#[derive(Debug, Clone, Serialize)]
pub struct SalesSummary {
    pub date: NaiveDate,
    pub total: i64,
    pub count: usize,
    pub ppn: i64,
    pub sales: Vec<Transaction>,
}

impl SalesSummary {
    pub fn build(rows: &[Transaction], date: NaiveDate) -> Self {
        let mut sales: Vec<Transaction> = rows
            .iter()
            .filter(|t| t.date == date && t.category == SALES_CATEGORY)
            .cloned()
            .collect();
        sales.sort_by_key(|t| std::cmp::Reverse(t.created_at_or_zero()));

        let total = sales.iter().fold(0i64, |acc, t| acc.saturating_add(t.amount));
        let ppn = sales
            .iter()
            .filter_map(|t| t.meta.as_ref())
            .fold(0i64, |acc, m| acc.saturating_add(m.tax));

        Self {
            date,
            total,
            count: sales.len(),
            ppn,
            sales,
        }
    }
}
