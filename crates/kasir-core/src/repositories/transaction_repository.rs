//! Transaction collection repository

use std::sync::Arc;

use kasir_shared::constants::TRANSACTIONS_KEY;
use serde_json::Value;
use tracing::warn;

use super::key_value_store::{read_json, write_json, KeyValueStore, StorageError};
use crate::domain::{Transaction, TransactionDraft};

/// Rows as found in storage. Rows that no longer parse are kept verbatim so
/// that rewriting the collection never drops data.
#[derive(Debug, Default)]
pub struct StoredTransactions {
    pub drafts: Vec<TransactionDraft>,
    pub quarantined: Vec<Value>,
}

pub struct TransactionRepository {
    store: Arc<dyn KeyValueStore>,
}

impl TransactionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Result<StoredTransactions, StorageError> {
        let raw: Vec<Value> = read_json(self.store.as_ref(), TRANSACTIONS_KEY)?;
        let mut stored = StoredTransactions::default();
        for value in raw {
            match serde_json::from_value::<TransactionDraft>(value.clone()) {
                Ok(draft) => stored.drafts.push(draft),
                Err(e) => {
                    warn!(error = %e, "Keeping unreadable ledger row aside");
                    stored.quarantined.push(value);
                }
            }
        }
        Ok(stored)
    }

    pub fn save(&self, rows: &[Transaction], quarantined: &[Value]) -> Result<(), StorageError> {
        let mut all = Vec::with_capacity(rows.len() + quarantined.len());
        for row in rows {
            all.push(
                serde_json::to_value(row)
                    .map_err(|e| StorageError::Backend(format!("serialize row {}: {}", row.id, e)))?,
            );
        }
        all.extend(quarantined.iter().cloned());
        write_json(self.store.as_ref(), TRANSACTIONS_KEY, &all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemStore;

    #[test]
    fn test_unreadable_rows_are_quarantined_and_kept() {
        let store = MemStore::shared();
        store
            .set(
                TRANSACTIONS_KEY,
                r#"[{"id":"a","date":"2025-01-10","type":"Masuk","amount":5},
                    {"id":"b","date":"not a date","amount":7}]"#,
            )
            .unwrap();
        let repo = TransactionRepository::new(store.clone());

        let stored = repo.load().unwrap();
        assert_eq!(stored.drafts.len(), 1);
        assert_eq!(stored.quarantined.len(), 1);

        repo.save(&[], &stored.quarantined).unwrap();
        let raw = store.raw(TRANSACTIONS_KEY).unwrap();
        assert!(raw.contains("not a date"));
    }
}
