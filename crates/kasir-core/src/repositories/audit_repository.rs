//! Audit log repository

use std::sync::Arc;

use kasir_shared::constants::AUDIT_KEY;

use super::key_value_store::{read_json, write_json, KeyValueStore, StorageError};
use crate::domain::AuditEntry;

pub struct AuditRepository {
    store: Arc<dyn KeyValueStore>,
}

impl AuditRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn append(&self, entry: AuditEntry) -> Result<(), StorageError> {
        let mut entries: Vec<AuditEntry> = read_json(self.store.as_ref(), AUDIT_KEY)?;
        entries.push(entry);
        write_json(self.store.as_ref(), AUDIT_KEY, &entries)
    }

    /// Newest first.
    pub fn list(&self) -> Result<Vec<AuditEntry>, StorageError> {
        let mut entries: Vec<AuditEntry> = read_json(self.store.as_ref(), AUDIT_KEY)?;
        entries.sort_by(|a, b| b.ts.cmp(&a.ts));
        Ok(entries)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(AUDIT_KEY)
    }
}
