//! Key-value store adapters

pub mod file_store;
pub mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

use kasir_core::repositories::StorageError;

/// Bytes a blob counts against a quota, mirroring how browsers charge
/// local storage for both key and value.
pub(crate) fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

pub(crate) fn check_quota(key: &str, total_after: u64, limit: Option<u64>) -> Result<(), StorageError> {
    match limit {
        Some(limit) if total_after > limit => Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            needed: total_after,
            limit,
        }),
        _ => Ok(()),
    }
}
