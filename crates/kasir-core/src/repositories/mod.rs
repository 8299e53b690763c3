//! Storage port and the typed repositories built on it

pub mod key_value_store;
pub mod user_repository;
pub mod transaction_repository;
pub mod grant_repository;
pub mod audit_repository;
pub mod product_repository;

pub use key_value_store::{read_json, write_json, KeyValueStore, StorageError};
#[cfg(test)]
pub use key_value_store::MockKeyValueStore;
pub use user_repository::UserRepository;
pub use transaction_repository::{StoredTransactions, TransactionRepository};
pub use grant_repository::{move_grants, GrantRepository};
pub use audit_repository::AuditRepository;
pub use product_repository::ProductRepository;
