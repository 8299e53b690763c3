//! # Kasir Infrastructure
//!
//! Concrete storage adapters behind the core's `KeyValueStore` port.

pub mod storage;

pub use storage::{FileStore, MemoryStore};
