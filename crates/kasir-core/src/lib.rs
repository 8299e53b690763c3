//! # Kasir Core
//!
//! Domain entities, storage port, and the services that decide who may see
//! what and how each ledger row is classified.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod error;
pub mod context;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export domain entities
pub use domain::*;
pub use context::AppContext;
pub use error::DomainError;
