//! # Kasir Core - Domain Module
//!
//! Domain entities for the cashier ledger.

pub mod audit;
pub mod category;
pub mod direction;
pub mod feature;
pub mod identity;
pub mod nav;
pub mod product;
pub mod session;
pub mod tax;
pub mod transaction;
pub mod user;

// Re-export all entities and enums
pub use audit::{AuditAction, AuditEntry};
pub use category::{Category, CATEGORY_LIST};
pub use direction::{is_in_type, is_out_type, Direction};
pub use feature::Feature;
pub use identity::Identity;
pub use nav::{Route, ROUTES};
pub use product::Product;
pub use session::{ProfilePatch, SessionUser};
pub use tax::TaxMeta;
pub use transaction::{Approval, ApprovalStatus, Transaction, TransactionDraft, TransactionPatch};
pub use user::{User, UserForm};
