//! # Kasir Core - Services
//!
//! Session, grant resolution, ledger and the authorization gate.

pub mod admin_service;
pub mod approval;
pub mod event_bus;
pub mod feature_service;
pub mod gate;
pub mod ledger;
pub mod normalizer;
pub mod other_income;
pub mod pt_access_service;
pub mod report;
pub mod sales;
pub mod session_store;

pub use admin_service::AdminService;
pub use approval::ApprovalService;
pub use event_bus::{AuthEvent, EventBus};
pub use feature_service::FeatureGrants;
pub use gate::{AuthorizationGate, GateDecision};
pub use ledger::TransactionLedger;
pub use normalizer::{migrate_if_needed, normalize, Migration};
pub use other_income::{record_other_income, OtherIncomeEntry};
pub use pt_access_service::PtAccess;
pub use report::{CashflowReport, PnlReport};
pub use sales::{SaleEntry, SalesService, SalesSummary};
pub use session_store::SessionStore;
