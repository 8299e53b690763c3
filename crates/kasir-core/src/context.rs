// ============================================================================
// Kasir Core - Application Context
// File: crates/kasir-core/src/context.rs
// Description: First-run sequence and wiring of every service over one store
// ============================================================================

use std::sync::Arc;

use chrono::NaiveDate;
use kasir_shared::config::SeedSettings;
use tracing::info;

use crate::error::DomainError;
use crate::repositories::{KeyValueStore, UserRepository};
use crate::services::approval::ApprovalService;
use crate::services::report::{CashflowReport, PnlReport};
use crate::services::sales::{SalesService, SalesSummary};
use crate::services::{
    AdminService, AuthorizationGate, EventBus, FeatureGrants, PtAccess, SessionStore,
    TransactionLedger,
};

pub struct AppContext {
    pub store: Arc<dyn KeyValueStore>,
    pub events: Arc<EventBus>,
    pub sessions: Arc<SessionStore>,
    pub features: Arc<FeatureGrants>,
    pub pts: Arc<PtAccess>,
    pub gate: Arc<AuthorizationGate>,
    pub admin: Arc<AdminService>,
    pub ledger: Arc<TransactionLedger>,
    pub approvals: ApprovalService,
    pub sales: SalesService,
}

impl AppContext {
    /// Wire the services and bring stored data up to date:
    /// 1. move the legacy user directory key
    /// 2. seed the master account
    /// 3. hash leftover plaintext passwords
    /// 4. migrate ledger rows lacking canonical fields
    pub fn open(store: Arc<dyn KeyValueStore>, seed: &SeedSettings) -> Result<Self, DomainError> {
        let events = Arc::new(EventBus::default());
        let sessions = Arc::new(SessionStore::new(store.clone(), events.clone()));
        let features = Arc::new(FeatureGrants::new(store.clone()));
        let pts = Arc::new(PtAccess::new(store.clone()));
        let gate = Arc::new(AuthorizationGate::new(
            store.clone(),
            sessions.clone(),
            features.clone(),
            pts.clone(),
        ));
        let admin = Arc::new(AdminService::new(
            store.clone(),
            features.clone(),
            pts.clone(),
            sessions.clone(),
            events.clone(),
        ));
        let ledger = Arc::new(TransactionLedger::new(
            store.clone(),
            sessions.clone(),
            events.clone(),
        ));
        let approvals = ApprovalService::new(ledger.clone(), gate.clone());
        let sales = SalesService::new(store.clone(), ledger.clone());

        UserRepository::new(store.clone()).migrate_legacy_key()?;
        if admin.ensure_master(&seed.master_password)? {
            info!("First run: master account created");
        }
        admin.upgrade_legacy_passwords()?;
        ledger.migrate()?;

        Ok(Self {
            store,
            events,
            sessions,
            features,
            pts,
            gate,
            admin,
            ledger,
            approvals,
            sales,
        })
    }

    /// Cash-flow sheet for one PT and day, empty when the PT is not visible.
    pub fn cashflow_report(&self, pt: &str, date: NaiveDate) -> Result<CashflowReport, DomainError> {
        let rows = self.gate.visible_rows(self.ledger.list()?, None)?;
        Ok(CashflowReport::build(&rows, pt, date))
    }

    /// Profit and loss over the visible PTs, optionally narrowed further.
    pub fn pnl_report(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        pt_filter: Option<&[String]>,
    ) -> Result<PnlReport, DomainError> {
        let rows = self.gate.visible_rows(self.ledger.list()?, pt_filter)?;
        Ok(PnlReport::build(&rows, from, to))
    }

    /// Sales of one day across the visible PTs.
    pub fn sales_summary(&self, date: NaiveDate) -> Result<SalesSummary, DomainError> {
        let rows = self.gate.visible_rows(self.ledger.list()?, None)?;
        Ok(SalesSummary::build(&rows, date))
    }
}
