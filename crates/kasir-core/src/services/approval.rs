//! Director sign-off on large cash expenses

use std::sync::Arc;

use kasir_shared::now_ms;
use tracing::{info, warn};

use crate::domain::{ApprovalStatus, Transaction, TransactionPatch};
use crate::error::DomainError;
use crate::services::gate::AuthorizationGate;
use crate::services::ledger::TransactionLedger;

/// Rows needing approval in the allowed PTs, oldest first, whatever their
/// current status.
pub fn approval_queue(rows: &[Transaction], allowed_pts: &[String]) -> Vec<Transaction> {
    let mut queue: Vec<Transaction> = rows
        .iter()
        .filter(|t| t.needs_approval() && allowed_pts.contains(&t.pt))
        .cloned()
        .collect();
    queue.sort_by_key(Transaction::created_at_or_zero);
    queue
}

/// [`approval_queue`] restricted to undecided rows.
pub fn pending_approvals(rows: &[Transaction], allowed_pts: &[String]) -> Vec<Transaction> {
    approval_queue(rows, allowed_pts)
        .into_iter()
        .filter(|t| t.approval.status() == ApprovalStatus::Pending)
        .collect()
}

pub struct ApprovalService {
    ledger: Arc<TransactionLedger>,
    gate: Arc<AuthorizationGate>,
}

impl ApprovalService {
    pub fn new(ledger: Arc<TransactionLedger>, gate: Arc<AuthorizationGate>) -> Self {
        Self { ledger, gate }
    }

    /// Queue for the logged-in reviewer.
    pub fn queue(&self, pending_only: bool) -> Result<Vec<Transaction>, DomainError> {
        let rows = self.ledger.list()?;
        let allowed = self.gate.allowed_pts()?;
        Ok(if pending_only {
            pending_approvals(&rows, &allowed)
        } else {
            approval_queue(&rows, &allowed)
        })
    }

    /// Only rows in the reviewer's own queue can be decided; any other id
    /// (unknown, outside the PT grant, or below the limit) is `Ok(None)`.
    pub fn approve(&self, id: &str, by: &str) -> Result<Option<Transaction>, DomainError> {
        info!("Approving {} by {}", id, by);
        self.decide(
            id,
            TransactionPatch {
                approval_status: Some(ApprovalStatus::Approved),
                approved_by: Some(by.to_string()),
                approved_at: Some(now_ms()),
                ..Default::default()
            },
        )
    }

    pub fn reject(&self, id: &str, by: &str) -> Result<Option<Transaction>, DomainError> {
        info!("Rejecting {} by {}", id, by);
        self.decide(
            id,
            TransactionPatch {
                approval_status: Some(ApprovalStatus::Rejected),
                rejected_by: Some(by.to_string()),
                rejected_at: Some(now_ms()),
                ..Default::default()
            },
        )
    }

    fn decide(&self, id: &str, patch: TransactionPatch) -> Result<Option<Transaction>, DomainError> {
        let in_queue = self.queue(false)?.iter().any(|t| t.id == id);
        if !in_queue {
            warn!("Ignoring decision on {}: not in the reviewer's queue", id);
            return Ok(None);
        }
        self.ledger.update(id, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, TransactionDraft, User};
    use crate::repositories::UserRepository;
    use crate::services::event_bus::EventBus;
    use crate::services::feature_service::FeatureGrants;
    use crate::services::normalizer::normalize;
    use crate::services::pt_access_service::PtAccess;
    use crate::services::session_store::SessionStore;
    use crate::test_support::MemStore;
    use chrono::NaiveDate;
    use kasir_security::PasswordService;

    const SJE: &str = "PT SUMBER JAYA ELPIJI";
    const SJS: &str = "PT SRI JOYO SHAKTI";

    /// Reviewer "dir" logged in with a grant for SJS only.
    fn reviewer_scoped_to_sjs() -> (Arc<TransactionLedger>, ApprovalService) {
        let store = MemStore::shared();
        let mut dir = User::new("Direktur".into(), "dir".into(), PasswordService::hash("pw1234").unwrap());
        dir.job_title = "Direktur".into();
        UserRepository::new(store.clone()).save_all(&[dir]).unwrap();

        let events = Arc::new(EventBus::default());
        let sessions = Arc::new(SessionStore::new(store.clone(), events.clone()));
        let features = Arc::new(FeatureGrants::new(store.clone()));
        let pts = Arc::new(PtAccess::new(store.clone()));
        let gate = Arc::new(AuthorizationGate::new(store.clone(), sessions.clone(), features, pts.clone()));
        let ledger = Arc::new(TransactionLedger::new(store, sessions.clone(), events));

        let me = sessions.login("dir", "pw1234").unwrap();
        assert!(!me.is_master());
        pts.set_allowed_pts(vec![SJS.to_string()], &me).unwrap();
        (ledger.clone(), ApprovalService::new(ledger, gate))
    }

    fn cash(pt: &str, token: &str, amount: i64) -> TransactionDraft {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        TransactionDraft::new(date, pt, token, amount).with_payment_method("Tunai")
    }

    fn row(id: &str, pt: &str, amount: i64, created_at: i64, method: &str) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let mut d = TransactionDraft::new(date, pt, "Keluar", amount)
            .with_payment_method(method)
            .with_created_at(created_at);
        d.id = Some(id.to_string());
        normalize(d)
    }

    #[test]
    fn test_queue_filters_and_orders() {
        let rows = vec![
            row("late", SJE, 400_000, 20, "Tunai"),
            row("early", SJE, 500_000, 10, "Tunai"),
            row("small", SJE, 300_000, 5, "Tunai"),
            row("cashless", SJE, 900_000, 5, "Cashless"),
            row("other-pt", "PT SRI JOYO SHAKTI", 900_000, 5, "Tunai"),
        ];
        let allowed = vec![SJE.to_string()];
        let ids: Vec<String> = approval_queue(&rows, &allowed).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["early".to_string(), "late".to_string()]);
    }

    #[test]
    fn test_decided_rows_leave_pending_list() {
        let mut approved = row("a", SJE, 400_000, 1, "Tunai");
        approved.approval.approval_status = Some(ApprovalStatus::Approved);
        let rows = vec![approved, row("b", SJE, 400_000, 2, "Tunai")];
        let allowed = vec![SJE.to_string()];

        assert_eq!(approval_queue(&rows, &allowed).len(), 2);
        let pending = pending_approvals(&rows, &allowed);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "b");
    }

    #[test]
    fn test_decisions_stay_inside_the_queue() {
        let (ledger, approvals) = reviewer_scoped_to_sjs();
        let other_pt = ledger.add(cash(SJE, "Keluar", 900_000)).unwrap();
        let small = ledger.add(cash(SJS, "Masuk", 5)).unwrap();
        let mine = ledger.add(cash(SJS, "Keluar", 400_000)).unwrap();

        assert!(approvals.approve(&other_pt.id, "dir").unwrap().is_none());
        assert!(approvals.reject(&small.id, "dir").unwrap().is_none());
        assert!(approvals.approve("no-such-id", "dir").unwrap().is_none());
        assert_eq!(
            ledger.get(&other_pt.id).unwrap().unwrap().approval.status(),
            ApprovalStatus::Pending
        );
        assert!(ledger.get(&small.id).unwrap().unwrap().approval.approval_status.is_none());

        let approved = approvals.approve(&mine.id, "dir").unwrap().unwrap();
        assert_eq!(approved.approval.status(), ApprovalStatus::Approved);
        assert_eq!(approved.approval.approved_by.as_deref(), Some("dir"));
    }
}
