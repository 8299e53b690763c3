// ============================================================================
// Kasir Core - Transaction Ledger
// File: crates/kasir-core/src/services/ledger.rs
// ============================================================================
//! Add, update and remove ledger rows with operator attribution

use std::sync::Arc;

use kasir_shared::constants::MAX_AMOUNT;
use kasir_shared::{new_id, now_ms};
use tracing::{debug, info};

use crate::domain::category::check_category;
use crate::domain::{Direction, Transaction, TransactionDraft, TransactionPatch};
use crate::error::DomainError;
use crate::repositories::{KeyValueStore, StorageError, StoredTransactions, TransactionRepository};
use crate::services::event_bus::{AuthEvent, EventBus};
use crate::services::normalizer::{migrate_if_needed, normalize};
use crate::services::session_store::SessionStore;

/// Every write rewrites the whole collection; the last writer wins.
pub struct TransactionLedger {
    repo: TransactionRepository,
    sessions: Arc<SessionStore>,
    events: Arc<EventBus>,
}

struct Loaded {
    rows: Vec<Transaction>,
    quarantined: Vec<serde_json::Value>,
}

pub(crate) fn validate_amount(amount: i64) -> Result<(), DomainError> {
    if amount < 0 {
        return Err(DomainError::Validation("Nominal tidak boleh negatif".to_string()));
    }
    if amount > MAX_AMOUNT {
        return Err(DomainError::Validation("Nominal terlalu besar".to_string()));
    }
    Ok(())
}

fn validate_type(type_token: &str) -> Result<Direction, DomainError> {
    Direction::parse(type_token).ok_or_else(|| {
        DomainError::Validation(format!("Tipe transaksi tidak dikenal: {}", type_token))
    })
}

fn validate_draft(draft: &TransactionDraft) -> Result<(), DomainError> {
    validate_amount(draft.amount)?;
    let direction = validate_type(&draft.type_token)?;
    check_category(&draft.category, direction).map_err(DomainError::Validation)
}

impl TransactionLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, sessions: Arc<SessionStore>, events: Arc<EventBus>) -> Self {
        Self {
            repo: TransactionRepository::new(store),
            sessions,
            events,
        }
    }

    /// Load the collection, re-normalizing and saving historic rows that
    /// lack canonical fields. Returns whether a migration was written.
    pub fn migrate(&self) -> Result<bool, StorageError> {
        Ok(self.load_migrated()?.1)
    }

    /// Rows that gained an id or a derived field are written back at once,
    /// so a row keeps the same id across reads.
    fn load_migrated(&self) -> Result<(Loaded, bool), StorageError> {
        let StoredTransactions { drafts, quarantined } = self.repo.load()?;
        let migration = migrate_if_needed(drafts);
        let loaded = Loaded {
            rows: migration.rows,
            quarantined,
        };
        if migration.changed {
            info!("Migrated {} ledger row(s) to canonical fields", loaded.rows.len());
            self.save(&loaded)?;
        }
        Ok((loaded, migration.changed))
    }

    fn load(&self) -> Result<Loaded, StorageError> {
        Ok(self.load_migrated()?.0)
    }

    fn save(&self, loaded: &Loaded) -> Result<(), StorageError> {
        self.repo.save(&loaded.rows, &loaded.quarantined)
    }

    /// All rows in stored order (newest added first).
    pub fn list(&self) -> Result<Vec<Transaction>, StorageError> {
        Ok(self.load()?.rows)
    }

    pub fn get(&self, id: &str) -> Result<Option<Transaction>, StorageError> {
        Ok(self.load()?.rows.into_iter().find(|t| t.id == id))
    }

    pub fn add(&self, draft: TransactionDraft) -> Result<Transaction, DomainError> {
        let mut added = self.add_many(vec![draft])?;
        added
            .pop()
            .ok_or_else(|| DomainError::Validation("Tidak ada transaksi".to_string()))
    }

    /// Validate every draft, then prepend them all in one write: either all
    /// rows land or none do. Later drafts end up nearer the top.
    pub fn add_many(&self, drafts: Vec<TransactionDraft>) -> Result<Vec<Transaction>, DomainError> {
        for draft in &drafts {
            validate_draft(draft)?;
        }

        let mut session_operator: Option<String> = None;
        let mut added = Vec::with_capacity(drafts.len());
        for mut draft in drafts {
            // 1. Attribute and stamp
            let operator = match draft.operator.take().filter(|o| !o.trim().is_empty()) {
                Some(explicit) => explicit,
                None => match &session_operator {
                    Some(name) => name.clone(),
                    None => {
                        let name = self.sessions.operator_name()?;
                        session_operator = Some(name.clone());
                        name
                    }
                },
            };
            draft.operator = Some(operator);
            draft.id = Some(new_id());
            if draft.created_at.is_none() {
                draft.created_at = Some(now_ms());
            }
            added.push(normalize(draft));
        }

        // 2. Prepend and persist once
        let mut loaded = self.load()?;
        for txn in &added {
            loaded.rows.insert(0, txn.clone());
        }
        self.save(&loaded)?;

        for txn in &added {
            info!(
                id = %txn.id,
                pt = %txn.pt,
                amount = txn.amount,
                affects_cash = txn.affects_cash,
                "Ledger row added by {}",
                txn.operator
            );
            if txn.needs_approval() {
                self.events.publish(AuthEvent::ApprovalCreated { pt: txn.pt.clone() });
            }
        }
        Ok(added)
    }

    /// Merge `patch` and re-normalize. An unknown id is a silent no-op.
    pub fn update(&self, id: &str, patch: TransactionPatch) -> Result<Option<Transaction>, DomainError> {
        let mut loaded = self.load()?;
        let Some(pos) = loaded.rows.iter().position(|t| t.id == id) else {
            debug!("Ignoring update of unknown ledger row {}", id);
            return Ok(None);
        };

        // Historic rows may carry odd tokens or categories; only what the
        // patch changes is checked.
        let reclassified = patch.type_token.is_some() || patch.category.is_some();
        let mut draft = TransactionDraft::from(loaded.rows[pos].clone());
        draft.apply(patch);
        validate_amount(draft.amount)?;
        if reclassified {
            let direction = validate_type(&draft.type_token)?;
            check_category(&draft.category, direction).map_err(DomainError::Validation)?;
        }

        let txn = normalize(draft);
        loaded.rows[pos] = txn.clone();
        self.save(&loaded)?;
        info!(id = %txn.id, "Ledger row updated");
        Ok(Some(txn))
    }

    /// Idempotent. Returns whether a row was removed.
    pub fn remove(&self, id: &str) -> Result<bool, StorageError> {
        let mut loaded = self.load()?;
        let before = loaded.rows.len();
        loaded.rows.retain(|t| t.id != id);
        let removed = loaded.rows.len() != before;
        self.save(&loaded)?;
        if removed {
            info!(id, "Ledger row removed");
        }
        Ok(removed)
    }

    pub fn clear_all(&self) -> Result<(), StorageError> {
        let mut loaded = self.load()?;
        loaded.rows.clear();
        self.save(&loaded)?;
        info!("Ledger cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockKeyValueStore;
    use crate::test_support::MemStore;
    use chrono::NaiveDate;
    use kasir_shared::constants::{DEFAULT_OPERATOR, MAX_AMOUNT, OPERATOR_NAME_KEY, TRANSACTIONS_KEY};

    fn setup(store: Arc<MemStore>) -> (TransactionLedger, Arc<EventBus>) {
        let events = Arc::new(EventBus::default());
        let sessions = Arc::new(SessionStore::new(store.clone(), events.clone()));
        (TransactionLedger::new(store, sessions, events.clone()), events)
    }

    fn draft(amount: i64) -> TransactionDraft {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        TransactionDraft::new(date, "PT SUMBER JAYA ELPIJI", "Keluar", amount)
            .with_payment_method("Tunai")
    }

    #[test]
    fn test_add_assigns_id_operator_and_prepends() {
        let store = MemStore::shared();
        store.set(OPERATOR_NAME_KEY, "Ani").unwrap();
        let (ledger, _) = setup(store);

        let first = ledger.add(draft(1_000)).unwrap();
        let second = ledger.add(draft(2_000)).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.operator, "Ani");
        assert!(first.created_at.is_some());
        let rows = ledger.list().unwrap();
        assert_eq!(rows[0].id, second.id);
        assert_eq!(rows[1].id, first.id);
    }

    #[test]
    fn test_add_without_session_uses_placeholder() {
        let (ledger, _) = setup(MemStore::shared());
        assert_eq!(ledger.add(draft(1)).unwrap().operator, DEFAULT_OPERATOR);
    }

    #[test]
    fn test_add_rejects_negative_amount_and_unknown_type() {
        let (ledger, _) = setup(MemStore::shared());
        assert!(matches!(ledger.add(draft(-5)), Err(DomainError::Validation(_))));

        let mut bad = draft(5);
        bad.type_token = "Transfer".into();
        assert!(matches!(ledger.add(bad), Err(DomainError::Validation(_))));
        assert!(ledger.list().unwrap().is_empty());
    }

    #[test]
    fn test_large_cash_expense_announces_approval() {
        let (ledger, events) = setup(MemStore::shared());
        let mut rx = events.subscribe();
        ledger.add(draft(300_000)).unwrap();
        assert!(rx.try_recv().is_err());

        ledger.add(draft(300_001)).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            AuthEvent::ApprovalCreated { pt: "PT SUMBER JAYA ELPIJI".into() }
        );
    }

    #[test]
    fn test_update_renormalizes_merged_row() {
        let (ledger, _) = setup(MemStore::shared());
        let t = ledger.add(draft(1_000)).unwrap();

        let updated = ledger
            .update(&t.id, TransactionPatch { amount: Some(5_000), desc: Some("koreksi".into()), ..Default::default() })
            .unwrap()
            .unwrap();
        assert_eq!(updated.amount, 5_000);
        assert_eq!(updated.desc, "koreksi");
        assert_eq!(updated.id, t.id);
        assert_eq!(updated.operator, t.operator);
        assert!(updated.affects_cash);
    }

    #[test]
    fn test_update_after_remove_does_not_resurrect() {
        let (ledger, _) = setup(MemStore::shared());
        let t = ledger.add(draft(1_000)).unwrap();

        assert!(ledger.remove(&t.id).unwrap());
        assert!(!ledger.remove(&t.id).unwrap());
        let res = ledger
            .update(&t.id, TransactionPatch { amount: Some(1), ..Default::default() })
            .unwrap();
        assert!(res.is_none());
        assert!(ledger.get(&t.id).unwrap().is_none());
    }

    #[test]
    fn test_migrate_writes_only_when_needed() {
        let store = MemStore::shared();
        store
            .set(
                TRANSACTIONS_KEY,
                r#"[{"id":"old","date":"2024-12-01","pt":"PT SRI JOYO SHAKTI","type":"Keluar",
                     "amount":75000,"paymentMethod":"Cashless"}]"#,
            )
            .unwrap();
        let (ledger, _) = setup(store.clone());

        assert!(ledger.migrate().unwrap());
        assert!(!ledger.migrate().unwrap());
        let t = ledger.get("old").unwrap().unwrap();
        assert_eq!(t.amount, 75_000);
        assert!(!t.affects_cash);
        assert!(store.raw(TRANSACTIONS_KEY).unwrap().contains("\"actorType\":\"pangkalan\""));
    }

    #[test]
    fn test_clear_all_keeps_quarantined_rows() {
        let store = MemStore::shared();
        store
            .set(TRANSACTIONS_KEY, r#"[{"id":"x","date":"rusak"}]"#)
            .unwrap();
        let (ledger, _) = setup(store.clone());
        ledger.add(draft(10)).unwrap();
        ledger.clear_all().unwrap();

        assert!(ledger.list().unwrap().is_empty());
        assert!(store.raw(TRANSACTIONS_KEY).unwrap().contains("rusak"));
    }

    #[test]
    fn test_persistence_failure_propagates() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get().returning(|_| Ok(None));
        mock.expect_set()
            .returning(|key, _| Err(StorageError::QuotaExceeded { key: key.to_string(), needed: 10, limit: 5 }));
        let store: Arc<dyn KeyValueStore> = Arc::new(mock);
        let events = Arc::new(EventBus::default());
        let sessions = Arc::new(SessionStore::new(store.clone(), events.clone()));
        let ledger = TransactionLedger::new(store, sessions, events);

        assert!(matches!(
            ledger.add(draft(10)),
            Err(DomainError::Storage(StorageError::QuotaExceeded { .. }))
        ));
    }

    #[test]
    fn test_amount_ceiling() {
        let (ledger, _) = setup(MemStore::shared());
        assert!(ledger.add(draft(MAX_AMOUNT)).is_ok());
        assert!(matches!(ledger.add(draft(MAX_AMOUNT + 1)), Err(DomainError::Validation(_))));

        let t = ledger.list().unwrap().remove(0);
        let res = ledger.update(&t.id, TransactionPatch { amount: Some(i64::MAX), ..Default::default() });
        assert!(matches!(res, Err(DomainError::Validation(_))));
        assert_eq!(ledger.get(&t.id).unwrap().unwrap().amount, MAX_AMOUNT);
    }

    #[test]
    fn test_category_must_match_direction() {
        let (ledger, _) = setup(MemStore::shared());
        assert!(ledger.add(draft(10).with_category("ATK")).is_ok());
        assert!(matches!(
            ledger.add(draft(10).with_category("Penjualan")),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            ledger.add(draft(10).with_category("Hiburan")),
            Err(DomainError::Validation(_))
        ));

        let t = ledger.add(draft(10)).unwrap();
        let flip = TransactionPatch { type_token: Some("Masuk".into()), ..Default::default() };
        assert!(ledger.update(&t.id, flip).unwrap().is_some());
        let bad = TransactionPatch { category: Some("ATK".into()), ..Default::default() };
        assert!(matches!(ledger.update(&t.id, bad), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_row_without_id_keeps_assigned_id() {
        let store = MemStore::shared();
        let (ledger, _) = setup(store.clone());
        store
            .set(
                TRANSACTIONS_KEY,
                r#"[{"date":"2025-01-10","pt":"PT SRI JOYO SHAKTI","type":"Masuk","amount":5000,
                     "payMethod":"Tunai","affectsCash":true,"actorType":"pangkalan","kind":"penebusan"}]"#,
            )
            .unwrap();

        let first = ledger.list().unwrap()[0].id.clone();
        let second = ledger.list().unwrap()[0].id.clone();
        assert_eq!(first, second);
        assert!(store.raw(TRANSACTIONS_KEY).unwrap().contains(&first));
        assert!(ledger.remove(&first).unwrap());
    }

    #[test]
    fn test_add_many_writes_rows_together() {
        let (ledger, _) = setup(MemStore::shared());
        let added = ledger.add_many(vec![draft(1), draft(2)]).unwrap();
        let rows = ledger.list().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, added[1].id);
        assert_eq!(rows[1].id, added[0].id);

        // One bad draft keeps the whole batch out.
        assert!(ledger.add_many(vec![draft(3), draft(-1)]).is_err());
        assert_eq!(ledger.list().unwrap().len(), 2);
    }

    #[test]
    fn test_add_many_is_a_single_write() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get().returning(|_| Ok(None));
        mock.expect_set()
            .times(1)
            .returning(|key, _| Err(StorageError::QuotaExceeded { key: key.to_string(), needed: 10, limit: 5 }));
        let store: Arc<dyn KeyValueStore> = Arc::new(mock);
        let events = Arc::new(EventBus::default());
        let sessions = Arc::new(SessionStore::new(store.clone(), events.clone()));
        let ledger = TransactionLedger::new(store, sessions, events);

        assert!(matches!(
            ledger.add_many(vec![draft(1), draft(2)]),
            Err(DomainError::Storage(StorageError::QuotaExceeded { .. }))
        ));
    }
}
