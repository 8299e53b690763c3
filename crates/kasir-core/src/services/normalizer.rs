// ============================================================================
// Kasir Core - Transaction Normalizer
// File: crates/kasir-core/src/services/normalizer.rs
// Description: Derives the canonical fields every report aggregates on
// ============================================================================

use kasir_shared::constants::DEFAULT_PAY_METHOD;
use kasir_shared::new_id;

use crate::domain::transaction::{ACTOR_PANGKALAN, KIND_PENEBUSAN};
use crate::domain::{Transaction, TransactionDraft};

/// `Tunai` and `cash` in any case move physical cash.
pub fn is_cash_method(method: &str) -> bool {
    let method = method.trim();
    method.eq_ignore_ascii_case("tunai") || method.eq_ignore_ascii_case("cash")
}

/// Produce a canonical row from a raw payload.
///
/// Values the caller set explicitly always win over derived ones, so the
/// function is idempotent: a normalized row normalizes to itself.
pub fn normalize(draft: TransactionDraft) -> Transaction {
    let TransactionDraft {
        id,
        date,
        pt,
        desc,
        category,
        type_token,
        amount,
        operator,
        created_at,
        payment_method,
        pay_method,
        affects_cash,
        actor_type,
        kind,
        meta,
        approval,
        extra,
    } = draft;

    let derived_method = payment_method
        .clone()
        .or_else(|| pay_method.clone())
        .unwrap_or_else(|| DEFAULT_PAY_METHOD.to_string());
    let is_cash = is_cash_method(&derived_method);

    Transaction {
        id: id.unwrap_or_else(new_id),
        date,
        pt,
        desc,
        category,
        type_token,
        amount,
        operator: operator.unwrap_or_default(),
        created_at,
        pay_method: pay_method.unwrap_or(derived_method),
        payment_method,
        affects_cash: affects_cash.unwrap_or(is_cash),
        actor_type: actor_type.unwrap_or_else(|| ACTOR_PANGKALAN.to_string()),
        kind: kind.unwrap_or_else(|| KIND_PENEBUSAN.to_string()),
        meta,
        approval,
        extra,
    }
}

#[derive(Debug)]
pub struct Migration {
    pub rows: Vec<Transaction>,
    /// True when at least one row gained a derived field and should be saved.
    pub changed: bool,
}

/// Re-normalize historic rows that predate the canonical fields. Amounts,
/// dates and existing ids are carried through untouched.
pub fn migrate_if_needed(drafts: Vec<TransactionDraft>) -> Migration {
    let changed = drafts
        .iter()
        .any(|d| d.id.is_none() || d.lacks_canonical_fields());
    let rows = drafts.into_iter().map(normalize).collect();
    Migration { rows, changed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draft(method: Option<&str>) -> TransactionDraft {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let mut d = TransactionDraft::new(date, "PT SUMBER JAYA ELPIJI", "Keluar", 500_000);
        d.payment_method = method.map(str::to_string);
        d
    }

    #[test]
    fn test_cash_methods_affect_cash() {
        for m in ["Tunai", "tunai", "CASH", "Cash"] {
            assert!(normalize(draft(Some(m))).affects_cash, "{m}");
        }
        for m in ["Cashless", "Transfer", "QRIS", ""] {
            assert!(!normalize(draft(Some(m))).affects_cash, "{m}");
        }
        assert!(normalize(draft(None)).affects_cash);
    }

    #[test]
    fn test_explicit_affects_cash_wins() {
        let t = normalize(draft(Some("Tunai")).with_affects_cash(false));
        assert!(!t.affects_cash);
    }

    #[test]
    fn test_payment_method_preferred_for_cash_check() {
        let mut d = draft(Some("Cashless"));
        d.pay_method = Some("Tunai".into());
        let t = normalize(d);
        assert!(!t.affects_cash);
        assert_eq!(t.pay_method, "Tunai");
    }

    #[test]
    fn test_default_classification() {
        let t = normalize(draft(None));
        assert_eq!(t.actor_type, ACTOR_PANGKALAN);
        assert_eq!(t.kind, KIND_PENEBUSAN);
        assert_eq!(t.pay_method, DEFAULT_PAY_METHOD);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for m in [Some("Tunai"), Some("Cashless"), None] {
            let once = normalize(draft(m));
            let twice = normalize(TransactionDraft::from(once.clone()));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_migration_preserves_amount_date_id() {
        let mut old = draft(Some("Cashless"));
        old.id = Some("legacy-1".into());
        let mut complete = TransactionDraft::from(normalize(draft(None)));
        complete.amount = 42;

        let m = migrate_if_needed(vec![old.clone(), complete.clone()]);
        assert!(m.changed);
        assert_eq!(m.rows[0].id, "legacy-1");
        assert_eq!(m.rows[0].amount, old.amount);
        assert_eq!(m.rows[0].date, old.date);
        assert_eq!(m.rows[1].amount, 42);

        let again = migrate_if_needed(m.rows.into_iter().map(TransactionDraft::from).collect());
        assert!(!again.changed);
    }
}
