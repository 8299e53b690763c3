//! Other income: a gross income row plus its withheld tax as an expense row

use chrono::NaiveDate;
use kasir_shared::constants::is_known_pt;
use kasir_shared::now_ms;
use tracing::info;

use crate::domain::category::{OTHER_INCOME_CATEGORY, TAX_EXPENSE_CATEGORY};
use crate::domain::tax::withheld_tax;
use crate::domain::transaction::{ACTOR_INTERNAL, KIND_OTHER_INCOME, KIND_OTHER_INCOME_TAX};
use crate::domain::{Direction, TaxMeta, Transaction, TransactionDraft};
use crate::error::DomainError;
use crate::services::ledger::{validate_amount, TransactionLedger};
use crate::services::normalizer::is_cash_method;

#[derive(Debug, Clone)]
pub struct OtherIncomeEntry {
    pub date: NaiveDate,
    pub pt: String,
    pub subject: String,
    /// Amount before tax.
    pub gross: i64,
    /// Withholding rate in percent, e.g. `2.0`.
    pub tax_percent: f64,
    pub payment_method: String,
}

#[derive(Debug, Clone)]
pub struct OtherIncomeRecord {
    pub income: Transaction,
    pub tax: Transaction,
    pub net_cash: i64,
}

/// The income row counts toward cash only when paid in cash; the tax row
/// never does, since the tax was withheld at source.
pub fn record_other_income(
    ledger: &TransactionLedger,
    entry: OtherIncomeEntry,
) -> Result<OtherIncomeRecord, DomainError> {
    let subject = entry.subject.trim();
    if subject.is_empty() {
        return Err(DomainError::Validation("Subjek wajib diisi".to_string()));
    }
    if entry.gross <= 0 {
        return Err(DomainError::Validation("Nominal bruto harus > 0".to_string()));
    }
    validate_amount(entry.gross)?;
    if !entry.tax_percent.is_finite() || !(0.0..=100.0).contains(&entry.tax_percent) {
        return Err(DomainError::Validation("Persentase pajak harus 0 - 100".to_string()));
    }
    if !is_known_pt(&entry.pt) {
        return Err(DomainError::Validation(format!("PT tidak dikenal: {}", entry.pt)));
    }

    let tax = withheld_tax(entry.gross, entry.tax_percent);
    let net_cash = entry.gross - tax;
    let meta = TaxMeta {
        tax_rate: entry.tax_percent / 100.0,
        gross: entry.gross,
        tax,
        net: net_cash,
        dpp: None,
    };
    let now = now_ms();

    // Same cash rule as every other ledger row, so "cash" counts too.
    let mut income = TransactionDraft::new(entry.date, entry.pt.clone(), Direction::In.as_token(), entry.gross)
        .with_desc(subject)
        .with_category(OTHER_INCOME_CATEGORY)
        .with_affects_cash(is_cash_method(&entry.payment_method))
        .with_classification(ACTOR_INTERNAL, KIND_OTHER_INCOME)
        .with_created_at(now)
        .with_meta(meta.clone());
    income.pay_method = Some(entry.payment_method.clone());

    let mut tax_row = TransactionDraft::new(entry.date, entry.pt, Direction::Out.as_token(), tax)
        .with_desc(format!("Pajak pendapatan lain-lain • {}", subject))
        .with_category(TAX_EXPENSE_CATEGORY)
        .with_affects_cash(false)
        .with_classification(ACTOR_INTERNAL, KIND_OTHER_INCOME_TAX)
        .with_created_at(now + 1)
        .with_meta(meta);
    tax_row.pay_method = Some(entry.payment_method);

    let mut rows = ledger.add_many(vec![income, tax_row])?.into_iter();
    let (Some(income), Some(tax)) = (rows.next(), rows.next()) else {
        return Err(DomainError::Validation("Pasangan transaksi tidak lengkap".to_string()));
    };

    info!(
        gross = income.amount,
        tax = tax.amount,
        net_cash,
        "Recorded other income for {}",
        income.pt
    );
    Ok(OtherIncomeRecord { income, tax, net_cash })
}
