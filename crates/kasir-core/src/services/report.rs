// ============================================================================
// Kasir Core - Reports
// File: crates/kasir-core/src/services/report.rs
// Description: Cash-flow day sheet and profit/loss totals over visible rows
// ============================================================================

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Direction, Transaction};

pub const UNCATEGORIZED: &str = "Tanpa Kategori";

#[derive(Debug, Clone, Serialize)]
pub struct CashflowLine {
    pub transaction: Transaction,
    /// Balance after this row.
    pub balance: i64,
}

/// Cash movements of one PT on one day. Sums saturate at the `i64` bounds.
#[derive(Debug, Clone, Serialize)]
pub struct CashflowReport {
    pub pt: String,
    pub date: NaiveDate,
    pub lines: Vec<CashflowLine>,
    pub total_in: i64,
    pub total_out: i64,
    pub balance: i64,
    pub unclassified: usize,
}

impl CashflowReport {
    /// Only rows that move cash count; order is by creation time.
    pub fn build(rows: &[Transaction], pt: &str, date: NaiveDate) -> Self {
        let mut day: Vec<&Transaction> = rows
            .iter()
            .filter(|t| t.affects_cash && t.pt == pt && t.date == date)
            .collect();
        day.sort_by_key(|t| t.created_at_or_zero());

        let mut report = CashflowReport {
            pt: pt.to_string(),
            date,
            lines: Vec::with_capacity(day.len()),
            total_in: 0,
            total_out: 0,
            balance: 0,
            unclassified: 0,
        };

        for t in day {
            match t.direction() {
                Some(Direction::In) => report.total_in = report.total_in.saturating_add(t.amount),
                Some(Direction::Out) => report.total_out = report.total_out.saturating_add(t.amount),
                None => report.unclassified += 1,
            }
            report.balance = report.total_in.saturating_sub(report.total_out);
            report.lines.push(CashflowLine {
                transaction: t.clone(),
                balance: report.balance,
            });
        }
        report
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub revenue: i64,
    pub expenses: i64,
}

/// Profit and loss over every row in range, cash or not.
#[derive(Debug, Clone, Serialize)]
pub struct PnlReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub revenue: i64,
    pub expenses: i64,
    pub net: i64,
    pub by_category: BTreeMap<String, CategoryTotal>,
    /// Rows whose type token is neither in nor out; excluded from all sums.
    pub unclassified: usize,
}

impl PnlReport {
    /// `from` and `to` are inclusive.
    pub fn build(rows: &[Transaction], from: NaiveDate, to: NaiveDate) -> Self {
        let mut report = PnlReport {
            from,
            to,
            revenue: 0,
            expenses: 0,
            net: 0,
            by_category: BTreeMap::new(),
            unclassified: 0,
        };

        for t in rows.iter().filter(|t| t.date >= from && t.date <= to) {
            let Some(direction) = t.direction() else {
                report.unclassified += 1;
                continue;
            };
            let category = if t.category.trim().is_empty() {
                UNCATEGORIZED.to_string()
            } else {
                t.category.clone()
            };
            let slot = report.by_category.entry(category).or_default();
            match direction {
                Direction::In => {
                    report.revenue = report.revenue.saturating_add(t.amount);
                    slot.revenue = slot.revenue.saturating_add(t.amount);
                }
                Direction::Out => {
                    report.expenses = report.expenses.saturating_add(t.amount);
                    slot.expenses = slot.expenses.saturating_add(t.amount);
                }
            }
        }
        report.net = report.revenue.saturating_sub(report.expenses);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionDraft;
    use crate::services::normalizer::normalize;

    const SJE: &str = "PT SUMBER JAYA ELPIJI";

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn row(day: u32, token: &str, amount: i64, method: &str, created_at: i64, category: &str) -> Transaction {
        normalize(
            TransactionDraft::new(d(day), SJE, token, amount)
                .with_payment_method(method)
                .with_created_at(created_at)
                .with_category(category),
        )
    }

    #[test]
    fn test_cashflow_running_balance() {
        let rows = vec![
            row(10, "Keluar", 30_000, "Tunai", 3, "ATK"),
            row(10, "Masuk", 100_000, "Tunai", 1, ""),
            row(10, "Debit", 50_000, "Cashless", 2, ""),
            row(11, "Masuk", 999, "Tunai", 1, ""),
            row(10, "transfer", 5, "Tunai", 4, ""),
        ];
        let r = CashflowReport::build(&rows, SJE, d(10));

        let balances: Vec<i64> = r.lines.iter().map(|l| l.balance).collect();
        assert_eq!(balances, vec![100_000, 70_000, 70_000]);
        assert_eq!(r.total_in, 100_000);
        assert_eq!(r.total_out, 30_000);
        assert_eq!(r.unclassified, 1);
    }

    #[test]
    fn test_pnl_counts_every_row_in_range() {
        let rows = vec![
            row(10, "Masuk", 100_000, "Cashless", 1, "Penjualan"),
            row(12, "income", 20_000, "Tunai", 1, "Penjualan"),
            row(12, "Kredit", 30_000, "Tunai", 1, "ATK"),
            row(15, "Keluar", 1_000, "Tunai", 1, "ATK"),
            row(12, "???", 7, "Tunai", 1, "ATK"),
        ];
        let r = PnlReport::build(&rows, d(10), d(12));

        assert_eq!(r.revenue, 120_000);
        assert_eq!(r.expenses, 30_000);
        assert_eq!(r.net, 90_000);
        assert_eq!(r.unclassified, 1);
        assert_eq!(r.by_category["Penjualan"].revenue, 120_000);
        assert_eq!(r.by_category["ATK"].expenses, 30_000);
    }

    #[test]
    fn test_huge_amounts_saturate() {
        let half = i64::MAX / 2 + 1;
        let rows = vec![
            row(10, "Masuk", half, "Tunai", 1, ""),
            row(10, "Masuk", half, "Tunai", 2, ""),
            row(10, "Keluar", half, "Tunai", 3, ""),
        ];
        let pnl = PnlReport::build(&rows, d(10), d(10));
        assert_eq!(pnl.revenue, i64::MAX);
        assert_eq!(pnl.by_category[UNCATEGORIZED].revenue, i64::MAX);
        assert_eq!(pnl.net, i64::MAX - half);

        let cash = CashflowReport::build(&rows, SJE, d(10));
        assert_eq!(cash.total_in, i64::MAX);
        assert_eq!(cash.lines[1].balance, i64::MAX);
    }
}
