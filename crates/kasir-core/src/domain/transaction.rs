// ============================================================================
// Kasir Core - Transaction Entity
// File: crates/kasir-core/src/domain/transaction.rs
// Description: Ledger row, raw draft and partial patch
// ============================================================================

use chrono::NaiveDate;
use kasir_shared::constants::NEED_APPROVAL_LIMIT;
use kasir_shared::{EntityId, TimestampMs};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::direction::Direction;
use super::tax::TaxMeta;

pub const ACTOR_PANGKALAN: &str = "pangkalan";
pub const ACTOR_INTERNAL: &str = "internal";

pub const KIND_PENEBUSAN: &str = "penebusan";
pub const KIND_OTHER_INCOME: &str = "other_income";
pub const KIND_OTHER_INCOME_TAX: &str = "other_income_tax";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

/// Director sign-off on a large cash expense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<TimestampMs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<TimestampMs>,
}

impl Approval {
    pub fn status(&self) -> ApprovalStatus {
        self.approval_status.unwrap_or_default()
    }
}

/// Canonical ledger row. Every field the reports rely on is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: EntityId,
    pub date: NaiveDate,
    pub pt: String,
    pub desc: String,
    pub category: String,
    /// Historic in/out token as written; see [`Transaction::direction`].
    #[serde(rename = "type")]
    pub type_token: String,
    pub amount: i64,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<TimestampMs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub pay_method: String,
    pub affects_cash: bool,
    pub actor_type: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<TaxMeta>,
    #[serde(flatten)]
    pub approval: Approval,
    /// Fields this crate does not model, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    pub fn direction(&self) -> Option<Direction> {
        Direction::parse(&self.type_token)
    }

    /// Large cash expenses wait for a director's decision.
    pub fn needs_approval(&self) -> bool {
        self.affects_cash
            && self.direction() == Some(Direction::Out)
            && self.amount > NEED_APPROVAL_LIMIT
    }

    pub fn created_at_or_zero(&self) -> TimestampMs {
        self.created_at.unwrap_or(0)
    }
}

/// Raw payload as handed in by an entry form or read from an older blob.
/// Canonical fields are optional here; the normalizer fills them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub date: NaiveDate,
    #[serde(default)]
    pub pt: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type", default)]
    pub type_token: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub created_at: Option<TimestampMs>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub pay_method: Option<String>,
    #[serde(default)]
    pub affects_cash: Option<bool>,
    #[serde(default)]
    pub actor_type: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub meta: Option<TaxMeta>,
    #[serde(flatten)]
    pub approval: Approval,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransactionDraft {
    pub fn new(date: NaiveDate, pt: impl Into<String>, type_token: impl Into<String>, amount: i64) -> Self {
        Self {
            id: None,
            date,
            pt: pt.into(),
            desc: String::new(),
            category: String::new(),
            type_token: type_token.into(),
            amount,
            operator: None,
            created_at: None,
            payment_method: None,
            pay_method: None,
            affects_cash: None,
            actor_type: None,
            kind: None,
            meta: None,
            approval: Approval::default(),
            extra: Map::new(),
        }
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_affects_cash(mut self, affects_cash: bool) -> Self {
        self.affects_cash = Some(affects_cash);
        self
    }

    pub fn with_classification(mut self, actor_type: &str, kind: &str) -> Self {
        self.actor_type = Some(actor_type.to_string());
        self.kind = Some(kind.to_string());
        self
    }

    pub fn with_created_at(mut self, ts: TimestampMs) -> Self {
        self.created_at = Some(ts);
        self
    }

    pub fn with_meta(mut self, meta: TaxMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// True when any field the reports depend on was never derived.
    pub fn lacks_canonical_fields(&self) -> bool {
        self.actor_type.is_none()
            || self.kind.is_none()
            || self.pay_method.is_none()
            || self.affects_cash.is_none()
    }

    pub fn apply(&mut self, patch: TransactionPatch) {
        let TransactionPatch {
            date,
            pt,
            desc,
            category,
            type_token,
            amount,
            payment_method,
            pay_method,
            affects_cash,
            actor_type,
            kind,
            meta,
            approval_status,
            approved_by,
            approved_at,
            rejected_by,
            rejected_at,
        } = patch;

        if let Some(v) = date { self.date = v; }
        if let Some(v) = pt { self.pt = v; }
        if let Some(v) = desc { self.desc = v; }
        if let Some(v) = category { self.category = v; }
        if let Some(v) = type_token { self.type_token = v; }
        if let Some(v) = amount { self.amount = v; }
        if payment_method.is_some() { self.payment_method = payment_method; }
        if pay_method.is_some() { self.pay_method = pay_method; }
        if affects_cash.is_some() { self.affects_cash = affects_cash; }
        if actor_type.is_some() { self.actor_type = actor_type; }
        if kind.is_some() { self.kind = kind; }
        if meta.is_some() { self.meta = meta; }
        if approval_status.is_some() { self.approval.approval_status = approval_status; }
        if approved_by.is_some() { self.approval.approved_by = approved_by; }
        if approved_at.is_some() { self.approval.approved_at = approved_at; }
        if rejected_by.is_some() { self.approval.rejected_by = rejected_by; }
        if rejected_at.is_some() { self.approval.rejected_at = rejected_at; }
    }
}

impl From<Transaction> for TransactionDraft {
    fn from(t: Transaction) -> Self {
        Self {
            id: Some(t.id),
            date: t.date,
            pt: t.pt,
            desc: t.desc,
            category: t.category,
            type_token: t.type_token,
            amount: t.amount,
            operator: Some(t.operator),
            created_at: t.created_at,
            payment_method: t.payment_method,
            pay_method: Some(t.pay_method),
            affects_cash: Some(t.affects_cash),
            actor_type: Some(t.actor_type),
            kind: Some(t.kind),
            meta: t.meta,
            approval: t.approval,
            extra: t.extra,
        }
    }
}

/// Fields an edit may change. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransactionPatch {
    pub date: Option<NaiveDate>,
    pub pt: Option<String>,
    pub desc: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub type_token: Option<String>,
    pub amount: Option<i64>,
    pub payment_method: Option<String>,
    pub pay_method: Option<String>,
    pub affects_cash: Option<bool>,
    pub actor_type: Option<String>,
    pub kind: Option<String>,
    pub meta: Option<TaxMeta>,
    pub approval_status: Option<ApprovalStatus>,
    pub approved_by: Option<String>,
    pub approved_at: Option<TimestampMs>,
    pub rejected_by: Option<String>,
    pub rejected_at: Option<TimestampMs>,
}
