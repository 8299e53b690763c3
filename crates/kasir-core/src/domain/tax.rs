//! PPN (value added tax) arithmetic

use serde::{Deserialize, Serialize};

pub use kasir_shared::constants::PPN_RATE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrossSplit {
    pub dpp: i64,
    pub ppn: i64,
}

/// Tax facts recorded alongside a row for later audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxMeta {
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default, alias = "bruto")]
    pub gross: i64,
    #[serde(default, alias = "pajak")]
    pub tax: i64,
    #[serde(default, alias = "netCash")]
    pub net: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpp: Option<i64>,
}

fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Split a PPN-inclusive amount into base (DPP) and tax.
pub fn split_ppn_from_gross(gross: i64, rate: f64) -> GrossSplit {
    let dpp = round_half_up(gross as f64 / (1.0 + rate));
    GrossSplit { dpp, ppn: gross - dpp }
}

impl TaxMeta {
    /// Facts for a PPN-inclusive sale: `net` and `dpp` both hold the base.
    pub fn ppn_inclusive(gross: i64) -> Self {
        let GrossSplit { dpp, ppn } = split_ppn_from_gross(gross, PPN_RATE);
        Self {
            tax_rate: PPN_RATE,
            gross,
            tax: ppn,
            net: dpp,
            dpp: Some(dpp),
        }
    }
}

/// Tax withheld from an income amount at `percent` (e.g. `2.5` for 2.5%).
/// Negative rates count as zero.
pub fn withheld_tax(gross: i64, percent: f64) -> i64 {
    let rate = percent / 100.0;
    if rate > 0.0 {
        round_half_up(gross as f64 * rate)
    } else {
        0
    }
}
