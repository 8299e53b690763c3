//! Ledger category catalog

use super::direction::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub direction: Direction,
}

pub const OTHER_INCOME_CATEGORY: &str = "Pendapatan Lain - Lain";
pub const TAX_EXPENSE_CATEGORY: &str = "Beban Pajak & Fee Konsultan Pajak";
/// Written by the sales entry screen.
pub const SALES_CATEGORY: &str = "Penjualan";

const fn income(name: &'static str) -> Category {
    Category { name, direction: Direction::In }
}

const fn expense(name: &'static str) -> Category {
    Category { name, direction: Direction::Out }
}

pub const CATEGORY_LIST: [Category; 19] = [
    // Pendapatan
    income("Penjualan Gas LPG 3Kg"),
    income(OTHER_INCOME_CATEGORY),
    income("Transport Fee"),
    // Biaya & beban
    expense("HPP Gas LPG 3Kg"),
    expense("Beban Gaji Karyawan"),
    expense(TAX_EXPENSE_CATEGORY),
    expense("Angsuran: Sewa Tabung"),
    expense("Angsuran: Sewa Truk"),
    expense("Angsuran: BPJS TK"),
    expense("Angsuran: Pak Dwi"),
    expense("Angsuran: Perorangan"),
    expense("Angsuran: Keluarga Alm P Daniel"),
    expense("Dana Khusus Bu Ulfa Sekeluarga"),
    expense("Pengeluaran Lain-lain"),
    expense("Pengeluaran Kasbon"),
    expense("Biaya Operasional"),
    // legacy
    income(SALES_CATEGORY),
    expense("ATK"),
    expense("Umum"),
];

pub fn find_category(name: &str) -> Option<&'static Category> {
    CATEGORY_LIST.iter().find(|c| c.name == name)
}

pub fn categories_for(direction: Direction) -> impl Iterator<Item = &'static Category> {
    CATEGORY_LIST.iter().filter(move |c| c.direction == direction)
}

/// A blank category is allowed and reported as uncategorized. Anything else
/// must be in the catalog under the same direction as the row.
pub fn check_category(name: &str, direction: Direction) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(());
    }
    match find_category(name) {
        None => Err(format!("Kategori tidak dikenal: {}", name)),
        Some(c) if c.direction != direction => Err(format!(
            "Kategori {} hanya untuk transaksi {}",
            name,
            c.direction.as_token()
        )),
        Some(_) => Ok(()),
    }
}
