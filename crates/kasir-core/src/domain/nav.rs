//! Navigation targets and what each one requires

use super::feature::Feature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub label: &'static str,
    pub feature: Option<Feature>,
    pub role: Option<&'static str>,
}

const fn feature_route(path: &'static str, label: &'static str, feature: Feature) -> Route {
    Route { path, label, feature: Some(feature), role: None }
}

const fn session_route(path: &'static str, label: &'static str) -> Route {
    Route { path, label, feature: None, role: None }
}

pub const ROUTES: [Route; 11] = [
    feature_route("/dashboard", "Beranda Utama", Feature::DashboardView),
    feature_route("/arus-kas-kecil", "Arus Kas Kecil", Feature::CashflowView),
    feature_route("/entri-penjualan", "Entri Penjualan", Feature::SalesEntry),
    feature_route("/pendapatan-lain", "Pendapatan Lain-lain", Feature::OtherIncome),
    feature_route("/laba-rugi", "Laba Rugi", Feature::PnlView),
    feature_route("/approval", "Persetujuan", Feature::ApprovalReview),
    feature_route("/admin", "Panel Admin", Feature::AdminPanel),
    feature_route("/admin/users", "Kelola Users", Feature::AdminUsers),
    feature_route("/admin/audit", "Audit Log", Feature::AdminAudit),
    session_route("/profile", "Profil"),
    session_route("/change-password", "Ganti Password"),
];

pub fn find_route(path: &str) -> Option<&'static Route> {
    let path = path.trim_end_matches('/');
    ROUTES.iter().find(|r| r.path == path)
}
