use anyhow::{bail, Context};
use kasir_core::domain::category::categories_for;
use kasir_core::services::{record_other_income, GateDecision, OtherIncomeEntry, SaleEntry};
use kasir_core::{AppContext, Direction, SessionUser, Transaction, TransactionDraft, UserForm};
use kasir_shared::constants::{is_known_pt, pt_by_tag, MASTER_USERNAME};
use kasir_shared::ms_to_datetime;
use tracing::info;

use crate::{ApprovalCommands, AuditCommands, ReportCommands, SalesCommands, TxnCommands, UserCommands};

/// Run the gate for `route` and hand back the session user.
fn authorize(ctx: &AppContext, route: &str) -> anyhow::Result<SessionUser> {
    match ctx.gate.check_path(route)? {
        GateDecision::Authorized { user } => Ok(user),
        GateDecision::Unauthenticated { .. } => bail!("Belum login. Jalankan `kasir login` dulu"),
        GateDecision::MissingFeature { feature } => bail!("Akses ditolak: fitur {} tidak aktif", feature),
        GateDecision::ForbiddenRole { role } => bail!("Akses ditolak: khusus {}", role),
    }
}

/// Accepts a short tag ("SJE") or the full PT name.
fn resolve_pt(arg: &str) -> anyhow::Result<String> {
    let arg = arg.trim();
    if let Some(pt) = pt_by_tag(arg) {
        return Ok(pt.full_name.to_string());
    }
    if is_known_pt(arg) {
        return Ok(arg.to_string());
    }
    bail!("PT tidak dikenal: {}", arg)
}

fn resolve_pts(args: &[String]) -> anyhow::Result<Vec<String>> {
    args.iter().map(|a| resolve_pt(a)).collect()
}

fn print_row(t: &Transaction) {
    println!(
        "{}  {}  {:<24} {:<6} {:>12}  {:<9} {:<10} {}",
        t.id,
        t.date,
        t.pt,
        t.type_token,
        t.amount,
        t.pay_method,
        t.approval.status().as_str(),
        t.desc
    );
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn seed(ctx: &AppContext) -> anyhow::Result<()> {
    let users = ctx.admin.list_users()?;
    let master = users
        .iter()
        .find(|u| u.username_matches(MASTER_USERNAME))
        .context("Master account missing after seeding")?;
    println!("Master account '{}' ready ({} user(s) total)", master.username, users.len());
    Ok(())
}

pub fn login(ctx: &AppContext, username: &str, password: &str) -> anyhow::Result<()> {
    let user = ctx.sessions.login(username, password)?;
    println!("Logged in as {} ({})", user.display_name(), user.username);
    if user.must_change_password {
        println!("Password must be changed: run `kasir passwd`");
    }
    Ok(())
}

pub fn logout(ctx: &AppContext) -> anyhow::Result<()> {
    ctx.sessions.logout()?;
    println!("Logged out");
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> anyhow::Result<()> {
    let Some(user) = ctx.sessions.current_user()? else {
        println!("Not logged in");
        return Ok(());
    };
    let features = ctx.features.active_features(&user)?;
    let pts = ctx.gate.allowed_pts()?;

    println!("{} ({})", user.display_name(), user.username);
    if !user.job_title.is_empty() {
        println!("Jabatan : {}", user.job_title);
    }
    println!("Fitur   : {}", features.into_iter().collect::<Vec<_>>().join(", "));
    println!("PT      : {}", pts.join(", "));
    Ok(())
}

pub fn passwd(ctx: &AppContext, old: &str, new: &str) -> anyhow::Result<()> {
    ctx.sessions.change_password(old, new)?;
    println!("Password changed");
    Ok(())
}

pub fn users(ctx: &AppContext, cmd: UserCommands) -> anyhow::Result<()> {
    let actor = authorize(ctx, "/admin/users")?;

    match cmd {
        UserCommands::List => {
            for u in ctx.admin.list_users()? {
                println!(
                    "{}  {:<12} {:<24} {:<20} {}  PT: {}",
                    u.id,
                    u.username,
                    u.name,
                    u.job_title,
                    if u.active { "aktif   " } else { "nonaktif" },
                    u.pt_access.join(", ")
                );
            }
        }
        UserCommands::Create { name, username, password, title, features, pts } => {
            let form = UserForm {
                name,
                username,
                password: Some(password),
                job_title: title,
                features,
                pt_access: resolve_pts(&pts)?,
                ..Default::default()
            };
            let user = ctx.admin.upsert_user(form, &actor.username)?;
            println!("Created {} ({})", user.username, user.id);
        }
        UserCommands::SetActive { id, active } => {
            let user = ctx.admin.set_active(&id, active, &actor.username)?;
            println!("{} is now {}", user.username, if user.active { "active" } else { "inactive" });
        }
        UserCommands::ResetPassword { id } => {
            let temp = ctx.admin.reset_password(&id, &actor.username)?;
            println!("Temporary password: {}", temp);
        }
        UserCommands::Delete { id } => {
            let user = ctx.admin.delete_user(&id, &actor.username)?;
            println!("Deleted {}", user.username);
        }
    }
    Ok(())
}

pub fn txn(ctx: &AppContext, cmd: TxnCommands) -> anyhow::Result<()> {
    match cmd {
        TxnCommands::Add { date, pt, type_token, amount, desc, category, method, affects_cash } => {
            authorize(ctx, "/entri-penjualan")?;
            let pt = resolve_pt(&pt)?;
            if !ctx.gate.allowed_pts()?.contains(&pt) {
                bail!("Akses ditolak: {} di luar akses PT Anda", pt);
            }
            let mut draft = TransactionDraft::new(date, pt, type_token, amount)
                .with_desc(desc)
                .with_category(category)
                .with_payment_method(method);
            if let Some(flag) = affects_cash {
                draft = draft.with_affects_cash(flag);
            }
            let t = ctx.ledger.add(draft)?;
            print_row(&t);
            if t.needs_approval() {
                println!("Menunggu persetujuan direktur");
            }
        }
        TxnCommands::OtherIncome { date, pt, subject, gross, tax_percent, method } => {
            authorize(ctx, "/pendapatan-lain")?;
            let pt = resolve_pt(&pt)?;
            if !ctx.gate.allowed_pts()?.contains(&pt) {
                bail!("Akses ditolak: {} di luar akses PT Anda", pt);
            }
            let entry = OtherIncomeEntry {
                date,
                pt,
                subject,
                gross,
                tax_percent,
                payment_method: method,
            };
            let record = record_other_income(&ctx.ledger, entry)?;
            print_row(&record.income);
            print_row(&record.tax);
            println!("Kas bersih: {}", record.net_cash);
        }
        TxnCommands::List { pt } => {
            authorize(ctx, "/arus-kas-kecil")?;
            let filter = if pt.is_empty() { None } else { Some(resolve_pts(&pt)?) };
            let rows = ctx.gate.visible_rows(ctx.ledger.list()?, filter.as_deref())?;
            for t in &rows {
                print_row(t);
            }
        }
        TxnCommands::Remove { id } => {
            authorize(ctx, "/entri-penjualan")?;
            let visible = ctx.gate.visible_rows(ctx.ledger.list()?, None)?;
            if !visible.iter().any(|t| t.id == id) {
                bail!("Transaksi {} tidak ditemukan", id);
            }
            ctx.ledger.remove(&id)?;
            info!("Removed ledger row {} from the command line", id);
            println!("Removed {}", id);
        }
        TxnCommands::Categories { type_token } => {
            let direction = Direction::parse(&type_token)
                .with_context(|| format!("Tipe tidak dikenal: {}", type_token))?;
            for c in categories_for(direction) {
                println!("{}", c.name);
            }
        }
    }
    Ok(())
}

pub fn sales(ctx: &AppContext, cmd: SalesCommands) -> anyhow::Result<()> {
    match cmd {
        SalesCommands::Products => {
            authorize(ctx, "/entri-penjualan")?;
            for p in ctx.sales.products()? {
                println!("{:<16} {:<20} {:>10}", p.id, p.name, p.price);
            }
        }
        SalesCommands::SetPrice { id, price } => {
            authorize(ctx, "/admin")?;
            let p = ctx.sales.update_product_price(&id, price)?;
            println!("{} now {}", p.name, p.price);
        }
        SalesCommands::Add { date, pt, product, qty, buyer, method } => {
            authorize(ctx, "/entri-penjualan")?;
            let pt = resolve_pt(&pt)?;
            if !ctx.gate.allowed_pts()?.contains(&pt) {
                bail!("Akses ditolak: {} di luar akses PT Anda", pt);
            }
            let sale = ctx.sales.record_sale(SaleEntry {
                date,
                pt,
                product_id: product,
                quantity: qty,
                buyer,
                payment_method: method,
            })?;
            print_row(&sale);
        }
        SalesCommands::Summary { date } => {
            authorize(ctx, "/entri-penjualan")?;
            let summary = ctx.sales_summary(date)?;
            println!("Total: {}  Transaksi: {}  PPN: {}", summary.total, summary.count, summary.ppn);
            for t in &summary.sales {
                print_row(t);
            }
        }
    }
    Ok(())
}

pub fn report(ctx: &AppContext, cmd: ReportCommands) -> anyhow::Result<()> {
    match cmd {
        ReportCommands::Cashflow { pt, date } => {
            authorize(ctx, "/arus-kas-kecil")?;
            let report = ctx.cashflow_report(&resolve_pt(&pt)?, date)?;
            print_json(&report)
        }
        ReportCommands::Pnl { from, to, pt } => {
            authorize(ctx, "/laba-rugi")?;
            let filter = if pt.is_empty() { None } else { Some(resolve_pts(&pt)?) };
            let report = ctx.pnl_report(from, to, filter.as_deref())?;
            print_json(&report)
        }
    }
}

pub fn approvals(ctx: &AppContext, cmd: ApprovalCommands) -> anyhow::Result<()> {
    let reviewer = authorize(ctx, "/approval")?;

    match cmd {
        ApprovalCommands::List { all } => {
            for t in ctx.approvals.queue(!all)? {
                print_row(&t);
            }
        }
        ApprovalCommands::Approve { id } => match ctx.approvals.approve(&id, reviewer.display_name())? {
            Some(t) => print_row(&t),
            None => bail!("Transaksi {} tidak ditemukan", id),
        },
        ApprovalCommands::Reject { id } => match ctx.approvals.reject(&id, reviewer.display_name())? {
            Some(t) => print_row(&t),
            None => bail!("Transaksi {} tidak ditemukan", id),
        },
    }
    Ok(())
}

pub fn audit(ctx: &AppContext, cmd: AuditCommands) -> anyhow::Result<()> {
    authorize(ctx, "/admin/audit")?;

    match cmd {
        AuditCommands::List => {
            for entry in ctx.admin.audit_log()? {
                println!(
                    "{}  {:<15} actor={} target={} user={}",
                    ms_to_datetime(entry.ts)
                        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| entry.ts.to_string()),
                    entry.action.as_str(),
                    entry.actor.as_deref().unwrap_or("-"),
                    entry.target.as_deref().unwrap_or("-"),
                    entry.username.as_deref().unwrap_or("-"),
                );
            }
        }
        AuditCommands::Clear => {
            ctx.admin.clear_audit_log()?;
            println!("Audit log cleared");
        }
    }
    Ok(())
}
