mod commands;

use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use kasir_core::repositories::KeyValueStore;
use kasir_core::AppContext;
use kasir_infrastructure::FileStore;
use kasir_shared::config::AppConfig;
use kasir_shared::telemetry::init_telemetry;
use tracing::debug;

#[derive(Parser)]
#[command(name = "kasir")]
#[command(about = "Cashier ledger and access control for the PT group")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory; overrides storage.data_dir from configuration
    #[arg(short, long, env = "KASIR_DATA_DIR")]
    data_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the master account and migrate stored data
    Seed,
    /// Open a session
    Login {
        username: String,
        #[arg(long, env = "KASIR_PASSWORD")]
        password: String,
    },
    /// Close the current session
    Logout,
    /// Show the logged-in user with resolved features and PTs
    Whoami,
    /// Change the password of the logged-in user
    Passwd {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },
    /// Manage the user directory
    #[command(subcommand)]
    Users(UserCommands),
    /// Ledger rows
    #[command(subcommand)]
    Txn(TxnCommands),
    /// Product catalog and sales entry
    #[command(subcommand)]
    Sales(SalesCommands),
    /// Cash-flow and profit/loss reports
    #[command(subcommand)]
    Report(ReportCommands),
    /// Expenses waiting for director sign-off
    #[command(subcommand)]
    Approvals(ApprovalCommands),
    /// Audit log
    #[command(subcommand)]
    Audit(AuditCommands),
}

#[derive(Subcommand)]
enum UserCommands {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        title: String,
        /// Comma-separated feature codes
        #[arg(long, value_delimiter = ',')]
        features: Vec<String>,
        /// Comma-separated PT tags or full names
        #[arg(long, value_delimiter = ',')]
        pts: Vec<String>,
    },
    SetActive {
        id: String,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    ResetPassword {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum TxnCommands {
    Add {
        #[arg(long)]
        date: NaiveDate,
        /// PT tag or full name
        #[arg(long)]
        pt: String,
        /// Masuk or Keluar (historic synonyms accepted)
        #[arg(long = "type")]
        type_token: String,
        #[arg(long)]
        amount: i64,
        #[arg(long, default_value = "")]
        desc: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "Tunai")]
        method: String,
        /// Override the cash flag derived from the payment method
        #[arg(long)]
        affects_cash: Option<bool>,
    },
    /// Record other income with its withheld tax
    OtherIncome {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        pt: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        gross: i64,
        #[arg(long, default_value_t = 2.0)]
        tax_percent: f64,
        #[arg(long, default_value = "Tunai")]
        method: String,
    },
    List {
        /// Narrow to these PTs (tags or full names)
        #[arg(long, value_delimiter = ',')]
        pt: Vec<String>,
    },
    Remove {
        id: String,
    },
    /// Category catalog for one direction
    Categories {
        /// Masuk or Keluar
        #[arg(long = "type")]
        type_token: String,
    },
}

#[derive(Subcommand)]
enum SalesCommands {
    Products,
    /// Change a product's unit price
    SetPrice {
        id: String,
        price: i64,
    },
    /// Record a product sale
    Add {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        pt: String,
        #[arg(long, default_value = "prod-lpg-3kg")]
        product: String,
        #[arg(long)]
        qty: u32,
        #[arg(long, default_value = "")]
        buyer: String,
        #[arg(long, default_value = "Tunai")]
        method: String,
    },
    /// Totals and rows for one day
    Summary {
        #[arg(long)]
        date: NaiveDate,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    Cashflow {
        #[arg(long)]
        pt: String,
        #[arg(long)]
        date: NaiveDate,
    },
    Pnl {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(long, value_delimiter = ',')]
        pt: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ApprovalCommands {
    List {
        /// Include approved and rejected rows
        #[arg(long)]
        all: bool,
    },
    Approve {
        id: String,
    },
    Reject {
        id: String,
    },
}

#[derive(Subcommand)]
enum AuditCommands {
    List,
    Clear,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }

    let _guard = init_telemetry(&config.logging)?;

    let file_store = FileStore::from_settings(&config.storage)?;
    debug!("Using data directory {}", file_store.dir().display());
    let store: Arc<dyn KeyValueStore> = Arc::new(file_store);
    let ctx = AppContext::open(store, &config.seed)?;

    match cli.command {
        Commands::Seed => commands::seed(&ctx),
        Commands::Login { username, password } => commands::login(&ctx, &username, &password),
        Commands::Logout => commands::logout(&ctx),
        Commands::Whoami => commands::whoami(&ctx),
        Commands::Passwd { old, new } => commands::passwd(&ctx, &old, &new),
        Commands::Users(cmd) => commands::users(&ctx, cmd),
        Commands::Txn(cmd) => commands::txn(&ctx, cmd),
        Commands::Sales(cmd) => commands::sales(&ctx, cmd),
        Commands::Report(cmd) => commands::report(&ctx, cmd),
        Commands::Approvals(cmd) => commands::approvals(&ctx, cmd),
        Commands::Audit(cmd) => commands::audit(&ctx, cmd),
    }
}
