//! Ledgerguard CLI
//!
//! Operator commands against a PostgreSQL database: schema migrations, journal posting,
//! financial reports, sales order reconciliation, CSV exports and payroll runs.
//!
//! ```bash
//! ledgerguard migrate up
//! ledgerguard post JE-000042
//! ledgerguard trial-balance --as-of 2024-12-31
//! ledgerguard export payments --output payments.csv
//! ledgerguard payroll generate --year 2024 --month 5
//! ```

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ledgerguard::accounting::reports::{
    account_ledger, balance_sheet, profit_and_loss, trial_balance, ReportLine,
};
use ledgerguard::accounting::{post_journal_entry, unpost_journal_entry, LedgerFilter};
use ledgerguard::banking::reconcile_sales_order;
use ledgerguard::export::{
    export_general_ledger, export_journal_entries, export_payments, export_trial_balance,
};
use ledgerguard::hrm::{generate_salary_month, mark_salary_month_paid, process_attendance};
use ledgerguard::migration::Migrator;
use ledgerguard::store::{AccountingStore, SalesStore};
use ledgerguard::{migrations, ErpConfig, PgStore};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ledgerguard")]
#[command(about = "Ledger posting, reports, reconciliation and payroll for Ledgerguard databases")]
#[command(version)]
struct Cli {
    /// Database connection URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Configuration file (TOML); missing files are ignored
    #[arg(long, global = true, default_value = "config/config.toml")]
    config: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply, roll back or inspect schema migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },

    /// Project a journal entry into the general ledger
    Post {
        /// Journal entry document number, e.g. JE-000001
        doc_num: String,
    },

    /// Remove a journal entry's ledger rows and mark it unposted
    Unpost { doc_num: String },

    TrialBalance {
        /// Include ledger rows up to and including this date
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    ProfitLoss {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },

    BalanceSheet {
        #[arg(long)]
        as_of: NaiveDate,
    },

    /// Ledger rows of one account with a running balance
    Ledger {
        /// Account code
        account: String,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Recompute paid, due and status of sales orders from their payments
    Reconcile {
        /// Sales order document number; every order when omitted
        document_no: Option<String>,
    },

    /// Write a CSV export
    Export {
        #[arg(value_enum)]
        kind: ExportKind,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Trial balance cut-off or general ledger upper bound
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// General ledger lower bound
        #[arg(long)]
        from: Option<NaiveDate>,
    },

    /// Derive daily attendance from synced terminal punches
    Attendance {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },

    /// Monthly salary runs
    Payroll {
        #[command(subcommand)]
        action: PayrollAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Show applied and pending migrations
    Status,

    /// Apply pending migrations
    Up {
        /// Number of migrations to apply (default: all pending)
        #[arg(long)]
        steps: Option<usize>,
    },

    /// Roll back migrations
    Down {
        /// Number of migrations to roll back
        #[arg(long, default_value = "1")]
        steps: usize,
    },
}

#[derive(Subcommand)]
enum PayrollAction {
    /// Generate (or regenerate, while unpaid) the salaries of a month
    Generate {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },

    MarkPaid {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Payments,
    JournalEntries,
    GeneralLedger,
    TrialBalance,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    if cli.verbose {
        ledgerguard::metrics::tracing_helpers::init_span_timing(
            std::time::Duration::from_millis(50),
        );
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ErpConfig::load_from(&cli.config).context("loading configuration")?;
    let database_url = cli
        .database_url
        .or_else(|| std::env::var("LEDGERGUARD_DATABASE_URL").ok())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| config.database.url.clone());

    let store = PgStore::connect(&database_url).with_context(|| {
        format!(
            "connecting to {}",
            ledgerguard::connection::redact_connection_string(&database_url)
        )
    })?;

    match cli.command {
        Commands::Migrate { action } => handle_migrate(&store, action),
        Commands::Post { doc_num } => handle_post(&store, &doc_num),
        Commands::Unpost { doc_num } => handle_unpost(&store, &doc_num),
        Commands::TrialBalance { as_of } => handle_trial_balance(&store, &config, as_of),
        Commands::ProfitLoss { from, to } => handle_profit_loss(&store, from, to),
        Commands::BalanceSheet { as_of } => handle_balance_sheet(&store, &config, as_of),
        Commands::Ledger { account, from, to } => handle_ledger(&store, &account, from, to),
        Commands::Reconcile { document_no } => {
            handle_reconcile(&store, &config, document_no.as_deref())
        }
        Commands::Export {
            kind,
            output,
            as_of,
            from,
        } => handle_export(&store, &config, kind, output, from, as_of),
        Commands::Attendance { from, to } => handle_attendance(&store, &config, from, to),
        Commands::Payroll { action } => handle_payroll(&store, action),
    }
}

fn handle_migrate(store: &PgStore, action: MigrateAction) -> anyhow::Result<()> {
    let migrator: Migrator = migrations::migrator()?;
    let executor = store.executor();
    match action {
        MigrateAction::Status => {
            let status = migrator.status(executor)?;
            println!("\n{}\n", "Migration Status".bold());
            for record in &status.applied {
                println!(
                    "  {} m{}_{} ({}, {}ms)",
                    "✓".green(),
                    record.version,
                    record.name,
                    record.applied_at.format("%Y-%m-%d %H:%M:%S"),
                    record.execution_time_ms.unwrap_or_default()
                );
            }
            for pending in &status.pending {
                println!("  {} m{}_{} (pending)", "…".yellow(), pending.version, pending.name);
            }
            println!(
                "\nSummary: {} applied, {} pending",
                status.applied.len(),
                status.pending.len()
            );
        }
        MigrateAction::Up { steps } => {
            let applied = migrator.up(executor, steps)?;
            println!("{} applied {applied} migration(s)", "✓".green());
        }
        MigrateAction::Down { steps } => {
            let rolled_back = migrator.down(executor, Some(steps))?;
            println!("{} rolled back {rolled_back} migration(s)", "✓".green());
        }
    }
    Ok(())
}

fn journal_id(store: &PgStore, doc_num: &str) -> anyhow::Result<Uuid> {
    store
        .find_journal_entry_by_doc_num(doc_num)?
        .map(|je| je.id)
        .ok_or_else(|| anyhow!("journal entry {doc_num} not found"))
}

fn handle_post(store: &PgStore, doc_num: &str) -> anyhow::Result<()> {
    let outcome = post_journal_entry(store, journal_id(store, doc_num)?)?;
    println!("{doc_num}: {}", outcome.label().green());
    Ok(())
}

fn handle_unpost(store: &PgStore, doc_num: &str) -> anyhow::Result<()> {
    let removed = unpost_journal_entry(store, journal_id(store, doc_num)?)?;
    println!("{doc_num}: removed {removed} ledger row(s)");
    Ok(())
}

fn handle_trial_balance(
    store: &PgStore,
    config: &ErpConfig,
    as_of: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let tb = trial_balance(store, as_of, config.ledger.balance_tolerance)?;
    println!("{:<12} {:<32} {:>16} {:>16}", "Code", "Account", "Debit", "Credit");
    for row in &tb.rows {
        println!(
            "{:<12} {:<32} {:>16} {:>16}",
            row.code, row.name, row.debit, row.credit
        );
    }
    println!(
        "{:<12} {:<32} {:>16} {:>16}",
        "TOTAL".bold(),
        "",
        tb.total_debit,
        tb.total_credit
    );
    print_balanced(tb.is_balanced);
    Ok(())
}

fn print_section(title: &str, lines: &[ReportLine], total: Decimal) {
    println!("{}", title.bold());
    for line in lines {
        println!("  {:<12} {:<32} {:>16}", line.code, line.name, line.amount);
    }
    println!("  {:<45} {:>16}", format!("Total {title}"), total);
}

fn print_balanced(balanced: bool) {
    if balanced {
        println!("{}", "balanced".green());
    } else {
        println!("{}", "NOT balanced".red().bold());
    }
}

fn handle_profit_loss(store: &PgStore, from: NaiveDate, to: NaiveDate) -> anyhow::Result<()> {
    let pl = profit_and_loss(store, from, to)?;
    println!("Profit and loss {} to {}\n", pl.from, pl.to);
    print_section("Revenue", &pl.revenue, pl.total_revenue);
    print_section("Expenses", &pl.expenses, pl.total_expenses);
    println!("\n{:<47} {:>16}", "Net profit".bold(), pl.net_profit);
    Ok(())
}

fn handle_balance_sheet(
    store: &PgStore,
    config: &ErpConfig,
    as_of: NaiveDate,
) -> anyhow::Result<()> {
    let bs = balance_sheet(store, as_of, config.ledger.balance_tolerance)?;
    println!("Balance sheet as of {}\n", bs.as_of);
    print_section("Assets", &bs.assets, bs.total_assets);
    print_section("Liabilities", &bs.liabilities, bs.total_liabilities);
    print_section("Equity", &bs.equity, bs.total_equity);
    println!("  {:<45} {:>16}", "Current earnings", bs.current_earnings);
    println!(
        "\n{:<47} {:>16}",
        "Liabilities and equity".bold(),
        bs.total_liabilities_and_equity
    );
    print_balanced(bs.is_balanced);
    Ok(())
}

fn handle_ledger(
    store: &PgStore,
    code: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let account = store
        .find_account_by_code(code)?
        .ok_or_else(|| anyhow!("account {code} not found"))?;
    let ledger = account_ledger(store, account.id, from, to)?;
    println!("{} {}\n", ledger.account.code.bold(), ledger.account.name);
    for line in &ledger.lines {
        println!(
            "{} {:<12} {:>16} {:>16} {:>16}",
            line.entry.posting_date,
            line.doc_num.as_deref().unwrap_or("-"),
            line.entry.debit_amount,
            line.entry.credit_amount,
            line.running_balance
        );
    }
    println!(
        "{:<23} {:>16} {:>16} {:>16}",
        "TOTAL".bold(),
        ledger.total_debit,
        ledger.total_credit,
        ledger.final_balance
    );
    Ok(())
}

fn handle_reconcile(
    store: &PgStore,
    config: &ErpConfig,
    document_no: Option<&str>,
) -> anyhow::Result<()> {
    let orders = match document_no {
        Some(document_no) => vec![store
            .find_sales_order_by_document_no(document_no)?
            .ok_or_else(|| anyhow!("sales order {document_no} not found"))?],
        None => store.list_sales_orders()?,
    };
    for order in orders {
        let summary = reconcile_sales_order(store, &config.ledger, order.id)?;
        println!(
            "{:<16} paid {:>14} due {:>14} {}",
            order.document_no, summary.paid_amount, summary.due_amount, summary.status
        );
    }
    Ok(())
}

fn handle_export(
    store: &PgStore,
    config: &ErpConfig,
    kind: ExportKind,
    output: Option<PathBuf>,
    from: Option<NaiveDate>,
    as_of: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let rows = match kind {
        ExportKind::Payments => export_payments(store, writer)?,
        ExportKind::JournalEntries => export_journal_entries(store, writer)?,
        ExportKind::GeneralLedger => {
            let filter = LedgerFilter {
                date_from: from,
                date_to: as_of,
                ..LedgerFilter::default()
            };
            export_general_ledger(store, &filter, writer)?
        }
        ExportKind::TrialBalance => {
            let tb = trial_balance(store, as_of, config.ledger.balance_tolerance)?;
            export_trial_balance(&tb, writer)?
        }
    };
    if let Some(path) = output {
        println!("{} wrote {rows} row(s) to {}", "✓".green(), path.display());
    }
    Ok(())
}

fn handle_attendance(
    store: &PgStore,
    config: &ErpConfig,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<()> {
    let run = process_attendance(store, &config.attendance, from, to)?;
    println!(
        "{} {from}..{to}: {} created, {} updated, {} unchanged",
        "✓".green(),
        run.created,
        run.updated,
        run.unchanged
    );
    if !run.unmatched_users.is_empty() {
        println!(
            "{} no employee for terminal user(s) {}",
            "!".yellow(),
            run.unmatched_users.join(", ")
        );
    }
    Ok(())
}

fn handle_payroll(store: &PgStore, action: PayrollAction) -> anyhow::Result<()> {
    match action {
        PayrollAction::Generate { year, month } => {
            let run = generate_salary_month(store, year, month)?;
            for salary in &run.salaries {
                log::debug!("employee {} net {}", salary.employee_id, salary.net_salary);
            }
            println!(
                "{} {year}-{month:02}: {} salaries, net total {}",
                "✓".green(),
                run.salaries.len(),
                run.total_net()
            );
        }
        PayrollAction::MarkPaid { year, month, date } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            mark_salary_month_paid(store, year, month, date)?;
            println!("{} {year}-{month:02} marked paid on {date}", "✓".green());
        }
    }
    Ok(())
}
