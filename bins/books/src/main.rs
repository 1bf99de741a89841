//! Tally command-line report runner.
//!
//! Loads a JSON ledger snapshot for one tenant, replays it through the
//! bookkeeping facade, and prints the requested report as JSON.
//!
//! Usage: tally-books <snapshot.json> <command> [args]

mod snapshot;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tally_core::books::{Bookkeeper, BooksSettings};
use tally_core::clock::{Clock, FixedClock, SystemClock};
use tally_core::reconciliation::NewReconciliation;
use tally_shared::AppConfig;
use tally_shared::config::LoggingConfig;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::snapshot::LedgerFile;

#[derive(Parser)]
#[command(name = "tally-books")]
#[command(about = "Print financial reports for a ledger snapshot")]
#[command(version)]
struct Cli {
    /// Ledger snapshot (JSON)
    snapshot: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Debit and credit totals per account
    TrialBalance {
        /// Report date (defaults to today)
        as_of: Option<NaiveDate>,
    },
    /// Profit and loss for a period
    Pnl {
        /// First day of the period
        start: NaiveDate,
        /// Last day of the period
        end: NaiveDate,
    },
    /// Assets, liabilities, and equity
    BalanceSheet {
        /// Report date (defaults to today)
        as_of: Option<NaiveDate>,
    },
    /// Cash flow statement for a period
    CashFlow {
        /// First day of the period
        start: NaiveDate,
        /// Last day of the period
        end: NaiveDate,
    },
    /// Receivables aging as of today
    Aging,
    /// Projected cash from open invoices and bills
    Forecast {
        /// Horizon in days (defaults to the configured horizon)
        days: Option<u32>,
    },
    /// Run depreciation for every asset and print the runs
    Depreciate {
        /// Run date (defaults to today)
        as_of: Option<NaiveDate>,
    },
    /// Budget vs actual for every budget
    Budgets,
    /// Headline financial ratios
    Ratios {
        /// Report date (defaults to today)
        as_of: Option<NaiveDate>,
    },
    /// Reconcile a bank account against a statement closing balance
    Reconcile {
        /// Bank account code
        account: String,
        /// Statement closing date
        statement_date: NaiveDate,
        /// Statement closing balance
        statement_balance: Decimal,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    // Reports go to stdout, so logs stay on stderr.
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_with_dotenv().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let settings = BooksSettings::from_config(&config);
    match config.clock.today {
        Some(today) => {
            info!(%today, "using fixed clock");
            run(&Bookkeeper::new(FixedClock(today), settings), &cli)
        }
        None => run(&Bookkeeper::new(SystemClock, settings), &cli),
    }
}

fn run<C: Clock>(keeper: &Bookkeeper<C>, cli: &Cli) -> Result<()> {
    let text = std::fs::read_to_string(&cli.snapshot)
        .with_context(|| format!("Failed to read {}", cli.snapshot.display()))?;
    let tenant = LedgerFile::parse(&text)?.replay(keeper)?;
    let today = keeper.clock().today();

    match &cli.command {
        Command::TrialBalance { as_of } => {
            print(&*keeper.generate_trial_balance(tenant, as_of.unwrap_or(today)))
        }
        Command::Pnl { start, end } => {
            print(&*keeper.generate_profit_and_loss(tenant, *start, *end)?)
        }
        Command::BalanceSheet { as_of } => {
            print(&*keeper.generate_balance_sheet(tenant, as_of.unwrap_or(today)))
        }
        Command::CashFlow { start, end } => {
            print(&keeper.generate_cash_flow_statement(tenant, *start, *end)?)
        }
        Command::Aging => print(&keeper.generate_aging_report(tenant)),
        Command::Forecast { days } => print(&keeper.generate_cash_flow_forecast(tenant, *days)?),
        Command::Depreciate { as_of } => {
            print(&keeper.run_all_depreciation(tenant, as_of.unwrap_or(today))?)
        }
        Command::Budgets => {
            let reports = keeper
                .tenant(tenant)
                .budgets()
                .iter()
                .map(|budget| keeper.budget_vs_actual(tenant, budget.id))
                .collect::<Result<Vec<_>, _>>()?;
            print(&reports)
        }
        Command::Ratios { as_of } => {
            print(&keeper.generate_financial_ratios(tenant, as_of.unwrap_or(today)))
        }
        Command::Reconcile {
            account,
            statement_date,
            statement_balance,
        } => {
            let account_id = keeper
                .snapshot(tenant)
                .account_by_code(account)
                .map(|account| account.id)
                .ok_or_else(|| anyhow!("unknown account code {account}"))?;
            let reconciliation = keeper.start_reconciliation(
                tenant,
                NewReconciliation {
                    account_id,
                    reconciliation_date: today,
                    statement_date: *statement_date,
                    statement_balance: *statement_balance,
                    notes: None,
                },
            )?;
            print(&keeper.reconciliation_worksheet(tenant, reconciliation.id)?)
        }
    }
}

fn print<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
