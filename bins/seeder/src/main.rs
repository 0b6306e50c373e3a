//! Sample general ledger seeder for Tally development and testing.
//!
//! Builds a small company ledger with a segmented chart of accounts, posts a
//! month of activity, closes the period and rolls balances forward, then
//! writes the JSON snapshot to the configured path.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::NaiveDate;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::account::{AccountNumberTemplate, AccountType, Segment};
use tally_core::ledger::{GeneralLedger, JournalEntryBuilder, Posting, SubledgerRollup, TrialBalance};
use tally_shared::{AppConfig, AppError, AppResult, Currency, Money, parse_date};

/// Seed accounts: (code, name, type).
const ACCOUNTS: [(&str, &str, AccountType); 8] = [
    ("01-10-100", "Cash", AccountType::Asset),
    ("01-10-110", "Accounts Receivable", AccountType::Asset),
    ("01-10-150", "Equipment", AccountType::Asset),
    ("01-10-200", "Accounts Payable", AccountType::Liability),
    ("01-10-300", "Owner Capital", AccountType::Equity),
    ("01-20-400", "Consulting Revenue", AccountType::Revenue),
    ("01-20-500", "Rent Expense", AccountType::Expense),
    ("01-20-510", "Wages Expense", AccountType::Expense),
];

fn main() {
    if let Err(err) = run() {
        eprintln!("Seeding failed: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

/// Exit code of the [`AppError`] behind `err`; anything else is internal.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>() {
        Some(app) => app.exit_code(),
        None => AppError::Internal(err.to_string()).exit_code(),
    }
}

fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(AppError::from)?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!(
        ledger = %config.ledger.name,
        currency = %config.ledger.currency,
        "Seeding sample general ledger"
    );

    let mut gl = seed_ledger(&config)?;
    log_trial_balance(&gl.trial_balance(date("January 31, 2024")?).map_err(AppError::from)?);
    info!("Journal\n{}", gl.journal().table(gl.chart()));

    gl.close();
    let next = gl
        .start_next_period(date("2024-02-01")?)
        .map_err(AppError::from)?;
    info!(
        period = next.period(),
        entries = next.journal().len(),
        "Opened next period"
    );
    log_trial_balance(&next.trial_balance(date("2024-02-01")?).map_err(AppError::from)?);

    match config.snapshot.path.as_deref() {
        Some(path) => {
            let json = next.snapshot().to_json().map_err(AppError::from)?;
            std::fs::write(path, json)
                .map_err(AppError::from)
                .with_context(|| format!("writing snapshot to {path}"))?;
            info!(path, "Snapshot written");
        }
        None => warn!("No snapshot path configured, skipping snapshot"),
    }

    info!("Seeding complete");
    Ok(())
}

fn date(input: &str) -> AppResult<NaiveDate> {
    Ok(parse_date(input)?)
}

fn template() -> AppResult<AccountNumberTemplate> {
    Ok(AccountNumberTemplate::new(vec![
        Segment::new("division", 2).value("01", "Headquarters"),
        Segment::new("department", 2).values([("10", "Finance"), ("20", "Operations")]),
        Segment::new("account", 3)
            .range(100..=199, "Assets")
            .range(200..=299, "Liabilities")
            .range(300..=399, "Equity")
            .range(400..=499, "Revenue")
            .range(500..=599, "Expenses"),
    ])?)
}

/// Builds the sample ledger for January 2024.
fn seed_ledger(config: &AppConfig) -> AppResult<GeneralLedger> {
    let currency = config.ledger.currency;
    let amount = |units: i64| Money::from_minor(units * minor_scale(currency), currency);

    let mut gl = GeneralLedger::with_template(config.ledger.name.clone(), currency, template()?)
        .with_accounting_method(config.ledger.accounting_method);
    for (code, name, account_type) in ACCOUNTS {
        gl.create_account(code, name, account_type)?;
    }

    let mut current_assets = SubledgerRollup::new("Current Assets");
    current_assets.add_account("01-10-100")?.add_account("01-10-110")?;
    gl.add_rollup(current_assets)?;
    let mut operating = SubledgerRollup::new("Operating Expenses");
    operating.add_account("01-20-500")?.add_account("01-20-510")?;
    gl.add_rollup(operating)?;

    gl.record(
        date("2024-01-02")?,
        vec![
            Posting::debit("01-10-100", amount(50_000)),
            Posting::credit("01-10-300", amount(50_000)),
        ],
        Some("Owner investment".to_string()),
    )?;

    let equipment = JournalEntryBuilder::new(date("Jan 5, 2024")?)
        .debit("01-10-150", amount(12_000))
        .credit("01-10-100", amount(4_000))
        .credit("01-10-200", amount(8_000))
        .memo("Equipment, part on account")
        .build(gl.chart())?;
    gl.post(equipment)?;

    gl.record(
        date("2024/01/10")?,
        vec![
            Posting::debit("01-10-100", amount(6_000)),
            Posting::debit("01-10-110", amount(9_000)),
            Posting::credit("01-20-400", amount(15_000)),
        ],
        Some("Consulting engagement".to_string()),
    )?;
    gl.record(
        date("2024-01-31")?,
        vec![
            Posting::debit("01-20-500", amount(2_500)),
            Posting::debit("01-20-510", amount(4_000)),
            Posting::credit("01-10-100", amount(6_500)),
        ],
        Some("Month-end rent and wages".to_string()),
    )?;
    // Back-dated collection
    gl.record(
        date("2024-01-20")?,
        vec![
            Posting::debit("01-10-100", amount(3_000)),
            Posting::credit("01-10-110", amount(3_000)),
        ],
        Some("Customer payment".to_string()),
    )?;

    info!(
        entries = gl.journal().len(),
        balanced = gl.is_balanced(),
        "Sample activity posted"
    );
    for line in gl.consolidated(date("2024-01-31")?)? {
        info!(label = %line.label, balance = %line.balance, "Consolidated balance");
    }
    Ok(gl)
}

/// Minor units per major unit.
fn minor_scale(currency: Currency) -> i64 {
    10_i64.pow(currency.minor_units())
}

fn log_trial_balance(report: &TrialBalance) {
    for line in &report.lines {
        info!(
            account = %line.code,
            name = %line.name,
            balance = %line.balance,
            "Trial balance line"
        );
    }
    info!(
        as_of = %report.as_of,
        debit_normal = %report.totals.debit_normal,
        credit_normal = %report.totals.credit_normal,
        balanced = report.is_balanced(),
        "Trial balance"
    );
}
