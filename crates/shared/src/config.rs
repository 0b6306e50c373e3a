//! Ledger configuration management.

use serde::Deserialize;

use crate::types::Currency;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// General ledger defaults.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Snapshot output configuration.
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

/// Bookkeeping method recorded on a general ledger.
///
/// Informational only; it does not change posting behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountingMethod {
    /// Cash-basis accounting.
    #[default]
    Cash,
    /// Accrual-basis accounting.
    Accrual,
}

/// General ledger defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Display name of the general ledger.
    #[serde(default = "default_ledger_name")]
    pub name: String,
    /// Functional currency every entry is recorded in.
    #[serde(default = "default_currency")]
    pub currency: Currency,
    /// Bookkeeping method.
    #[serde(default)]
    pub accounting_method: AccountingMethod,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            name: default_ledger_name(),
            currency: default_currency(),
            accounting_method: AccountingMethod::default(),
        }
    }
}

fn default_ledger_name() -> String {
    "General Ledger".to_string()
}

fn default_currency() -> Currency {
    Currency::Usd
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_filter() -> String {
    "tally=info".to_string()
}

/// Snapshot output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotConfig {
    /// Where to write the JSON snapshot. Nothing is written when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default.toml`,
    /// `config/{RUN_MODE}.toml`, then `TALLY__SECTION__KEY` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
