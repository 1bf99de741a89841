//! Application configuration management.
//!
//! Sources, later ones winning: `config/default.toml`, `config/{RUN_MODE}.toml`,
//! then `TALLY__SECTION__KEY` environment variables. Every field has a default.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Ledger behaviour.
    pub ledger: LedgerConfig,
    /// Report generation.
    pub reports: ReportsConfig,
    /// Log output.
    pub logging: LoggingConfig,
    /// Clock override.
    pub clock: ClockConfig,
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Currency code printed on reports.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Prefix for generated journal entry numbers.
    #[serde(default = "default_entry_number_prefix")]
    pub entry_number_prefix: String,
    /// Maximum difference still reported as balanced on a balance sheet.
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            entry_number_prefix: default_entry_number_prefix(),
            balance_tolerance: default_balance_tolerance(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_entry_number_prefix() -> String {
    "JE".to_string()
}

fn default_balance_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Report configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    /// Case-insensitive name fragments that mark an asset account as cash.
    #[serde(default = "default_cash_account_keywords")]
    pub cash_account_keywords: Vec<String>,
    /// Default horizon of the cash flow forecast.
    #[serde(default = "default_forecast_horizon_days")]
    pub forecast_horizon_days: u32,
    /// Width in days of each receivables aging bucket.
    #[serde(default = "default_aging_bucket_days")]
    pub aging_bucket_days: u32,
    /// Maximum number of cached reports.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// Time-to-live of cached reports in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            cash_account_keywords: default_cash_account_keywords(),
            forecast_horizon_days: default_forecast_horizon_days(),
            aging_bucket_days: default_aging_bucket_days(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cash_account_keywords() -> Vec<String> {
    vec!["cash".to_string(), "bank".to_string()]
}

fn default_forecast_horizon_days() -> u32 {
    90
}

fn default_aging_bucket_days() -> u32 {
    30
}

fn default_cache_capacity() -> u64 {
    256
}

fn default_cache_ttl_secs() -> u64 {
    300 // 5 minutes
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "tally=info".to_string()
}

/// Clock configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClockConfig {
    /// Fixed "today" for reproducible runs. Uses the system date when absent.
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

impl AppConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed or a value has the wrong type.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Loads `.env` (if present) and then the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn load_with_dotenv() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        Self::load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_without_any_source() {
        let config = temp_env::with_vars_unset(
            [
                "TALLY__LEDGER__CURRENCY",
                "TALLY__REPORTS__FORECAST_HORIZON_DAYS",
                "TALLY__CLOCK__TODAY",
            ],
            AppConfig::load,
        )
        .unwrap();

        assert_eq!(config.ledger.currency, "USD");
        assert_eq!(config.ledger.entry_number_prefix, "JE");
        assert_eq!(config.ledger.balance_tolerance, dec!(0.01));
        assert_eq!(config.reports.cash_account_keywords, vec!["cash", "bank"]);
        assert_eq!(config.reports.forecast_horizon_days, 90);
        assert_eq!(config.logging.filter, "tally=info");
        assert!(!config.logging.json);
        assert!(config.clock.today.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = temp_env::with_vars(
            [
                ("TALLY__LEDGER__CURRENCY", Some("EUR")),
                ("TALLY__REPORTS__FORECAST_HORIZON_DAYS", Some("45")),
                ("TALLY__CLOCK__TODAY", Some("2024-06-30")),
            ],
            AppConfig::load,
        )
        .unwrap();

        assert_eq!(config.ledger.currency, "EUR");
        assert_eq!(config.reports.forecast_horizon_days, 45);
        assert_eq!(
            config.clock.today,
            NaiveDate::from_ymd_opt(2024, 6, 30)
        );
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let result = temp_env::with_var(
            "TALLY__REPORTS__FORECAST_HORIZON_DAYS",
            Some("ninety"),
            AppConfig::load,
        );
        assert!(result.is_err());
    }
}
