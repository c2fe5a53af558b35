//! Configuration loading and validation.
//!
//! Configuration is loaded from YAML with per-field serde defaults and
//! validated before use. Invalid values (e.g. a warn-days threshold
//! below 1) fail fast; they are never silently corrected.

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ContractError, ContractSpec, SecType, defaults_for};

/// Environment variable overriding the mappings file path.
const MAPPINGS_PATH_ENV: &str = "ROLLOVER_MAPPINGS_PATH";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    /// A configured contract spec is invalid.
    #[error("Invalid contract in config: {0}")]
    InvalidContract(#[from] ContractError),
}

/// Rollover manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloverConfig {
    /// Days before expiration at which rollover alerts fire (>= 1).
    #[serde(default = "default_warn_days")]
    pub warn_days_before_expiry: i64,
    /// Derive front-month contract names from the defaults table when
    /// registering mappings without an explicit contract symbol.
    #[serde(default)]
    pub auto_detect_front_month: bool,
    /// Persist the mapping table to disk on every registration.
    #[serde(default = "default_true")]
    pub persist_mappings: bool,
    /// Path of the persisted mapping file.
    #[serde(default = "default_mappings_path")]
    pub mappings_path: PathBuf,
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            warn_days_before_expiry: default_warn_days(),
            auto_detect_front_month: false,
            persist_mappings: default_true(),
            mappings_path: default_mappings_path(),
        }
    }
}

impl RolloverConfig {
    /// Create a config with the given warn threshold, validating eagerly.
    pub fn new(warn_days_before_expiry: i64) -> Result<Self, ConfigError> {
        let config = Self {
            warn_days_before_expiry,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.warn_days_before_expiry < 1 {
            return Err(ConfigError::ValidationError(format!(
                "warn_days_before_expiry must be >= 1, got {}",
                self.warn_days_before_expiry
            )));
        }
        Ok(())
    }
}

/// Preflight gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightConfig {
    /// Treat expired contracts as blocking errors.
    #[serde(default = "default_true")]
    pub block_on_expired: bool,
    /// Timeout for each live broker contract-details query.
    #[serde(default = "default_query_timeout_ms")]
    pub broker_query_timeout_ms: u64,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            block_on_expired: default_true(),
            broker_query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl PreflightConfig {
    /// Broker query timeout as a [`Duration`].
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.broker_query_timeout_ms)
    }
}

/// One configured contract, converted to a [`ContractSpec`] on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractEntry {
    /// Contract symbol.
    pub symbol: String,
    /// Security type (defaults to FUT).
    #[serde(default = "default_sec_type")]
    pub sec_type: SecType,
    /// Listing exchange; falls back to the defaults table for futures.
    #[serde(default)]
    pub exchange: Option<String>,
    /// Contract multiplier; falls back to the defaults table for futures.
    #[serde(default)]
    pub multiplier: Option<Decimal>,
    /// Expiration date (`YYYYMMDD` or `YYYYMM`).
    #[serde(default)]
    pub expiration_date: Option<String>,
    /// Logical root symbol (e.g. "ES").
    #[serde(default)]
    pub underlying: Option<String>,
}

impl ContractEntry {
    /// Root symbol used for defaults lookups.
    fn root(&self) -> &str {
        self.underlying.as_deref().unwrap_or(&self.symbol)
    }

    /// Build the immutable spec, applying futures defaults where the
    /// entry leaves exchange/multiplier unset.
    pub fn to_spec(&self) -> Result<ContractSpec, ContractError> {
        let defaults = defaults_for(self.root());

        let exchange = self
            .exchange
            .clone()
            .or_else(|| defaults.map(|d| d.exchange.to_string()))
            .unwrap_or_else(|| "SMART".to_string());
        let multiplier = self
            .multiplier
            .or_else(|| defaults.map(|d| d.multiplier));

        let mut spec = ContractSpec::new(&self.symbol, self.sec_type, exchange, multiplier)?;
        if let Some(expiration) = &self.expiration_date {
            spec = spec.with_expiration(expiration);
        }
        if let Some(underlying) = &self.underlying {
            spec = spec.with_underlying(underlying);
        }
        Ok(spec)
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Preflight gate configuration.
    #[serde(default)]
    pub preflight: PreflightConfig,
    /// Rollover manager configuration.
    #[serde(default)]
    pub rollover: RolloverConfig,
    /// Contracts the session trades.
    #[serde(default)]
    pub contracts: Vec<ContractEntry>,
}

impl Config {
    /// Validate all sections and every configured contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rollover.validate()?;
        for entry in &self.contracts {
            entry.to_spec()?;
        }
        Ok(())
    }

    /// Build the configured contract specs.
    pub fn contract_specs(&self) -> Result<Vec<ContractSpec>, ContractError> {
        self.contracts.iter().map(ContractEntry::to_spec).collect()
    }
}

/// Load and validate configuration from a YAML file.
///
/// Defaults to `config.yaml` when `path` is `None`. The mappings path
/// may be overridden with the `ROLLOVER_MAPPINGS_PATH` environment
/// variable.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_string(),
        source,
    })?;

    let mut config: Config = serde_yaml_bw::from_str(&raw)?;
    if let Ok(override_path) = std::env::var(MAPPINGS_PATH_ENV) {
        config.rollover.mappings_path = PathBuf::from(override_path);
    }
    config.validate()?;

    tracing::info!(
        path,
        contracts = config.contracts.len(),
        warn_days = config.rollover.warn_days_before_expiry,
        "config_loaded"
    );
    Ok(config)
}

const fn default_warn_days() -> i64 {
    5
}

const fn default_true() -> bool {
    true
}

const fn default_query_timeout_ms() -> u64 {
    5000
}

fn default_mappings_path() -> PathBuf {
    PathBuf::from("data/contract_mappings.json")
}

const fn default_sec_type() -> SecType {
    SecType::Fut
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rollover_config_defaults() {
        let config = RolloverConfig::default();
        assert_eq!(config.warn_days_before_expiry, 5);
        assert!(config.persist_mappings);
        assert!(!config.auto_detect_front_month);
    }

    #[test]
    fn test_warn_days_below_one_rejected() {
        assert!(RolloverConfig::new(0).is_err());
        assert!(RolloverConfig::new(-3).is_err());
        assert!(RolloverConfig::new(1).is_ok());
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r"
rollover:
  warn_days_before_expiry: 10
contracts:
  - symbol: ESH26
    underlying: ES
    expiration_date: '20260320'
";
        let config: Config = serde_yaml_bw::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.rollover.warn_days_before_expiry, 10);
        assert!(config.preflight.block_on_expired);

        let specs = config.contract_specs().unwrap();
        assert_eq!(specs.len(), 1);
        // Defaults table filled in exchange and multiplier from the root.
        assert_eq!(specs[0].exchange(), "CME");
        assert_eq!(specs[0].multiplier(), Some(dec!(50)));
    }

    #[test]
    fn test_invalid_warn_days_in_yaml_rejected() {
        let yaml = r"
rollover:
  warn_days_before_expiry: 0
";
        let config: Config = serde_yaml_bw::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_futures_entry_without_multiplier_or_defaults_rejected() {
        let yaml = r"
contracts:
  - symbol: XXXH26
";
        let config: Config = serde_yaml_bw::from_str(yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidContract(_))
        ));
    }

    #[test]
    fn test_stock_entry_needs_no_multiplier() {
        let yaml = r"
contracts:
  - symbol: AAPL
    sec_type: STK
    exchange: NASDAQ
";
        let config: Config = serde_yaml_bw::from_str(yaml).unwrap();
        config.validate().unwrap();
        let specs = config.contract_specs().unwrap();
        assert_eq!(specs[0].sec_type(), SecType::Stk);
        assert_eq!(specs[0].multiplier(), None);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "rollover:\n  warn_days_before_expiry: 7\n").unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.rollover.warn_days_before_expiry, 7);
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(matches!(
            load_config(Some("/nonexistent/config.yaml")),
            Err(ConfigError::ReadError { .. })
        ));
    }
}
