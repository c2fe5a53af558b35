//! Rollover Engine Binary
//!
//! Runs the contract preflight gate over the configured contracts and
//! reports rollover alerts. Exits non-zero when the gate blocks.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin rollover-engine -- config.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (default: info)
//! - `ROLLOVER_MAPPINGS_PATH`: Override for the mappings file path

use anyhow::Context;

use rollover_engine::{
    ContractValidator, PreflightChecker, RolloverManager, enforce_preflight, load_config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref()).context("loading configuration")?;
    let contracts = config
        .contract_specs()
        .context("building configured contract specs")?;

    let validator = ContractValidator::new(
        config.rollover.warn_days_before_expiry,
        config.preflight.query_timeout(),
    );
    let checker = PreflightChecker::new(validator, config.preflight.block_on_expired);

    // The CLI has no live broker session; validation runs offline from
    // the configured expiration dates.
    let result = enforce_preflight(&checker, None, &contracts)
        .await
        .context("preflight gate blocked the session")?;

    for warning in &result.warnings {
        tracing::warn!(warning = %warning, "preflight_warning");
    }
    tracing::info!(
        validated = result.validated_contracts.len(),
        warnings = result.warnings.len(),
        "preflight_passed"
    );

    let manager = RolloverManager::new(config.rollover.clone());
    let alerts = manager.check_rollover_needed(&contracts);
    if alerts.is_empty() {
        tracing::info!("no_rollovers_needed");
    } else {
        for alert in &alerts {
            tracing::warn!(
                symbol = %alert.symbol,
                days_to_expiry = alert.days_to_expiry,
                urgency = ?alert.urgency,
                "rollover_needed"
            );
        }
    }

    Ok(())
}
