//! Session startup gate over a batch of contracts.
//!
//! The preflight checker is the single authority allowed to block a
//! trading session. It validates every configured futures contract and
//! aggregates verdicts into pass/fail plus categorized errors and
//! warnings; non-futures contracts are ignored entirely.

use std::collections::HashMap;

use thiserror::Error;

use crate::broker::BrokerAdapter;
use crate::models::{ContractSpec, ValidationResult};
use crate::validation::ContractValidator;

/// Aggregated preflight outcome.
#[derive(Debug, Clone, Default)]
pub struct PreflightResult {
    /// True iff no blocking errors were found.
    pub passed: bool,
    /// Blocking error messages, one per failing contract.
    pub errors: Vec<String>,
    /// Advisory messages (near-expiry, missing data, downgraded errors).
    pub warnings: Vec<String>,
    /// Per-symbol verdicts for every validated futures contract.
    pub validated_contracts: HashMap<String, ValidationResult>,
}

/// Raised when the preflight gate blocks a session.
#[derive(Debug, Error)]
#[error("Preflight validation failed: {}", messages.join("; "))]
pub struct PreflightError {
    /// All blocking error messages, so an operator can identify exactly
    /// which contracts require rollover.
    pub messages: Vec<String>,
}

/// Validates contracts at session start and decides pass/block.
pub struct PreflightChecker {
    validator: ContractValidator,
    block_on_expired: bool,
}

impl PreflightChecker {
    /// Create a preflight checker.
    ///
    /// With `block_on_expired` set (the default posture), an expired
    /// contract is a blocking error; otherwise it is downgraded to a
    /// warning.
    #[must_use]
    pub const fn new(validator: ContractValidator, block_on_expired: bool) -> Self {
        Self {
            validator,
            block_on_expired,
        }
    }

    /// Run preflight validation over `contracts`.
    ///
    /// Only futures contracts are examined; an empty futures set passes
    /// immediately. `passed` is true iff `errors` is empty.
    pub async fn run_preflight(
        &self,
        broker: Option<&dyn BrokerAdapter>,
        contracts: &[ContractSpec],
    ) -> PreflightResult {
        let futures: Vec<&ContractSpec> = contracts
            .iter()
            .filter(|spec| spec.sec_type().is_futures())
            .collect();

        let mut result = PreflightResult {
            passed: true,
            ..Default::default()
        };

        if futures.is_empty() {
            tracing::info!(total = contracts.len(), "preflight_skipped_no_futures");
            return result;
        }

        for spec in futures {
            let verdict = self.validator.validate(broker, spec).await;

            if let Some(error) = &verdict.error {
                if verdict.expired && self.block_on_expired {
                    result.errors.push(format!("{}: {error}", verdict.symbol));
                } else {
                    // Downgraded: still visible, never blocking.
                    result.warnings.push(format!("{}: {error}", verdict.symbol));
                }
            }
            if let Some(warning) = &verdict.warning {
                result.warnings.push(format!("{}: {warning}", verdict.symbol));
            }

            result
                .validated_contracts
                .insert(verdict.symbol.clone(), verdict);
        }

        result.passed = result.errors.is_empty();

        tracing::info!(
            passed = result.passed,
            validated = result.validated_contracts.len(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "preflight_completed"
        );

        result
    }

    /// Fast-path check for a single contract.
    ///
    /// Applies the same expired+blocking rule as [`Self::run_preflight`];
    /// otherwise returns the validator's `valid` flag with no message.
    pub async fn check_single_contract(
        &self,
        broker: Option<&dyn BrokerAdapter>,
        spec: &ContractSpec,
    ) -> (bool, Option<String>) {
        let verdict = self.validator.validate(broker, spec).await;

        if verdict.expired && self.block_on_expired {
            if let Some(error) = verdict.error {
                return (false, Some(error));
            }
        }

        (verdict.valid, None)
    }
}

/// Run the full preflight gate and fail the startup sequence on block.
///
/// This is the single call a startup sequence makes before trading
/// operations are permitted to proceed.
pub async fn enforce_preflight(
    checker: &PreflightChecker,
    broker: Option<&dyn BrokerAdapter>,
    contracts: &[ContractSpec],
) -> Result<PreflightResult, PreflightError> {
    let result = checker.run_preflight(broker, contracts).await;
    if result.passed {
        Ok(result)
    } else {
        Err(PreflightError {
            messages: result.errors,
        })
    }
}
