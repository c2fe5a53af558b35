//! Per-symbol validation verdicts.

use serde::{Deserialize, Serialize};

/// Verdict for one contract from [`crate::validation::ContractValidator`].
///
/// `error` carries a blocking condition, `warning` an advisory one. At
/// most one of the two is set for the expired case; both may be
/// populated independently in other flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Contract symbol this verdict applies to.
    pub symbol: String,
    /// Whether the contract may be traded.
    pub valid: bool,
    /// Whether the contract is past its expiration date.
    pub expired: bool,
    /// Days until expiration; `None` when unknown.
    pub days_to_expiry: Option<i64>,
    /// Expiration date string used for classification, if any.
    pub expiration_date: Option<String>,
    /// Broker-assigned contract identifier, if resolved.
    pub con_id: Option<i64>,
    /// Blocking condition, if any.
    pub error: Option<String>,
    /// Advisory condition, if any.
    pub warning: Option<String>,
}

impl ValidationResult {
    /// A valid verdict with no findings.
    #[must_use]
    pub fn valid(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            valid: true,
            expired: false,
            days_to_expiry: None,
            expiration_date: None,
            con_id: None,
            error: None,
            warning: None,
        }
    }
}
