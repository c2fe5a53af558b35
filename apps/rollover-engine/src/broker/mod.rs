//! Broker collaborator interface.
//!
//! The engine never owns a broker connection; it consumes a narrow
//! contract-details capability. Adapters map whatever live payload
//! shape their broker produces onto [`ContractDetails`], which exposes
//! exactly the optional fields the validator reads.
//!
//! Absence, timeout, or error from this collaborator is always
//! non-fatal to the core: callers degrade to offline validation.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from broker contract-details queries.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Broker reported no live session.
    #[error("Broker not connected")]
    NotConnected,

    /// Broker API returned an error.
    #[error("Broker API error: {0}")]
    Api(String),

    /// Transport-level failure.
    #[error("Broker transport error: {0}")]
    Transport(String),
}

/// One contract-details record returned by a broker.
///
/// All fields are optional; brokers differ in which expiration-like
/// date they populate. [`Self::expiration`] applies the priority
/// order the validator relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractDetails {
    /// Authoritative expiration date (`YYYYMMDD`), when the broker
    /// reports one.
    pub real_expiration_date: Option<String>,
    /// Last trading date (`YYYYMMDD`), often the only date reported.
    pub last_trade_date: Option<String>,
    /// Month-granularity contract identifier (`YYYYMM`).
    pub contract_month: Option<String>,
    /// Broker-assigned unique contract identifier.
    pub con_id: Option<i64>,
}

impl ContractDetails {
    /// Best available expiration date string.
    ///
    /// Priority: authoritative expiration, then last-trade date, then
    /// the month-granularity field.
    #[must_use]
    pub fn expiration(&self) -> Option<&str> {
        self.real_expiration_date
            .as_deref()
            .or(self.last_trade_date.as_deref())
            .or(self.contract_month.as_deref())
    }
}

/// Contract-details source exposed by a live broker session.
#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    /// Whether a live session is currently open.
    fn is_connected(&self) -> bool;

    /// Query contract details by symbol.
    ///
    /// Returns zero or more detail records; an empty vector means the
    /// broker knows nothing about the symbol.
    async fn contract_details(&self, symbol: &str) -> Result<Vec<ContractDetails>, BrokerError>;

    /// Human-readable adapter name for logging.
    fn broker_name(&self) -> &'static str;
}
