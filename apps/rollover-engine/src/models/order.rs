//! Order specifications produced by the rollover engine.
//!
//! The engine only *describes* the orders a rollover requires; an
//! external order-management layer executes them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

impl OrderSide {
    /// The opposite side.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

/// One leg of a rollover: a close or open order specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloverOrder {
    /// Contract symbol to trade.
    pub contract: String,
    /// Order side.
    pub side: OrderSide,
    /// Unsigned quantity.
    pub quantity: Decimal,
}

impl RolloverOrder {
    /// Create a new rollover order specification.
    #[must_use]
    pub fn new(contract: impl Into<String>, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            contract: contract.into(),
            side,
            quantity,
        }
    }
}
