//! Portfolio collaborator interface.

use std::collections::HashMap;
use std::sync::RwLock;

use rust_decimal::Decimal;

/// Position lookup by symbol.
///
/// Quantities are signed: positive is long, negative is short, zero is
/// flat. Unknown symbols are flat, never an error.
pub trait Portfolio: Send + Sync {
    /// Signed position quantity for `symbol`.
    fn position_quantity(&self, symbol: &str) -> Decimal;
}

/// Simple in-memory portfolio, used by tests and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryPortfolio {
    positions: RwLock<HashMap<String, Decimal>>,
}

impl InMemoryPortfolio {
    /// Create an empty portfolio.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the position for a symbol, replacing any prior value.
    pub fn set_position(&self, symbol: &str, quantity: Decimal) {
        if let Ok(mut positions) = self.positions.write() {
            positions.insert(symbol.to_uppercase(), quantity);
        }
    }
}

impl Portfolio for InMemoryPortfolio {
    fn position_quantity(&self, symbol: &str) -> Decimal {
        self.positions
            .read()
            .ok()
            .and_then(|positions| positions.get(&symbol.to_uppercase()).copied())
            .unwrap_or(Decimal::ZERO)
    }
}
