//! Core data model for the rollover engine.
//!
//! Everything here is a plain value object: constructed once, never
//! mutated, safe to clone and send across threads.

mod contract;
mod defaults;
mod front_month;
mod order;
mod validation;

pub use contract::{ContractError, ContractSpec, SecType, parse_expiration};
pub use defaults::{ContractDefaults, defaults_for};
pub use front_month::{front_month_symbol, month_code};
pub use order::{OrderSide, RolloverOrder};
pub use validation::ValidationResult;
