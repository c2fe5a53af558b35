//! Rollover lifecycle management.
//!
//! Maintains the logical-symbol to contract mapping table (persisted as
//! JSON), detects approaching expirations, generates close/open order
//! pairs, and keeps the rollover event audit trail.

mod event;
mod manager;
mod persistence;

pub use event::{RolloverEvent, RolloverStatus, RolloverUpdate, RolloverUpdateError};
pub use manager::{AlertUrgency, RolloverAlert, RolloverManager, SymbolMapping};
pub use persistence::PersistenceError;
