// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Rollover Engine - Contract Lifecycle Library
//!
//! Tracks the lifecycle of futures contracts that periodically expire and
//! must be rolled to a successor contract before trading can continue.
//!
//! # Architecture
//!
//! ```text
//! PreflightChecker ──► ContractValidator ──► BrokerAdapter (live, optional)
//!       │                     │
//!       │                     └──► ContractSpec expiry arithmetic (offline)
//!       ▼
//! session gate (pass / block)
//!
//! RolloverManager ──► SymbolMapping table ──► JSON mapping store
//!       │
//!       ├──► RolloverAlert (approaching expirations)
//!       ├──► close/open RolloverOrder pair (from Portfolio position)
//!       └──► RolloverEvent audit history
//! ```
//!
//! The engine never submits orders and never owns a broker connection;
//! the broker and portfolio are narrow collaborator traits supplied by
//! the host system.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Broker collaborator interface (contract-details source).
pub mod broker;

/// Configuration loading and validation.
pub mod config;

/// Core data model: contract specs, validation verdicts, orders.
pub mod models;

/// Portfolio collaborator interface (position lookup).
pub mod portfolio;

/// Session startup gate over a batch of contracts.
pub mod preflight;

/// Symbol mapping, rollover detection, order generation, audit trail.
pub mod rollover;

/// Contract validation against broker details with offline fallback.
pub mod validation;

pub use broker::{BrokerAdapter, BrokerError, ContractDetails};
pub use config::{Config, ConfigError, PreflightConfig, RolloverConfig, load_config};
pub use models::{ContractError, ContractSpec, OrderSide, RolloverOrder, SecType, ValidationResult};
pub use portfolio::{InMemoryPortfolio, Portfolio};
pub use preflight::{PreflightChecker, PreflightError, PreflightResult, enforce_preflight};
pub use rollover::{
    AlertUrgency, RolloverAlert, RolloverEvent, RolloverManager, RolloverStatus, RolloverUpdate,
    RolloverUpdateError, SymbolMapping,
};
pub use validation::ContractValidator;
