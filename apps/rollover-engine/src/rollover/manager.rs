//! Rollover manager: symbol mappings, alerts, order pairs, audit trail.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RolloverConfig;
use crate::models::{
    ContractError, ContractSpec, OrderSide, RolloverOrder, SecType, defaults_for,
    front_month_symbol,
};
use crate::portfolio::Portfolio;

use super::event::{RolloverEvent, RolloverStatus, RolloverUpdate, RolloverUpdateError};
use super::persistence;

/// Alert urgency for an approaching expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertUrgency {
    /// Rollover recommended soon.
    Warning,
    /// Expiration within two days; roll now.
    Critical,
}

/// One approaching-expiration alert from [`RolloverManager::check_rollover_needed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloverAlert {
    /// Contract symbol.
    pub symbol: String,
    /// Raw expiration date string.
    pub expiration_date: String,
    /// Days until expiration.
    pub days_to_expiry: i64,
    /// Alert urgency.
    pub urgency: AlertUrgency,
}

/// Logical-symbol to actual-contract mapping.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolMapping {
    /// Canonicalized (uppercase) logical symbol.
    pub logical_symbol: String,
    /// Actual contract symbol currently traded for the logical symbol.
    pub actual_contract: String,
    /// Full spec of the mapped contract.
    pub contract: ContractSpec,
    /// Whether this is the front-month contract.
    pub is_front_month: bool,
    /// Last registration time.
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct ManagerState {
    mappings: HashMap<String, SymbolMapping>,
    events: Vec<RolloverEvent>,
}

/// Tracks symbol mappings and rollover events for a trading session.
///
/// All mutating operations and the accompanying persistence write are
/// serialized under one exclusive lock; reads are served from a
/// consistent snapshot taken under the same lock.
pub struct RolloverManager {
    config: RolloverConfig,
    state: RwLock<ManagerState>,
}

impl RolloverManager {
    /// Create a manager, loading persisted mappings when enabled.
    ///
    /// A load failure is logged and the manager starts empty; the
    /// in-memory table is authoritative for the process either way.
    #[must_use]
    pub fn new(config: RolloverConfig) -> Self {
        let mappings = if config.persist_mappings {
            match persistence::load_mappings(&config.mappings_path) {
                Ok(mappings) => {
                    tracing::info!(
                        path = %config.mappings_path.display(),
                        count = mappings.len(),
                        "mappings_loaded"
                    );
                    mappings
                }
                Err(e) => {
                    tracing::warn!(
                        path = %config.mappings_path.display(),
                        error = %e,
                        "mappings_load_failed"
                    );
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Self {
            config,
            state: RwLock::new(ManagerState {
                mappings,
                events: Vec::new(),
            }),
        }
    }

    /// Register (or replace) the mapping for a logical symbol.
    ///
    /// The logical symbol is canonicalized to uppercase, a non-futures
    /// spec is normalized into a futures spec via the defaults table,
    /// and the table is flushed to disk when persistence is enabled.
    /// A flush failure is logged, never raised.
    pub fn register_mapping(
        &self,
        logical_symbol: &str,
        contract: ContractSpec,
        is_front_month: bool,
    ) -> Result<(), ContractError> {
        let logical = logical_symbol.to_uppercase();
        let contract = normalize_to_futures(&logical, contract)?;
        let actual_contract = self.resolve_actual_contract(&logical, &contract);

        let mapping = SymbolMapping {
            logical_symbol: logical.clone(),
            actual_contract: actual_contract.clone(),
            contract,
            is_front_month,
            updated_at: Utc::now(),
        };

        let mut state = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        state.mappings.insert(logical.clone(), mapping);

        tracing::info!(
            logical_symbol = %logical,
            actual_contract = %actual_contract,
            is_front_month,
            "mapping_registered"
        );

        if self.config.persist_mappings {
            if let Err(e) = persistence::save_mappings(&self.config.mappings_path, &state.mappings)
            {
                tracing::warn!(
                    path = %self.config.mappings_path.display(),
                    error = %e,
                    "mappings_save_failed"
                );
            }
        }

        Ok(())
    }

    /// Actual contract symbol for a registration.
    ///
    /// With front-month auto-detection enabled and a spec registered by
    /// bare root (no month code), the active contract code is derived
    /// from the defaults table.
    fn resolve_actual_contract(&self, logical: &str, contract: &ContractSpec) -> String {
        if self.config.auto_detect_front_month && contract.symbol() == logical {
            if let Some(derived) = front_month_symbol(logical, Utc::now().date_naive()) {
                return derived;
            }
        }
        contract
            .local_symbol()
            .unwrap_or(contract.symbol())
            .to_string()
    }

    /// Mapped contract spec for a logical symbol (case-insensitive).
    #[must_use]
    pub fn get_contract(&self, logical_symbol: &str) -> Option<ContractSpec> {
        self.get_mapping(logical_symbol).map(|m| m.contract)
    }

    /// Full mapping record for a logical symbol (case-insensitive).
    #[must_use]
    pub fn get_mapping(&self, logical_symbol: &str) -> Option<SymbolMapping> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .mappings
            .get(&logical_symbol.to_uppercase())
            .cloned()
    }

    /// Scan contracts for known upcoming expirations.
    ///
    /// Only futures with a resolvable days-to-expiry can alert; a
    /// present-but-unparsable expiration is surfaced as a structured
    /// warning event and otherwise skipped.
    #[must_use]
    pub fn check_rollover_needed(&self, contracts: &[ContractSpec]) -> Vec<RolloverAlert> {
        let today = Utc::now().date_naive();
        let mut alerts = Vec::new();

        for spec in contracts {
            if !spec.sec_type().is_futures() {
                continue;
            }
            let Some(raw) = spec.expiration_date() else {
                continue;
            };
            let Some(days) = spec.days_to_expiry(today) else {
                tracing::warn!(
                    symbol = %spec.symbol(),
                    expiration = raw,
                    "expiration_unparsable"
                );
                continue;
            };
            if days > self.config.warn_days_before_expiry {
                continue;
            }

            let urgency = if days <= 2 {
                AlertUrgency::Critical
            } else {
                AlertUrgency::Warning
            };
            tracing::warn!(
                symbol = %spec.symbol(),
                days_to_expiry = days,
                urgency = ?urgency,
                "rollover_alert"
            );
            alerts.push(RolloverAlert {
                symbol: spec.symbol().to_string(),
                expiration_date: raw.to_string(),
                days_to_expiry: days,
                urgency,
            });
        }

        alerts
    }

    /// Generate the close/open order pair migrating a position.
    ///
    /// Returns `(None, None)` for a flat position. The close order
    /// targets the currently mapped contract (falling back to `symbol`
    /// when unmapped); the open order targets `next_contract`. Orders
    /// are specifications only; nothing is submitted.
    #[must_use]
    pub fn generate_rollover_orders(
        &self,
        symbol: &str,
        next_contract: &ContractSpec,
        portfolio: &dyn Portfolio,
    ) -> (Option<RolloverOrder>, Option<RolloverOrder>) {
        let quantity = portfolio.position_quantity(symbol);
        if quantity.is_zero() {
            tracing::info!(symbol = %symbol, "rollover_skipped_flat");
            return (None, None);
        }

        let current_contract = self
            .get_mapping(symbol)
            .map_or_else(|| symbol.to_uppercase(), |m| m.actual_contract);

        // The open side re-establishes the position; the close side is
        // its opposite.
        let open_side = if quantity > Decimal::ZERO {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };

        let close = RolloverOrder::new(current_contract, open_side.opposite(), quantity.abs());
        let open = RolloverOrder::new(next_contract.symbol(), open_side, quantity.abs());

        tracing::info!(
            symbol = %symbol,
            close_contract = %close.contract,
            open_contract = %open.contract,
            quantity = %quantity,
            "rollover_orders_generated"
        );

        (Some(close), Some(open))
    }

    /// Create a PENDING rollover event and append it to the history.
    pub fn create_rollover_event(
        &self,
        logical_symbol: &str,
        from_contract: &str,
        to_contract: &str,
        position_quantity: Decimal,
    ) -> RolloverEvent {
        let event = RolloverEvent::new(
            logical_symbol.to_uppercase(),
            from_contract,
            to_contract,
            position_quantity,
        );

        tracing::info!(
            event_id = %event.event_id,
            logical_symbol = %event.logical_symbol,
            from_contract = %event.from_contract,
            to_contract = %event.to_contract,
            "rollover_event_created"
        );

        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .push(event.clone());
        event
    }

    /// Apply a status transition and execution fields to an event.
    ///
    /// Rejects unknown event ids and transitions outside the lifecycle;
    /// terminal events are immutable. COMPLETED/FAILED stamp
    /// `completed_at`.
    pub fn update_rollover_status(
        &self,
        event_id: Uuid,
        status: RolloverStatus,
        update: RolloverUpdate,
    ) -> Result<(), RolloverUpdateError> {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Linear scan: the history is small and append-only.
        let event = state
            .events
            .iter_mut()
            .find(|event| event.event_id == event_id)
            .ok_or(RolloverUpdateError::NotFound(event_id))?;

        if !event.status.can_transition_to(status) {
            return Err(RolloverUpdateError::InvalidTransition {
                event_id,
                from: event.status,
                to: status,
            });
        }

        event.status = status;
        if let Some(message) = update.error_message {
            event.error_message = Some(message);
        }
        if let Some(order_id) = update.close_order_id {
            event.close_order_id = Some(order_id);
        }
        if let Some(order_id) = update.open_order_id {
            event.open_order_id = Some(order_id);
        }
        if let Some(price) = update.close_fill_price {
            event.close_fill_price = Some(price);
        }
        if let Some(price) = update.open_fill_price {
            event.open_fill_price = Some(price);
        }
        if matches!(status, RolloverStatus::Completed | RolloverStatus::Failed) {
            event.completed_at = Some(Utc::now());
        }

        tracing::info!(event_id = %event_id, status = ?status, "rollover_status_updated");
        Ok(())
    }

    /// Read-only snapshot of the full event history.
    #[must_use]
    pub fn get_rollover_history(&self) -> Vec<RolloverEvent> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .clone()
    }

    /// Events still in flight (PENDING or IN_PROGRESS).
    #[must_use]
    pub fn get_pending_rollovers(&self) -> Vec<RolloverEvent> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .iter()
            .filter(|event| !event.status.is_terminal())
            .cloned()
            .collect()
    }
}

/// Normalize a registered spec into a futures spec.
///
/// Futures specs pass through. A generic spec is rebuilt as FUT,
/// taking the multiplier from the spec or the defaults table for its
/// root; an unknown root with no multiplier is an error.
fn normalize_to_futures(
    logical: &str,
    spec: ContractSpec,
) -> Result<ContractSpec, ContractError> {
    if spec.sec_type().is_futures() {
        return Ok(spec);
    }

    let root = spec.underlying().unwrap_or(logical).to_string();
    let multiplier = match spec.multiplier() {
        Some(m) => m,
        None => {
            defaults_for(&root)
                .ok_or(ContractError::UnknownRoot { root: root.clone() })?
                .multiplier
        }
    };

    let mut futures = ContractSpec::new(
        spec.symbol(),
        SecType::Fut,
        spec.exchange(),
        Some(multiplier),
    )?
    .with_currency(spec.currency())
    .with_underlying(&root);
    if let Some(expiration) = spec.expiration_date() {
        futures = futures.with_expiration(expiration);
    }
    if let Some(con_id) = spec.con_id() {
        futures = futures.with_con_id(con_id);
    }
    if let Some(local) = spec.local_symbol() {
        futures = futures.with_local_symbol(local);
    }
    Ok(futures)
}
