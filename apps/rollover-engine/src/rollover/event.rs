//! Rollover event audit records and their lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Rollover event lifecycle status.
///
/// ```text
/// PENDING ──► IN_PROGRESS ──► COMPLETED
///    │             │     └──► FAILED
///    └──► CANCELLED ◄──┘
/// ```
///
/// COMPLETED, FAILED, and CANCELLED are terminal; no further mutation
/// is permitted once reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RolloverStatus {
    /// Event created, execution not yet started.
    Pending,
    /// Close/open orders are being worked.
    InProgress,
    /// Both legs filled.
    Completed,
    /// Execution failed.
    Failed,
    /// Rollover abandoned before completion.
    Cancelled,
}

impl RolloverStatus {
    /// Returns true if the status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether a transition to `next` is permitted.
    ///
    /// Re-asserting the current non-terminal status is allowed so that
    /// execution updates (order ids, fill prices) can be applied
    /// without a state change.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Pending | Self::InProgress | Self::Cancelled),
            Self::InProgress => matches!(
                next,
                Self::InProgress | Self::Completed | Self::Failed | Self::Cancelled
            ),
            Self::Completed | Self::Failed | Self::Cancelled => false,
        }
    }
}

/// Errors from rollover event updates.
#[derive(Debug, Error)]
pub enum RolloverUpdateError {
    /// No event with the given id exists.
    #[error("No rollover event with id {0}")]
    NotFound(Uuid),

    /// The requested transition is not in the lifecycle.
    #[error("Invalid rollover transition {from:?} -> {to:?} for event {event_id}")]
    InvalidTransition {
        /// Event that rejected the update.
        event_id: Uuid,
        /// Current status.
        from: RolloverStatus,
        /// Requested status.
        to: RolloverStatus,
    },
}

/// Audit record for one rollover.
///
/// Created in PENDING state and appended to the manager's history;
/// an external execution layer updates it as orders fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloverEvent {
    /// Globally unique event id, generated at creation.
    pub event_id: Uuid,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Logical symbol being rolled (e.g. "ES").
    pub logical_symbol: String,
    /// Contract being closed.
    pub from_contract: String,
    /// Contract being opened.
    pub to_contract: String,
    /// Signed position quantity being migrated.
    pub position_quantity: Decimal,
    /// Lifecycle status.
    pub status: RolloverStatus,
    /// Close-leg order id, set by external execution.
    pub close_order_id: Option<String>,
    /// Open-leg order id, set by external execution.
    pub open_order_id: Option<String>,
    /// Close-leg fill price.
    pub close_fill_price: Option<Decimal>,
    /// Open-leg fill price.
    pub open_fill_price: Option<Decimal>,
    /// Failure detail, if any.
    pub error_message: Option<String>,
    /// Stamped on transition to COMPLETED or FAILED.
    pub completed_at: Option<DateTime<Utc>>,
}

impl RolloverEvent {
    /// Create a new PENDING event with a fresh id.
    #[must_use]
    pub fn new(
        logical_symbol: impl Into<String>,
        from_contract: impl Into<String>,
        to_contract: impl Into<String>,
        position_quantity: Decimal,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            logical_symbol: logical_symbol.into(),
            from_contract: from_contract.into(),
            to_contract: to_contract.into(),
            position_quantity,
            status: RolloverStatus::Pending,
            close_order_id: None,
            open_order_id: None,
            close_fill_price: None,
            open_fill_price: None,
            error_message: None,
            completed_at: None,
        }
    }
}

/// Optional fields applied alongside a status update.
#[derive(Debug, Clone, Default)]
pub struct RolloverUpdate {
    /// Failure detail.
    pub error_message: Option<String>,
    /// Close-leg order id.
    pub close_order_id: Option<String>,
    /// Open-leg order id.
    pub open_order_id: Option<String>,
    /// Close-leg fill price.
    pub close_fill_price: Option<Decimal>,
    /// Open-leg fill price.
    pub open_fill_price: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_event_is_pending() {
        let event = RolloverEvent::new("ES", "ESZ25", "ESH26", dec!(10));
        assert_eq!(event.status, RolloverStatus::Pending);
        assert!(event.completed_at.is_none());
        assert!(event.close_order_id.is_none());
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = RolloverEvent::new("ES", "ESZ25", "ESH26", dec!(10));
        let b = RolloverEvent::new("ES", "ESZ25", "ESH26", dec!(10));
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(RolloverStatus::Completed.is_terminal());
        assert!(RolloverStatus::Failed.is_terminal());
        assert!(RolloverStatus::Cancelled.is_terminal());
        assert!(!RolloverStatus::Pending.is_terminal());
        assert!(!RolloverStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_lifecycle_transitions() {
        use RolloverStatus::{Cancelled, Completed, Failed, InProgress, Pending};

        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Failed));

        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Failed));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(!InProgress.can_transition_to(Pending));

        // Terminal states reject everything.
        for terminal in [Completed, Failed, Cancelled] {
            for next in [Pending, InProgress, Completed, Failed, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }
}
