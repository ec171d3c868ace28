//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::{ProductId, WarehouseId};
use crate::money::Quantity;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, state machine violations). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A movement or line quantity was zero, negative or otherwise unusable.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// An outgoing movement would take the position below zero.
    #[error(
        "insufficient stock for product {product} in warehouse {warehouse}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product: ProductId,
        warehouse: WarehouseId,
        available: Quantity,
        requested: Quantity,
    },

    /// The document is not in a state that permits the requested transition.
    #[error("invalid transition: cannot {action} a {document} that is {state}")]
    InvalidTransition {
        document: &'static str,
        action: &'static str,
        state: String,
    },

    /// The transition needs at least one item.
    #[error("{0} has no items")]
    EmptyDocument(&'static str),

    /// Items can no longer be modified.
    #[error("{document} is locked ({state})")]
    DocumentLocked { document: &'static str, state: String },

    /// Transfer source and destination are the same warehouse.
    #[error("source and destination warehouse must differ")]
    SameWarehouse,

    /// Another inventory count is in progress for the warehouse.
    #[error("warehouse {0} already has an inventory count in progress")]
    WarehouseLocked(WarehouseId),

    /// A posting whose debits and credits differ. Indicates a programming defect
    /// when raised for internally generated postings.
    #[error("unbalanced entry: debits {debits} != credits {credits}")]
    UnbalancedEntry { debits: Decimal, credits: Decimal },

    /// A cash-settled transition needs an open cash register session.
    #[error("no open cash session for point of sale {0}")]
    CashSessionRequired(String),

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found: {0}")]
    NotFound(String),

    /// A conflict occurred (e.g. stale version, duplicate open session).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authorization failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn invalid_transition(
        document: &'static str,
        action: &'static str,
        state: impl core::fmt::Debug,
    ) -> Self {
        Self::InvalidTransition {
            document,
            action,
            state: format!("{state:?}").to_lowercase(),
        }
    }

    pub fn locked(document: &'static str, state: impl core::fmt::Debug) -> Self {
        Self::DocumentLocked {
            document,
            state: format!("{state:?}").to_lowercase(),
        }
    }

    /// Input errors detected before any write.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidQuantity(_)
                | DomainError::EmptyDocument(_)
                | DomainError::SameWarehouse
                | DomainError::Validation(_)
                | DomainError::InvalidId(_)
        )
    }

    /// Errors that signal a defect rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            DomainError::UnbalancedEntry { .. } | DomainError::InvariantViolation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum Status {
        Received,
    }

    #[test]
    fn transition_errors_render_state_in_lowercase() {
        let err = DomainError::invalid_transition("purchase", "cancel", Status::Received);
        assert_eq!(
            err.to_string(),
            "invalid transition: cannot cancel a purchase that is received"
        );
    }

    #[test]
    fn classification_separates_input_from_defects() {
        assert!(DomainError::SameWarehouse.is_validation());
        assert!(!DomainError::SameWarehouse.is_internal());
        let unbalanced = DomainError::UnbalancedEntry {
            debits: Decimal::ONE,
            credits: Decimal::ZERO,
        };
        assert!(unbalanced.is_internal());
        assert!(!unbalanced.is_validation());
    }
}
