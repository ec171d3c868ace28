use thiserror::Error;

use comptoir_auth::AuthzError;
use comptoir_core::DomainError;

/// Failures of the transactional store itself (not business rules).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("aggregate type mismatch: {0}")]
    AggregateTypeMismatch(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),
}

/// Error returned by every engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored event payload no longer matches its aggregate's event type.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Programming or configuration defects, as opposed to user-correctable input.
    pub fn is_internal(&self) -> bool {
        match self {
            EngineError::Domain(e) => e.is_internal(),
            EngineError::Authz(_) => false,
            EngineError::Store(StoreError::Concurrency(_)) => false,
            EngineError::Store(_) | EngineError::Deserialize(_) => true,
        }
    }

    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            EngineError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comptoir_core::{ProductId, WarehouseId};

    #[test]
    fn unbalanced_entries_and_store_failures_are_internal() {
        let unbalanced = EngineError::from(DomainError::UnbalancedEntry {
            debits: rust_decimal::Decimal::ONE,
            credits: rust_decimal::Decimal::ZERO,
        });
        assert!(unbalanced.is_internal());
        assert!(EngineError::from(StoreError::InvalidAppend("empty".into())).is_internal());
        assert!(EngineError::Deserialize("bad".into()).is_internal());
    }

    #[test]
    fn business_failures_are_not_internal() {
        let stock = EngineError::from(DomainError::InsufficientStock {
            product: ProductId::new(),
            warehouse: WarehouseId::new(),
            available: 1,
            requested: 2,
        });
        assert!(!stock.is_internal());
        assert!(matches!(stock.domain(), Some(DomainError::InsufficientStock { .. })));
        assert!(!EngineError::from(AuthzError::TenantMismatch).is_internal());
        assert!(!EngineError::from(StoreError::Concurrency("stale".into())).is_internal());
    }
}
