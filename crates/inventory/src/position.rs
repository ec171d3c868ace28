use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comptoir_core::{DomainError, DomainResult, Quantity};

use crate::movement::{Direction, MovementRequest, StockKey, StockMovement};

/// Tenant policy for outgoing movements that exceed the available quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeStockPolicy {
    /// Reject with `InsufficientStock`.
    #[default]
    Forbid,
    /// Let the position go negative and flag it.
    Allow,
}

/// Current quantity and weighted-average unit cost for one stock key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPosition {
    key: StockKey,
    quantity: Quantity,
    average_cost: Decimal,
    /// Id of the last movement folded into this position (0 = none).
    last_movement_id: u64,
}

impl StockPosition {
    /// Position of a key that has never moved.
    pub fn empty(key: StockKey) -> Self {
        Self {
            key,
            quantity: 0,
            average_cost: Decimal::ZERO,
            last_movement_id: 0,
        }
    }

    pub fn key(&self) -> StockKey {
        self.key
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn average_cost(&self) -> Decimal {
        self.average_cost
    }

    pub fn last_movement_id(&self) -> u64 {
        self.last_movement_id
    }

    /// Set when a permitted negative-stock sale took the position below zero.
    pub fn is_negative(&self) -> bool {
        self.quantity < 0
    }

    /// Stock value at average cost (unrounded, zero for negative positions).
    pub fn value(&self) -> Decimal {
        if self.quantity > 0 {
            Decimal::from(self.quantity) * self.average_cost
        } else {
            Decimal::ZERO
        }
    }

    /// Validate `request` against this position and return the unit cost the
    /// movement must be recorded at.
    ///
    /// - incoming: the requested unit cost
    /// - outgoing: the current average cost
    pub fn plan(&self, request: &MovementRequest, policy: NegativeStockPolicy) -> DomainResult<Decimal> {
        if request.product_id != self.key.product_id || request.warehouse_id != self.key.warehouse_id {
            return Err(DomainError::invariant("movement does not target this position"));
        }
        if !request.reason.permits(request.direction) {
            return Err(DomainError::invariant(format!(
                "{:?} movement cannot be recorded as {:?}",
                request.direction, request.reason
            )));
        }
        if request.quantity <= 0 {
            return Err(DomainError::invalid_quantity(format!(
                "movement quantity must be positive (got {})",
                request.quantity
            )));
        }

        match request.direction {
            Direction::In => {
                if request.unit_cost < Decimal::ZERO {
                    return Err(DomainError::validation("unit cost cannot be negative"));
                }
                if self.quantity.checked_add(request.quantity).is_none() {
                    return Err(DomainError::invalid_quantity(format!(
                        "receiving {} would overflow the position of {}",
                        request.quantity, self.quantity
                    )));
                }
                Ok(request.unit_cost)
            }
            Direction::Out => {
                if policy == NegativeStockPolicy::Forbid && request.quantity > self.quantity {
                    return Err(DomainError::InsufficientStock {
                        product: self.key.product_id,
                        warehouse: self.key.warehouse_id,
                        available: self.quantity.max(0),
                        requested: request.quantity,
                    });
                }
                if self.quantity.checked_sub(request.quantity).is_none() {
                    return Err(DomainError::invalid_quantity(format!(
                        "issuing {} would overflow the position of {}",
                        request.quantity, self.quantity
                    )));
                }
                Ok(self.average_cost)
            }
        }
    }

    /// Fold one committed movement into the position.
    ///
    /// This is the only way a position changes, both when the store maintains it
    /// incrementally and when it is rebuilt from the log.
    pub fn apply(&mut self, movement: &StockMovement) {
        match movement.direction {
            Direction::In => {
                let new_quantity = self.quantity + movement.quantity;
                self.average_cost = if self.quantity <= 0 || new_quantity <= 0 {
                    movement.unit_cost_at_time
                } else {
                    (Decimal::from(self.quantity) * self.average_cost
                        + Decimal::from(movement.quantity) * movement.unit_cost_at_time)
                        / Decimal::from(new_quantity)
                };
                self.quantity = new_quantity;
            }
            Direction::Out => {
                self.quantity -= movement.quantity;
            }
        }
        self.last_movement_id = movement.id;
    }
}
