use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comptoir_core::{DocumentRef, ProductId, Quantity, TenantId, WarehouseId};

/// Key of a stock position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
}

impl StockKey {
    pub fn new(tenant_id: TenantId, product_id: ProductId, warehouse_id: WarehouseId) -> Self {
        Self {
            tenant_id,
            product_id,
            warehouse_id,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// Why stock moved. Each reason is written by exactly one workflow transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    PurchaseReceipt,
    Sale,
    TransferOut,
    TransferIn,
    CountAdjustment,
}

impl MovementReason {
    /// Whether the reason can carry a movement in `direction`.
    pub fn permits(self, direction: Direction) -> bool {
        match self {
            MovementReason::PurchaseReceipt | MovementReason::TransferIn => direction == Direction::In,
            MovementReason::Sale | MovementReason::TransferOut => direction == Direction::Out,
            MovementReason::CountAdjustment => true,
        }
    }
}

/// A movement as requested by a workflow, before the store assigns id and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRequest {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub direction: Direction,
    pub quantity: Quantity,
    /// Cost of incoming units. Ignored for `Out`: outgoing units leave at the
    /// position's average cost.
    pub unit_cost: Decimal,
    pub reason: MovementReason,
    pub document: DocumentRef,
}

impl MovementRequest {
    pub fn incoming(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: Quantity,
        unit_cost: Decimal,
        reason: MovementReason,
        document: DocumentRef,
    ) -> Self {
        Self {
            product_id,
            warehouse_id,
            direction: Direction::In,
            quantity,
            unit_cost,
            reason,
            document,
        }
    }

    pub fn outgoing(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: Quantity,
        reason: MovementReason,
        document: DocumentRef,
    ) -> Self {
        Self {
            product_id,
            warehouse_id,
            direction: Direction::Out,
            quantity,
            unit_cost: Decimal::ZERO,
            reason,
            document,
        }
    }
}

/// Immutable stock movement record (append-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    /// Per-tenant, auto-incrementing sequence (starts at 1).
    pub id: u64,
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub direction: Direction,
    pub quantity: Quantity,
    pub unit_cost_at_time: Decimal,
    pub reason: MovementReason,
    pub document: DocumentRef,
    pub occurred_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.tenant_id, self.product_id, self.warehouse_id)
    }

    /// `+quantity` for `In`, `-quantity` for `Out`.
    pub fn signed_quantity(&self) -> Quantity {
        match self.direction {
            Direction::In => self.quantity,
            Direction::Out => -self.quantity,
        }
    }

    /// Value moved at the recorded unit cost (unrounded).
    pub fn value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_cost_at_time
    }
}
