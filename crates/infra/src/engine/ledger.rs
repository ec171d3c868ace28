use comptoir_auth::Permission;
use comptoir_core::{ProductId, WarehouseId};
use comptoir_inventory::{PositionMismatch, StockMovement, StockPosition, reconstruct};

use super::Engine;
use crate::context::RequestContext;
use crate::error::EngineResult;

impl Engine {
    /// Materialised position; an untouched key reads as empty.
    pub fn current_position(
        &self,
        ctx: &RequestContext,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> EngineResult<StockPosition> {
        self.query(ctx, &Permission::LEDGER_READ, |tx, _| {
            Ok(tx.position(tx.stock_key(product_id, warehouse_id)))
        })
    }

    /// Movement log of one key in append order.
    pub fn stock_movements(
        &self,
        ctx: &RequestContext,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> EngineResult<Vec<StockMovement>> {
        self.query(ctx, &Permission::LEDGER_READ, |tx, _| {
            Ok(tx.movements_for(tx.stock_key(product_id, warehouse_id)))
        })
    }

    pub fn reconstruct_from_log(
        &self,
        ctx: &RequestContext,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> EngineResult<StockPosition> {
        self.query(ctx, &Permission::LEDGER_READ, |tx, _| {
            Ok(reconstruct(tx.stock_key(product_id, warehouse_id), tx.movements()))
        })
    }

    /// Keys whose materialised position differs from the fold of their log.
    pub fn verify_ledger(&self, ctx: &RequestContext) -> EngineResult<Vec<PositionMismatch>> {
        self.query(ctx, &Permission::LEDGER_READ, |tx, _| {
            let mismatches = tx.verify_positions();
            if !mismatches.is_empty() {
                tracing::error!(tenant_id = %ctx.tenant_id, mismatches = mismatches.len(), "stock ledger drifted from its log");
            }
            Ok(mismatches)
        })
    }

    pub fn warehouse_positions(
        &self,
        ctx: &RequestContext,
        warehouse_id: WarehouseId,
    ) -> EngineResult<Vec<StockPosition>> {
        self.query(ctx, &Permission::LEDGER_READ, |tx, _| Ok(tx.warehouse_positions(warehouse_id)))
    }
}
