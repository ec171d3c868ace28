use comptoir_auth::Permission;
use comptoir_core::{DocumentKind, DocumentRef, ProductId, Quantity, WarehouseId};
use comptoir_inventory::{MovementReason, MovementRequest, StockMovement};
use comptoir_transfers::{Transfer, TransferCommand, TransferId};

use super::Engine;
use crate::context::RequestContext;
use crate::error::EngineResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferExecution {
    pub transfer: Transfer,
    /// Out at source then in at destination, per item.
    pub movements: Vec<StockMovement>,
}

impl Engine {
    pub fn create_transfer(
        &self,
        ctx: &RequestContext,
        source: WarehouseId,
        destination: WarehouseId,
        items: Vec<(ProductId, Quantity)>,
    ) -> EngineResult<Transfer> {
        let transfer_id = TransferId::generate();
        self.transition("transfer.create", ctx, &Permission::TRANSFERS_MANAGE, |tx, _| {
            let command = TransferCommand::Create {
                tenant_id: ctx.tenant_id,
                transfer_id,
                source,
                destination,
                items,
                occurred_at: tx.now(),
            };
            let transfer = tx.execute(
                DocumentKind::Transfer,
                transfer_id.aggregate_id(),
                Transfer::empty(transfer_id),
                &command,
            )?;
            for item in transfer.items() {
                self.product(ctx.tenant_id, item.product_id)?;
            }
            tracing::info!(
                tenant_id = %ctx.tenant_id,
                %transfer_id,
                %source,
                %destination,
                items = transfer.items().len(),
                "transfer created"
            );
            Ok(transfer)
        })
    }

    /// Authorizes the transfer without moving stock.
    pub fn approve_transfer(&self, ctx: &RequestContext, transfer_id: TransferId) -> EngineResult<Transfer> {
        self.transition("transfer.approve", ctx, &Permission::TRANSFERS_APPROVE, |tx, _| {
            let command = TransferCommand::Approve {
                tenant_id: ctx.tenant_id,
                approved_by: ctx.user_id(),
                occurred_at: tx.now(),
            };
            let transfer = tx.execute(
                DocumentKind::Transfer,
                transfer_id.aggregate_id(),
                Transfer::empty(transfer_id),
                &command,
            )?;
            tracing::info!(tenant_id = %ctx.tenant_id, %transfer_id, approved_by = %ctx.user_id(), "transfer approved");
            Ok(transfer)
        })
    }

    /// Move every item from source to destination at the source's average cost.
    ///
    /// One item short of stock aborts the whole transfer.
    pub fn execute_transfer(&self, ctx: &RequestContext, transfer_id: TransferId) -> EngineResult<TransferExecution> {
        self.transition("transfer.execute", ctx, &Permission::TRANSFERS_MANAGE, |tx, config| {
            let command = TransferCommand::Execute {
                tenant_id: ctx.tenant_id,
                occurred_at: tx.now(),
            };
            let transfer = tx.execute(
                DocumentKind::Transfer,
                transfer_id.aggregate_id(),
                Transfer::empty(transfer_id),
                &command,
            )?;
            let (source, destination) = transfer.route()?;
            let document = DocumentRef::new(DocumentKind::Transfer, transfer_id.aggregate_id());
            let rules = config.stock_rules();

            let mut movements = Vec::with_capacity(transfer.items().len() * 2);
            for item in transfer.items() {
                let out = tx.apply_movement(
                    MovementRequest::outgoing(
                        item.product_id,
                        source,
                        item.quantity,
                        MovementReason::TransferOut,
                        document,
                    ),
                    rules,
                )?;
                let incoming = tx.apply_movement(
                    MovementRequest::incoming(
                        item.product_id,
                        destination,
                        item.quantity,
                        out.unit_cost_at_time,
                        MovementReason::TransferIn,
                        document,
                    ),
                    rules,
                )?;
                movements.push(out);
                movements.push(incoming);
            }

            tracing::info!(
                tenant_id = %ctx.tenant_id,
                %transfer_id,
                %source,
                %destination,
                movements = movements.len(),
                "transfer executed"
            );
            Ok(TransferExecution { transfer, movements })
        })
    }

    pub fn cancel_transfer(
        &self,
        ctx: &RequestContext,
        transfer_id: TransferId,
        reason: Option<String>,
    ) -> EngineResult<Transfer> {
        self.transition("transfer.cancel", ctx, &Permission::TRANSFERS_MANAGE, |tx, _| {
            let command = TransferCommand::Cancel {
                tenant_id: ctx.tenant_id,
                reason,
                occurred_at: tx.now(),
            };
            let transfer = tx.execute(
                DocumentKind::Transfer,
                transfer_id.aggregate_id(),
                Transfer::empty(transfer_id),
                &command,
            )?;
            tracing::info!(tenant_id = %ctx.tenant_id, %transfer_id, "transfer cancelled");
            Ok(transfer)
        })
    }
}
