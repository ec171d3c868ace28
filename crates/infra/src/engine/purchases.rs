use rust_decimal::Decimal;

use comptoir_accounting::{AccountingEntry, BusinessEvent, PostingGenerator};
use comptoir_auth::Permission;
use comptoir_cash::{CashCategory, CashDirection, CashMovement, CashMovementRequest};
use comptoir_core::{
    DocumentKind, DocumentRef, DomainError, PointOfSaleId, ProductId, Quantity, Settlement, WarehouseId,
    round_money,
};
use comptoir_inventory::{MovementReason, MovementRequest, StockMovement};
use comptoir_purchasing::{Purchase, PurchaseCommand, PurchaseId};

use super::Engine;
use crate::context::RequestContext;
use crate::error::EngineResult;

/// Everything written by receiving a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub purchase: Purchase,
    pub movements: Vec<StockMovement>,
    pub entries: Vec<AccountingEntry>,
    pub cash_movement: Option<CashMovement>,
}

fn purchase_ref(id: PurchaseId) -> DocumentRef {
    DocumentRef::new(DocumentKind::Purchase, id.aggregate_id())
}

impl Engine {
    pub fn create_purchase(
        &self,
        ctx: &RequestContext,
        warehouse_id: WarehouseId,
        terms: Settlement,
        point_of_sale: Option<PointOfSaleId>,
    ) -> EngineResult<Purchase> {
        let purchase_id = PurchaseId::generate();
        self.transition("purchase.create", ctx, &Permission::PURCHASES_MANAGE, |tx, _| {
            let command = PurchaseCommand::Create {
                tenant_id: ctx.tenant_id,
                purchase_id,
                warehouse_id,
                terms,
                point_of_sale,
                occurred_at: tx.now(),
            };
            let purchase = tx.execute(
                DocumentKind::Purchase,
                purchase_id.aggregate_id(),
                Purchase::empty(purchase_id),
                &command,
            )?;
            tracing::info!(tenant_id = %ctx.tenant_id, %purchase_id, %warehouse_id, "purchase created");
            Ok(purchase)
        })
    }

    pub fn add_purchase_item(
        &self,
        ctx: &RequestContext,
        purchase_id: PurchaseId,
        product_id: ProductId,
        quantity: Quantity,
        unit_price: Decimal,
    ) -> EngineResult<Purchase> {
        self.transition("purchase.add_item", ctx, &Permission::PURCHASES_MANAGE, |tx, _| {
            let command = PurchaseCommand::AddItem {
                tenant_id: ctx.tenant_id,
                product_id,
                quantity,
                unit_price,
                occurred_at: tx.now(),
            };
            tx.execute(
                DocumentKind::Purchase,
                purchase_id.aggregate_id(),
                Purchase::empty(purchase_id),
                &command,
            )
        })
    }

    pub fn confirm_purchase(&self, ctx: &RequestContext, purchase_id: PurchaseId) -> EngineResult<Purchase> {
        self.transition("purchase.confirm", ctx, &Permission::PURCHASES_MANAGE, |tx, _| {
            let command = PurchaseCommand::Confirm {
                tenant_id: ctx.tenant_id,
                occurred_at: tx.now(),
            };
            let purchase = tx.execute(
                DocumentKind::Purchase,
                purchase_id.aggregate_id(),
                Purchase::empty(purchase_id),
                &command,
            )?;
            tracing::info!(tenant_id = %ctx.tenant_id, %purchase_id, items = purchase.items().len(), "purchase confirmed");
            Ok(purchase)
        })
    }

    /// Stock every item at its purchase price, post the intake and pay it.
    pub fn receive_purchase(&self, ctx: &RequestContext, purchase_id: PurchaseId) -> EngineResult<PurchaseReceipt> {
        self.transition("purchase.receive", ctx, &Permission::PURCHASES_RECEIVE, |tx, config| {
            let command = PurchaseCommand::Receive {
                tenant_id: ctx.tenant_id,
                occurred_at: tx.now(),
            };
            let purchase = tx.execute(
                DocumentKind::Purchase,
                purchase_id.aggregate_id(),
                Purchase::empty(purchase_id),
                &command,
            )?;
            let warehouse_id = purchase
                .warehouse_id()
                .ok_or_else(|| DomainError::invariant("received purchase has no warehouse"))?;
            let document = purchase_ref(purchase_id);

            for item in purchase.items() {
                self.product(ctx.tenant_id, item.product_id)?;
            }

            let mut movements = Vec::with_capacity(purchase.items().len());
            for item in purchase.items() {
                let request = MovementRequest::incoming(
                    item.product_id,
                    warehouse_id,
                    item.quantity,
                    item.unit_price,
                    MovementReason::PurchaseReceipt,
                    document,
                );
                movements.push(tx.apply_movement(request, config.stock_rules())?);
            }

            let event = BusinessEvent::PurchaseReceived {
                settlement: purchase.terms(),
                item_values: purchase.items().iter().map(|i| i.value()).collect(),
            };
            let posting = PostingGenerator::new(&config.chart, config.money_scale).generate(document, &event)?;
            let entries = tx.post(posting, tx.now().date_naive())?;

            let amount = round_money(purchase.total(), config.money_scale);
            let cash_movement = if purchase.terms().requires_cash_ledger_entry() && amount > Decimal::ZERO {
                let point_of_sale = purchase
                    .point_of_sale()
                    .ok_or_else(|| DomainError::validation("a cash purchase needs a point of sale"))?;
                let request = CashMovementRequest::new(
                    CashDirection::Out,
                    CashCategory::Purchase,
                    amount,
                    format!("payment of {document}"),
                )
                .for_document(document);
                Some(tx.record_cash(point_of_sale, request)?)
            } else {
                None
            };

            tracing::info!(
                tenant_id = %ctx.tenant_id,
                %purchase_id,
                %warehouse_id,
                movements = movements.len(),
                entries = entries.len(),
                total = %purchase.total(),
                "purchase received"
            );
            Ok(PurchaseReceipt {
                purchase,
                movements,
                entries,
                cash_movement,
            })
        })
    }

    pub fn cancel_purchase(
        &self,
        ctx: &RequestContext,
        purchase_id: PurchaseId,
        reason: Option<String>,
    ) -> EngineResult<Purchase> {
        self.transition("purchase.cancel", ctx, &Permission::PURCHASES_MANAGE, |tx, _| {
            let command = PurchaseCommand::Cancel {
                tenant_id: ctx.tenant_id,
                reason,
                occurred_at: tx.now(),
            };
            let purchase = tx.execute(
                DocumentKind::Purchase,
                purchase_id.aggregate_id(),
                Purchase::empty(purchase_id),
                &command,
            )?;
            tracing::info!(tenant_id = %ctx.tenant_id, %purchase_id, "purchase cancelled");
            Ok(purchase)
        })
    }
}
