use rust_decimal::Decimal;

use comptoir_accounting::{AccountingEntry, BusinessEvent, PostingGenerator};
use comptoir_auth::Permission;
use comptoir_cash::{CashCategory, CashDirection, CashMovement, CashMovementRequest};
use comptoir_core::{
    Aggregate, DocumentKind, DocumentRef, DomainError, ExpectedVersion, PaymentMethod, PointOfSaleId,
    ProductId, Quantity, WarehouseId, round_money,
};
use comptoir_inventory::{MovementReason, MovementRequest, NegativeStockPolicy, StockMovement};
use comptoir_sales::{Sale, SaleCommand, SaleId};

use super::Engine;
use crate::config::SalePriceSource;
use crate::context::RequestContext;
use crate::error::EngineResult;

/// Everything written by completing a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleCompletion {
    pub sale: Sale,
    pub movements: Vec<StockMovement>,
    pub entries: Vec<AccountingEntry>,
    pub cash_movement: Option<CashMovement>,
    /// Sum of the sale movements' value at average cost.
    pub cost_of_goods_sold: Decimal,
}

fn sale_ref(id: SaleId) -> DocumentRef {
    DocumentRef::new(DocumentKind::Sale, id.aggregate_id())
}

impl Engine {
    pub fn create_sale(
        &self,
        ctx: &RequestContext,
        warehouse_id: WarehouseId,
        point_of_sale: Option<PointOfSaleId>,
    ) -> EngineResult<Sale> {
        let sale_id = SaleId::generate();
        self.transition("sale.create", ctx, &Permission::SALES_CREATE, |tx, _| {
            let command = SaleCommand::Create {
                tenant_id: ctx.tenant_id,
                sale_id,
                warehouse_id,
                point_of_sale,
                occurred_at: tx.now(),
            };
            let sale = tx.execute(DocumentKind::Sale, sale_id.aggregate_id(), Sale::empty(sale_id), &command)?;
            tracing::info!(tenant_id = %ctx.tenant_id, %sale_id, %warehouse_id, "sale created");
            Ok(sale)
        })
    }

    /// Add a line; `unit_price` falls back to the catalog sale price when allowed.
    pub fn add_sale_item(
        &self,
        ctx: &RequestContext,
        sale_id: SaleId,
        product_id: ProductId,
        quantity: Quantity,
        unit_price: Option<Decimal>,
    ) -> EngineResult<Sale> {
        self.transition("sale.add_item", ctx, &Permission::SALES_CREATE, |tx, config| {
            let product = self.product(ctx.tenant_id, product_id)?;
            if !product.can_be_sold() {
                return Err(DomainError::validation(format!("product {} is archived", product.sku)).into());
            }
            let unit_price = match (unit_price, config.sale_price_source) {
                (Some(price), _) => price,
                (None, SalePriceSource::Catalog) => product.pricing.sale_price,
                (None, SalePriceSource::Explicit) => {
                    return Err(DomainError::validation("sale lines need an explicit unit price").into());
                }
            };

            let (mut sale, version) = tx.load(DocumentKind::Sale, sale_id.aggregate_id(), Sale::empty(sale_id))?;
            let decided = sale.handle(&SaleCommand::AddItem {
                tenant_id: ctx.tenant_id,
                product_id,
                quantity,
                unit_price,
                occurred_at: tx.now(),
            })?;

            if config.check_stock_on_add && config.negative_stock == NegativeStockPolicy::Forbid {
                let warehouse_id = sale
                    .warehouse_id()
                    .ok_or_else(|| DomainError::invariant("sale has no warehouse"))?;
                let available = tx.position(tx.stock_key(product_id, warehouse_id)).quantity();
                let requested = sale.quantity_of(product_id).checked_add(quantity).ok_or_else(|| {
                    DomainError::invalid_quantity(format!("sale quantity of product {product_id} overflows"))
                })?;
                if requested > available {
                    return Err(DomainError::InsufficientStock {
                        product: product_id,
                        warehouse: warehouse_id,
                        available: available.max(0),
                        requested,
                    }
                    .into());
                }
            }

            tx.append(
                DocumentKind::Sale,
                sale_id.aggregate_id(),
                ExpectedVersion::Exact(version),
                &decided,
            )?;
            for event in &decided {
                sale.apply(event);
            }
            Ok(sale)
        })
    }

    /// Deduct stock at average cost, collect the payment and post revenue and COGS.
    ///
    /// Availability is checked again here; a line that fit at `add_sale_item`
    /// can fail now if stock moved in between.
    pub fn complete_sale(
        &self,
        ctx: &RequestContext,
        sale_id: SaleId,
        method: PaymentMethod,
        amount_paid: Decimal,
    ) -> EngineResult<SaleCompletion> {
        self.transition("sale.complete", ctx, &Permission::SALES_COMPLETE, |tx, config| {
            let command = SaleCommand::Complete {
                tenant_id: ctx.tenant_id,
                method,
                amount_paid,
                occurred_at: tx.now(),
            };
            let sale = tx.execute(DocumentKind::Sale, sale_id.aggregate_id(), Sale::empty(sale_id), &command)?;
            let warehouse_id = sale
                .warehouse_id()
                .ok_or_else(|| DomainError::invariant("sale has no warehouse"))?;
            let payment = sale
                .payment()
                .ok_or_else(|| DomainError::invariant("completed sale has no payment"))?;
            let document = sale_ref(sale_id);

            let mut movements = Vec::with_capacity(sale.items().len());
            for item in sale.items() {
                let request = MovementRequest::outgoing(
                    item.product_id,
                    warehouse_id,
                    item.quantity,
                    MovementReason::Sale,
                    document,
                );
                movements.push(tx.apply_movement(request, config.stock_rules())?);
            }
            let cost_of_goods_sold: Decimal = movements.iter().map(|m| m.value()).sum();

            let event = BusinessEvent::SaleCompleted {
                method,
                total: sale.total(),
                collected: payment.collected,
                cost_of_goods_sold,
            };
            let posting = PostingGenerator::new(&config.chart, config.money_scale).generate(document, &event)?;
            let entries = tx.post(posting, tx.now().date_naive())?;

            let collected = round_money(payment.collected, config.money_scale);
            let cash_movement = if method.requires_cash_ledger_entry() && collected > Decimal::ZERO {
                let point_of_sale = sale
                    .point_of_sale()
                    .ok_or_else(|| DomainError::validation("a cash sale needs a point of sale"))?;
                let request = CashMovementRequest::new(
                    CashDirection::In,
                    CashCategory::Sale,
                    collected,
                    format!("collection of {document}"),
                )
                .for_document(document);
                Some(tx.record_cash(point_of_sale, request)?)
            } else {
                None
            };

            tracing::info!(
                tenant_id = %ctx.tenant_id,
                %sale_id,
                %method,
                total = %sale.total(),
                cogs = %cost_of_goods_sold,
                change_due = %payment.change_due,
                outstanding = %payment.outstanding(sale.total()),
                movements = movements.len(),
                entries = entries.len(),
                "sale completed"
            );
            Ok(SaleCompletion {
                sale,
                movements,
                entries,
                cash_movement,
                cost_of_goods_sold,
            })
        })
    }

    pub fn cancel_sale(&self, ctx: &RequestContext, sale_id: SaleId, reason: Option<String>) -> EngineResult<Sale> {
        self.transition("sale.cancel", ctx, &Permission::SALES_CANCEL, |tx, _| {
            let command = SaleCommand::Cancel {
                tenant_id: ctx.tenant_id,
                reason,
                occurred_at: tx.now(),
            };
            let sale = tx.execute(DocumentKind::Sale, sale_id.aggregate_id(), Sale::empty(sale_id), &command)?;
            tracing::info!(tenant_id = %ctx.tenant_id, %sale_id, "sale cancelled");
            Ok(sale)
        })
    }
}
