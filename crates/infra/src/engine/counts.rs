use rust_decimal::Decimal;

use comptoir_accounting::{BusinessEvent, PostingGenerator};
use comptoir_auth::Permission;
use comptoir_core::{Aggregate, DocumentKind, DocumentRef, DomainError, ExpectedVersion, ProductId, Quantity, WarehouseId};
use comptoir_inventory::{MovementReason, MovementRequest};
use comptoir_reconciliation::{
    CompletionSummary, CountCommand, CountId, CountSummary, InventoryCount, SnapshotLine, VarianceReport,
    VarianceRow,
};

use super::Engine;
use crate::context::RequestContext;
use crate::error::EngineResult;
use crate::store::Transaction;

fn count_ref(id: CountId) -> DocumentRef {
    DocumentRef::new(DocumentKind::InventoryCount, id.aggregate_id())
}

fn load_count(tx: &Transaction<'_>, count_id: CountId) -> EngineResult<(InventoryCount, u64)> {
    tx.load(
        DocumentKind::InventoryCount,
        count_id.aggregate_id(),
        InventoryCount::empty(count_id),
    )
}

fn created_count(tx: &Transaction<'_>, count_id: CountId) -> EngineResult<InventoryCount> {
    let (count, _) = load_count(tx, count_id)?;
    if !count.is_created() {
        return Err(DomainError::not_found(format!("inventory count {count_id}")).into());
    }
    Ok(count)
}

impl Engine {
    /// Snapshot the warehouse and lock it against a second count.
    pub fn start_count(
        &self,
        ctx: &RequestContext,
        warehouse_id: WarehouseId,
        reason: impl Into<String>,
    ) -> EngineResult<InventoryCount> {
        let count_id = CountId::generate();
        let reason = reason.into();
        self.transition("count.start", ctx, &Permission::INVENTORY_COUNT, |tx, _| {
            if tx.active_count(warehouse_id).is_some() {
                return Err(DomainError::WarehouseLocked(warehouse_id).into());
            }
            let snapshot = tx
                .warehouse_positions(warehouse_id)
                .iter()
                .map(|p| SnapshotLine {
                    product_id: p.key().product_id,
                    quantity: p.quantity(),
                })
                .collect::<Vec<_>>();
            let lines = snapshot.len();

            let command = CountCommand::Start {
                tenant_id: ctx.tenant_id,
                count_id,
                warehouse_id,
                reason,
                started_by: ctx.user_id(),
                snapshot,
                occurred_at: tx.now(),
            };
            let count = tx.execute(
                DocumentKind::InventoryCount,
                count_id.aggregate_id(),
                InventoryCount::empty(count_id),
                &command,
            )?;
            tx.set_active_count(warehouse_id, Some(count_id));
            tracing::info!(tenant_id = %ctx.tenant_id, %count_id, %warehouse_id, snapshot = lines, "inventory count started");
            Ok(count)
        })
    }

    /// Record (or overwrite) the physical quantity of one product.
    pub fn record_count_item(
        &self,
        ctx: &RequestContext,
        count_id: CountId,
        product_id: ProductId,
        physical_quantity: Quantity,
    ) -> EngineResult<InventoryCount> {
        self.transition("count.record_item", ctx, &Permission::INVENTORY_COUNT, |tx, _| {
            self.product(ctx.tenant_id, product_id)?;
            let command = CountCommand::RecordItem {
                tenant_id: ctx.tenant_id,
                product_id,
                physical_quantity,
                occurred_at: tx.now(),
            };
            tx.execute(
                DocumentKind::InventoryCount,
                count_id.aggregate_id(),
                InventoryCount::empty(count_id),
                &command,
            )
        })
    }

    /// Drive every counted position to its physical quantity and post the variance.
    ///
    /// Adjustments are taken from the position at completion time, so stock that
    /// moved since the snapshot is still corrected exactly; such items are
    /// reported as drifted.
    pub fn complete_count(&self, ctx: &RequestContext, count_id: CountId) -> EngineResult<CompletionSummary> {
        self.transition("count.complete", ctx, &Permission::INVENTORY_COUNT, |tx, config| {
            let (mut count, version) = load_count(tx, count_id)?;

            // Reject a wrong state before any movement is planned.
            count.handle(&CountCommand::Complete {
                tenant_id: ctx.tenant_id,
                summary: CompletionSummary {
                    total_items: count.items().len(),
                    ..CompletionSummary::default()
                },
                occurred_at: tx.now(),
            })?;

            let warehouse_id = count
                .warehouse_id()
                .ok_or_else(|| DomainError::invariant("inventory count has no warehouse"))?;
            let document = count_ref(count_id);
            let rules = config.stock_rules();

            let adjustments = count.plan_adjustments(|p| tx.position(tx.stock_key(p, warehouse_id)).quantity());
            let mut items_with_drift = 0;
            let mut item_values = Vec::new();
            for adjustment in &adjustments {
                if adjustment.drifted() {
                    items_with_drift += 1;
                    tracing::warn!(
                        tenant_id = %ctx.tenant_id,
                        %count_id,
                        product_id = %adjustment.product_id,
                        expected = adjustment.expected_quantity,
                        current = adjustment.current_quantity,
                        "stock moved while the warehouse was being counted"
                    );
                }

                let delta = adjustment.delta();
                let request = if delta > 0 {
                    let position = tx.position(tx.stock_key(adjustment.product_id, warehouse_id));
                    let unit_cost = if position.average_cost() > Decimal::ZERO {
                        position.average_cost()
                    } else {
                        self.product(ctx.tenant_id, adjustment.product_id)?
                            .pricing
                            .purchase_price
                    };
                    MovementRequest::incoming(
                        adjustment.product_id,
                        warehouse_id,
                        delta,
                        unit_cost,
                        MovementReason::CountAdjustment,
                        document,
                    )
                } else if delta < 0 {
                    MovementRequest::outgoing(
                        adjustment.product_id,
                        warehouse_id,
                        -delta,
                        MovementReason::CountAdjustment,
                        document,
                    )
                } else {
                    continue;
                };
                let movement = tx.apply_movement(request, rules)?;
                item_values.push(Decimal::from(movement.signed_quantity()) * movement.unit_cost_at_time);
            }

            let posting = PostingGenerator::new(&config.chart, config.money_scale)
                .generate(document, &BusinessEvent::InventoryVariance { item_values })?;
            let entries = tx.post(posting, tx.now().date_naive())?;
            let total_variance_value: Decimal = entries
                .iter()
                .filter(|e| e.account == config.chart.inventory)
                .map(|e| e.net())
                .sum();

            let summary = CompletionSummary {
                total_items: count.items().len(),
                items_with_variance: count.items().iter().filter(|i| i.variance != 0).count(),
                items_with_drift,
                total_variance_value,
                gl_entries_created: entries.len(),
            };
            let decided = count.handle(&CountCommand::Complete {
                tenant_id: ctx.tenant_id,
                summary: summary.clone(),
                occurred_at: tx.now(),
            })?;
            tx.append(
                DocumentKind::InventoryCount,
                count_id.aggregate_id(),
                ExpectedVersion::Exact(version),
                &decided,
            )?;
            for event in &decided {
                count.apply(event);
            }
            tx.set_active_count(warehouse_id, None);

            tracing::info!(
                tenant_id = %ctx.tenant_id,
                %count_id,
                %warehouse_id,
                items = summary.total_items,
                with_variance = summary.items_with_variance,
                drifted = summary.items_with_drift,
                variance_value = %summary.total_variance_value,
                entries = summary.gl_entries_created,
                "inventory count completed"
            );
            Ok(summary)
        })
    }

    /// Discard the recorded items and release the warehouse.
    pub fn cancel_count(&self, ctx: &RequestContext, count_id: CountId) -> EngineResult<InventoryCount> {
        self.transition("count.cancel", ctx, &Permission::INVENTORY_COUNT, |tx, _| {
            let command = CountCommand::Cancel {
                tenant_id: ctx.tenant_id,
                occurred_at: tx.now(),
            };
            let count = tx.execute(
                DocumentKind::InventoryCount,
                count_id.aggregate_id(),
                InventoryCount::empty(count_id),
                &command,
            )?;
            if let Some(warehouse_id) = count.warehouse_id() {
                tx.set_active_count(warehouse_id, None);
            }
            tracing::info!(tenant_id = %ctx.tenant_id, %count_id, "inventory count cancelled");
            Ok(count)
        })
    }

    pub fn count_summary(&self, ctx: &RequestContext, count_id: CountId) -> EngineResult<CountSummary> {
        self.query(ctx, &Permission::INVENTORY_COUNT, |tx, _| {
            Ok(created_count(tx, count_id)?.summary())
        })
    }

    /// Variance rows valued at the current average cost of each product.
    pub fn variance_analysis(&self, ctx: &RequestContext, count_id: CountId) -> EngineResult<Vec<VarianceRow>> {
        self.query(ctx, &Permission::INVENTORY_COUNT, |tx, _| {
            let count = created_count(tx, count_id)?;
            let Some(warehouse_id) = count.warehouse_id() else {
                return Ok(vec![]);
            };
            Ok(count.variance_analysis(|p| tx.position(tx.stock_key(p, warehouse_id)).average_cost()))
        })
    }

    pub fn count_report(&self, ctx: &RequestContext, count_id: CountId) -> EngineResult<VarianceReport> {
        self.query(ctx, &Permission::INVENTORY_COUNT, |tx, _| {
            let count = created_count(tx, count_id)?;
            let warehouse_id = count
                .warehouse_id()
                .ok_or_else(|| DomainError::invariant("inventory count has no warehouse"))?;
            Ok(count.report(
                |p| tx.position(tx.stock_key(p, warehouse_id)).average_cost(),
                tx.now(),
            ))
        })
    }
}
