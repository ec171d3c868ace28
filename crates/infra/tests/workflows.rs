mod common;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use comptoir_accounting::AccountingEntry;
use comptoir_core::{DocumentKind, DocumentRef, DomainError, PaymentMethod, ProductId, Settlement};
use comptoir_infra::TenantConfig;
use comptoir_inventory::{MovementReason, NegativeStockPolicy};
use comptoir_purchasing::{PurchaseEvent, PurchaseStatus};
use comptoir_sales::SaleStatus;
use comptoir_transfers::TransferStatus;

use common::{domain, shop, shop_with};

fn net(entries: &[AccountingEntry], account: &str) -> Decimal {
    entries
        .iter()
        .filter(|e| e.account.as_str() == account)
        .map(|e| e.net())
        .sum()
}

#[test]
fn purchase_sale_transfer_and_count_scenario() {
    let shop = shop();
    let p = shop.product("P", dec!(150));

    shop.stock(p, shop.a, 10, dec!(100));
    let at_a = shop.position(p, shop.a);
    assert_eq!(at_a.quantity(), 10);
    assert_eq!(at_a.average_cost(), dec!(100));

    let sale = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    let sale = shop
        .engine
        .add_sale_item(&shop.admin, sale.id_typed(), p, 3, None)
        .unwrap();
    assert_eq!(sale.total(), dec!(450));
    let completion = shop
        .engine
        .complete_sale(&shop.admin, sale.id_typed(), PaymentMethod::Card, dec!(450))
        .unwrap();
    assert_eq!(completion.sale.status(), SaleStatus::Completed);
    assert_eq!(completion.cost_of_goods_sold, dec!(300));
    assert_eq!(net(&completion.entries, "5000"), dec!(300));
    assert_eq!(net(&completion.entries, "4000"), dec!(-450));
    assert!(completion.cash_movement.is_none());
    let at_a = shop.position(p, shop.a);
    assert_eq!(at_a.quantity(), 7);
    assert_eq!(at_a.average_cost(), dec!(100));

    let transfer = shop
        .engine
        .create_transfer(&shop.admin, shop.a, shop.b, vec![(p, 2)])
        .unwrap();
    shop.engine.approve_transfer(&shop.admin, transfer.id_typed()).unwrap();
    let execution = shop.engine.execute_transfer(&shop.admin, transfer.id_typed()).unwrap();
    assert_eq!(execution.transfer.status(), TransferStatus::Completed);
    assert_eq!(execution.movements.len(), 2);
    assert_eq!(shop.position(p, shop.a).quantity(), 5);
    let at_b = shop.position(p, shop.b);
    assert_eq!(at_b.quantity(), 2);
    assert_eq!(at_b.average_cost(), dec!(100));

    let count = shop.engine.start_count(&shop.admin, shop.a, "shelf check").unwrap();
    shop.engine
        .record_count_item(&shop.admin, count.id_typed(), p, 4)
        .unwrap();
    let summary = shop.engine.complete_count(&shop.admin, count.id_typed()).unwrap();
    assert_eq!(summary.total_items, 1);
    assert_eq!(summary.items_with_variance, 1);
    assert_eq!(summary.items_with_drift, 0);
    assert_eq!(summary.total_variance_value, dec!(-100));
    assert_eq!(summary.gl_entries_created, 2);
    assert_eq!(shop.position(p, shop.a).quantity(), 4);

    let count_entries = shop
        .engine
        .accounting_entries(
            &shop.admin,
            Some(DocumentRef::new(DocumentKind::InventoryCount, count.id_typed().aggregate_id())),
        )
        .unwrap();
    assert_eq!(net(&count_entries, "8200"), dec!(100));
    assert_eq!(net(&count_entries, "1300"), dec!(-100));

    assert!(shop.engine.verify_ledger(&shop.admin).unwrap().is_empty());
    assert!(shop.engine.trial_balance(&shop.admin).unwrap().is_balanced());
}

#[test]
fn sale_is_revalidated_at_completion() {
    let shop = shop();
    let p = shop.product("P", dec!(150));
    shop.stock(p, shop.a, 5, dec!(100));

    let first = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    shop.engine
        .add_sale_item(&shop.admin, first.id_typed(), p, 4, None)
        .unwrap();

    // Another sale drains the stock between add and complete.
    let second = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    shop.engine
        .add_sale_item(&shop.admin, second.id_typed(), p, 3, None)
        .unwrap();
    shop.engine
        .complete_sale(&shop.admin, second.id_typed(), PaymentMethod::Card, dec!(450))
        .unwrap();

    let err = shop
        .engine
        .complete_sale(&shop.admin, first.id_typed(), PaymentMethod::Card, dec!(600))
        .unwrap_err();
    assert!(matches!(
        domain(err),
        DomainError::InsufficientStock {
            available: 2,
            requested: 4,
            ..
        }
    ));

    assert_eq!(shop.position(p, shop.a).quantity(), 2);
    let first_ref = DocumentRef::new(DocumentKind::Sale, first.id_typed().aggregate_id());
    assert!(shop
        .engine
        .accounting_entries(&shop.admin, Some(first_ref))
        .unwrap()
        .is_empty());
    // Created and one item added; the completion left no event behind.
    assert_eq!(shop.engine.document_history(&shop.admin, first_ref).unwrap().len(), 2);
}

#[test]
fn stock_check_on_add_counts_lines_already_on_the_sale() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    shop.stock(p, shop.a, 5, dec!(4));

    let sale = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    shop.engine
        .add_sale_item(&shop.admin, sale.id_typed(), p, 3, None)
        .unwrap();
    let err = shop
        .engine
        .add_sale_item(&shop.admin, sale.id_typed(), p, 3, None)
        .unwrap_err();
    assert!(matches!(
        domain(err),
        DomainError::InsufficientStock { requested: 6, .. }
    ));
}

#[test]
fn explicit_price_source_requires_a_unit_price() {
    let shop = shop_with(TenantConfig {
        sale_price_source: comptoir_infra::SalePriceSource::Explicit,
        ..TenantConfig::default()
    });
    let p = shop.product("P", dec!(10));
    shop.stock(p, shop.a, 5, dec!(4));

    let sale = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    let err = shop
        .engine
        .add_sale_item(&shop.admin, sale.id_typed(), p, 1, None)
        .unwrap_err();
    assert!(domain(err).is_validation());
    let sale = shop
        .engine
        .add_sale_item(&shop.admin, sale.id_typed(), p, 1, Some(dec!(12.50)))
        .unwrap();
    assert_eq!(sale.total(), dec!(12.50));
}

#[test]
fn transfer_moves_every_item_or_none() {
    let shop = shop();
    let products: Vec<ProductId> = (1..=5).map(|i| shop.product(&format!("T{i}"), dec!(10))).collect();
    for (i, p) in products.iter().enumerate() {
        // Item 3 is short.
        let stocked = if i == 2 { 1 } else { 10 };
        shop.stock(*p, shop.a, stocked, dec!(5));
    }

    let items = products.iter().map(|p| (*p, 2)).collect();
    let transfer = shop.engine.create_transfer(&shop.admin, shop.a, shop.b, items).unwrap();
    shop.engine.approve_transfer(&shop.admin, transfer.id_typed()).unwrap();

    let err = shop
        .engine
        .execute_transfer(&shop.admin, transfer.id_typed())
        .unwrap_err();
    match domain(err) {
        DomainError::InsufficientStock { product, .. } => assert_eq!(product, products[2]),
        other => panic!("unexpected error: {other:?}"),
    }
    for (i, p) in products.iter().enumerate() {
        let expected = if i == 2 { 1 } else { 10 };
        assert_eq!(shop.position(*p, shop.a).quantity(), expected);
        assert_eq!(shop.position(*p, shop.b).quantity(), 0);
        assert!(shop.engine.stock_movements(&shop.admin, *p, shop.b).unwrap().is_empty());
    }

    // Still approved: topping up item 3 lets the same transfer run.
    shop.stock(products[2], shop.a, 1, dec!(5));
    let execution = shop.engine.execute_transfer(&shop.admin, transfer.id_typed()).unwrap();
    assert_eq!(execution.movements.len(), 10);
    for p in &products {
        assert_eq!(shop.position(*p, shop.b).quantity(), 2);
    }
    assert!(shop.engine.verify_ledger(&shop.admin).unwrap().is_empty());
}

#[test]
fn transfer_destination_inherits_source_cost() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    shop.stock(p, shop.a, 10, dec!(4));
    shop.stock(p, shop.a, 10, dec!(6));
    shop.stock(p, shop.b, 5, dec!(8));

    let transfer = shop
        .engine
        .create_transfer(&shop.admin, shop.a, shop.b, vec![(p, 5)])
        .unwrap();
    shop.engine.approve_transfer(&shop.admin, transfer.id_typed()).unwrap();
    let execution = shop.engine.execute_transfer(&shop.admin, transfer.id_typed()).unwrap();

    assert!(execution.movements.iter().all(|m| m.unit_cost_at_time == dec!(5)));
    assert_eq!(execution.movements[0].reason, MovementReason::TransferOut);
    assert_eq!(execution.movements[1].reason, MovementReason::TransferIn);
    // (5 × 8 + 5 × 5) / 10
    assert_eq!(shop.position(p, shop.b).average_cost(), dec!(6.5));
    assert_eq!(shop.position(p, shop.a).average_cost(), dec!(5));
}

#[test]
fn transfer_to_the_same_warehouse_is_rejected() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    let err = shop
        .engine
        .create_transfer(&shop.admin, shop.a, shop.a, vec![(p, 1)])
        .unwrap_err();
    assert_eq!(domain(err), DomainError::SameWarehouse);
}

#[test]
fn receive_fails_whole_when_a_product_is_unknown() {
    let shop = shop();
    let known = shop.product("K", dec!(10));
    let unknown = ProductId::new();

    let purchase = shop
        .engine
        .create_purchase(&shop.admin, shop.a, Settlement::OnAccount, None)
        .unwrap();
    let id = purchase.id_typed();
    shop.engine.add_purchase_item(&shop.admin, id, known, 4, dec!(3)).unwrap();
    shop.engine.add_purchase_item(&shop.admin, id, unknown, 4, dec!(3)).unwrap();
    shop.engine.confirm_purchase(&shop.admin, id).unwrap();

    let err = shop.engine.receive_purchase(&shop.admin, id).unwrap_err();
    assert!(matches!(domain(err), DomainError::NotFound(_)));
    assert_eq!(shop.position(known, shop.a).quantity(), 0);
    assert!(shop.engine.accounting_entries(&shop.admin, None).unwrap().is_empty());

    // The purchase stays confirmed and can still be cancelled.
    let cancelled = shop
        .engine
        .cancel_purchase(&shop.admin, id, Some("supplier mix-up".into()))
        .unwrap();
    assert_eq!(cancelled.status(), PurchaseStatus::Cancelled);
}

#[test]
fn received_purchase_cannot_be_cancelled_or_extended() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    let purchase = shop
        .engine
        .create_purchase(&shop.admin, shop.a, Settlement::OnAccount, None)
        .unwrap();
    let id = purchase.id_typed();

    let err = shop.engine.confirm_purchase(&shop.admin, id).unwrap_err();
    assert!(matches!(domain(err), DomainError::EmptyDocument(_)));

    shop.engine.add_purchase_item(&shop.admin, id, p, 2, dec!(3)).unwrap();
    shop.engine.confirm_purchase(&shop.admin, id).unwrap();
    let receipt = shop.engine.receive_purchase(&shop.admin, id).unwrap();
    assert_eq!(net(&receipt.entries, "1300"), dec!(6));
    assert_eq!(net(&receipt.entries, "2100"), dec!(-6));

    let err = shop.engine.cancel_purchase(&shop.admin, id, None).unwrap_err();
    assert!(matches!(domain(err), DomainError::InvalidTransition { .. }));
    let err = shop
        .engine
        .add_purchase_item(&shop.admin, id, p, 1, dec!(3))
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::DocumentLocked { .. }));
}

#[test]
fn count_converges_on_physical_quantities_despite_drift() {
    let shop = shop();
    let p = shop.product("P", dec!(150));
    let q = shop.product("Q", dec!(60));
    shop.stock(p, shop.a, 10, dec!(100));
    shop.stock(q, shop.a, 5, dec!(40));

    let count = shop.engine.start_count(&shop.admin, shop.a, "monthly").unwrap();
    let id = count.id_typed();

    // P moves while the count is open.
    let sale = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    shop.engine.add_sale_item(&shop.admin, sale.id_typed(), p, 2, None).unwrap();
    shop.engine
        .complete_sale(&shop.admin, sale.id_typed(), PaymentMethod::Card, dec!(300))
        .unwrap();

    shop.engine.record_count_item(&shop.admin, id, p, 9).unwrap();
    // Re-recording overwrites the first figure.
    shop.engine.record_count_item(&shop.admin, id, p, 7).unwrap();
    shop.engine.record_count_item(&shop.admin, id, q, 6).unwrap();

    let summary = shop.engine.count_summary(&shop.admin, id).unwrap();
    assert_eq!(summary.total_items, 2);
    assert_eq!(summary.total_expected, 15);
    assert_eq!(summary.total_physical, 13);
    assert_eq!(summary.surplus_items, 1);
    assert_eq!(summary.shortage_items, 1);

    let rows = shop.engine.variance_analysis(&shop.admin, id).unwrap();
    assert_eq!(rows.len(), 2);
    // P: |−3| × 100 ranks above Q: 1 × 40.
    assert_eq!(rows[0].product_id, p);
    assert_eq!(rows[0].variance_value, dec!(300));
    assert_eq!(rows[0].variance_percentage, Some(dec!(-30)));

    let outcome = shop.engine.complete_count(&shop.admin, id).unwrap();
    assert_eq!(shop.position(p, shop.a).quantity(), 7);
    assert_eq!(shop.position(q, shop.a).quantity(), 6);
    assert_eq!(outcome.items_with_variance, 2);
    assert_eq!(outcome.items_with_drift, 1);
    // P was at 8 when completed, so only one unit is written off; Q gains one at 40.
    assert_eq!(outcome.total_variance_value, dec!(-60));

    let entries = shop
        .engine
        .accounting_entries(&shop.admin, Some(DocumentRef::new(DocumentKind::InventoryCount, id.aggregate_id())))
        .unwrap();
    assert_eq!(entries.len(), outcome.gl_entries_created);
    assert_eq!(net(&entries, "1300"), outcome.total_variance_value);
    assert_eq!(net(&entries, "8100"), dec!(-40));
    assert_eq!(net(&entries, "8200"), dec!(100));

    let adjustments: Vec<_> = shop
        .engine
        .stock_movements(&shop.admin, p, shop.a)
        .unwrap()
        .into_iter()
        .filter(|m| m.reason == MovementReason::CountAdjustment)
        .collect();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].quantity, 1);
    assert!(shop.engine.verify_ledger(&shop.admin).unwrap().is_empty());
}

#[test]
fn one_count_per_warehouse_until_completed_or_cancelled() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    shop.stock(p, shop.a, 3, dec!(2));

    let first = shop.engine.start_count(&shop.admin, shop.a, "first").unwrap();
    let err = shop.engine.start_count(&shop.admin, shop.a, "second").unwrap_err();
    assert_eq!(domain(err), DomainError::WarehouseLocked(shop.a));
    // Another warehouse is unaffected.
    shop.engine.start_count(&shop.admin, shop.b, "other").unwrap();

    shop.engine.record_count_item(&shop.admin, first.id_typed(), p, 1).unwrap();
    shop.engine.cancel_count(&shop.admin, first.id_typed()).unwrap();
    assert_eq!(shop.position(p, shop.a).quantity(), 3);

    let err = shop.engine.complete_count(&shop.admin, first.id_typed()).unwrap_err();
    assert!(matches!(domain(err), DomainError::InvalidTransition { .. }));
    shop.engine.start_count(&shop.admin, shop.a, "again").unwrap();
}

#[test]
fn count_rejects_negative_and_unknown_items() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    let count = shop.engine.start_count(&shop.admin, shop.a, "spot").unwrap();

    let err = shop
        .engine
        .record_count_item(&shop.admin, count.id_typed(), p, -1)
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::InvalidQuantity(_)));
    let err = shop
        .engine
        .record_count_item(&shop.admin, count.id_typed(), ProductId::new(), 1)
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::NotFound(_)));
}

#[test]
fn count_report_reflects_items_until_cancelled() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    shop.stock(p, shop.a, 10, dec!(4));
    let count = shop.engine.start_count(&shop.admin, shop.a, "monthly").unwrap();
    let id = count.id_typed();
    shop.engine.record_count_item(&shop.admin, id, p, 8).unwrap();

    let report = shop.engine.count_report(&shop.admin, id).unwrap();
    assert_eq!(report.status, comptoir_reconciliation::CountStatus::Started);
    assert_eq!(report.warehouse_id, Some(shop.a));
    assert_eq!(report.reason, "monthly");
    assert_eq!(report.summary.total_variance, -2);
    assert_eq!(report.summary.shortage_items, 1);
    assert_eq!(report.analysis.len(), 1);
    assert_eq!(report.analysis[0].variance_value, dec!(8));
    assert_eq!(report.analysis[0].variance_percentage, Some(dec!(-20)));
    assert_eq!(report.analysis[0].kind, comptoir_reconciliation::VarianceKind::Shortage);

    shop.engine.cancel_count(&shop.admin, id).unwrap();
    let report = shop.engine.count_report(&shop.admin, id).unwrap();
    assert_eq!(report.status, comptoir_reconciliation::CountStatus::Cancelled);
    assert_eq!(report.summary.total_items, 0);
    assert_eq!(shop.position(p, shop.a).quantity(), 10);
    let positions = shop.engine.warehouse_positions(&shop.admin, shop.a).unwrap();
    assert_eq!(positions.len(), 1);
    assert!(shop.engine.warehouse_positions(&shop.admin, shop.b).unwrap().is_empty());
}

#[test]
fn reconciling_entries_is_idempotent_and_atomic() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    shop.stock(p, shop.a, 5, dec!(4));
    let ids: Vec<u64> = shop
        .engine
        .accounting_entries(&shop.admin, None)
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids.len(), 2);

    let err = shop.engine.mark_reconciled(&shop.admin, &[ids[0], 9_999]).unwrap_err();
    assert!(matches!(domain(err), DomainError::NotFound(_)));
    assert!(shop.engine.accounting_entries(&shop.admin, None).unwrap().iter().all(|e| !e.rapproche));

    assert_eq!(shop.engine.mark_reconciled(&shop.admin, &ids).unwrap(), 2);
    assert_eq!(shop.engine.mark_reconciled(&shop.admin, &ids).unwrap(), 0);
    assert!(shop.engine.accounting_entries(&shop.admin, None).unwrap().iter().all(|e| e.rapproche));
}

#[test]
fn quantities_past_the_integer_range_are_rejected_without_poisoning_the_tenant() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    shop.stock(p, shop.a, i64::MAX, dec!(1));

    let purchase = shop
        .engine
        .create_purchase(&shop.admin, shop.a, Settlement::OnAccount, None)
        .unwrap();
    let id = purchase.id_typed();
    shop.engine.add_purchase_item(&shop.admin, id, p, 1, dec!(1)).unwrap();
    shop.engine.confirm_purchase(&shop.admin, id).unwrap();
    let err = shop.engine.receive_purchase(&shop.admin, id).unwrap_err();
    assert!(matches!(domain(err), DomainError::InvalidQuantity(_)));

    let sale = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    shop.engine.add_sale_item(&shop.admin, sale.id_typed(), p, i64::MAX, None).unwrap();
    let err = shop
        .engine
        .add_sale_item(&shop.admin, sale.id_typed(), p, 1, None)
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::InvalidQuantity(_)));

    assert_eq!(shop.position(p, shop.a).quantity(), i64::MAX);
    assert!(shop.engine.verify_ledger(&shop.admin).unwrap().is_empty());
}

#[test]
fn count_surplus_without_history_is_valued_at_purchase_price() {
    let shop = shop();
    let p = comptoir_core::ProductId::new();
    shop.catalog.register(
        shop.tenant_id,
        comptoir_products::Product::new(p, "NEW", "found on shelf", dec!(20)).with_purchase_price(dec!(12)),
    );

    let count = shop.engine.start_count(&shop.admin, shop.a, "found stock").unwrap();
    shop.engine.record_count_item(&shop.admin, count.id_typed(), p, 3).unwrap();
    let outcome = shop.engine.complete_count(&shop.admin, count.id_typed()).unwrap();

    assert_eq!(outcome.total_variance_value, dec!(36));
    let position = shop.position(p, shop.a);
    assert_eq!(position.quantity(), 3);
    assert_eq!(position.average_cost(), dec!(12));
}

#[test]
fn frozen_warehouse_rejects_sales_during_a_count() {
    let shop = shop_with(TenantConfig {
        freeze_counted_warehouses: true,
        ..TenantConfig::default()
    });
    let p = shop.product("P", dec!(10));
    shop.stock(p, shop.a, 3, dec!(2));

    let sale = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    shop.engine.add_sale_item(&shop.admin, sale.id_typed(), p, 1, None).unwrap();
    let count = shop.engine.start_count(&shop.admin, shop.a, "frozen").unwrap();

    let err = shop
        .engine
        .complete_sale(&shop.admin, sale.id_typed(), PaymentMethod::Card, dec!(10))
        .unwrap_err();
    assert_eq!(domain(err), DomainError::WarehouseLocked(shop.a));

    shop.engine.complete_count(&shop.admin, count.id_typed()).unwrap();
    shop.engine
        .complete_sale(&shop.admin, sale.id_typed(), PaymentMethod::Card, dec!(10))
        .unwrap();
    assert_eq!(shop.position(p, shop.a).quantity(), 2);
}

#[test]
fn negative_stock_policy_lets_sales_overdraw() {
    let shop = shop_with(TenantConfig {
        negative_stock: NegativeStockPolicy::Allow,
        ..TenantConfig::default()
    });
    let p = shop.product("P", dec!(10));
    shop.stock(p, shop.a, 1, dec!(4));

    let sale = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    shop.engine.add_sale_item(&shop.admin, sale.id_typed(), p, 3, None).unwrap();
    let completion = shop
        .engine
        .complete_sale(&shop.admin, sale.id_typed(), PaymentMethod::Card, dec!(30))
        .unwrap();

    let position = shop.position(p, shop.a);
    assert_eq!(position.quantity(), -2);
    assert!(position.is_negative());
    assert_eq!(completion.cost_of_goods_sold, dec!(12));
}

#[test]
fn partial_payment_leaves_a_receivable() {
    let shop = shop();
    let p = shop.product("P", dec!(100));
    shop.stock(p, shop.a, 2, dec!(60));

    let sale = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    shop.engine.add_sale_item(&shop.admin, sale.id_typed(), p, 2, None).unwrap();
    let completion = shop
        .engine
        .complete_sale(&shop.admin, sale.id_typed(), PaymentMethod::MobileMoney, dec!(150))
        .unwrap();

    assert_eq!(net(&completion.entries, "1250"), dec!(150));
    assert_eq!(net(&completion.entries, "4110"), dec!(50));
    assert_eq!(net(&completion.entries, "4000"), dec!(-200));
}

#[test]
fn every_posting_balances() {
    let shop = shop();
    let p = shop.product("P", dec!(9.99));
    shop.stock(p, shop.a, 3, dec!(3.333));
    shop.stock(p, shop.a, 7, dec!(4.1));

    let sale = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    shop.engine.add_sale_item(&shop.admin, sale.id_typed(), p, 3, None).unwrap();
    shop.engine
        .complete_sale(&shop.admin, sale.id_typed(), PaymentMethod::Card, dec!(29.97))
        .unwrap();

    let count = shop.engine.start_count(&shop.admin, shop.a, "odd costs").unwrap();
    shop.engine.record_count_item(&shop.admin, count.id_typed(), p, 6).unwrap();
    shop.engine.complete_count(&shop.admin, count.id_typed()).unwrap();

    let entries = shop.engine.accounting_entries(&shop.admin, None).unwrap();
    let mut by_posting: BTreeMap<u64, Decimal> = BTreeMap::new();
    for entry in &entries {
        *by_posting.entry(entry.posting_id).or_default() += entry.net();
        assert!(entry.debit.scale() <= 2 && entry.credit.scale() <= 2);
    }
    assert_eq!(by_posting.len(), 4);
    assert!(by_posting.values().all(|net| net.is_zero()));

    let balance = shop.engine.trial_balance(&shop.admin).unwrap();
    assert!(balance.is_balanced());
    assert_eq!(balance.total_debit, balance.total_credit);
}

#[test]
fn reconstruction_matches_the_materialised_position() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    shop.stock(p, shop.a, 4, dec!(3));
    shop.stock(p, shop.a, 6, dec!(5));
    let sale = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    shop.engine.add_sale_item(&shop.admin, sale.id_typed(), p, 5, None).unwrap();
    shop.engine
        .complete_sale(&shop.admin, sale.id_typed(), PaymentMethod::Card, dec!(50))
        .unwrap();

    let movements = shop.engine.stock_movements(&shop.admin, p, shop.a).unwrap();
    let signed: i64 = movements.iter().map(|m| m.signed_quantity()).sum();
    let position = shop.position(p, shop.a);
    assert_eq!(position.quantity(), signed);
    assert_eq!(shop.engine.reconstruct_from_log(&shop.admin, p, shop.a).unwrap(), position);
    assert_eq!(shop.engine.warehouse_positions(&shop.admin, shop.a).unwrap(), vec![position]);
}

#[test]
fn document_history_lists_committed_events_in_order() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    let purchase = shop
        .engine
        .create_purchase(&shop.admin, shop.a, Settlement::OnAccount, None)
        .unwrap();
    let id = purchase.id_typed();
    shop.engine.add_purchase_item(&shop.admin, id, p, 1, dec!(2)).unwrap();
    shop.engine.confirm_purchase(&shop.admin, id).unwrap();

    let history = shop
        .engine
        .document_history(&shop.admin, DocumentRef::new(DocumentKind::Purchase, id.aggregate_id()))
        .unwrap();
    let sequences: Vec<u64> = history.iter().map(|e| e.sequence_number()).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert!(history.iter().all(|e| e.aggregate_type() == "purchasing.purchase"));
    assert_eq!(history[2].payload()["type"], "purchase_confirmed");
    let confirmed = history[2].decode::<PurchaseEvent>().unwrap();
    assert!(matches!(confirmed.payload(), PurchaseEvent::PurchaseConfirmed { .. }));
}

#[test]
fn tenants_do_not_see_each_other() {
    let one = shop();
    let other = shop();
    let p = one.product("P", dec!(10));
    one.stock(p, one.a, 5, dec!(1));

    let engine = &one.engine;
    let stranger = comptoir_infra::RequestContext::new(comptoir_auth::Principal::with_roles(
        comptoir_core::UserId::new(),
        other.tenant_id,
        vec![comptoir_auth::Role::ADMIN],
    ));
    assert_eq!(engine.current_position(&stranger, p, one.a).unwrap().quantity(), 0);
    assert!(engine.accounting_entries(&stranger, None).unwrap().is_empty());
    assert_eq!(engine.current_position(&one.admin, p, one.a).unwrap().quantity(), 5);
}
