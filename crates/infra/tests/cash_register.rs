mod common;

use rust_decimal_macros::dec;

use comptoir_accounting::ExpenseCategory;
use comptoir_cash::{CashCategory, CashDirection, CashMovementRequest, SessionStatus};
use comptoir_core::{DomainError, PaymentMethod, Settlement};

use common::{domain, shop};

#[test]
fn session_lifecycle_balances_the_drawer() {
    let shop = shop();
    let p = shop.product("P", dec!(150));
    shop.stock(p, shop.a, 10, dec!(100));

    let session = shop.engine.open_cash_session(&shop.admin, shop.till, dec!(1000)).unwrap();
    let session_id = session.id_typed();
    let err = shop
        .engine
        .open_cash_session(&shop.admin, shop.till, dec!(0))
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::Conflict(_)));

    let sale = shop.engine.create_sale(&shop.admin, shop.a, Some(shop.till)).unwrap();
    shop.engine.add_sale_item(&shop.admin, sale.id_typed(), p, 3, None).unwrap();
    let completion = shop
        .engine
        .complete_sale(&shop.admin, sale.id_typed(), PaymentMethod::Cash, dec!(500))
        .unwrap();
    let payment = completion.sale.payment().unwrap();
    assert_eq!(payment.collected, dec!(450));
    assert_eq!(payment.change_due, dec!(50));
    let collected = completion.cash_movement.unwrap();
    assert_eq!(collected.amount, dec!(450));
    assert_eq!(collected.direction, CashDirection::In);
    assert_eq!(collected.session_id, session_id);

    let expense = shop
        .engine
        .record_expense(&shop.admin, shop.till, ExpenseCategory::Transport, dec!(200), "delivery")
        .unwrap();
    assert_eq!(expense.cash_movement.category, CashCategory::Expense);
    assert_eq!(expense.entries.len(), 2);
    assert!(expense.entries.iter().any(|e| e.account.as_str() == "6200" && e.debit == dec!(200)));
    assert!(expense.entries.iter().any(|e| e.account.as_str() == "1100" && e.credit == dec!(200)));

    shop.engine
        .record_cash_movement(
            &shop.admin,
            shop.till,
            CashMovementRequest::new(CashDirection::In, CashCategory::Deposit, dec!(100), "float top-up"),
        )
        .unwrap();

    let open = shop.engine.cash_session_summary(&shop.admin, session_id).unwrap();
    assert_eq!(open.movement_count, 3);
    assert_eq!(open.expected_balance, dec!(1350));
    assert_eq!(open.difference, None);

    let closed = shop.engine.close_cash_session(&shop.admin, session_id, dec!(1340)).unwrap();
    assert_eq!(closed.status, SessionStatus::Closed);
    assert_eq!(closed.total_in, dec!(550));
    assert_eq!(closed.total_out, dec!(200));
    assert_eq!(closed.difference, Some(dec!(-10)));

    let err = shop
        .engine
        .close_cash_session(&shop.admin, session_id, dec!(1340))
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::InvalidTransition { .. }));

    // The point of sale is free again.
    shop.engine.open_cash_session(&shop.admin, shop.till, dec!(1340)).unwrap();
}

#[test]
fn cash_sale_without_a_session_rolls_back() {
    let shop = shop();
    let p = shop.product("P", dec!(150));
    shop.stock(p, shop.a, 10, dec!(100));

    let sale = shop.engine.create_sale(&shop.admin, shop.a, Some(shop.till)).unwrap();
    shop.engine.add_sale_item(&shop.admin, sale.id_typed(), p, 2, None).unwrap();
    let err = shop
        .engine
        .complete_sale(&shop.admin, sale.id_typed(), PaymentMethod::Cash, dec!(300))
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::CashSessionRequired(_)));

    assert_eq!(shop.position(p, shop.a).quantity(), 10);
    // Only the purchase receipt is in the books.
    assert_eq!(shop.engine.accounting_entries(&shop.admin, None).unwrap().len(), 2);
}

#[test]
fn cash_sale_needs_a_point_of_sale() {
    let shop = shop();
    let p = shop.product("P", dec!(150));
    shop.stock(p, shop.a, 1, dec!(100));

    let sale = shop.engine.create_sale(&shop.admin, shop.a, None).unwrap();
    shop.engine.add_sale_item(&shop.admin, sale.id_typed(), p, 1, None).unwrap();
    let err = shop
        .engine
        .complete_sale(&shop.admin, sale.id_typed(), PaymentMethod::Cash, dec!(150))
        .unwrap_err();
    assert!(domain(err).is_validation());
}

#[test]
fn cash_purchase_pays_out_of_the_register() {
    let shop = shop();
    let p = shop.product("P", dec!(10));
    let session = shop.engine.open_cash_session(&shop.admin, shop.till, dec!(500)).unwrap();

    let purchase = shop
        .engine
        .create_purchase(&shop.admin, shop.a, Settlement::Paid(PaymentMethod::Cash), Some(shop.till))
        .unwrap();
    let id = purchase.id_typed();
    shop.engine.add_purchase_item(&shop.admin, id, p, 4, dec!(25)).unwrap();
    shop.engine.confirm_purchase(&shop.admin, id).unwrap();
    let receipt = shop.engine.receive_purchase(&shop.admin, id).unwrap();

    let paid = receipt.cash_movement.unwrap();
    assert_eq!(paid.direction, CashDirection::Out);
    assert_eq!(paid.category, CashCategory::Purchase);
    assert_eq!(paid.amount, dec!(100));
    assert!(receipt.entries.iter().any(|e| e.account.as_str() == "1100" && e.credit == dec!(100)));

    let summary = shop.engine.cash_session_summary(&shop.admin, session.id_typed()).unwrap();
    assert_eq!(summary.expected_balance, dec!(400));
}

#[test]
fn movements_must_be_positive_and_match_their_category() {
    let shop = shop();
    shop.engine.open_cash_session(&shop.admin, shop.till, dec!(0)).unwrap();

    let err = shop
        .engine
        .record_cash_movement(
            &shop.admin,
            shop.till,
            CashMovementRequest::new(CashDirection::In, CashCategory::Deposit, dec!(0), "nothing"),
        )
        .unwrap_err();
    assert!(domain(err).is_validation());

    let err = shop
        .engine
        .record_cash_movement(
            &shop.admin,
            shop.till,
            CashMovementRequest::new(CashDirection::In, CashCategory::Expense, dec!(5), "backwards"),
        )
        .unwrap_err();
    assert!(domain(err).is_validation());
}
