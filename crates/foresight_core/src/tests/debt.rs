//! Tests for liability payment limits
//!
//! These tests verify:
//! - Debt balances are stored non-positive
//! - Minimum payments shrink as payments land, capped at the outstanding
//!   balance
//! - Accelerated payments widen the ceiling without touching the floor
//! - Debts accept no outflows

use crate::account::{Account, AccountKind, RateSource};
use crate::growth::Compounding;
use crate::timing::When;

fn debt(owed: f64, minimum_payment: f64, accelerated_payment: f64) -> Account {
    Account::new(
        2025,
        owed,
        RateSource::Constant(0.0),
        Compounding::Periodic(1),
        AccountKind::Debt {
            minimum_payment,
            accelerated_payment,
        },
    )
}

/// The owed amount may be passed with either sign; the balance is negative
#[test]
fn test_debt_balance_sign() {
    let positive = debt(100.0, 10.0, 0.0);
    let negative = debt(-100.0, 10.0, 0.0);
    assert_eq!(positive.balance().unwrap(), -100.0);
    assert_eq!(negative.balance().unwrap(), -100.0);
}

/// A 100 debt with a 10 minimum requires exactly 10 before year end
#[test]
fn test_min_inflow_is_minimum_payment() {
    let account = debt(100.0, 10.0, 40.0);
    assert_eq!(account.min_inflow(When::END).unwrap(), 10.0);
}

/// Payments already made this year count against the minimum
#[test]
fn test_min_inflow_net_of_payments() {
    let mut account = debt(100.0, 10.0, 40.0);
    account.add_transaction(10.0, When::START);
    assert_eq!(account.min_inflow(When::END).unwrap(), 0.0);

    // a partial payment leaves the remainder due
    let mut account = debt(100.0, 10.0, 40.0);
    account.add_transaction(4.0, When::START);
    assert_eq!(account.min_inflow(When::END).unwrap(), 6.0);
}

/// The minimum never exceeds what is actually owed
#[test]
fn test_min_inflow_capped_at_outstanding() {
    let account = debt(5.0, 10.0, 0.0);
    assert_eq!(account.min_inflow(When::END).unwrap(), 5.0);
}

/// The ceiling is minimum plus accelerated payment, net of payments, capped
/// at the outstanding balance
#[test]
fn test_max_inflow() {
    let mut account = debt(100.0, 10.0, 40.0);
    assert_eq!(account.max_inflow(When::END, None).unwrap(), 50.0);

    account.add_transaction(10.0, When::START);
    assert_eq!(account.max_inflow(When::END, None).unwrap(), 40.0);

    // a small debt can only absorb what is owed
    let account = debt(30.0, 10.0, 40.0);
    assert_eq!(account.max_inflow(When::END, None).unwrap(), 30.0);
}

/// Interest grows the outstanding amount a payment must cover
#[test]
fn test_outstanding_includes_interest() {
    let account = Account::new(
        2025,
        100.0,
        RateSource::Constant(0.10),
        Compounding::Periodic(1),
        AccountKind::Debt {
            minimum_payment: 200.0,
            accelerated_payment: 0.0,
        },
    );
    // -100 at 10% owes 110 by year end; the oversized minimum is capped there
    let owed = account.min_inflow(When::END).unwrap();
    assert!((owed - 110.0).abs() < 1e-9, "Expected $110.00, got ${owed:.2}");
}

/// Money never flows out of a debt
#[test]
fn test_no_outflows() {
    let account = debt(100.0, 10.0, 40.0);
    assert_eq!(account.max_outflow(When::MID).unwrap(), 0.0);
}
