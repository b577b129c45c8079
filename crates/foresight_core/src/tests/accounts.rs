//! Tests for balance projection and flow limits
//!
//! These tests verify:
//! - Projection to arbitrary points within a year, continuous and discrete
//! - Balance additivity: opening balance and each transaction grow
//!   independently
//! - Savings flow limits
//! - The balance-crossing solver used by the scheduler

use crate::account::{Account, AccountKind, RateSource};
use crate::growth::Compounding;
use crate::timing::When;

fn savings(balance: f64, rate: f64, compounding: Compounding) -> Account {
    Account::new(
        2025,
        balance,
        RateSource::Constant(rate),
        compounding,
        AccountKind::Savings,
    )
}

/// Opening balance of 100 at 100% annual compounding, plus 100 deposited
/// mid-year: each component grows on its own and the year-end balance is
/// their sum
#[test]
fn test_balance_additivity() {
    let mut account = savings(100.0, 1.0, Compounding::Periodic(1));
    account.add_transaction(100.0, When::MID);

    let actual = account.balance_at(When::END).unwrap();
    let expected = 100.0 * 2.0 + 100.0 * 2.0_f64.sqrt();
    assert!(
        (actual - expected).abs() < 1e-9,
        "Expected ${expected:.2}, got ${actual:.2}"
    );
}

/// Continuous compounding follows e^(rt)
#[test]
fn test_continuous_projection() {
    let account = savings(1_000.0, 0.05, Compounding::Continuous);
    let actual = account.balance_at(When::END).unwrap();
    let expected = 1_000.0 * (0.05_f64).exp();
    assert!(
        (actual - expected).abs() < 1e-9,
        "Expected ${expected:.4}, got ${actual:.4}"
    );
    let mid = account.balance_at(When::MID).unwrap();
    let expected_mid = 1_000.0 * (0.025_f64).exp();
    assert!((mid - expected_mid).abs() < 1e-9);
}

/// A transaction is included from its time onward, not before
#[test]
fn test_balance_at_excludes_later_transactions() {
    let mut account = savings(100.0, 0.0, Compounding::Periodic(1));
    account.add_transaction(50.0, When::MID);
    assert_eq!(account.balance_at(When::new(0.25).unwrap()).unwrap(), 100.0);
    assert_eq!(account.balance_at(When::MID).unwrap(), 150.0);
}

/// Savings outflow is capped by the balance at the withdrawal time and
/// reported as a non-positive value
#[test]
fn test_savings_max_outflow() {
    let mut account = savings(100.0, 0.0, Compounding::Periodic(1));
    assert_eq!(account.max_outflow(When::START).unwrap(), -100.0);

    account.add_transaction(-100.0, When::START);
    assert_eq!(account.max_outflow(When::END).unwrap(), 0.0);

    // an overdrawn balance allows no further outflow
    account.add_transaction(-50.0, When::MID);
    assert_eq!(account.max_outflow(When::END).unwrap(), 0.0);
}

/// Savings inflow is unlimited and never required
#[test]
fn test_savings_inflow_limits() {
    let account = savings(100.0, 0.05, Compounding::Continuous);
    assert_eq!(account.max_inflow(When::MID, None).unwrap(), f64::INFINITY);
    assert_eq!(account.min_inflow(When::MID).unwrap(), 0.0);
    assert_eq!(account.min_outflow(When::MID).unwrap(), 0.0);
}

/// The crossing solver finds when growth alone reaches a target
#[test]
fn test_time_to_balance_growth_only() {
    let account = savings(100.0, 1.0, Compounding::Periodic(1));
    // 100 doubling over the year reaches ~141.42 at mid-year
    let t = account
        .time_to_balance(100.0 * 2.0_f64.sqrt(), When::START)
        .unwrap();
    assert!((t - 0.5).abs() < 1e-9, "expected 0.5, got {t}");
}

/// A target beyond this year's growth reports a time past 1.0
#[test]
fn test_time_to_balance_out_of_reach() {
    let account = savings(100.0, 1.0, Compounding::Periodic(1));
    let t = account.time_to_balance(500.0, When::START).unwrap();
    assert!(t > 1.0, "expected a time past year end, got {t}");
}

/// A scheduled deposit pulls the crossing earlier than growth alone would
#[test]
fn test_time_to_balance_with_deposit() {
    let mut account = savings(100.0, 1.0, Compounding::Periodic(1));
    account.add_transaction(100.0, When::MID);

    // growth alone would need log2(1.9) ~ 0.926 years to reach 190; the
    // deposit at 0.5 jumps the balance past it
    let t = account.time_to_balance(190.0, When::START).unwrap();
    assert!((t - 0.5).abs() < 1e-9, "expected 0.5, got {t}");
}

/// A negative balance never grows its way to a positive level
#[test]
fn test_time_to_balance_from_negative() {
    let account = savings(-100.0, 0.05, Compounding::Continuous);
    let t = account.time_to_balance(50.0, When::START).unwrap();
    assert_eq!(t, f64::INFINITY);
}
