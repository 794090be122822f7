//! Integration test: deposit validation order, lookup failures and
//! whitelist administration.
//!
//! Rejected calls leave balances, records and the journal untouched.

use votemarket_integration_tests::{
    Harness, ADMIN, BRIBE_AMOUNT, CUSTODY, DISTRIBUTOR, EPOCH, GAUGE, TOKEN,
};
use votemarket_types::{Address, BribeRecord};

const UNLISTED: Address = Address::repeat_byte(0x77);

fn reject(h: &mut Harness, token: Address, amount: u128, gauge: Address) -> String {
    let before = h.market.snapshot().expect("snapshot");
    h.market.drain_events();
    let err = h
        .market
        .add_bribe(&DISTRIBUTOR, token, amount, gauge)
        .expect_err("rejected");
    assert!(h.market.drain_events().is_empty());
    assert_eq!(h.market.snapshot().expect("snapshot"), before);
    err.to_string()
}

#[test]
fn deposit_checks_run_in_order() {
    let mut h = Harness::new().expect("harness");
    h.fund(DISTRIBUTOR, TOKEN, BRIBE_AMOUNT).expect("fund");

    // Each case also breaks every later check.
    assert_eq!(
        reject(&mut h, Address::ZERO, 0, Address::ZERO),
        "Token not provided"
    );
    assert_eq!(
        reject(&mut h, UNLISTED, 0, Address::ZERO),
        "Token not permitted"
    );
    assert_eq!(reject(&mut h, TOKEN, 0, Address::ZERO), "Zero bribe amount");
    assert_eq!(
        reject(&mut h, TOKEN, 1, Address::ZERO),
        "Gauge not provided"
    );
    assert_eq!(reject(&mut h, TOKEN, 1, UNLISTED), "Gauge not permitted");
}

#[test]
fn deposit_needs_balance_and_allowance() {
    let mut h = Harness::new().expect("harness");
    h.market.mint(TOKEN, DISTRIBUTOR, 50).expect("mint");

    assert_eq!(
        reject(&mut h, TOKEN, 10, GAUGE),
        "insufficient allowance: required 10, available 0"
    );

    h.market
        .approve(&DISTRIBUTOR, TOKEN, CUSTODY, 100)
        .expect("approve");
    assert_eq!(
        reject(&mut h, TOKEN, 60, GAUGE),
        "insufficient balance: required 60, available 50"
    );

    h.market
        .add_bribe(&DISTRIBUTOR, TOKEN, 50, GAUGE)
        .expect("exact balance");
    assert_eq!(h.market.allowance(&TOKEN, &DISTRIBUTOR, &CUSTODY), 50);
}

fn reason(result: votemarket_market::Result<BribeRecord>) -> String {
    result.expect_err("lookup fails").to_string()
}

#[test]
fn lookups_report_why_nothing_was_found() {
    let mut h = Harness::new().expect("harness");
    h.bribe(TOKEN, GAUGE, 10).expect("bribe");

    assert_eq!(
        reason(h.market.get_bribe(&Address::ZERO, EPOCH, 0)),
        "Invalid gauge"
    );
    assert_eq!(
        reason(h.market.get_bribe(&GAUGE, 0, 0)),
        "Invalid epoch timestamp"
    );
    assert_eq!(
        reason(h.market.get_bribe(&GAUGE, EPOCH - 1, 0)),
        "No bribes for epoch"
    );
    assert_eq!(reason(h.market.get_bribe(&GAUGE, EPOCH, 1)), "Invalid index");
    assert!(h.market.get_bribe(&GAUGE, EPOCH, 0).is_ok());
}

#[test]
fn delisting_keeps_past_records() {
    let mut h = Harness::new().expect("harness");
    let record = h.bribe(TOKEN, GAUGE, 10).expect("bribe");

    assert!(h.market.delist_token(&ADMIN, TOKEN).expect("delist"));
    assert!(h.market.revoke_gauge(&ADMIN, GAUGE).expect("revoke"));
    assert!(!h.market.is_whitelisted_token(&TOKEN));
    assert!(!h.market.is_gauge_approved(&GAUGE));

    assert_eq!(h.market.get_bribe(&GAUGE, EPOCH, 0).expect("kept"), record);
    assert_eq!(
        reject(&mut h, TOKEN, 10, GAUGE),
        "Token not permitted"
    );

    assert!(h.market.whitelist_token(&ADMIN, TOKEN).expect("relist"));
    assert_eq!(
        reject(&mut h, TOKEN, 10, GAUGE),
        "Gauge not permitted"
    );
}

#[test]
fn registry_changes_need_admin() {
    let mut h = Harness::new().expect("harness");
    let err = h
        .market
        .whitelist_token(&DISTRIBUTOR, UNLISTED)
        .expect_err("not admin");
    assert_eq!(
        err.to_string(),
        format!("AccessControl: account {DISTRIBUTOR} is missing role DEFAULT_ADMIN_ROLE")
    );
    assert!(!h.market.is_whitelisted_token(&UNLISTED));

    let err = h
        .market
        .approve_gauge(&ADMIN, Address::ZERO)
        .expect_err("zero gauge");
    assert_eq!(err.to_string(), "Gauge not provided");
}
