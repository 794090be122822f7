//! Integration test: a bribe from deposit to payout.
//!
//! 1. A distributor deposits 100 tokens for a gauge
//! 2. The bribe is split between five voters in a Merkle tree
//! 3. Voters claim their shares, some through a relayer
//! 4. Custody always holds exactly what is still owed

use votemarket_crypto::AllocationTree;
use votemarket_integration_tests::{
    allocations, claim, node, Harness, BRIBE_AMOUNT, CUSTODY, DISTRIBUTOR, EPOCH, GAUGE, TOKEN,
    USER, USER_AMOUNT,
};
use votemarket_types::{Address, Event};

#[test]
fn bribe_distribute_and_claim() {
    let mut h = Harness::new().expect("harness");

    // =========================================================
    // Step 1: Deposit
    // =========================================================
    let record = h.bribe(TOKEN, GAUGE, BRIBE_AMOUNT).expect("bribe");
    assert_eq!(record.index, 0);
    assert_eq!(record.epoch_start_time, EPOCH);
    assert_eq!(record.briber, DISTRIBUTOR);
    assert_eq!(h.market.balance_of(&TOKEN, &CUSTODY), BRIBE_AMOUNT);
    assert_eq!(h.market.balance_of(&TOKEN, &DISTRIBUTOR), 0);
    assert_eq!(
        h.market.get_bribe(&GAUGE, EPOCH, 0).expect("stored"),
        record
    );

    // =========================================================
    // Step 2: Distribution over the bribe
    // =========================================================
    let tree = AllocationTree::new(&allocations()).expect("tree");
    assert_eq!(tree.total_amount, BRIBE_AMOUNT);
    let distribution = h.distribute(&record, &tree).expect("distribution");
    assert_eq!(distribution.id, 0);
    assert_eq!(distribution.bribe, record.key());
    assert_eq!(
        h.market.get_distribution_root(&TOKEN, &DISTRIBUTOR, 0),
        tree.merkle_root
    );
    assert_eq!(h.market.get_next_distribution_id(&TOKEN, &DISTRIBUTOR), 1);
    assert_eq!(
        h.market.get_remaining_balance(&TOKEN, &DISTRIBUTOR),
        BRIBE_AMOUNT
    );

    // =========================================================
    // Step 3: USER claims 55.19 tokens
    // =========================================================
    let user_node = node(&tree, USER).expect("user node");
    assert!(h.market.verify_claim(
        &TOKEN,
        &DISTRIBUTOR,
        0,
        &USER,
        USER_AMOUNT,
        &user_node.proof
    ));
    h.market.drain_events();

    let receipt = h
        .market
        .claim_distributions(&USER, &USER, &[claim(user_node, 0, 0)], &[TOKEN])
        .expect("claim");
    assert_eq!(receipt.payouts.len(), 1);
    assert_eq!(receipt.payouts[0].amount, USER_AMOUNT);
    assert_eq!(h.market.balance_of(&TOKEN, &USER), USER_AMOUNT);
    assert!(h.market.is_claimed(&TOKEN, &DISTRIBUTOR, 0, &USER));

    let events = h.market.drain_events();
    assert_eq!(
        events,
        vec![
            Event::DistributionClaimed {
                token: TOKEN,
                distributor: DISTRIBUTOR,
                distribution_id: 0,
                claimer: USER,
                amount: USER_AMOUNT,
            },
            Event::Transfer {
                token: TOKEN,
                from: CUSTODY,
                to: USER,
                amount: USER_AMOUNT,
            },
        ]
    );

    // A second claim of the same allocation is rejected.
    let err = h
        .market
        .claim_distributions(&USER, &USER, &[claim(user_node, 0, 0)], &[TOKEN])
        .expect_err("second claim");
    assert_eq!(err.to_string(), "cannot claim twice");
    assert_eq!(h.market.balance_of(&TOKEN, &USER), USER_AMOUNT);
    assert!(h.market.drain_events().is_empty());

    // =========================================================
    // Step 4: Everyone else claims through a relayer
    // =========================================================
    let relayer = Address::repeat_byte(0x5e);
    for (claimer, amount) in allocations().into_iter().skip(1) {
        let n = node(&tree, claimer).expect("node");
        h.market
            .claim_distributions(&relayer, &claimer, &[claim(n, 0, 0)], &[TOKEN])
            .expect("relayed claim");
        assert_eq!(h.market.balance_of(&TOKEN, &claimer), amount);
        // Custody holds exactly what the channel still owes.
        assert_eq!(
            h.market.balance_of(&TOKEN, &CUSTODY),
            h.market.get_remaining_balance(&TOKEN, &DISTRIBUTOR)
        );
    }
    assert_eq!(h.market.balance_of(&TOKEN, &relayer), 0);
    assert_eq!(h.market.get_remaining_balance(&TOKEN, &DISTRIBUTOR), 0);
    assert_eq!(h.market.balance_of(&TOKEN, &CUSTODY), 0);
}

#[test]
fn custody_covers_undistributed_and_remaining() {
    let mut h = Harness::new().expect("harness");
    let first = h.bribe(TOKEN, GAUGE, BRIBE_AMOUNT).expect("first bribe");
    let second = h.bribe(TOKEN, GAUGE, 40).expect("second bribe");
    assert_eq!(second.index, 1);

    // Only the first bribe is distributed.
    let tree = AllocationTree::new(&allocations()).expect("tree");
    h.distribute(&first, &tree).expect("distribution");
    let user_node = node(&tree, USER).expect("user node");
    h.market
        .claim_distributions(&USER, &USER, &[claim(user_node, 0, 0)], &[TOKEN])
        .expect("claim");

    let undistributed = second.amount;
    assert_eq!(
        h.market.balance_of(&TOKEN, &CUSTODY),
        undistributed + h.market.get_remaining_balance(&TOKEN, &DISTRIBUTOR)
    );
}

#[test]
fn empty_claim_batch_is_a_no_op() {
    let mut h = Harness::new().expect("harness");
    h.market.drain_events();
    let receipt = h
        .market
        .claim_distributions(&USER, &USER, &[], &[])
        .expect("empty batch");
    assert!(receipt.claimed.is_empty());
    assert!(receipt.payouts.is_empty());
    assert!(h.market.drain_events().is_empty());
}

#[test]
fn custody_cannot_move_escrow_directly() {
    let mut h = Harness::new().expect("harness");
    h.bribe(TOKEN, GAUGE, BRIBE_AMOUNT).expect("bribe");
    h.market.drain_events();

    let err = h
        .market
        .transfer(&CUSTODY, TOKEN, USER, BRIBE_AMOUNT)
        .expect_err("transfer from custody");
    assert_eq!(err.to_string(), "Custody account cannot call");
    let err = h
        .market
        .approve(&CUSTODY, TOKEN, USER, BRIBE_AMOUNT)
        .expect_err("approve from custody");
    assert_eq!(err.to_string(), "Custody account cannot call");

    assert_eq!(h.market.balance_of(&TOKEN, &CUSTODY), BRIBE_AMOUNT);
    assert_eq!(h.market.balance_of(&TOKEN, &USER), 0);
    assert_eq!(h.market.allowance(&TOKEN, &CUSTODY, &USER), 0);
    assert!(h.market.drain_events().is_empty());
}

#[test]
fn custody_cannot_bribe_with_escrow() {
    let mut h = Harness::new().expect("harness");
    h.bribe(TOKEN, GAUGE, BRIBE_AMOUNT).expect("bribe");
    h.market.drain_events();

    let err = h
        .market
        .add_bribe(&CUSTODY, TOKEN, BRIBE_AMOUNT, GAUGE)
        .expect_err("custody bribe");
    assert_eq!(err.to_string(), "Custody cannot bribe");

    assert_eq!(h.market.get_gauge_bribes(&GAUGE, EPOCH).len(), 1);
    assert_eq!(h.market.balance_of(&TOKEN, &CUSTODY), BRIBE_AMOUNT);
    assert!(h.market.drain_events().is_empty());
}

#[test]
fn claims_cannot_pay_custody() {
    let mut h = Harness::new().expect("harness");
    let record = h.bribe(TOKEN, GAUGE, BRIBE_AMOUNT).expect("bribe");
    let tree = AllocationTree::new(&[(CUSTODY, BRIBE_AMOUNT - USER_AMOUNT), (USER, USER_AMOUNT)])
        .expect("tree");
    h.distribute(&record, &tree).expect("distribution");
    h.market.drain_events();

    let custody_node = node(&tree, CUSTODY).expect("custody node");
    let relayer = Address::repeat_byte(0x5e);
    let err = h
        .market
        .claim_distributions(&relayer, &CUSTODY, &[claim(custody_node, 0, 0)], &[TOKEN])
        .expect_err("claim to custody");
    assert_eq!(err.to_string(), "Custody cannot claim");
    assert!(!h.market.is_claimed(&TOKEN, &DISTRIBUTOR, 0, &CUSTODY));
    assert_eq!(
        h.market.get_remaining_balance(&TOKEN, &DISTRIBUTOR),
        BRIBE_AMOUNT
    );
    assert!(h.market.drain_events().is_empty());

    // The honest share is still fully funded.
    let user_node = node(&tree, USER).expect("user node");
    h.market
        .claim_distributions(&USER, &USER, &[claim(user_node, 0, 0)], &[TOKEN])
        .expect("user claim");
    assert_eq!(
        h.market.balance_of(&TOKEN, &CUSTODY),
        h.market.get_remaining_balance(&TOKEN, &DISTRIBUTOR)
    );
}
