//! Integration test: bribes land in the epoch the oracle reports after
//! checkpointing, and indices restart per (gauge, epoch).

use votemarket_integration_tests::{Harness, BRIBE_AMOUNT, EPOCH, GAUGE, OTHER_GAUGE, TOKEN};
use votemarket_types::{Event, WEEK};

#[test]
fn bribe_before_boundary_stays_in_current_epoch() {
    let mut h = Harness::new().expect("harness");
    let record = h.bribe(TOKEN, GAUGE, BRIBE_AMOUNT).expect("bribe");
    assert_eq!(record.epoch_start_time, EPOCH);
    assert_eq!(record.epoch_start_time % WEEK, 0);
    assert_eq!(h.market.current_epoch_start().expect("epoch"), EPOCH);
    assert!(!h
        .market
        .drain_events()
        .iter()
        .any(|e| matches!(e, Event::EpochCheckpointed { .. })));
}

#[test]
fn crossing_the_boundary_advances_one_week() {
    let mut h = Harness::new().expect("harness");
    h.bribe(TOKEN, GAUGE, 10).expect("before boundary");

    h.clock.set(EPOCH + 60);
    h.market.drain_events();
    let record = h.bribe(TOKEN, GAUGE, 10).expect("after boundary");
    assert_eq!(record.epoch_start_time, EPOCH + WEEK);
    // New epoch, new list.
    assert_eq!(record.index, 0);
    assert!(h
        .market
        .drain_events()
        .contains(&Event::EpochCheckpointed {
            epoch_start: EPOCH + WEEK
        }));

    assert_eq!(h.market.get_gauge_bribes(&GAUGE, EPOCH).len(), 1);
    assert_eq!(h.market.get_gauge_bribes(&GAUGE, EPOCH + WEEK).len(), 1);
}

#[test]
fn stale_oracle_advances_exactly_once_per_checkpoint() {
    let mut h = Harness::new().expect("harness");
    h.clock.set(EPOCH + 3 * WEEK + 5);

    assert_eq!(h.market.checkpoint().expect("checkpoint"), EPOCH + WEEK);
    assert_eq!(h.market.checkpoint().expect("checkpoint"), EPOCH + 2 * WEEK);

    let record = h.bribe(TOKEN, GAUGE, 10).expect("bribe");
    assert_eq!(record.epoch_start_time, EPOCH + 3 * WEEK);
    assert_eq!(h.market.current_epoch_start().expect("epoch"), EPOCH + 3 * WEEK);
}

#[test]
fn indices_are_dense_per_gauge_and_epoch() {
    let mut h = Harness::new().expect("harness");
    for expected in 0..3u32 {
        let record = h.bribe(TOKEN, GAUGE, 7).expect("bribe");
        assert_eq!(record.index, expected);
    }
    let other = h.bribe(TOKEN, OTHER_GAUGE, 7).expect("other gauge");
    assert_eq!(other.index, 0);

    let list = h.market.get_gauge_bribes(&GAUGE, EPOCH);
    let indices: Vec<u32> = list.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(h.market.get_gauge_bribes(&GAUGE, EPOCH + WEEK).is_empty());
}
