//! Integration test crate for the bribe market.
//!
//! Holds the fixtures shared by the end-to-end scenarios under `tests/`,
//! which drive the market through its public operations across the
//! workspace crates, without a running daemon.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p votemarket-integration-tests
//! ```

use votemarket_crypto::{AllocationNode, AllocationTree};
use votemarket_market::{Market, MarketConfig, NewDistribution};
use votemarket_oracle::{EpochOracleClient, GaugeController, ManualClock};
use votemarket_token::TokenBook;
use votemarket_types::{Address, Amount, BribeRecord, Claim, Distribution, Timestamp};

/// Thursday 2023-02-23 00:00 UTC, a week boundary.
pub const EPOCH: Timestamp = 1_677_110_400;

pub const TOKEN: Address = Address::repeat_byte(0x70);
pub const OTHER_TOKEN: Address = Address::repeat_byte(0x71);
pub const GAUGE: Address = Address::repeat_byte(0x9a);
pub const OTHER_GAUGE: Address = Address::repeat_byte(0x9b);
pub const ADMIN: Address = Address::repeat_byte(0xad);
pub const CUSTODY: Address = Address::repeat_byte(0xcc);
/// Funds bribes and publishes their distributions.
pub const DISTRIBUTOR: Address = Address::repeat_byte(0xd1);
pub const USER: Address = Address::repeat_byte(0x01);

/// 100 tokens at 18 decimals.
pub const BRIBE_AMOUNT: Amount = 100_000_000_000_000_000_000;
/// USER's share of [`allocations`].
pub const USER_AMOUNT: Amount = 55_190_000_000_000_000_000;

/// Five voters sharing [`BRIBE_AMOUNT`].
pub fn allocations() -> Vec<(Address, Amount)> {
    vec![
        (USER, USER_AMOUNT),
        (Address::repeat_byte(0x02), 20_000_000_000_000_000_000),
        (Address::repeat_byte(0x03), 15_000_000_000_000_000_000),
        (Address::repeat_byte(0x04), 6_000_000_000_000_000_000),
        (Address::repeat_byte(0x05), 3_810_000_000_000_000_000),
    ]
}

/// A market over a manual clock.
pub struct Harness {
    pub market: Market,
    pub clock: ManualClock,
}

impl Harness {
    /// Whitelists `TOKEN` and `OTHER_TOKEN`, approves `GAUGE` and
    /// `OTHER_GAUGE`. The clock sits an hour before the `EPOCH` boundary,
    /// so bribes land in `EPOCH`.
    pub fn new() -> anyhow::Result<Self> {
        let clock = ManualClock::new(EPOCH - 3_600);
        let oracle = EpochOracleClient::new(GaugeController::new(EPOCH, clock.clone()));
        let market = Market::new(
            MarketConfig {
                custody: CUSTODY,
                admin: ADMIN,
                distributors: vec![DISTRIBUTOR],
                whitelisted_tokens: vec![TOKEN, OTHER_TOKEN],
                approved_gauges: vec![GAUGE, OTHER_GAUGE],
            },
            oracle,
            TokenBook::new(),
        )?;
        Ok(Self { market, clock })
    }

    /// Mint `amount` to `holder` and let custody pull all of it.
    pub fn fund(&mut self, holder: Address, token: Address, amount: Amount) -> anyhow::Result<()> {
        self.market.mint(token, holder, amount)?;
        self.market.approve(&holder, token, CUSTODY, amount)?;
        Ok(())
    }

    /// Fund `DISTRIBUTOR` and deposit `amount` of `token` for `gauge`.
    pub fn bribe(
        &mut self,
        token: Address,
        gauge: Address,
        amount: Amount,
    ) -> anyhow::Result<BribeRecord> {
        self.fund(DISTRIBUTOR, token, amount)?;
        Ok(self.market.add_bribe(&DISTRIBUTOR, token, amount, gauge)?)
    }

    /// Publish `tree` over `record` as the channel's next distribution.
    pub fn distribute(
        &mut self,
        record: &BribeRecord,
        tree: &AllocationTree,
    ) -> anyhow::Result<Distribution> {
        let request = distribution_request(
            record,
            self.market.get_next_distribution_id(&record.token, &record.briber),
            tree,
        );
        Ok(self.market.create_distribution(&DISTRIBUTOR, request)?)
    }
}

/// A request publishing `tree` over `record` with id `distribution_id`.
pub fn distribution_request(
    record: &BribeRecord,
    distribution_id: u32,
    tree: &AllocationTree,
) -> NewDistribution {
    NewDistribution {
        token: record.token,
        gauge: record.gauge,
        epoch_start_time: record.epoch_start_time,
        bribe_index: record.index,
        amount: record.amount,
        distributor: record.briber,
        distribution_id,
        merkle_root: tree.merkle_root,
    }
}

/// A claim on `DISTRIBUTOR`'s distribution for the node's allocation.
pub fn claim(node: &AllocationNode, distribution_id: u32, token_index: usize) -> Claim {
    Claim {
        distribution_id,
        amount: node.amount,
        distributor: DISTRIBUTOR,
        token_index,
        proof: node.proof.clone(),
    }
}

/// Look up `claimer`'s node.
pub fn node(tree: &AllocationTree, claimer: Address) -> anyhow::Result<&AllocationNode> {
    tree.node(&claimer)
        .ok_or_else(|| anyhow::anyhow!("{claimer} not in tree"))
}
