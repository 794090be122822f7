//! Full-state export and restore.
//!
//! A [`MarketSnapshot`] carries exactly the logical state layout that the
//! persistence layer stores: registry sets, capability grants, bribe records,
//! distributions with channel balances, claim flags, token balances and
//! allowances, and the oracle's stored epoch boundary.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use votemarket_bribes::{BribeLedger, WhitelistRegistry};
use votemarket_distribution::{
    AccessControl, ClaimLedger, DistributionChannelStore, DistributionManager,
};
use votemarket_oracle::EpochOracleClient;
use votemarket_token::{AllowanceEntry, BalanceEntry, TokenBook};
use votemarket_types::{
    Address, Amount, BribeRecord, Capability, ChannelKey, ClaimKey, Distribution, Event, Timestamp,
};

use crate::{Market, Result};

/// One `(account, capability)` grant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityGrant {
    pub account: Address,
    pub capability: Capability,
}

/// A distribution together with its channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDistribution {
    pub token: Address,
    pub distributor: Address,
    pub distribution: Distribution,
}

/// A channel's unclaimed balance.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBalance {
    pub token: Address,
    pub distributor: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub remaining: Amount,
}

/// The complete state of a [`Market`] backed by a [`TokenBook`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub custody: Address,
    /// The oracle's stored epoch boundary.
    pub epoch_start: Timestamp,
    pub whitelisted_tokens: Vec<Address>,
    pub approved_gauges: Vec<Address>,
    pub grants: Vec<CapabilityGrant>,
    pub bribes: Vec<BribeRecord>,
    pub distributions: Vec<ChannelDistribution>,
    pub channel_balances: Vec<ChannelBalance>,
    pub claims: Vec<ClaimKey>,
    pub balances: Vec<BalanceEntry>,
    pub allowances: Vec<AllowanceEntry>,
}

impl Market<TokenBook> {
    /// Export the full state.
    ///
    /// # Errors
    ///
    /// [`OracleError::Unset`](votemarket_oracle::OracleError::Unset) if the
    /// oracle reports no epoch.
    pub fn snapshot(&self) -> Result<MarketSnapshot> {
        let channels = self.distributions.channels();
        Ok(MarketSnapshot {
            custody: self.custody,
            epoch_start: self.oracle.current_epoch_start()?,
            whitelisted_tokens: self.registry.tokens().copied().collect(),
            approved_gauges: self.registry.gauges().copied().collect(),
            grants: self
                .distributions
                .access()
                .grants()
                .map(|(account, capability)| CapabilityGrant {
                    account,
                    capability,
                })
                .collect(),
            bribes: self.bribes.records().cloned().collect(),
            distributions: channels
                .channels()
                .flat_map(|(key, channel)| {
                    channel.distributions().iter().map(|d| ChannelDistribution {
                        token: key.token,
                        distributor: key.distributor,
                        distribution: d.clone(),
                    })
                })
                .collect(),
            channel_balances: channels
                .channels()
                .map(|(key, channel)| ChannelBalance {
                    token: key.token,
                    distributor: key.distributor,
                    remaining: channel.remaining(),
                })
                .collect(),
            claims: self.distributions.claims().keys().copied().collect(),
            balances: self.tokens.balance_entries(),
            allowances: self.tokens.allowance_entries(),
        })
    }

    /// Rebuild a market from a snapshot.
    ///
    /// `oracle` should be positioned at `snapshot.epoch_start`; the snapshot
    /// only records the boundary, not the oracle itself.
    ///
    /// # Errors
    ///
    /// Any inconsistency in the snapshot, e.g. gaps in bribe indices or
    /// distribution ids.
    pub fn restore(snapshot: MarketSnapshot, oracle: EpochOracleClient) -> Result<Self> {
        let stores = Stores::rebuild(snapshot)?;
        let market = Market::from_parts(
            stores.custody,
            stores.registry,
            oracle,
            stores.tokens,
            stores.bribes,
            stores.distributions,
        );
        tracing::info!(
            custody = %market.custody,
            bribes = market.bribes.records().count(),
            claims = market.distributions.claims().len(),
            "market restored"
        );
        Ok(market)
    }

    /// Put the stores back to `snapshot`, discarding uncommitted events.
    ///
    /// The oracle is external and keeps its position. If it moved past
    /// `snapshot.epoch_start`, an [`Event::EpochCheckpointed`] is queued so
    /// the next commit records the new boundary.
    ///
    /// # Errors
    ///
    /// Any inconsistency in the snapshot, or an oracle with no epoch. The
    /// market is left untouched on error.
    pub fn rollback(&mut self, snapshot: MarketSnapshot) -> Result<()> {
        let epoch_start = snapshot.epoch_start;
        let current = self.oracle.current_epoch_start()?;
        let stores = Stores::rebuild(snapshot)?;

        self.custody = stores.custody;
        self.registry = stores.registry;
        self.tokens = stores.tokens;
        self.bribes = stores.bribes;
        self.distributions = stores.distributions;
        self.events.clear();
        if current != epoch_start {
            self.events.push(Event::EpochCheckpointed {
                epoch_start: current,
            });
        }
        tracing::warn!(epoch_start = current, "market rolled back");
        Ok(())
    }
}

/// Every store a snapshot carries, minus the oracle.
struct Stores {
    custody: Address,
    registry: WhitelistRegistry,
    tokens: TokenBook,
    bribes: BribeLedger,
    distributions: DistributionManager,
}

impl Stores {
    fn rebuild(snapshot: MarketSnapshot) -> Result<Self> {
        let MarketSnapshot {
            custody,
            epoch_start: _,
            whitelisted_tokens,
            approved_gauges,
            grants,
            bribes,
            distributions,
            channel_balances,
            claims,
            balances,
            allowances,
        } = snapshot;

        let channels = DistributionChannelStore::restore(
            distributions.into_iter().map(|d| {
                (
                    ChannelKey {
                        token: d.token,
                        distributor: d.distributor,
                    },
                    d.distribution,
                )
            }),
            channel_balances.into_iter().map(|b| {
                (
                    ChannelKey {
                        token: b.token,
                        distributor: b.distributor,
                    },
                    b.remaining,
                )
            }),
        )?;
        Ok(Self {
            custody,
            registry: WhitelistRegistry::new(whitelisted_tokens, approved_gauges),
            tokens: TokenBook::from_entries(balances, allowances),
            bribes: BribeLedger::from_records(bribes)?,
            distributions: DistributionManager::from_parts(
                AccessControl::from_grants(grants.into_iter().map(|g| (g.account, g.capability))),
                channels,
                ClaimLedger::from_keys(claims),
            ),
        })
    }
}
