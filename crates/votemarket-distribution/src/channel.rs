//! Distribution channels.
//!
//! A channel is the sequence of payout rounds for one `(token, distributor)`
//! pair. Ids are assigned 0, 1, 2, … with no gaps, and a published root is
//! never replaced. Each channel also tracks how much of its funding is still
//! unclaimed.

use std::collections::{BTreeMap, BTreeSet};

use votemarket_types::{Amount, BribeKey, ChannelKey, Distribution, DistributionId, Hash, ZERO_HASH};

use crate::{DistributionError, Result};

/// One `(token, distributor)` channel.
#[derive(Debug, Default, Clone)]
pub struct Channel {
    distributions: Vec<Distribution>,
    remaining: Amount,
}

impl Channel {
    /// The id the next distribution must use.
    pub fn next_distribution_id(&self) -> DistributionId {
        // Ids are dense and u32-bounded on append.
        self.distributions.len() as DistributionId
    }

    pub fn distribution(&self, id: DistributionId) -> Option<&Distribution> {
        self.distributions.get(id as usize)
    }

    pub fn distributions(&self) -> &[Distribution] {
        &self.distributions
    }

    /// Funded amount not yet claimed.
    pub fn remaining(&self) -> Amount {
        self.remaining
    }
}

/// Every channel, plus the set of bribe records already bound to one.
#[derive(Debug, Default, Clone)]
pub struct DistributionChannelStore {
    channels: BTreeMap<ChannelKey, Channel>,
    bound_bribes: BTreeSet<BribeKey>,
}

impl DistributionChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self, key: &ChannelKey) -> Option<&Channel> {
        self.channels.get(key)
    }

    /// The id the next distribution in the channel must use. Zero for a
    /// channel that does not exist yet.
    pub fn next_distribution_id(&self, key: &ChannelKey) -> DistributionId {
        self.channel(key).map_or(0, Channel::next_distribution_id)
    }

    /// The stored root, or the zero hash if there is none.
    pub fn distribution_root(&self, key: &ChannelKey, id: DistributionId) -> Hash {
        self.channel(key)
            .and_then(|c| c.distribution(id))
            .map_or(ZERO_HASH, |d| d.merkle_root)
    }

    /// Funded amount not yet claimed in the channel.
    pub fn remaining_balance(&self, key: &ChannelKey) -> Amount {
        self.channel(key).map_or(0, Channel::remaining)
    }

    /// Whether a bribe record already funds a distribution.
    pub fn is_bribe_bound(&self, bribe: &BribeKey) -> bool {
        self.bound_bribes.contains(bribe)
    }

    /// Check that `distribution` may be appended to the channel.
    ///
    /// # Errors
    ///
    /// - [`DistributionError::MerkleRootNotSet`] for a zero root
    /// - [`DistributionError::InvalidDistributionId`] if the id is not next
    /// - [`DistributionError::BribeAlreadyDistributed`] if the bribe is bound
    /// - [`DistributionError::BalanceExceeded`] if the channel balance would
    ///   overflow
    pub fn ensure_append(&self, key: &ChannelKey, distribution: &Distribution) -> Result<()> {
        if distribution.merkle_root == ZERO_HASH {
            return Err(DistributionError::MerkleRootNotSet);
        }
        let channel = self.channel(key);
        let next = channel.map_or(0, |c| c.distributions.len());
        if distribution.id as usize != next || distribution.id == DistributionId::MAX {
            return Err(DistributionError::InvalidDistributionId);
        }
        if self.is_bribe_bound(&distribution.bribe) {
            return Err(DistributionError::BribeAlreadyDistributed);
        }
        channel
            .map_or(0, Channel::remaining)
            .checked_add(distribution.amount)
            .ok_or(DistributionError::BalanceExceeded)?;
        Ok(())
    }

    /// Append a distribution and fund the channel with its amount.
    ///
    /// # Errors
    ///
    /// Same as [`ensure_append`](Self::ensure_append).
    pub fn append(&mut self, key: ChannelKey, distribution: Distribution) -> Result<()> {
        self.ensure_append(&key, &distribution)?;
        let channel = self.channels.entry(key).or_default();
        channel.remaining += distribution.amount;
        self.bound_bribes.insert(distribution.bribe);
        channel.distributions.push(distribution);
        Ok(())
    }

    /// Take `amount` out of the channel's remaining balance.
    ///
    /// # Errors
    ///
    /// - [`DistributionError::BalanceExceeded`] if the channel holds less
    pub fn debit(&mut self, key: &ChannelKey, amount: Amount) -> Result<()> {
        let channel = self
            .channels
            .get_mut(key)
            .ok_or(DistributionError::BalanceExceeded)?;
        channel.remaining = channel
            .remaining
            .checked_sub(amount)
            .ok_or(DistributionError::BalanceExceeded)?;
        Ok(())
    }

    /// Every channel in key order.
    pub fn channels(&self) -> impl Iterator<Item = (&ChannelKey, &Channel)> {
        self.channels.iter()
    }

    /// Rebuild a store from persisted distributions and channel balances.
    ///
    /// Distributions are appended in id order, then each channel's remaining
    /// balance is overwritten with the persisted value.
    ///
    /// # Errors
    ///
    /// Any append error, e.g. a gap in a channel's ids.
    pub fn restore(
        distributions: impl IntoIterator<Item = (ChannelKey, Distribution)>,
        balances: impl IntoIterator<Item = (ChannelKey, Amount)>,
    ) -> Result<Self> {
        let mut sorted: Vec<(ChannelKey, Distribution)> = distributions.into_iter().collect();
        sorted.sort_by_key(|(key, d)| (*key, d.id));

        let mut store = Self::new();
        for (key, distribution) in sorted {
            store.append(key, distribution)?;
        }
        for (key, remaining) in balances {
            store.channels.entry(key).or_default().remaining = remaining;
        }
        Ok(store)
    }
}
