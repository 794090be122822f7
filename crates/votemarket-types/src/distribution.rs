//! Distribution channels and claims.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as, DisplayFromStr};

use crate::{Address, Amount, BribeKey, Hash};

/// Sequential id of a distribution within its channel.
pub type DistributionId = u32;

/// A distribution channel: one `(token, distributor)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelKey {
    pub token: Address,
    pub distributor: Address,
}

/// The anti-replay tuple: a claimer's leaf in one distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimKey {
    pub token: Address,
    pub distributor: Address,
    pub distribution_id: DistributionId,
    pub claimer: Address,
}

impl ClaimKey {
    /// The channel this claim draws from.
    pub fn channel(&self) -> ChannelKey {
        ChannelKey {
            token: self.token,
            distributor: self.distributor,
        }
    }
}

/// One payout round in a channel, bound to the bribe that funds it.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub id: DistributionId,
    /// Root of the allocation tree. Never zero.
    #[serde_as(as = "Hex")]
    pub merkle_root: Hash,
    /// Amount funded, equal to the bound bribe's amount.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
    /// The bribe record funding this distribution.
    pub bribe: BribeKey,
}

/// A single entry of a claim batch.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub distribution_id: DistributionId,
    /// Allocated amount, as committed in the leaf.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
    pub distributor: Address,
    /// Index into the batch's token list.
    pub token_index: usize,
    /// Sibling hashes from leaf to root.
    #[serde_as(as = "Vec<Hex>")]
    pub proof: Vec<Hash>,
}
