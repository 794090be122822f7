//! Bribe records.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{Address, Amount, Timestamp};

/// A single deposit earmarked for a gauge in one voting epoch.
///
/// Identity is `(gauge, epoch_start_time, index)`. Records are immutable once
/// created.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BribeRecord {
    /// Gauge the bribe is earmarked for.
    pub gauge: Address,
    /// Reward token deposited.
    pub token: Address,
    /// Depositor.
    pub briber: Address,
    /// Deposited amount in token base units.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
    /// Epoch boundary the deposit was attributed to.
    pub epoch_start_time: Timestamp,
    /// Position within the `(gauge, epoch_start_time)` list.
    pub index: u32,
}

impl BribeRecord {
    /// The identity of this record.
    pub fn key(&self) -> BribeKey {
        BribeKey {
            gauge: self.gauge,
            epoch_start_time: self.epoch_start_time,
            index: self.index,
        }
    }
}

/// Identity of a bribe record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BribeKey {
    pub gauge: Address,
    pub epoch_start_time: Timestamp,
    pub index: u32,
}
