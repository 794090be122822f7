//! Journal events emitted by committed market operations.
//!
//! Every successful state change produces one or more events, in the order
//! the changes were applied. Failed calls emit nothing. The journal is what
//! the persistence layer replays into its tables.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{Address, Amount, BribeRecord, Capability, Distribution, DistributionId, Timestamp};

/// A committed state change.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    // Registry
    TokenWhitelisted {
        token: Address,
    },
    TokenDelisted {
        token: Address,
    },
    GaugeApproved {
        gauge: Address,
    },
    GaugeRevoked {
        gauge: Address,
    },

    // Access control
    CapabilityGranted {
        account: Address,
        capability: Capability,
    },
    CapabilityRevoked {
        account: Address,
        capability: Capability,
    },

    // Epoch clock
    EpochCheckpointed {
        epoch_start: Timestamp,
    },

    // Bribes and distributions
    BribeAdded {
        record: BribeRecord,
    },
    DistributionCreated {
        token: Address,
        distributor: Address,
        distribution: Distribution,
    },
    DistributionClaimed {
        token: Address,
        distributor: Address,
        distribution_id: DistributionId,
        claimer: Address,
        #[serde_as(as = "DisplayFromStr")]
        amount: Amount,
    },

    // Token movements
    Transfer {
        token: Address,
        from: Address,
        to: Address,
        #[serde_as(as = "DisplayFromStr")]
        amount: Amount,
    },
    Approval {
        token: Address,
        owner: Address,
        spender: Address,
        #[serde_as(as = "DisplayFromStr")]
        amount: Amount,
    },
}

impl Event {
    /// Event type name, matching the serialized tag.
    pub fn name(&self) -> &'static str {
        match self {
            Event::TokenWhitelisted { .. } => "token_whitelisted",
            Event::TokenDelisted { .. } => "token_delisted",
            Event::GaugeApproved { .. } => "gauge_approved",
            Event::GaugeRevoked { .. } => "gauge_revoked",
            Event::CapabilityGranted { .. } => "capability_granted",
            Event::CapabilityRevoked { .. } => "capability_revoked",
            Event::EpochCheckpointed { .. } => "epoch_checkpointed",
            Event::BribeAdded { .. } => "bribe_added",
            Event::DistributionCreated { .. } => "distribution_created",
            Event::DistributionClaimed { .. } => "distribution_claimed",
            Event::Transfer { .. } => "transfer",
            Event::Approval { .. } => "approval",
        }
    }
}
