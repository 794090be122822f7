//! # votemarket-distribution
//!
//! Merkle-proof distribution of bribes.
//!
//! A distributor turns a bribe record into a claimable payout round by
//! publishing the root of an off-chain allocation tree. Claimers then prove
//! their `(claimer, amount)` leaf against that root and are paid from
//! custody, at most once per distribution.
//!
//! ## Modules
//!
//! - [`access`] - Capability sets per account
//! - [`channel`] - Per `(token, distributor)` distribution sequences
//! - [`claims`] - Anti-replay claim flags
//! - [`manager`] - Distribution creation and batch claiming

pub mod access;
pub mod channel;
pub mod claims;
pub mod manager;

use votemarket_types::{Address, Capability};

pub use access::AccessControl;
pub use channel::{Channel, DistributionChannelStore};
pub use claims::ClaimLedger;
pub use manager::{ClaimReceipt, DistributionManager, NewDistribution, Payout};

/// Error types for distribution operations.
///
/// The display text of each validation variant is a stable reason string.
#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    /// The caller lacks a required capability.
    #[error("AccessControl: account {account} is missing role {capability}")]
    Unauthorized {
        account: Address,
        capability: Capability,
    },

    /// Token, amount or briber differ from the bound bribe record.
    #[error("Invalid bribe record")]
    InvalidBribeRecord,

    /// The supplied Merkle root is zero.
    #[error("Merkle root not set")]
    MerkleRootNotSet,

    /// The id is not the channel's next id.
    #[error("Invalid distribution id")]
    InvalidDistributionId,

    /// The bribe record already funds a distribution.
    #[error("Bribe already distributed")]
    BribeAlreadyDistributed,

    /// A claim's proof does not resolve to the stored root.
    #[error("Incorrect merkle proof")]
    IncorrectProof,

    /// The claim tuple has already been paid.
    #[error("cannot claim twice")]
    AlreadyClaimed,

    /// A claim's token index is outside the token list.
    #[error("Invalid token index")]
    InvalidTokenIndex,

    /// The claims would pay out more than the channel holds.
    #[error("Distribution balance exceeded")]
    BalanceExceeded,

    /// The claimer is the custody account.
    #[error("Custody cannot claim")]
    CustodyClaimer,

    /// A bribe lookup failed.
    #[error(transparent)]
    Bribe(#[from] votemarket_bribes::BribeError),

    /// Paying out from custody failed.
    #[error(transparent)]
    Token(#[from] votemarket_token::TokenError),
}

/// Convenience result type for distribution operations.
pub type Result<T> = std::result::Result<T, DistributionError>;
