//! # votemarket-bribes
//!
//! Epoch-aligned bribe deposits.
//!
//! A bribe is a deposit of a whitelisted token earmarked for an approved
//! gauge. Deposits are attributed to the epoch boundary reported by the
//! oracle after it has been checkpointed, never to a stale one.
//!
//! ## Modules
//!
//! - [`registry`] - Whitelisted tokens and approved gauges
//! - [`ledger`] - Append-only bribe lists per `(gauge, epoch)`

pub mod ledger;
pub mod registry;

pub use ledger::{BribeDeposit, BribeLedger, BribeReceipt};
pub use registry::WhitelistRegistry;

/// Error types for bribe operations.
///
/// The display text of each validation variant is a stable reason string.
#[derive(Debug, thiserror::Error)]
pub enum BribeError {
    /// Token is the zero address.
    #[error("Token not provided")]
    TokenNotProvided,

    /// Token is not whitelisted.
    #[error("Token not permitted")]
    TokenNotPermitted,

    /// Deposit amount is zero.
    #[error("Zero bribe amount")]
    ZeroAmount,

    /// Gauge is the zero address.
    #[error("Gauge not provided")]
    GaugeNotProvided,

    /// Gauge is not approved.
    #[error("Gauge not permitted")]
    GaugeNotPermitted,

    /// The custody account tried to deposit into itself.
    #[error("Custody cannot bribe")]
    CustodyBriber,

    /// Lookup with the zero gauge.
    #[error("Invalid gauge")]
    InvalidGauge,

    /// Lookup with a zero epoch timestamp.
    #[error("Invalid epoch timestamp")]
    InvalidEpochTimestamp,

    /// No records exist for the `(gauge, epoch)` pair.
    #[error("No bribes for epoch")]
    NoBribesForEpoch,

    /// Index past the end of the list.
    #[error("Invalid index")]
    InvalidIndex,

    /// The epoch oracle failed.
    #[error(transparent)]
    Oracle(#[from] votemarket_oracle::OracleError),

    /// Pulling the deposit into custody failed.
    #[error(transparent)]
    Token(#[from] votemarket_token::TokenError),
}

/// Convenience result type for bribe operations.
pub type Result<T> = std::result::Result<T, BribeError>;
