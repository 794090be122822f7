//! # votemarket-market
//!
//! The serialized state machine. [`Market`] owns every store and exposes each
//! operation with an explicit caller. Each call either commits all of its
//! changes and appends the matching journal [`Event`]s, or fails and changes
//! nothing.
//!
//! ## Modules
//!
//! - [`market`] - The [`Market`] facade
//! - [`snapshot`] - Full-state export and restore

pub mod market;
pub mod snapshot;

pub use market::{Market, MarketConfig};
pub use snapshot::{CapabilityGrant, ChannelBalance, ChannelDistribution, MarketSnapshot};

pub use votemarket_distribution::{ClaimReceipt, NewDistribution, Payout};
pub use votemarket_types::Event;

/// Error types for market operations.
///
/// Lower-layer errors pass through unchanged so their reason strings reach
/// the caller intact.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error(transparent)]
    Bribe(#[from] votemarket_bribes::BribeError),

    #[error(transparent)]
    Distribution(#[from] votemarket_distribution::DistributionError),

    #[error(transparent)]
    Oracle(#[from] votemarket_oracle::OracleError),

    #[error(transparent)]
    Token(#[from] votemarket_token::TokenError),

    /// The custody account only moves tokens through bribes and claims.
    #[error("Custody account cannot call")]
    CustodyCaller,

    /// Construction parameters are unusable.
    #[error("invalid market config: {0}")]
    InvalidConfig(String),
}

/// Convenience result type for market operations.
pub type Result<T> = std::result::Result<T, MarketError>;
