//! # votemarket-oracle
//!
//! The epoch clock. Bribes are attributed to the boundary reported by an
//! external gauge controller, which must be checkpointed to advance.
//!
//! ## Modules
//!
//! - [`clock`] - Wall-clock sources (system and manual)
//! - [`gauge_controller`] - In-process gauge controller oracle
//! - [`client`] - Thin accessor used by the bribe ledger

pub mod client;
pub mod clock;
pub mod gauge_controller;

use votemarket_types::Timestamp;

pub use client::{Checkpoint, EpochOracleClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use gauge_controller::GaugeController;

/// Error types for oracle operations.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The oracle reports no epoch boundary.
    #[error("epoch oracle has no current epoch")]
    Unset,

    /// Advancing the boundary would overflow the timestamp.
    #[error("epoch timestamp overflow advancing from {0}")]
    Overflow(Timestamp),
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;

/// The external epoch oracle boundary.
///
/// `current_epoch_start` is a pure read of the stored boundary. `checkpoint`
/// forces the oracle to catch up with wall-clock time and returns the
/// boundary it ends on.
pub trait EpochOracle: Send {
    /// The stored epoch boundary.
    fn current_epoch_start(&self) -> Timestamp;

    /// Advance the stored boundary if wall-clock time has reached it.
    fn checkpoint(&mut self) -> Result<Timestamp>;
}
