//! # votemarket-crypto
//!
//! Hashing and Merkle-proof primitives for claim verification.
//!
//! ## Modules
//!
//! - [`blake3`] - Domain-separated BLAKE3 hashing
//! - [`merkle`] - Claim leaves, sorted-pair proof verification and tree building

pub mod blake3;
pub mod merkle;

pub use merkle::{AllocationNode, AllocationTree, MerkleTree};

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// A Merkle tree needs at least one leaf.
    #[error("cannot build a merkle tree without leaves")]
    EmptyTree,

    /// Requested leaf index is outside the tree.
    #[error("leaf index {index} out of range for {len} leaves")]
    LeafOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of leaves in the tree.
        len: usize,
    },

    /// Claimer appears more than once in an allocation.
    #[error("duplicate claimer in allocation: {0}")]
    DuplicateClaimer(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
