//! # votemarket-types
//!
//! Shared domain types used across the votemarket workspace: account
//! addresses, amounts, epoch timestamps, bribe records, distribution
//! channels, claims and the journal events emitted by the market.

pub mod access;
pub mod bribe;
pub mod distribution;
pub mod events;

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

pub use access::Capability;
pub use bribe::{BribeKey, BribeRecord};
pub use distribution::{ChannelKey, Claim, ClaimKey, Distribution, DistributionId};
pub use events::Event;

/// 32-byte hash (Merkle roots, leaves, proof elements).
pub type Hash = [u8; 32];

/// Token amount in base units.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Length of one voting epoch in seconds (7 days).
pub const WEEK: Timestamp = 7 * 24 * 60 * 60;

/// The "not set" Merkle root.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Errors produced when parsing textual forms of domain types.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// Input is not a 20-byte hex address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Input is not a 32-byte hex hash.
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    /// Unknown capability name.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),
}

/// A 20-byte account identifier (tokens, gauges, bribers, distributors, claimers).
///
/// Rendered as `0x` followed by 40 lowercase hex digits.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Byte length of an address.
    pub const LEN: usize = 20;

    /// The zero address, used as the "not provided" sentinel.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Address with every byte set to `byte`. Handy for fixtures.
    pub const fn repeat_byte(byte: u8) -> Self {
        Address([byte; 20])
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| TypeError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| TypeError::InvalidAddress(s.to_string()))?;
        Ok(Address(bytes))
    }
}

/// Parse a 32-byte hash from hex, with or without a `0x` prefix.
pub fn parse_hash(s: &str) -> Result<Hash, TypeError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|_| TypeError::InvalidHash(s.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| TypeError::InvalidHash(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_roundtrip() {
        let addr = Address::repeat_byte(0xab);
        let text = addr.to_string();
        assert_eq!(text, format!("0x{}", "ab".repeat(20)));
        assert_eq!(text.parse::<Address>().expect("parse"), addr);
    }

    #[test]
    fn test_address_parse_mixed_case_checksum() {
        let addr: Address = "0xe9e7CEA3DedcA5984780Bafc599bD69ADd087D56"
            .parse()
            .expect("checksummed address");
        assert_eq!(addr.to_string(), "0xe9e7cea3dedca5984780bafc599bd69add087d56");
    }

    #[test]
    fn test_address_parse_rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("not hex".parse::<Address>().is_err());
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::repeat_byte(1).is_zero());
        assert_eq!(Address::default(), Address::ZERO);
    }

    #[test]
    fn test_address_json() {
        let addr = Address::repeat_byte(0x11);
        let json = serde_json::to_string(&addr).expect("serialize");
        assert_eq!(json, format!("\"0x{}\"", "11".repeat(20)));
        let back: Address = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, addr);
    }

    #[test]
    fn test_parse_hash() {
        let hash = parse_hash(&format!("0x{}", "ff".repeat(32))).expect("hash");
        assert_eq!(hash, [0xff; 32]);
        assert!(parse_hash("00").is_err());
    }

    #[test]
    fn test_week_constant() {
        assert_eq!(WEEK, 604_800);
    }
}
