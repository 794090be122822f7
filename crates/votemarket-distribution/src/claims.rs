//! Claim flags.
//!
//! A tuple is absent until its first successful claim and present forever
//! after.

use std::collections::BTreeSet;

use votemarket_types::ClaimKey;

/// The set of paid claim tuples.
#[derive(Debug, Default, Clone)]
pub struct ClaimLedger {
    claimed: BTreeSet<ClaimKey>,
}

impl ClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted tuples.
    pub fn from_keys(keys: impl IntoIterator<Item = ClaimKey>) -> Self {
        Self {
            claimed: keys.into_iter().collect(),
        }
    }

    pub fn is_claimed(&self, key: &ClaimKey) -> bool {
        self.claimed.contains(key)
    }

    /// Flip the tuple to claimed. Returns false if it already was.
    pub fn mark_claimed(&mut self, key: ClaimKey) -> bool {
        self.claimed.insert(key)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Every claimed tuple in order.
    pub fn keys(&self) -> impl Iterator<Item = &ClaimKey> {
        self.claimed.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use votemarket_types::Address;

    #[test]
    fn test_mark_once() {
        let mut ledger = ClaimLedger::new();
        let key = ClaimKey {
            token: Address::repeat_byte(1),
            distributor: Address::repeat_byte(2),
            distribution_id: 0,
            claimer: Address::repeat_byte(3),
        };
        assert!(!ledger.is_claimed(&key));
        assert!(ledger.mark_claimed(key));
        assert!(ledger.is_claimed(&key));
        assert!(!ledger.mark_claimed(key));
        assert_eq!(ledger.len(), 1);

        let other = ClaimKey {
            distribution_id: 1,
            ..key
        };
        assert!(!ledger.is_claimed(&other));
    }
}
