//! Whitelisted tokens and approved gauges.
//!
//! Two independent address sets. Membership can change over time without
//! affecting records created while an address was a member.

use std::collections::BTreeSet;

use votemarket_types::Address;

use crate::{BribeError, Result};

/// The token whitelist and gauge approval list.
#[derive(Debug, Default, Clone)]
pub struct WhitelistRegistry {
    tokens: BTreeSet<Address>,
    gauges: BTreeSet<Address>,
}

impl WhitelistRegistry {
    /// Seed the registry. Zero addresses are skipped.
    pub fn new(
        tokens: impl IntoIterator<Item = Address>,
        gauges: impl IntoIterator<Item = Address>,
    ) -> Self {
        Self {
            tokens: tokens.into_iter().filter(|a| !a.is_zero()).collect(),
            gauges: gauges.into_iter().filter(|a| !a.is_zero()).collect(),
        }
    }

    pub fn is_whitelisted_token(&self, token: &Address) -> bool {
        self.tokens.contains(token)
    }

    pub fn is_gauge_approved(&self, gauge: &Address) -> bool {
        self.gauges.contains(gauge)
    }

    /// Add a token. Returns whether it was newly added.
    ///
    /// # Errors
    ///
    /// - [`BribeError::TokenNotProvided`] for the zero address
    pub fn whitelist_token(&mut self, token: Address) -> Result<bool> {
        if token.is_zero() {
            return Err(BribeError::TokenNotProvided);
        }
        Ok(self.tokens.insert(token))
    }

    /// Remove a token. Returns whether it was present.
    pub fn delist_token(&mut self, token: &Address) -> bool {
        self.tokens.remove(token)
    }

    /// Add a gauge. Returns whether it was newly added.
    ///
    /// # Errors
    ///
    /// - [`BribeError::GaugeNotProvided`] for the zero address
    pub fn approve_gauge(&mut self, gauge: Address) -> Result<bool> {
        if gauge.is_zero() {
            return Err(BribeError::GaugeNotProvided);
        }
        Ok(self.gauges.insert(gauge))
    }

    /// Remove a gauge. Returns whether it was present.
    pub fn revoke_gauge(&mut self, gauge: &Address) -> bool {
        self.gauges.remove(gauge)
    }

    /// Whitelisted tokens in address order.
    pub fn tokens(&self) -> impl Iterator<Item = &Address> {
        self.tokens.iter()
    }

    /// Approved gauges in address order.
    pub fn gauges(&self) -> impl Iterator<Item = &Address> {
        self.gauges.iter()
    }
}
