//! Capability-based access control.
//!
//! Each account maps to the set of capabilities it holds. Checks happen at
//! the top of the guarded operation.

use std::collections::{BTreeMap, BTreeSet};

use votemarket_types::{Address, Capability};

use crate::{DistributionError, Result};

/// Granted capabilities per account.
#[derive(Debug, Default, Clone)]
pub struct AccessControl {
    grants: BTreeMap<Address, BTreeSet<Capability>>,
}

impl AccessControl {
    /// Create with `admin` holding both [`Capability::Admin`] and
    /// [`Capability::Distributor`].
    pub fn new(admin: Address) -> Self {
        let mut access = Self::default();
        access.insert(admin, Capability::Admin);
        access.insert(admin, Capability::Distributor);
        access
    }

    /// Rebuild from persisted grants.
    pub fn from_grants(grants: impl IntoIterator<Item = (Address, Capability)>) -> Self {
        let mut access = Self::default();
        for (account, capability) in grants {
            access.insert(account, capability);
        }
        access
    }

    pub fn has_capability(&self, account: &Address, capability: Capability) -> bool {
        self.grants
            .get(account)
            .is_some_and(|caps| caps.contains(&capability))
    }

    /// Fail unless `account` holds `capability`.
    ///
    /// # Errors
    ///
    /// - [`DistributionError::Unauthorized`] naming the account and capability
    pub fn require(&self, account: &Address, capability: Capability) -> Result<()> {
        if self.has_capability(account, capability) {
            Ok(())
        } else {
            Err(DistributionError::Unauthorized {
                account: *account,
                capability,
            })
        }
    }

    /// Grant `capability` to `account`. `caller` must be an admin.
    /// Returns whether the grant is new.
    ///
    /// # Errors
    ///
    /// - [`DistributionError::Unauthorized`] if `caller` is not an admin
    pub fn grant(
        &mut self,
        caller: &Address,
        account: Address,
        capability: Capability,
    ) -> Result<bool> {
        self.require(caller, Capability::Admin)?;
        let added = self.insert(account, capability);
        if added {
            tracing::info!(%caller, %account, %capability, "capability granted");
        }
        Ok(added)
    }

    /// Revoke `capability` from `account`. `caller` must be an admin.
    /// Returns whether the account held it.
    ///
    /// # Errors
    ///
    /// - [`DistributionError::Unauthorized`] if `caller` is not an admin
    pub fn revoke(
        &mut self,
        caller: &Address,
        account: &Address,
        capability: Capability,
    ) -> Result<bool> {
        self.require(caller, Capability::Admin)?;
        let removed = match self.grants.get_mut(account) {
            Some(caps) => {
                let removed = caps.remove(&capability);
                if caps.is_empty() {
                    self.grants.remove(account);
                }
                removed
            }
            None => false,
        };
        if removed {
            tracing::info!(%caller, %account, %capability, "capability revoked");
        }
        Ok(removed)
    }

    /// Every `(account, capability)` grant, in order.
    pub fn grants(&self) -> impl Iterator<Item = (Address, Capability)> + '_ {
        self.grants
            .iter()
            .flat_map(|(account, caps)| caps.iter().map(move |cap| (*account, *cap)))
    }

    fn insert(&mut self, account: Address, capability: Capability) -> bool {
        self.grants.entry(account).or_default().insert(capability)
    }
}
