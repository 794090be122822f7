//! The market facade.

use votemarket_bribes::{BribeDeposit, BribeLedger, WhitelistRegistry};
use votemarket_distribution::{ClaimReceipt, DistributionManager, NewDistribution};
use votemarket_oracle::EpochOracleClient;
use votemarket_token::{TokenBook, TokenLedger};
use votemarket_types::{
    Address, Amount, BribeRecord, Capability, Claim, ClaimKey, Distribution, DistributionId,
    Event, Hash, Timestamp,
};

use crate::{MarketError, Result};

/// Parameters for a fresh market.
#[derive(Debug, Clone, Default)]
pub struct MarketConfig {
    /// Account holding deposited bribes until they are claimed.
    pub custody: Address,
    /// Initial administrator. Also receives the distributor capability.
    pub admin: Address,
    /// Additional accounts granted the distributor capability.
    pub distributors: Vec<Address>,
    pub whitelisted_tokens: Vec<Address>,
    pub approved_gauges: Vec<Address>,
}

/// Every store of the system behind one serialized interface.
pub struct Market<T: TokenLedger = TokenBook> {
    pub(crate) custody: Address,
    pub(crate) registry: WhitelistRegistry,
    pub(crate) oracle: EpochOracleClient,
    pub(crate) tokens: T,
    pub(crate) bribes: BribeLedger,
    pub(crate) distributions: DistributionManager,
    pub(crate) events: Vec<Event>,
}

impl<T: TokenLedger> Market<T> {
    /// Create a market.
    ///
    /// # Errors
    ///
    /// - [`MarketError::InvalidConfig`] if custody or admin is the zero address
    pub fn new(config: MarketConfig, oracle: EpochOracleClient, tokens: T) -> Result<Self> {
        if config.custody.is_zero() {
            return Err(MarketError::InvalidConfig("custody address not set".into()));
        }
        if config.admin.is_zero() {
            return Err(MarketError::InvalidConfig("admin address not set".into()));
        }

        let mut distributions = DistributionManager::new(config.admin);
        for distributor in config.distributors {
            distributions
                .access_mut()
                .grant(&config.admin, distributor, Capability::Distributor)?;
        }

        tracing::info!(
            custody = %config.custody,
            admin = %config.admin,
            tokens = config.whitelisted_tokens.len(),
            gauges = config.approved_gauges.len(),
            "market initialized"
        );

        Ok(Self::from_parts(
            config.custody,
            WhitelistRegistry::new(config.whitelisted_tokens, config.approved_gauges),
            oracle,
            tokens,
            BribeLedger::new(),
            distributions,
        ))
    }

    pub(crate) fn from_parts(
        custody: Address,
        registry: WhitelistRegistry,
        oracle: EpochOracleClient,
        tokens: T,
        bribes: BribeLedger,
        distributions: DistributionManager,
    ) -> Self {
        Self {
            custody,
            registry,
            oracle,
            tokens,
            bribes,
            distributions,
            events: Vec::new(),
        }
    }

    /// The custody account.
    pub fn custody(&self) -> Address {
        self.custody
    }

    /// Take the events committed since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ---- Bribes ----

    /// Deposit `amount` of `token` for `gauge` from `caller`.
    ///
    /// # Errors
    ///
    /// See [`BribeLedger::add_bribe`].
    pub fn add_bribe(
        &mut self,
        caller: &Address,
        token: Address,
        amount: Amount,
        gauge: Address,
    ) -> Result<BribeRecord> {
        let receipt = self.bribes.add_bribe(
            &self.registry,
            &mut self.oracle,
            &mut self.tokens,
            &self.custody,
            BribeDeposit {
                briber: *caller,
                token,
                amount,
                gauge,
            },
        )?;

        if receipt.checkpoint.advanced() {
            self.events.push(Event::EpochCheckpointed {
                epoch_start: receipt.checkpoint.current,
            });
        }
        // The custody pull consumed allowance; record what is left.
        self.events.push(Event::Approval {
            token,
            owner: *caller,
            spender: self.custody,
            amount: self.tokens.allowance(&token, caller, &self.custody),
        });
        self.events.push(Event::Transfer {
            token,
            from: *caller,
            to: self.custody,
            amount,
        });
        self.events.push(Event::BribeAdded {
            record: receipt.record.clone(),
        });
        Ok(receipt.record)
    }

    /// # Errors
    ///
    /// See [`BribeLedger::get_bribe`].
    pub fn get_bribe(
        &self,
        gauge: &Address,
        epoch_start_time: Timestamp,
        index: u32,
    ) -> Result<BribeRecord> {
        Ok(self.bribes.get_bribe(gauge, epoch_start_time, index)?.clone())
    }

    pub fn get_gauge_bribes(&self, gauge: &Address, epoch_start_time: Timestamp) -> Vec<BribeRecord> {
        self.bribes.get_gauge_bribes(gauge, epoch_start_time).to_vec()
    }

    // ---- Distributions ----

    /// # Errors
    ///
    /// See [`DistributionManager::create_distribution`].
    pub fn create_distribution(
        &mut self,
        caller: &Address,
        request: NewDistribution,
    ) -> Result<Distribution> {
        let distribution =
            self.distributions
                .create_distribution(caller, &self.bribes, request)?;
        self.events.push(Event::DistributionCreated {
            token: request.token,
            distributor: request.distributor,
            distribution: distribution.clone(),
        });
        Ok(distribution)
    }

    pub fn verify_claim(
        &self,
        token: &Address,
        distributor: &Address,
        distribution_id: DistributionId,
        claimer: &Address,
        amount: Amount,
        proof: &[Hash],
    ) -> bool {
        self.distributions
            .verify_claim(token, distributor, distribution_id, claimer, amount, proof)
    }

    pub fn is_claimed(
        &self,
        token: &Address,
        distributor: &Address,
        distribution_id: DistributionId,
        claimer: &Address,
    ) -> bool {
        self.distributions.is_claimed(&ClaimKey {
            token: *token,
            distributor: *distributor,
            distribution_id,
            claimer: *claimer,
        })
    }

    /// Pay `claimer` for a batch of claims. `caller` may be anyone.
    ///
    /// # Errors
    ///
    /// See [`DistributionManager::claim_distributions`].
    pub fn claim_distributions(
        &mut self,
        caller: &Address,
        claimer: &Address,
        claims: &[Claim],
        tokens: &[Address],
    ) -> Result<ClaimReceipt> {
        let receipt = self.distributions.claim_distributions(
            claimer,
            claims,
            tokens,
            &mut self.tokens,
            &self.custody,
        )?;

        for (key, amount) in &receipt.claimed {
            self.events.push(Event::DistributionClaimed {
                token: key.token,
                distributor: key.distributor,
                distribution_id: key.distribution_id,
                claimer: key.claimer,
                amount: *amount,
            });
        }
        for payout in &receipt.payouts {
            self.events.push(Event::Transfer {
                token: payout.token,
                from: self.custody,
                to: *claimer,
                amount: payout.amount,
            });
        }
        tracing::debug!(%caller, %claimer, "claim batch submitted");
        Ok(receipt)
    }

    pub fn get_next_distribution_id(&self, token: &Address, distributor: &Address) -> DistributionId {
        self.distributions.next_distribution_id(token, distributor)
    }

    pub fn get_distribution_root(
        &self,
        token: &Address,
        distributor: &Address,
        distribution_id: DistributionId,
    ) -> Hash {
        self.distributions
            .distribution_root(token, distributor, distribution_id)
    }

    pub fn get_remaining_balance(&self, token: &Address, distributor: &Address) -> Amount {
        self.distributions.remaining_balance(token, distributor)
    }

    // ---- Registry ----

    pub fn is_whitelisted_token(&self, token: &Address) -> bool {
        self.registry.is_whitelisted_token(token)
    }

    pub fn is_gauge_approved(&self, gauge: &Address) -> bool {
        self.registry.is_gauge_approved(gauge)
    }

    /// # Errors
    ///
    /// Unauthorized unless `caller` is an admin; "Token not provided" for the
    /// zero address.
    pub fn whitelist_token(&mut self, caller: &Address, token: Address) -> Result<bool> {
        self.require_admin(caller)?;
        let added = self.registry.whitelist_token(token)?;
        if added {
            tracing::info!(%caller, %token, "token whitelisted");
            self.events.push(Event::TokenWhitelisted { token });
        }
        Ok(added)
    }

    /// # Errors
    ///
    /// Unauthorized unless `caller` is an admin.
    pub fn delist_token(&mut self, caller: &Address, token: Address) -> Result<bool> {
        self.require_admin(caller)?;
        let removed = self.registry.delist_token(&token);
        if removed {
            tracing::info!(%caller, %token, "token delisted");
            self.events.push(Event::TokenDelisted { token });
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// Unauthorized unless `caller` is an admin; "Gauge not provided" for the
    /// zero address.
    pub fn approve_gauge(&mut self, caller: &Address, gauge: Address) -> Result<bool> {
        self.require_admin(caller)?;
        let added = self.registry.approve_gauge(gauge)?;
        if added {
            tracing::info!(%caller, %gauge, "gauge approved");
            self.events.push(Event::GaugeApproved { gauge });
        }
        Ok(added)
    }

    /// # Errors
    ///
    /// Unauthorized unless `caller` is an admin.
    pub fn revoke_gauge(&mut self, caller: &Address, gauge: Address) -> Result<bool> {
        self.require_admin(caller)?;
        let removed = self.registry.revoke_gauge(&gauge);
        if removed {
            tracing::info!(%caller, %gauge, "gauge revoked");
            self.events.push(Event::GaugeRevoked { gauge });
        }
        Ok(removed)
    }

    // ---- Capabilities ----

    pub fn has_capability(&self, account: &Address, capability: Capability) -> bool {
        self.distributions.access().has_capability(account, capability)
    }

    /// # Errors
    ///
    /// Unauthorized unless `caller` is an admin.
    pub fn grant_capability(
        &mut self,
        caller: &Address,
        account: Address,
        capability: Capability,
    ) -> Result<bool> {
        let added = self
            .distributions
            .access_mut()
            .grant(caller, account, capability)?;
        if added {
            self.events.push(Event::CapabilityGranted {
                account,
                capability,
            });
        }
        Ok(added)
    }

    /// # Errors
    ///
    /// Unauthorized unless `caller` is an admin.
    pub fn revoke_capability(
        &mut self,
        caller: &Address,
        account: Address,
        capability: Capability,
    ) -> Result<bool> {
        let removed = self
            .distributions
            .access_mut()
            .revoke(caller, &account, capability)?;
        if removed {
            self.events.push(Event::CapabilityRevoked {
                account,
                capability,
            });
        }
        Ok(removed)
    }

    // ---- Epoch clock ----

    /// # Errors
    ///
    /// [`OracleError::Unset`](votemarket_oracle::OracleError::Unset) if the
    /// oracle reports no epoch.
    pub fn current_epoch_start(&self) -> Result<Timestamp> {
        Ok(self.oracle.current_epoch_start()?)
    }

    /// Force the oracle up to the present epoch.
    ///
    /// # Errors
    ///
    /// Any oracle error.
    pub fn checkpoint(&mut self) -> Result<Timestamp> {
        let checkpoint = self.oracle.checkpoint()?;
        if checkpoint.advanced() {
            self.events.push(Event::EpochCheckpointed {
                epoch_start: checkpoint.current,
            });
        }
        Ok(checkpoint.current)
    }

    // ---- Tokens ----

    pub fn balance_of(&self, token: &Address, holder: &Address) -> Amount {
        self.tokens.balance_of(token, holder)
    }

    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.tokens.allowance(token, owner, spender)
    }

    /// Let `spender` pull up to `amount` of `caller`'s `token`.
    ///
    /// # Errors
    ///
    /// [`MarketError::CustodyCaller`] when `caller` is custody; any token
    /// error.
    pub fn approve(
        &mut self,
        caller: &Address,
        token: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<()> {
        self.require_not_custody(caller)?;
        self.tokens.approve(&token, caller, &spender, amount)?;
        self.events.push(Event::Approval {
            token,
            owner: *caller,
            spender,
            amount,
        });
        Ok(())
    }

    /// Move `amount` of `caller`'s `token` to `to`.
    ///
    /// # Errors
    ///
    /// [`MarketError::CustodyCaller`] when `caller` is custody; any token
    /// error.
    pub fn transfer(
        &mut self,
        caller: &Address,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.require_not_custody(caller)?;
        self.tokens.transfer(&token, caller, &to, amount)?;
        self.events.push(Event::Transfer {
            token,
            from: *caller,
            to,
            amount,
        });
        Ok(())
    }

    fn require_not_custody(&self, caller: &Address) -> Result<()> {
        if *caller == self.custody {
            return Err(MarketError::CustodyCaller);
        }
        Ok(())
    }

    fn require_admin(&self, caller: &Address) -> Result<()> {
        Ok(self
            .distributions
            .access()
            .require(caller, Capability::Admin)?)
    }
}

impl Market<TokenBook> {
    /// Credit `to` with freshly minted tokens. Dev and test seeding only.
    ///
    /// # Errors
    ///
    /// Overflow of the recipient's balance.
    pub fn mint(&mut self, token: Address, to: Address, amount: Amount) -> Result<()> {
        self.tokens.mint(&token, &to, amount)?;
        self.events.push(Event::Transfer {
            token,
            from: Address::ZERO,
            to,
            amount,
        });
        Ok(())
    }
}
