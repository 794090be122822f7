//! Distribution creation and claiming.
//!
//! `create_distribution` binds a published Merkle root to a previously
//! recorded bribe, so a distributor can only distribute funds that were
//! actually deposited. `claim_distributions` pays out a batch of claims in
//! two phases: every claim is validated and every effect computed first,
//! then all flags, balances and transfers are committed together.

use std::collections::{BTreeMap, BTreeSet};

use votemarket_bribes::BribeLedger;
use votemarket_crypto::merkle;
use votemarket_token::TokenLedger;
use votemarket_types::{
    Address, Amount, Capability, ChannelKey, Claim, ClaimKey, Distribution, DistributionId, Hash,
    Timestamp,
};

use crate::{AccessControl, ClaimLedger, DistributionChannelStore, DistributionError, Result};

/// Arguments to [`DistributionManager::create_distribution`].
#[derive(Debug, Clone, Copy)]
pub struct NewDistribution {
    pub token: Address,
    pub gauge: Address,
    pub epoch_start_time: Timestamp,
    pub bribe_index: u32,
    pub amount: Amount,
    pub distributor: Address,
    pub distribution_id: DistributionId,
    pub merkle_root: Hash,
}

/// Net amount of one token paid to the claimer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub token: Address,
    pub amount: Amount,
}

/// Effects of a committed claim batch.
#[derive(Debug, Clone, Default)]
pub struct ClaimReceipt {
    /// Each claimed tuple with its amount, in batch order.
    pub claimed: Vec<(ClaimKey, Amount)>,
    /// One transfer per token, in order of first appearance.
    pub payouts: Vec<Payout>,
}

/// Access control, channels and claim flags.
#[derive(Debug, Clone)]
pub struct DistributionManager {
    access: AccessControl,
    channels: DistributionChannelStore,
    claims: ClaimLedger,
}

impl DistributionManager {
    /// Create an empty manager administered by `admin`.
    pub fn new(admin: Address) -> Self {
        Self::from_parts(
            AccessControl::new(admin),
            DistributionChannelStore::new(),
            ClaimLedger::new(),
        )
    }

    /// Assemble a manager from restored state.
    pub fn from_parts(
        access: AccessControl,
        channels: DistributionChannelStore,
        claims: ClaimLedger,
    ) -> Self {
        Self {
            access,
            channels,
            claims,
        }
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }

    pub fn channels(&self) -> &DistributionChannelStore {
        &self.channels
    }

    pub fn claims(&self) -> &ClaimLedger {
        &self.claims
    }

    /// Publish a distribution funded by a recorded bribe.
    ///
    /// # Errors
    ///
    /// - [`DistributionError::Unauthorized`] unless `caller` is a distributor
    /// - Any [`BribeError`](votemarket_bribes::BribeError) from the bribe lookup
    /// - [`DistributionError::InvalidBribeRecord`] if token, amount or
    ///   distributor do not match the record's token, amount and briber
    /// - [`DistributionError::MerkleRootNotSet`] for a zero root
    /// - [`DistributionError::InvalidDistributionId`] unless the id is the
    ///   channel's next id
    /// - [`DistributionError::BribeAlreadyDistributed`] if the record already
    ///   funds a distribution
    pub fn create_distribution(
        &mut self,
        caller: &Address,
        bribes: &BribeLedger,
        request: NewDistribution,
    ) -> Result<Distribution> {
        self.access.require(caller, Capability::Distributor)?;

        let record =
            bribes.get_bribe(&request.gauge, request.epoch_start_time, request.bribe_index)?;
        if record.token != request.token
            || record.amount != request.amount
            || record.briber != request.distributor
        {
            return Err(DistributionError::InvalidBribeRecord);
        }

        let key = ChannelKey {
            token: request.token,
            distributor: request.distributor,
        };
        let distribution = Distribution {
            id: request.distribution_id,
            merkle_root: request.merkle_root,
            amount: request.amount,
            bribe: record.key(),
        };
        self.channels.append(key, distribution.clone())?;

        tracing::info!(
            %caller,
            token = %key.token,
            distributor = %key.distributor,
            distribution_id = distribution.id,
            amount = distribution.amount,
            merkle_root = %hex::encode(distribution.merkle_root),
            "distribution created"
        );

        Ok(distribution)
    }

    /// Whether `proof` shows `claimer` is allocated `amount` in the
    /// distribution. False when the distribution does not exist.
    pub fn verify_claim(
        &self,
        token: &Address,
        distributor: &Address,
        distribution_id: DistributionId,
        claimer: &Address,
        amount: Amount,
        proof: &[Hash],
    ) -> bool {
        let key = ChannelKey {
            token: *token,
            distributor: *distributor,
        };
        let root = self.channels.distribution_root(&key, distribution_id);
        let valid = merkle::verify_claim(&root, claimer, amount, proof);
        tracing::debug!(
            %token,
            %distributor,
            distribution_id,
            %claimer,
            amount,
            valid,
            "claim verified"
        );
        valid
    }

    pub fn is_claimed(&self, key: &ClaimKey) -> bool {
        self.claims.is_claimed(key)
    }

    pub fn next_distribution_id(&self, token: &Address, distributor: &Address) -> DistributionId {
        self.channels.next_distribution_id(&ChannelKey {
            token: *token,
            distributor: *distributor,
        })
    }

    pub fn distribution_root(
        &self,
        token: &Address,
        distributor: &Address,
        distribution_id: DistributionId,
    ) -> Hash {
        self.channels.distribution_root(
            &ChannelKey {
                token: *token,
                distributor: *distributor,
            },
            distribution_id,
        )
    }

    pub fn remaining_balance(&self, token: &Address, distributor: &Address) -> Amount {
        self.channels.remaining_balance(&ChannelKey {
            token: *token,
            distributor: *distributor,
        })
    }

    /// Pay `claimer` for a batch of claims from `custody`.
    ///
    /// Amounts are netted per token and transferred once per token. Anyone
    /// may submit the batch; funds always go to `claimer`.
    ///
    /// # Errors
    ///
    /// Any single failing claim aborts the whole batch with nothing changed:
    ///
    /// - [`DistributionError::CustodyClaimer`] if `claimer` is custody
    /// - [`DistributionError::InvalidTokenIndex`] for an out-of-range index
    /// - [`DistributionError::AlreadyClaimed`] for a paid tuple, or one
    ///   repeated within the batch
    /// - [`DistributionError::IncorrectProof`] if the proof does not verify
    /// - [`DistributionError::BalanceExceeded`] if a channel would be overdrawn
    /// - Any [`TokenError`](votemarket_token::TokenError) from the custody
    ///   transfer pre-check
    pub fn claim_distributions(
        &mut self,
        claimer: &Address,
        claims: &[Claim],
        tokens: &[Address],
        ledger: &mut dyn TokenLedger,
        custody: &Address,
    ) -> Result<ClaimReceipt> {
        if claimer == custody {
            return Err(DistributionError::CustodyClaimer);
        }

        let mut receipt = ClaimReceipt::default();
        let mut seen = BTreeSet::new();
        let mut per_channel: BTreeMap<ChannelKey, Amount> = BTreeMap::new();

        for claim in claims {
            let token = tokens
                .get(claim.token_index)
                .ok_or(DistributionError::InvalidTokenIndex)?;
            let key = ClaimKey {
                token: *token,
                distributor: claim.distributor,
                distribution_id: claim.distribution_id,
                claimer: *claimer,
            };

            if self.claims.is_claimed(&key) || !seen.insert(key) {
                return Err(DistributionError::AlreadyClaimed);
            }
            if !self.verify_claim(
                token,
                &claim.distributor,
                claim.distribution_id,
                claimer,
                claim.amount,
                &claim.proof,
            ) {
                return Err(DistributionError::IncorrectProof);
            }

            let channel_total = per_channel.entry(key.channel()).or_default();
            *channel_total = channel_total
                .checked_add(claim.amount)
                .ok_or(DistributionError::BalanceExceeded)?;

            match receipt.payouts.iter_mut().find(|p| p.token == *token) {
                Some(payout) => {
                    payout.amount = payout
                        .amount
                        .checked_add(claim.amount)
                        .ok_or(DistributionError::BalanceExceeded)?;
                }
                None => receipt.payouts.push(Payout {
                    token: *token,
                    amount: claim.amount,
                }),
            }
            receipt.claimed.push((key, claim.amount));
        }

        for (channel, total) in &per_channel {
            if *total > self.channels.remaining_balance(channel) {
                return Err(DistributionError::BalanceExceeded);
            }
        }
        for payout in &receipt.payouts {
            ledger.ensure_transfer(&payout.token, custody, claimer, payout.amount)?;
        }

        // Commit
        for (key, _) in &receipt.claimed {
            self.claims.mark_claimed(*key);
        }
        for (channel, total) in &per_channel {
            self.channels.debit(channel, *total)?;
        }
        for payout in &receipt.payouts {
            ledger.transfer(&payout.token, custody, claimer, payout.amount)?;
        }

        tracing::info!(
            %claimer,
            claims = receipt.claimed.len(),
            tokens = receipt.payouts.len(),
            "distributions claimed"
        );

        Ok(receipt)
    }
}
