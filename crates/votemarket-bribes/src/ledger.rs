//! Append-only bribe lists keyed by `(gauge, epoch_start_time)`.
//!
//! A record's index is its position in the list and never changes.

use std::collections::BTreeMap;

use votemarket_oracle::{Checkpoint, EpochOracleClient};
use votemarket_token::TokenLedger;
use votemarket_types::{Address, Amount, BribeKey, BribeRecord, Timestamp};

use crate::{BribeError, Result, WhitelistRegistry};

/// A deposit request.
#[derive(Debug, Clone, Copy)]
pub struct BribeDeposit {
    pub briber: Address,
    pub token: Address,
    pub amount: Amount,
    pub gauge: Address,
}

/// Result of a successful deposit.
#[derive(Debug, Clone)]
pub struct BribeReceipt {
    pub record: BribeRecord,
    /// The oracle checkpoint taken before recording.
    pub checkpoint: Checkpoint,
}

/// All bribe records, grouped by gauge and epoch.
#[derive(Debug, Default, Clone)]
pub struct BribeLedger {
    bribes: BTreeMap<(Address, Timestamp), Vec<BribeRecord>>,
}

impl BribeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deposit.
    ///
    /// Validates the deposit, checkpoints the oracle and pulls `amount` of
    /// `token` from the briber into `custody`. The record lands under the
    /// checkpointed epoch at the next free index.
    ///
    /// # Errors
    ///
    /// In order: [`BribeError::TokenNotProvided`],
    /// [`BribeError::TokenNotPermitted`], [`BribeError::ZeroAmount`],
    /// [`BribeError::GaugeNotProvided`], [`BribeError::GaugeNotPermitted`],
    /// [`BribeError::CustodyBriber`]. Then any token error from the custody
    /// pull (insufficient balance or allowance) or oracle error. Nothing is
    /// changed on failure.
    pub fn add_bribe(
        &mut self,
        registry: &WhitelistRegistry,
        oracle: &mut EpochOracleClient,
        tokens: &mut dyn TokenLedger,
        custody: &Address,
        deposit: BribeDeposit,
    ) -> Result<BribeReceipt> {
        let BribeDeposit {
            briber,
            token,
            amount,
            gauge,
        } = deposit;

        if token.is_zero() {
            return Err(BribeError::TokenNotProvided);
        }
        if !registry.is_whitelisted_token(&token) {
            return Err(BribeError::TokenNotPermitted);
        }
        if amount == 0 {
            return Err(BribeError::ZeroAmount);
        }
        if gauge.is_zero() {
            return Err(BribeError::GaugeNotProvided);
        }
        if !registry.is_gauge_approved(&gauge) {
            return Err(BribeError::GaugeNotPermitted);
        }
        if briber == *custody {
            return Err(BribeError::CustodyBriber);
        }

        tokens.ensure_transfer_from(&token, custody, &briber, custody, amount)?;

        let checkpoint = oracle.checkpoint()?;
        let epoch_start_time = checkpoint.current;

        let next = self.get_gauge_bribes(&gauge, epoch_start_time).len();
        let index = u32::try_from(next).map_err(|_| BribeError::InvalidIndex)?;

        tokens.transfer_from(&token, custody, &briber, custody, amount)?;

        let record = BribeRecord {
            gauge,
            token,
            briber,
            amount,
            epoch_start_time,
            index,
        };
        self.bribes
            .entry((gauge, epoch_start_time))
            .or_default()
            .push(record.clone());

        tracing::info!(
            %gauge,
            %token,
            %briber,
            amount,
            epoch_start_time,
            index,
            "bribe added"
        );

        Ok(BribeReceipt { record, checkpoint })
    }

    /// Look up a single record.
    ///
    /// # Errors
    ///
    /// - [`BribeError::InvalidGauge`] for the zero gauge
    /// - [`BribeError::InvalidEpochTimestamp`] for a zero timestamp
    /// - [`BribeError::NoBribesForEpoch`] if the list is empty
    /// - [`BribeError::InvalidIndex`] if `index` is past the end
    pub fn get_bribe(
        &self,
        gauge: &Address,
        epoch_start_time: Timestamp,
        index: u32,
    ) -> Result<&BribeRecord> {
        if gauge.is_zero() {
            return Err(BribeError::InvalidGauge);
        }
        if epoch_start_time == 0 {
            return Err(BribeError::InvalidEpochTimestamp);
        }
        let list = self.get_gauge_bribes(gauge, epoch_start_time);
        if list.is_empty() {
            return Err(BribeError::NoBribesForEpoch);
        }
        list.get(index as usize).ok_or(BribeError::InvalidIndex)
    }

    /// Look up a record by its identity.
    pub fn get_bribe_by_key(&self, key: &BribeKey) -> Result<&BribeRecord> {
        self.get_bribe(&key.gauge, key.epoch_start_time, key.index)
    }

    /// Every record for `(gauge, epoch_start_time)`, possibly none.
    pub fn get_gauge_bribes(&self, gauge: &Address, epoch_start_time: Timestamp) -> &[BribeRecord] {
        self.bribes
            .get(&(*gauge, epoch_start_time))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every record, ordered by gauge, epoch, then index.
    pub fn records(&self) -> impl Iterator<Item = &BribeRecord> {
        self.bribes.values().flatten()
    }

    /// Rebuild a ledger from persisted records.
    ///
    /// # Errors
    ///
    /// - [`BribeError::InvalidIndex`] if the indices of any list are not
    ///   exactly `0..len`
    pub fn from_records(records: impl IntoIterator<Item = BribeRecord>) -> Result<Self> {
        let mut bribes: BTreeMap<(Address, Timestamp), Vec<BribeRecord>> = BTreeMap::new();
        for record in records {
            bribes
                .entry((record.gauge, record.epoch_start_time))
                .or_default()
                .push(record);
        }
        for list in bribes.values_mut() {
            list.sort_by_key(|r| r.index);
            if list.iter().enumerate().any(|(i, r)| r.index as usize != i) {
                return Err(BribeError::InvalidIndex);
            }
        }
        Ok(Self { bribes })
    }
}
