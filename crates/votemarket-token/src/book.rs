//! In-process token book.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use votemarket_types::{Address, Amount};

use crate::{Result, TokenError, TokenLedger};

/// A persisted balance row.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub token: Address,
    pub holder: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
}

/// A persisted allowance row.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEntry {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
}

/// Balances and allowances for any number of tokens.
///
/// An allowance of `Amount::MAX` is treated as unlimited and never consumed.
#[derive(Debug, Default, Clone)]
pub struct TokenBook {
    balances: HashMap<(Address, Address), Amount>,
    allowances: HashMap<(Address, Address, Address), Amount>,
}

impl TokenBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a book from persisted rows.
    pub fn from_entries(balances: Vec<BalanceEntry>, allowances: Vec<AllowanceEntry>) -> Self {
        Self {
            balances: balances
                .into_iter()
                .filter(|e| e.amount > 0)
                .map(|e| ((e.token, e.holder), e.amount))
                .collect(),
            allowances: allowances
                .into_iter()
                .filter(|e| e.amount > 0)
                .map(|e| ((e.token, e.owner, e.spender), e.amount))
                .collect(),
        }
    }

    /// Create tokens out of thin air. Only for seeding dev and test state.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Overflow`] if the holder's balance would overflow
    pub fn mint(&mut self, token: &Address, to: &Address, amount: Amount) -> Result<()> {
        let current = self.balance_of(token, to);
        let updated = current
            .checked_add(amount)
            .ok_or(TokenError::Overflow { holder: *to })?;
        self.balances.insert((*token, *to), updated);
        tracing::warn!(%token, %to, amount, "minted tokens");
        Ok(())
    }

    /// All non-zero balances, sorted by `(token, holder)`.
    pub fn balance_entries(&self) -> Vec<BalanceEntry> {
        let mut entries: Vec<BalanceEntry> = self
            .balances
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|((token, holder), amount)| BalanceEntry {
                token: *token,
                holder: *holder,
                amount: *amount,
            })
            .collect();
        entries.sort_by_key(|e| (e.token, e.holder));
        entries
    }

    /// All non-zero allowances, sorted by `(token, owner, spender)`.
    pub fn allowance_entries(&self) -> Vec<AllowanceEntry> {
        let mut entries: Vec<AllowanceEntry> = self
            .allowances
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|((token, owner, spender), amount)| AllowanceEntry {
                token: *token,
                owner: *owner,
                spender: *spender,
                amount: *amount,
            })
            .collect();
        entries.sort_by_key(|e| (e.token, e.owner, e.spender));
        entries
    }

    /// Sum of every holder's balance of `token`.
    pub fn total_supply(&self, token: &Address) -> Amount {
        self.balances
            .iter()
            .filter(|((t, _), _)| t == token)
            .fold(0, |total, (_, amount)| total.saturating_add(*amount))
    }

    fn set_balance(&mut self, token: &Address, holder: &Address, amount: Amount) {
        if amount == 0 {
            self.balances.remove(&(*token, *holder));
        } else {
            self.balances.insert((*token, *holder), amount);
        }
    }

    fn set_allowance(&mut self, token: &Address, owner: &Address, spender: &Address, amount: Amount) {
        if amount == 0 {
            self.allowances.remove(&(*token, *owner, *spender));
        } else {
            self.allowances.insert((*token, *owner, *spender), amount);
        }
    }
}

impl TokenLedger for TokenBook {
    fn balance_of(&self, token: &Address, holder: &Address) -> Amount {
        self.balances.get(&(*token, *holder)).copied().unwrap_or(0)
    }

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<()> {
        self.set_allowance(token, owner, spender, amount);
        tracing::debug!(%token, %owner, %spender, amount, "approval set");
        Ok(())
    }

    fn ensure_transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        if from != to && self.balance_of(token, to).checked_add(amount).is_none() {
            return Err(TokenError::Overflow { holder: *to });
        }
        Ok(())
    }

    fn ensure_transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        let allowed = self.allowance(token, from, spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                required: amount,
                available: allowed,
            });
        }
        self.ensure_transfer(token, from, to, amount)
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_transfer(token, from, to, amount)?;
        if from != to {
            let from_balance = self.balance_of(token, from) - amount;
            let to_balance = self.balance_of(token, to) + amount;
            self.set_balance(token, from, from_balance);
            self.set_balance(token, to, to_balance);
        }
        tracing::debug!(%token, %from, %to, amount, "transfer");
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_transfer_from(token, spender, from, to, amount)?;
        let allowed = self.allowance(token, from, spender);
        if allowed != Amount::MAX {
            self.set_allowance(token, from, spender, allowed - amount);
        }
        self.transfer(token, from, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: Address = Address::repeat_byte(0x70);
    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb0);
    const CUSTODY: Address = Address::repeat_byte(0xcc);

    fn funded_book() -> TokenBook {
        let mut book = TokenBook::new();
        book.mint(&TOKEN, &ALICE, 1_000).expect("mint");
        book
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut book = funded_book();
        book.transfer(&TOKEN, &ALICE, &BOB, 400).expect("transfer");
        assert_eq!(book.balance_of(&TOKEN, &ALICE), 600);
        assert_eq!(book.balance_of(&TOKEN, &BOB), 400);
        assert_eq!(book.total_supply(&TOKEN), 1_000);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut book = funded_book();
        let err = book.transfer(&TOKEN, &ALICE, &BOB, 1_001).expect_err("should fail");
        assert!(matches!(
            err,
            TokenError::InsufficientBalance {
                required: 1_001,
                available: 1_000
            }
        ));
        assert_eq!(book.balance_of(&TOKEN, &ALICE), 1_000);
        assert_eq!(book.balance_of(&TOKEN, &BOB), 0);
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let mut book = funded_book();
        book.transfer(&TOKEN, &ALICE, &ALICE, 1_000).expect("transfer");
        assert_eq!(book.balance_of(&TOKEN, &ALICE), 1_000);
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let mut book = funded_book();
        book.approve(&TOKEN, &ALICE, &CUSTODY, 500).expect("approve");
        book.transfer_from(&TOKEN, &CUSTODY, &ALICE, &CUSTODY, 300)
            .expect("transfer_from");
        assert_eq!(book.allowance(&TOKEN, &ALICE, &CUSTODY), 200);
        assert_eq!(book.balance_of(&TOKEN, &CUSTODY), 300);

        let err = book
            .transfer_from(&TOKEN, &CUSTODY, &ALICE, &CUSTODY, 201)
            .expect_err("should fail");
        assert!(matches!(err, TokenError::InsufficientAllowance { .. }));
        assert_eq!(book.balance_of(&TOKEN, &ALICE), 700);
    }

    #[test]
    fn test_unlimited_allowance_not_consumed() {
        let mut book = funded_book();
        book.approve(&TOKEN, &ALICE, &CUSTODY, Amount::MAX)
            .expect("approve");
        book.transfer_from(&TOKEN, &CUSTODY, &ALICE, &CUSTODY, 300)
            .expect("transfer_from");
        assert_eq!(book.allowance(&TOKEN, &ALICE, &CUSTODY), Amount::MAX);
    }

    #[test]
    fn test_ensure_does_not_mutate() {
        let book = funded_book();
        book.ensure_transfer(&TOKEN, &ALICE, &BOB, 1_000)
            .expect("ensure");
        assert!(book
            .ensure_transfer_from(&TOKEN, &CUSTODY, &ALICE, &CUSTODY, 1)
            .is_err());
        assert_eq!(book.balance_of(&TOKEN, &BOB), 0);
    }

    #[test]
    fn test_mint_overflow() {
        let mut book = funded_book();
        assert!(matches!(
            book.mint(&TOKEN, &ALICE, Amount::MAX),
            Err(TokenError::Overflow { .. })
        ));
    }

    #[test]
    fn test_entries_round_trip() {
        let mut book = funded_book();
        book.approve(&TOKEN, &ALICE, &CUSTODY, 50).expect("approve");
        book.transfer(&TOKEN, &ALICE, &BOB, 1).expect("transfer");

        let restored = TokenBook::from_entries(book.balance_entries(), book.allowance_entries());
        assert_eq!(restored.balance_of(&TOKEN, &ALICE), 999);
        assert_eq!(restored.balance_of(&TOKEN, &BOB), 1);
        assert_eq!(restored.allowance(&TOKEN, &ALICE, &CUSTODY), 50);
        assert_eq!(restored.balance_entries(), book.balance_entries());
    }

    #[test]
    fn test_error_messages() {
        let err = TokenError::InsufficientBalance {
            required: 2,
            available: 1,
        };
        assert_eq!(err.to_string(), "insufficient balance: required 2, available 1");
    }
}
