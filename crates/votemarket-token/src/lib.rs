//! # votemarket-token
//!
//! The token-system boundary. Bribes are pulled into custody with
//! transfer-from semantics and paid out to claimers with plain transfers.
//!
//! ## Modules
//!
//! - [`book`] - In-process balances and allowances

pub mod book;

use votemarket_types::{Address, Amount};

pub use book::{AllowanceEntry, BalanceEntry, TokenBook};

/// Error types for token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The sender does not hold enough of the token.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    /// The spender is not approved for enough of the owner's tokens.
    #[error("insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance { required: Amount, available: Amount },

    /// Crediting would overflow the recipient's balance.
    #[error("balance overflow for {holder}")]
    Overflow { holder: Address },
}

/// Convenience result type for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Fungible-token balances and allowances, keyed by token address.
///
/// Mutations are all-or-nothing. The `ensure_*` methods run the same checks
/// as their mutating counterparts without changing anything, so callers can
/// validate a whole batch before committing any of it.
pub trait TokenLedger: Send {
    /// Balance of `holder` in `token`.
    fn balance_of(&self, token: &Address, holder: &Address) -> Amount;

    /// Amount `spender` may still pull from `owner`.
    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount;

    /// Set the allowance of `spender` over `owner`'s tokens.
    fn approve(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<()>;

    /// Check that `transfer(token, from, to, amount)` would succeed.
    fn ensure_transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()>;

    /// Check that `transfer_from(token, spender, from, to, amount)` would succeed.
    fn ensure_transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()>;

    /// Move `amount` from `from` to `to`.
    fn transfer(&mut self, token: &Address, from: &Address, to: &Address, amount: Amount)
        -> Result<()>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()>;
}
