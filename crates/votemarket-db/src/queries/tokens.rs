//! Token balances and allowances.

use rusqlite::{Connection, OptionalExtension};
use votemarket_token::{AllowanceEntry, BalanceEntry};
use votemarket_types::{Address, Amount};

use crate::codec::{address_at, amount_at};
use crate::{DbError, Result};

/// Balance of `holder` in `token`, zero when absent.
pub fn balance(conn: &Connection, token: &Address, holder: &Address) -> Result<Amount> {
    let value = conn
        .query_row(
            "SELECT amount FROM token_balances WHERE token = ?1 AND holder = ?2",
            rusqlite::params![token.as_bytes().as_slice(), holder.as_bytes().as_slice()],
            |row| amount_at(row, 0),
        )
        .optional()?;
    Ok(value.unwrap_or(0))
}

/// Overwrite a balance. A zero balance removes the row.
pub fn set_balance(conn: &Connection, token: &Address, holder: &Address, amount: Amount) -> Result<()> {
    if amount == 0 {
        conn.execute(
            "DELETE FROM token_balances WHERE token = ?1 AND holder = ?2",
            rusqlite::params![token.as_bytes().as_slice(), holder.as_bytes().as_slice()],
        )?;
    } else {
        conn.execute(
            "INSERT OR REPLACE INTO token_balances (token, holder, amount) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                token.as_bytes().as_slice(),
                holder.as_bytes().as_slice(),
                amount.to_string(),
            ],
        )?;
    }
    Ok(())
}

/// Add to a balance.
pub fn credit(conn: &Connection, token: &Address, holder: &Address, amount: Amount) -> Result<()> {
    let updated = balance(conn, token, holder)?
        .checked_add(amount)
        .ok_or_else(|| DbError::Constraint(format!("balance overflow for {holder}")))?;
    set_balance(conn, token, holder, updated)
}

/// Subtract from a balance.
pub fn debit(conn: &Connection, token: &Address, holder: &Address, amount: Amount) -> Result<()> {
    let updated = balance(conn, token, holder)?
        .checked_sub(amount)
        .ok_or_else(|| DbError::Constraint(format!("balance underflow for {holder}")))?;
    set_balance(conn, token, holder, updated)
}

/// Overwrite an allowance. A zero allowance removes the row.
pub fn set_allowance(
    conn: &Connection,
    token: &Address,
    owner: &Address,
    spender: &Address,
    amount: Amount,
) -> Result<()> {
    if amount == 0 {
        conn.execute(
            "DELETE FROM token_allowances WHERE token = ?1 AND owner = ?2 AND spender = ?3",
            rusqlite::params![
                token.as_bytes().as_slice(),
                owner.as_bytes().as_slice(),
                spender.as_bytes().as_slice(),
            ],
        )?;
    } else {
        conn.execute(
            "INSERT OR REPLACE INTO token_allowances (token, owner, spender, amount)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                token.as_bytes().as_slice(),
                owner.as_bytes().as_slice(),
                spender.as_bytes().as_slice(),
                amount.to_string(),
            ],
        )?;
    }
    Ok(())
}

/// Every non-zero balance.
pub fn balances(conn: &Connection) -> Result<Vec<BalanceEntry>> {
    let mut stmt =
        conn.prepare("SELECT token, holder, amount FROM token_balances ORDER BY token, holder")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(BalanceEntry {
                token: address_at(row, 0)?,
                holder: address_at(row, 1)?,
                amount: amount_at(row, 2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every non-zero allowance.
pub fn allowances(conn: &Connection) -> Result<Vec<AllowanceEntry>> {
    let mut stmt = conn.prepare(
        "SELECT token, owner, spender, amount FROM token_allowances
         ORDER BY token, owner, spender",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AllowanceEntry {
                token: address_at(row, 0)?,
                owner: address_at(row, 1)?,
                spender: address_at(row, 2)?,
                amount: amount_at(row, 3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
