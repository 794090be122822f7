//! Whitelisted tokens and approved gauges.

use rusqlite::Connection;
use votemarket_types::Address;

use crate::codec::address_at;
use crate::Result;

/// Add a token to the whitelist. Adding an existing token is a no-op.
pub fn add_token(conn: &Connection, token: &Address) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO registry_tokens (token) VALUES (?1)",
        [token.as_bytes().as_slice()],
    )?;
    Ok(())
}

/// Remove a token from the whitelist.
pub fn remove_token(conn: &Connection, token: &Address) -> Result<()> {
    conn.execute(
        "DELETE FROM registry_tokens WHERE token = ?1",
        [token.as_bytes().as_slice()],
    )?;
    Ok(())
}

/// All whitelisted tokens.
pub fn tokens(conn: &Connection) -> Result<Vec<Address>> {
    let mut stmt = conn.prepare("SELECT token FROM registry_tokens ORDER BY token")?;
    let rows = stmt
        .query_map([], |row| address_at(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Approve a gauge. Approving an existing gauge is a no-op.
pub fn add_gauge(conn: &Connection, gauge: &Address) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO registry_gauges (gauge) VALUES (?1)",
        [gauge.as_bytes().as_slice()],
    )?;
    Ok(())
}

/// Revoke a gauge.
pub fn remove_gauge(conn: &Connection, gauge: &Address) -> Result<()> {
    conn.execute(
        "DELETE FROM registry_gauges WHERE gauge = ?1",
        [gauge.as_bytes().as_slice()],
    )?;
    Ok(())
}

/// All approved gauges.
pub fn gauges(conn: &Connection) -> Result<Vec<Address>> {
    let mut stmt = conn.prepare("SELECT gauge FROM registry_gauges ORDER BY gauge")?;
    let rows = stmt
        .query_map([], |row| address_at(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
