//! Capability grants.

use rusqlite::Connection;
use votemarket_types::{Address, Capability};

use crate::codec::{address_at, capability_at};
use crate::Result;

/// Record a grant.
pub fn grant(conn: &Connection, account: &Address, capability: Capability) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO capabilities (account, capability) VALUES (?1, ?2)",
        rusqlite::params![account.as_bytes().as_slice(), capability.as_str()],
    )?;
    Ok(())
}

/// Remove a grant.
pub fn revoke(conn: &Connection, account: &Address, capability: Capability) -> Result<()> {
    conn.execute(
        "DELETE FROM capabilities WHERE account = ?1 AND capability = ?2",
        rusqlite::params![account.as_bytes().as_slice(), capability.as_str()],
    )?;
    Ok(())
}

/// Every grant.
pub fn list(conn: &Connection) -> Result<Vec<(Address, Capability)>> {
    let mut stmt =
        conn.prepare("SELECT account, capability FROM capabilities ORDER BY account, capability")?;
    let rows = stmt
        .query_map([], |row| Ok((address_at(row, 0)?, capability_at(row, 1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
