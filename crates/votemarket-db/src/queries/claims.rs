//! Claim flags.

use rusqlite::Connection;
use votemarket_types::{Amount, ClaimKey};

use crate::codec::{address_at, u32_at};
use crate::Result;

/// Record a paid claim.
pub fn insert(conn: &Connection, key: &ClaimKey, amount: Amount) -> Result<()> {
    conn.execute(
        "INSERT INTO claims (token, distributor, distribution_id, claimer, amount)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            key.token.as_bytes().as_slice(),
            key.distributor.as_bytes().as_slice(),
            key.distribution_id,
            key.claimer.as_bytes().as_slice(),
            amount.to_string(),
        ],
    )?;
    Ok(())
}

/// Whether the tuple has been paid.
pub fn is_claimed(conn: &Connection, key: &ClaimKey) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM claims
         WHERE token = ?1 AND distributor = ?2 AND distribution_id = ?3 AND claimer = ?4",
        rusqlite::params![
            key.token.as_bytes().as_slice(),
            key.distributor.as_bytes().as_slice(),
            key.distribution_id,
            key.claimer.as_bytes().as_slice(),
        ],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Every paid tuple.
pub fn list(conn: &Connection) -> Result<Vec<ClaimKey>> {
    let mut stmt = conn.prepare(
        "SELECT token, distributor, distribution_id, claimer FROM claims
         ORDER BY token, distributor, distribution_id, claimer",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ClaimKey {
                token: address_at(row, 0)?,
                distributor: address_at(row, 1)?,
                distribution_id: u32_at(row, 2)?,
                claimer: address_at(row, 3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
