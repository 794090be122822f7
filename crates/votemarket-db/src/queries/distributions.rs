//! Distributions and channel balances.

use rusqlite::{Connection, OptionalExtension, Row};
use votemarket_types::{Amount, BribeKey, ChannelKey, Distribution};

use crate::codec::{address_at, amount_at, hash_at, int, u32_at, u64_at};
use crate::Result;

fn distribution_from_row(row: &Row<'_>) -> rusqlite::Result<(ChannelKey, Distribution)> {
    Ok((
        ChannelKey {
            token: address_at(row, 0)?,
            distributor: address_at(row, 1)?,
        },
        Distribution {
            id: u32_at(row, 2)?,
            merkle_root: hash_at(row, 3)?,
            amount: amount_at(row, 4)?,
            bribe: BribeKey {
                gauge: address_at(row, 5)?,
                epoch_start_time: u64_at(row, 6)?,
                index: u32_at(row, 7)?,
            },
        },
    ))
}

/// Insert a distribution.
pub fn insert(conn: &Connection, channel: &ChannelKey, distribution: &Distribution) -> Result<()> {
    conn.execute(
        "INSERT INTO distributions (
             token, distributor, distribution_id, merkle_root, amount,
             bribe_gauge, bribe_epoch_start_time, bribe_index
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            channel.token.as_bytes().as_slice(),
            channel.distributor.as_bytes().as_slice(),
            distribution.id,
            distribution.merkle_root.as_slice(),
            distribution.amount.to_string(),
            distribution.bribe.gauge.as_bytes().as_slice(),
            int(distribution.bribe.epoch_start_time),
            distribution.bribe.index,
        ],
    )?;
    Ok(())
}

/// Every distribution, ordered by channel then id.
pub fn list(conn: &Connection) -> Result<Vec<(ChannelKey, Distribution)>> {
    let mut stmt = conn.prepare(
        "SELECT token, distributor, distribution_id, merkle_root, amount,
                bribe_gauge, bribe_epoch_start_time, bribe_index
         FROM distributions ORDER BY token, distributor, distribution_id",
    )?;
    let rows = stmt
        .query_map([], distribution_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// The channel's remaining balance, zero when absent.
pub fn remaining(conn: &Connection, channel: &ChannelKey) -> Result<Amount> {
    let value = conn
        .query_row(
            "SELECT remaining FROM channel_balances WHERE token = ?1 AND distributor = ?2",
            rusqlite::params![
                channel.token.as_bytes().as_slice(),
                channel.distributor.as_bytes().as_slice(),
            ],
            |row| amount_at(row, 0),
        )
        .optional()?;
    Ok(value.unwrap_or(0))
}

/// Overwrite the channel's remaining balance.
pub fn set_remaining(conn: &Connection, channel: &ChannelKey, remaining: Amount) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO channel_balances (token, distributor, remaining)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![
            channel.token.as_bytes().as_slice(),
            channel.distributor.as_bytes().as_slice(),
            remaining.to_string(),
        ],
    )?;
    Ok(())
}

/// Every channel balance.
pub fn balances(conn: &Connection) -> Result<Vec<(ChannelKey, Amount)>> {
    let mut stmt = conn.prepare(
        "SELECT token, distributor, remaining FROM channel_balances ORDER BY token, distributor",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                ChannelKey {
                    token: address_at(row, 0)?,
                    distributor: address_at(row, 1)?,
                },
                amount_at(row, 2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
