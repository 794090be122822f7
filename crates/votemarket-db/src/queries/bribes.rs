//! Bribe records.

use rusqlite::{Connection, Row};
use votemarket_types::{Address, BribeRecord, Timestamp};

use crate::codec::{address_at, amount_at, int, u32_at, u64_at};
use crate::Result;

const COLUMNS: &str = "gauge, epoch_start_time, bribe_index, token, briber, amount";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<BribeRecord> {
    Ok(BribeRecord {
        gauge: address_at(row, 0)?,
        epoch_start_time: u64_at(row, 1)?,
        index: u32_at(row, 2)?,
        token: address_at(row, 3)?,
        briber: address_at(row, 4)?,
        amount: amount_at(row, 5)?,
    })
}

/// Insert a new record.
pub fn insert(conn: &Connection, record: &BribeRecord) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO bribes ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        rusqlite::params![
            record.gauge.as_bytes().as_slice(),
            int(record.epoch_start_time),
            record.index,
            record.token.as_bytes().as_slice(),
            record.briber.as_bytes().as_slice(),
            record.amount.to_string(),
        ],
    )?;
    Ok(())
}

/// Records for one `(gauge, epoch)` in index order.
pub fn for_gauge(
    conn: &Connection,
    gauge: &Address,
    epoch_start_time: Timestamp,
) -> Result<Vec<BribeRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM bribes
         WHERE gauge = ?1 AND epoch_start_time = ?2 ORDER BY bribe_index"
    ))?;
    let rows = stmt
        .query_map(
            rusqlite::params![gauge.as_bytes().as_slice(), int(epoch_start_time)],
            record_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every record, ordered by gauge, epoch, then index.
pub fn list(conn: &Connection) -> Result<Vec<BribeRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM bribes ORDER BY gauge, epoch_start_time, bribe_index"
    ))?;
    let rows = stmt
        .query_map([], record_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
