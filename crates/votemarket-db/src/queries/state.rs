//! Market settings and the stored epoch boundary.

use rusqlite::{Connection, OptionalExtension};
use votemarket_types::{Address, Timestamp, TypeError};

use crate::codec::int;
use crate::{DbError, Result};

const CUSTODY_KEY: &str = "custody";

/// The custody address, if the market has been seeded.
pub fn custody(conn: &Connection) -> Result<Option<Address>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            [CUSTODY_KEY],
            |row| row.get(0),
        )
        .optional()?;
    match value {
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|e: TypeError| DbError::Serialization(e.to_string())),
        None => Ok(None),
    }
}

/// Record the custody address.
pub fn set_custody(conn: &Connection, custody: &Address) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        rusqlite::params![CUSTODY_KEY, custody.to_string()],
    )?;
    Ok(())
}

/// The oracle's stored epoch boundary, if recorded.
pub fn epoch_start(conn: &Connection) -> Result<Option<Timestamp>> {
    let value: Option<i64> = conn
        .query_row("SELECT epoch_start FROM oracle_state WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value.map(|v| v as Timestamp))
}

/// Record the oracle's epoch boundary.
pub fn set_epoch_start(conn: &Connection, epoch_start: Timestamp) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO oracle_state (id, epoch_start) VALUES (1, ?1)",
        [int(epoch_start)],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_db_is_unseeded() {
        let conn = crate::open_memory().expect("open test db");
        assert_eq!(custody(&conn).expect("custody"), None);
        assert_eq!(epoch_start(&conn).expect("epoch"), None);
    }

    #[test]
    fn test_set_and_get() {
        let conn = crate::open_memory().expect("open test db");
        let addr = Address::repeat_byte(0xcc);
        set_custody(&conn, &addr).expect("set");
        assert_eq!(custody(&conn).expect("custody"), Some(addr));

        set_epoch_start(&conn, 1_677_110_400).expect("set");
        set_epoch_start(&conn, 1_677_715_200).expect("overwrite");
        assert_eq!(epoch_start(&conn).expect("epoch"), Some(1_677_715_200));
    }
}
