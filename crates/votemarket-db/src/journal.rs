//! Event journal.
//!
//! Each market call's committed events are applied to the state tables and
//! appended to the `journal` table in a single transaction, so the database
//! never reflects half of a call.

use rusqlite::Connection;
use votemarket_types::{ChannelKey, ClaimKey, Event, Timestamp};

use crate::codec::int;
use crate::queries::{bribes, capabilities, claims, distributions, registry, state, tokens};
use crate::{DbError, Result};

/// A stored journal entry.
#[derive(Debug)]
pub struct JournalRow {
    pub seq: i64,
    pub event: Event,
    pub recorded_at: Timestamp,
}

/// Apply `events` to the tables and append them to the journal, atomically.
pub fn apply_events(conn: &mut Connection, events: &[Event], recorded_at: Timestamp) -> Result<()> {
    if events.is_empty() {
        return Ok(());
    }
    let tx = conn.transaction()?;
    for event in events {
        apply_event(&tx, event)?;
        append(&tx, event, recorded_at)?;
    }
    tx.commit()?;
    tracing::debug!(events = events.len(), "journal applied");
    Ok(())
}

/// Apply one event to the state tables.
fn apply_event(conn: &Connection, event: &Event) -> Result<()> {
    match event {
        Event::TokenWhitelisted { token } => registry::add_token(conn, token),
        Event::TokenDelisted { token } => registry::remove_token(conn, token),
        Event::GaugeApproved { gauge } => registry::add_gauge(conn, gauge),
        Event::GaugeRevoked { gauge } => registry::remove_gauge(conn, gauge),
        Event::CapabilityGranted {
            account,
            capability,
        } => capabilities::grant(conn, account, *capability),
        Event::CapabilityRevoked {
            account,
            capability,
        } => capabilities::revoke(conn, account, *capability),
        Event::EpochCheckpointed { epoch_start } => state::set_epoch_start(conn, *epoch_start),
        Event::BribeAdded { record } => bribes::insert(conn, record),
        Event::DistributionCreated {
            token,
            distributor,
            distribution,
        } => {
            let channel = ChannelKey {
                token: *token,
                distributor: *distributor,
            };
            distributions::insert(conn, &channel, distribution)?;
            let remaining = distributions::remaining(conn, &channel)?
                .checked_add(distribution.amount)
                .ok_or_else(|| DbError::Constraint("channel balance overflow".into()))?;
            distributions::set_remaining(conn, &channel, remaining)
        }
        Event::DistributionClaimed {
            token,
            distributor,
            distribution_id,
            claimer,
            amount,
        } => {
            let key = ClaimKey {
                token: *token,
                distributor: *distributor,
                distribution_id: *distribution_id,
                claimer: *claimer,
            };
            claims::insert(conn, &key, *amount)?;
            let channel = key.channel();
            let remaining = distributions::remaining(conn, &channel)?
                .checked_sub(*amount)
                .ok_or_else(|| DbError::Constraint("channel balance underflow".into()))?;
            distributions::set_remaining(conn, &channel, remaining)
        }
        Event::Transfer {
            token,
            from,
            to,
            amount,
        } => {
            // Transfers from the zero address are mints.
            if !from.is_zero() {
                tokens::debit(conn, token, from, *amount)?;
            }
            tokens::credit(conn, token, to, *amount)
        }
        Event::Approval {
            token,
            owner,
            spender,
            amount,
        } => tokens::set_allowance(conn, token, owner, spender, *amount),
    }
}

/// Append one event to the journal. Returns its sequence number.
pub fn append(conn: &Connection, event: &Event, recorded_at: Timestamp) -> Result<i64> {
    let payload =
        serde_json::to_string(event).map_err(|e| DbError::Serialization(e.to_string()))?;
    conn.execute(
        "INSERT INTO journal (event_type, payload, recorded_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![event.name(), payload, int(recorded_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The most recent journal entries, newest first.
pub fn recent(conn: &Connection, limit: u32) -> Result<Vec<JournalRow>> {
    let mut stmt = conn.prepare(
        "SELECT seq, payload, recorded_at FROM journal ORDER BY seq DESC LIMIT ?1",
    )?;
    let raw = stmt
        .query_map([limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)? as Timestamp,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(seq, payload, recorded_at)| {
            let event = serde_json::from_str(&payload)
                .map_err(|e| DbError::Serialization(e.to_string()))?;
            Ok(JournalRow {
                seq,
                event,
                recorded_at,
            })
        })
        .collect()
}
