//! Whole-state save and load.

use rusqlite::Connection;
use votemarket_market::{CapabilityGrant, ChannelBalance, ChannelDistribution, MarketSnapshot};
use votemarket_types::ChannelKey;

use crate::queries::{bribes, capabilities, claims, distributions, registry, state, tokens};
use crate::{DbError, Result};

/// Replace every state table with the contents of `snapshot`.
///
/// The journal is left untouched.
pub fn save_snapshot(conn: &mut Connection, snapshot: &MarketSnapshot) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        "DELETE FROM claims;
         DELETE FROM channel_balances;
         DELETE FROM distributions;
         DELETE FROM bribes;
         DELETE FROM capabilities;
         DELETE FROM registry_tokens;
         DELETE FROM registry_gauges;
         DELETE FROM token_balances;
         DELETE FROM token_allowances;",
    )?;

    state::set_custody(&tx, &snapshot.custody)?;
    state::set_epoch_start(&tx, snapshot.epoch_start)?;
    for token in &snapshot.whitelisted_tokens {
        registry::add_token(&tx, token)?;
    }
    for gauge in &snapshot.approved_gauges {
        registry::add_gauge(&tx, gauge)?;
    }
    for grant in &snapshot.grants {
        capabilities::grant(&tx, &grant.account, grant.capability)?;
    }
    for record in &snapshot.bribes {
        bribes::insert(&tx, record)?;
    }
    for entry in &snapshot.distributions {
        let channel = ChannelKey {
            token: entry.token,
            distributor: entry.distributor,
        };
        distributions::insert(&tx, &channel, &entry.distribution)?;
    }
    for balance in &snapshot.channel_balances {
        let channel = ChannelKey {
            token: balance.token,
            distributor: balance.distributor,
        };
        distributions::set_remaining(&tx, &channel, balance.remaining)?;
    }
    for key in &snapshot.claims {
        // The claimed amount is not part of the snapshot.
        claims::insert(&tx, key, 0)?;
    }
    for entry in &snapshot.balances {
        tokens::set_balance(&tx, &entry.token, &entry.holder, entry.amount)?;
    }
    for entry in &snapshot.allowances {
        tokens::set_allowance(&tx, &entry.token, &entry.owner, &entry.spender, entry.amount)?;
    }

    tx.commit()?;
    tracing::info!(
        bribes = snapshot.bribes.len(),
        distributions = snapshot.distributions.len(),
        claims = snapshot.claims.len(),
        "snapshot saved"
    );
    Ok(())
}

/// Load the stored state, or `None` for a database that was never seeded.
pub fn load_snapshot(conn: &Connection) -> Result<Option<MarketSnapshot>> {
    let Some(custody) = state::custody(conn)? else {
        return Ok(None);
    };
    let epoch_start = state::epoch_start(conn)?
        .ok_or_else(|| DbError::NotFound("oracle epoch start".into()))?;

    let snapshot = MarketSnapshot {
        custody,
        epoch_start,
        whitelisted_tokens: registry::tokens(conn)?,
        approved_gauges: registry::gauges(conn)?,
        grants: capabilities::list(conn)?
            .into_iter()
            .map(|(account, capability)| CapabilityGrant {
                account,
                capability,
            })
            .collect(),
        bribes: bribes::list(conn)?,
        distributions: distributions::list(conn)?
            .into_iter()
            .map(|(channel, distribution)| ChannelDistribution {
                token: channel.token,
                distributor: channel.distributor,
                distribution,
            })
            .collect(),
        channel_balances: distributions::balances(conn)?
            .into_iter()
            .map(|(channel, remaining)| ChannelBalance {
                token: channel.token,
                distributor: channel.distributor,
                remaining,
            })
            .collect(),
        claims: claims::list(conn)?,
        balances: tokens::balances(conn)?,
        allowances: tokens::allowances(conn)?,
    };
    Ok(Some(snapshot))
}
