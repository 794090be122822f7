//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category. Handlers
//! that mutate the market take a [`savepoint`] first and [`persist`] the
//! call's events before releasing the market lock.

pub mod bribes;
pub mod diagnostics;
pub mod distribution;
pub mod registry;
pub mod tokens;

use serde::Serialize;
use serde_json::Value;
use votemarket_market::{Market, MarketSnapshot};
use votemarket_types::{parse_hash, Address, Amount, Capability, Hash, Timestamp};

use crate::rpc::RpcError;
use crate::DaemonState;

type ParamResult<T> = std::result::Result<T, RpcError>;

fn field<'a>(params: &'a Value, key: &str) -> ParamResult<&'a Value> {
    params
        .get(key)
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))
}

fn string_field<'a>(params: &'a Value, key: &str) -> ParamResult<&'a str> {
    field(params, key)?
        .as_str()
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be a string")))
}

/// A `0x`-prefixed address parameter.
pub(crate) fn address(params: &Value, key: &str) -> ParamResult<Address> {
    string_field(params, key)?
        .parse()
        .map_err(|e| RpcError::invalid_params(&format!("{key}: {e}")))
}

/// The acting account.
pub(crate) fn caller(params: &Value) -> ParamResult<Address> {
    address(params, "caller")
}

/// An amount given as a decimal string, or as a JSON number when it fits.
pub(crate) fn amount(params: &Value, key: &str) -> ParamResult<Amount> {
    match field(params, key)? {
        Value::String(s) => s
            .parse()
            .map_err(|_| RpcError::invalid_params(&format!("{key} must be a decimal amount"))),
        Value::Number(n) => n
            .as_u64()
            .map(Amount::from)
            .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be non-negative"))),
        _ => Err(RpcError::invalid_params(&format!("{key} must be an amount"))),
    }
}

pub(crate) fn timestamp(params: &Value, key: &str) -> ParamResult<Timestamp> {
    field(params, key)?
        .as_u64()
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be an integer")))
}

pub(crate) fn index(params: &Value, key: &str) -> ParamResult<u32> {
    u32::try_from(timestamp(params, key)?)
        .map_err(|_| RpcError::invalid_params(&format!("{key} out of range")))
}

pub(crate) fn hash(params: &Value, key: &str) -> ParamResult<Hash> {
    parse_hash(string_field(params, key)?)
        .map_err(|e| RpcError::invalid_params(&format!("{key}: {e}")))
}

pub(crate) fn capability(params: &Value, key: &str) -> ParamResult<Capability> {
    string_field(params, key)?
        .parse()
        .map_err(|e| RpcError::invalid_params(&format!("{key}: {e}")))
}

/// A typed parameter decoded with serde.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(params: &Value, key: &str) -> ParamResult<T> {
    serde_json::from_value(field(params, key)?.clone())
        .map_err(|e| RpcError::invalid_params(&format!("{key}: {e}")))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> ParamResult<Value> {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&e.to_string()))
}

pub(crate) fn hex_hash(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// The market state a mutating call can be rolled back to.
pub(crate) fn savepoint(market: &Market) -> ParamResult<MarketSnapshot> {
    Ok(market.snapshot()?)
}

/// Write the events of the call that just committed to the database.
///
/// Called with the market lock held so the journal order matches the
/// order in which calls were applied. If the write fails, the market is
/// rolled back to `before` so memory never runs ahead of the database.
pub(crate) async fn persist(
    state: &DaemonState,
    market: &mut Market,
    before: MarketSnapshot,
) -> ParamResult<()> {
    let events = market.drain_events();
    if events.is_empty() {
        return Ok(());
    }
    let mut db = state.db.lock().await;
    if let Err(e) = votemarket_db::journal::apply_events(&mut db, &events, crate::unix_now()) {
        tracing::error!(error = %e, events = events.len(), "failed to persist committed events");
        if let Err(rollback) = market.rollback(before) {
            tracing::error!(error = %rollback, "rollback after db failure failed");
        }
        return Err(RpcError::internal_error(&format!("db error: {e}")));
    }
    Ok(())
}
