//! Whitelist and capability command handlers.
//!
//! Every mutation requires the caller to hold the admin capability and
//! returns whether anything changed.

use std::sync::Arc;

use serde_json::Value;
use votemarket_market::Market;
use votemarket_types::Address;

use super::{address, caller, capability, persist, savepoint};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

pub async fn is_whitelisted_token(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = address(params, "token")?;
    let market = state.market.lock().await;
    Ok(serde_json::json!(market.is_whitelisted_token(&token)))
}

pub async fn is_gauge_approved(state: &Arc<DaemonState>, params: &Value) -> Result {
    let gauge = address(params, "gauge")?;
    let market = state.market.lock().await;
    Ok(serde_json::json!(market.is_gauge_approved(&gauge)))
}

pub async fn whitelist_token(state: &Arc<DaemonState>, params: &Value) -> Result {
    update(state, params, "token", Market::whitelist_token).await
}

pub async fn delist_token(state: &Arc<DaemonState>, params: &Value) -> Result {
    update(state, params, "token", Market::delist_token).await
}

pub async fn approve_gauge(state: &Arc<DaemonState>, params: &Value) -> Result {
    update(state, params, "gauge", Market::approve_gauge).await
}

pub async fn revoke_gauge(state: &Arc<DaemonState>, params: &Value) -> Result {
    update(state, params, "gauge", Market::revoke_gauge).await
}

pub async fn has_capability(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account = address(params, "account")?;
    let capability = capability(params, "capability")?;
    let market = state.market.lock().await;
    Ok(serde_json::json!(market.has_capability(&account, capability)))
}

pub async fn grant_capability(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let account = address(params, "account")?;
    let capability = capability(params, "capability")?;

    let mut market = state.market.lock().await;
    let before = savepoint(&market)?;
    let changed = market.grant_capability(&caller, account, capability)?;
    persist(state, &mut market, before).await?;
    Ok(serde_json::json!({"changed": changed}))
}

pub async fn revoke_capability(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let account = address(params, "account")?;
    let capability = capability(params, "capability")?;

    let mut market = state.market.lock().await;
    let before = savepoint(&market)?;
    let changed = market.revoke_capability(&caller, account, capability)?;
    persist(state, &mut market, before).await?;
    Ok(serde_json::json!({"changed": changed}))
}

async fn update(
    state: &Arc<DaemonState>,
    params: &Value,
    key: &str,
    op: fn(&mut Market, &Address, Address) -> votemarket_market::Result<bool>,
) -> Result {
    let caller = caller(params)?;
    let target = address(params, key)?;

    let mut market = state.market.lock().await;
    let before = savepoint(&market)?;
    let changed = op(&mut *market, &caller, target)?;
    persist(state, &mut market, before).await?;
    Ok(serde_json::json!({"changed": changed}))
}
