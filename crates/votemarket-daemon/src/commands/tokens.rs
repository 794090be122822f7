//! Token command handlers.

use std::sync::Arc;

use serde_json::Value;

use super::{address, amount, caller, persist, savepoint};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

pub async fn balance_of(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = address(params, "token")?;
    let holder = address(params, "holder")?;
    let market = state.market.lock().await;
    Ok(serde_json::json!(market.balance_of(&token, &holder).to_string()))
}

pub async fn allowance(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = address(params, "token")?;
    let owner = address(params, "owner")?;
    let spender = address(params, "spender")?;
    let market = state.market.lock().await;
    Ok(serde_json::json!(market
        .allowance(&token, &owner, &spender)
        .to_string()))
}

/// Let `spender` pull `caller`'s tokens. Bribers approve the custody account.
pub async fn approve(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let token = address(params, "token")?;
    let spender = address(params, "spender")?;
    let amount = amount(params, "amount")?;

    let mut market = state.market.lock().await;
    let before = savepoint(&market)?;
    market.approve(&caller, token, spender, amount)?;
    persist(state, &mut market, before).await?;
    Ok(serde_json::json!({"approved": true}))
}

pub async fn transfer(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let token = address(params, "token")?;
    let to = address(params, "to")?;
    let amount = amount(params, "amount")?;

    let mut market = state.market.lock().await;
    let before = savepoint(&market)?;
    market.transfer(&caller, token, to, amount)?;
    persist(state, &mut market, before).await?;
    Ok(serde_json::json!({"transferred": true}))
}

/// Dev-only: credit `to` with freshly minted tokens.
pub async fn dev_mint(state: &Arc<DaemonState>, params: &Value) -> Result {
    if !state.config.advanced.dev_commands {
        return Err(RpcError::method_not_found("dev_mint"));
    }
    let token = address(params, "token")?;
    let to = address(params, "to")?;
    let amount = amount(params, "amount")?;

    let mut market = state.market.lock().await;
    let before = savepoint(&market)?;
    market.mint(token, to, amount)?;
    persist(state, &mut market, before).await?;
    Ok(serde_json::json!({"minted": amount.to_string()}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{state_with, stored_snapshot, test_state, TOKEN};
    use votemarket_types::Address;

    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb0);

    #[tokio::test]
    async fn test_mint_transfer_and_allowance() {
        let state = test_state();
        dev_mint(
            &state,
            &serde_json::json!({"token": TOKEN.to_string(), "to": ALICE.to_string(), "amount": 100}),
        )
        .await
        .expect("mint");

        transfer(
            &state,
            &serde_json::json!({
                "caller": ALICE.to_string(),
                "token": TOKEN.to_string(),
                "to": BOB.to_string(),
                "amount": "30",
            }),
        )
        .await
        .expect("transfer");

        let bob = balance_of(
            &state,
            &serde_json::json!({"token": TOKEN.to_string(), "holder": BOB.to_string()}),
        )
        .await
        .expect("balance");
        assert_eq!(bob, "30");

        approve(
            &state,
            &serde_json::json!({
                "caller": ALICE.to_string(),
                "token": TOKEN.to_string(),
                "spender": BOB.to_string(),
                "amount": "5",
            }),
        )
        .await
        .expect("approve");
        let allowed = allowance(
            &state,
            &serde_json::json!({
                "token": TOKEN.to_string(),
                "owner": ALICE.to_string(),
                "spender": BOB.to_string(),
            }),
        )
        .await
        .expect("allowance");
        assert_eq!(allowed, "5");

        let err = transfer(
            &state,
            &serde_json::json!({
                "caller": BOB.to_string(),
                "token": TOKEN.to_string(),
                "to": ALICE.to_string(),
                "amount": "31",
            }),
        )
        .await
        .expect_err("overdraw");
        assert_eq!(err.code, -32040);

        let live = state.market.lock().await.snapshot().expect("snapshot");
        assert_eq!(stored_snapshot(&state).await, live);
    }

    #[tokio::test]
    async fn test_dev_mint_disabled_by_default() {
        let state = state_with(crate::config::DaemonConfig::default());
        let err = dev_mint(
            &state,
            &serde_json::json!({"token": TOKEN.to_string(), "to": ALICE.to_string(), "amount": 1}),
        )
        .await
        .expect_err("disabled");
        assert_eq!(err.code, -32601);
    }
}
