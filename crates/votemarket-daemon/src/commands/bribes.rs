//! Bribe command handlers.

use std::sync::Arc;

use serde_json::Value;

use super::{address, amount, caller, index, persist, savepoint, timestamp, to_json};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Deposit a bribe from `caller` for the current epoch.
pub async fn add_bribe(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let token = address(params, "token")?;
    let amount = amount(params, "amount")?;
    let gauge = address(params, "gauge")?;

    let mut market = state.market.lock().await;
    let before = savepoint(&market)?;
    let record = market.add_bribe(&caller, token, amount, gauge)?;
    persist(state, &mut market, before).await?;
    to_json(&record)
}

pub async fn get_bribe(state: &Arc<DaemonState>, params: &Value) -> Result {
    let gauge = address(params, "gauge")?;
    let epoch_start_time = timestamp(params, "epoch_start_time")?;
    let index = index(params, "index")?;

    let market = state.market.lock().await;
    let record = market.get_bribe(&gauge, epoch_start_time, index)?;
    to_json(&record)
}

pub async fn get_gauge_bribes(state: &Arc<DaemonState>, params: &Value) -> Result {
    let gauge = address(params, "gauge")?;
    let epoch_start_time = timestamp(params, "epoch_start_time")?;

    let market = state.market.lock().await;
    to_json(&market.get_gauge_bribes(&gauge, epoch_start_time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{stored_snapshot, test_state, ADMIN, EPOCH, GAUGE, TOKEN};
    use crate::commands::tokens;
    use votemarket_types::Address;

    const BRIBER: Address = Address::repeat_byte(0xb1);

    async fn fund_briber(state: &Arc<DaemonState>) {
        tokens::dev_mint(
            state,
            &serde_json::json!({"token": TOKEN.to_string(), "to": BRIBER.to_string(), "amount": "1000"}),
        )
        .await
        .expect("mint");
        let custody = state.market.lock().await.custody();
        tokens::approve(
            state,
            &serde_json::json!({
                "caller": BRIBER.to_string(),
                "token": TOKEN.to_string(),
                "spender": custody.to_string(),
                "amount": "1000",
            }),
        )
        .await
        .expect("approve");
    }

    #[tokio::test]
    async fn test_add_and_get_bribe() {
        let state = test_state();
        fund_briber(&state).await;

        let params = serde_json::json!({
            "caller": BRIBER.to_string(),
            "token": TOKEN.to_string(),
            "amount": "400",
            "gauge": GAUGE.to_string(),
        });
        let record = add_bribe(&state, &params).await.expect("add");
        assert_eq!(record["index"], 0);
        assert_eq!(record["amount"], "400");

        let second = add_bribe(&state, &params).await.expect("add again");
        assert_eq!(second["index"], 1);

        let fetched = get_bribe(
            &state,
            &serde_json::json!({"gauge": GAUGE.to_string(), "epoch_start_time": EPOCH, "index": 1}),
        )
        .await
        .expect("get");
        assert_eq!(fetched, second);

        let all = get_gauge_bribes(
            &state,
            &serde_json::json!({"gauge": GAUGE.to_string(), "epoch_start_time": EPOCH}),
        )
        .await
        .expect("list");
        assert_eq!(all.as_array().map(Vec::len), Some(2));

        // The database followed every committed call.
        let live = state.market.lock().await.snapshot().expect("snapshot");
        assert_eq!(stored_snapshot(&state).await, live);
    }

    #[tokio::test]
    async fn test_rejected_bribe_reports_reason() {
        let state = test_state();
        let err = add_bribe(
            &state,
            &serde_json::json!({
                "caller": ADMIN.to_string(),
                "token": TOKEN.to_string(),
                "amount": "0",
                "gauge": GAUGE.to_string(),
            }),
        )
        .await
        .expect_err("zero amount");
        assert_eq!(err.code, -32000);
        assert_eq!(err.data, Some(serde_json::json!({"reason": "Zero bribe amount"})));

        let err = get_bribe(
            &state,
            &serde_json::json!({"gauge": GAUGE.to_string(), "epoch_start_time": 0, "index": 0}),
        )
        .await
        .expect_err("zero epoch");
        assert_eq!(
            err.data,
            Some(serde_json::json!({"reason": "Invalid epoch timestamp"}))
        );
    }

    #[tokio::test]
    async fn test_db_failure_rolls_back_bribe() {
        let state = test_state();
        fund_briber(&state).await;
        let before = state.market.lock().await.snapshot().expect("snapshot");

        state
            .db
            .lock()
            .await
            .execute_batch("DROP TABLE journal")
            .expect("drop journal");

        let err = add_bribe(
            &state,
            &serde_json::json!({
                "caller": BRIBER.to_string(),
                "token": TOKEN.to_string(),
                "amount": "400",
                "gauge": GAUGE.to_string(),
            }),
        )
        .await
        .expect_err("db failure");
        assert_eq!(err.code, -32603);

        let mut market = state.market.lock().await;
        assert_eq!(market.snapshot().expect("snapshot"), before);
        assert!(market.get_gauge_bribes(&GAUGE, EPOCH).is_empty());
        assert_eq!(market.balance_of(&TOKEN, &BRIBER), 1000);
        assert!(market.drain_events().is_empty());
        drop(market);

        // Nothing reached the state tables either.
        assert_eq!(stored_snapshot(&state).await.balances, before.balances);
    }
}
