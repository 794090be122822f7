//! Distribution and claim command handlers.

use std::sync::Arc;

use serde_json::Value;
use votemarket_market::NewDistribution;
use votemarket_types::{Address, Claim, Hash};

use super::{
    address, amount, caller, decode, hash, hex_hash, index, persist, savepoint, timestamp, to_json,
};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Publish a Merkle root funded by a recorded bribe.
pub async fn create_distribution(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let request = NewDistribution {
        token: address(params, "token")?,
        gauge: address(params, "gauge")?,
        epoch_start_time: timestamp(params, "epoch_start_time")?,
        bribe_index: index(params, "bribe_index")?,
        amount: amount(params, "amount")?,
        distributor: address(params, "distributor")?,
        distribution_id: index(params, "distribution_id")?,
        merkle_root: hash(params, "merkle_root")?,
    };

    let mut market = state.market.lock().await;
    let before = savepoint(&market)?;
    let distribution = market.create_distribution(&caller, request)?;
    persist(state, &mut market, before).await?;
    to_json(&distribution)
}

/// Check a proof without changing anything.
pub async fn verify_claim(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = address(params, "token")?;
    let distributor = address(params, "distributor")?;
    let distribution_id = index(params, "distribution_id")?;
    let claimer = address(params, "claimer")?;
    let amount = amount(params, "amount")?;
    let proof = proof(params)?;

    let market = state.market.lock().await;
    Ok(serde_json::json!(market.verify_claim(
        &token,
        &distributor,
        distribution_id,
        &claimer,
        amount,
        &proof,
    )))
}

pub async fn is_claimed(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = address(params, "token")?;
    let distributor = address(params, "distributor")?;
    let distribution_id = index(params, "distribution_id")?;
    let claimer = address(params, "claimer")?;

    let market = state.market.lock().await;
    Ok(serde_json::json!(market.is_claimed(
        &token,
        &distributor,
        distribution_id,
        &claimer
    )))
}

/// Pay `claimer` for a batch of claims. `caller` may be a relayer.
pub async fn claim_distributions(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = caller(params)?;
    let claimer = address(params, "claimer")?;
    let claims: Vec<Claim> = decode(params, "claims")?;
    let tokens: Vec<Address> = decode(params, "tokens")?;

    let mut market = state.market.lock().await;
    let before = savepoint(&market)?;
    let receipt = market.claim_distributions(&caller, &claimer, &claims, &tokens)?;
    persist(state, &mut market, before).await?;

    let claimed: Vec<Value> = receipt
        .claimed
        .iter()
        .map(|(key, amount)| {
            serde_json::json!({
                "token": key.token.to_string(),
                "distributor": key.distributor.to_string(),
                "distribution_id": key.distribution_id,
                "amount": amount.to_string(),
            })
        })
        .collect();
    let payouts: Vec<Value> = receipt
        .payouts
        .iter()
        .map(|payout| {
            serde_json::json!({
                "token": payout.token.to_string(),
                "amount": payout.amount.to_string(),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "claimer": claimer.to_string(),
        "claimed": claimed,
        "payouts": payouts,
    }))
}

pub async fn get_next_distribution_id(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = address(params, "token")?;
    let distributor = address(params, "distributor")?;

    let market = state.market.lock().await;
    Ok(serde_json::json!(market.get_next_distribution_id(&token, &distributor)))
}

/// The root of a distribution, all zeros when absent.
pub async fn get_distribution_root(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = address(params, "token")?;
    let distributor = address(params, "distributor")?;
    let distribution_id = index(params, "distribution_id")?;

    let market = state.market.lock().await;
    let root = market.get_distribution_root(&token, &distributor, distribution_id);
    Ok(serde_json::json!(hex_hash(&root)))
}

pub async fn get_remaining_balance(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = address(params, "token")?;
    let distributor = address(params, "distributor")?;

    let market = state.market.lock().await;
    Ok(serde_json::json!(market
        .get_remaining_balance(&token, &distributor)
        .to_string()))
}

fn proof(params: &Value) -> std::result::Result<Vec<Hash>, RpcError> {
    let items: Vec<String> = decode(params, "proof")?;
    items
        .iter()
        .map(|item| {
            votemarket_types::parse_hash(item)
                .map_err(|e| RpcError::invalid_params(&format!("proof: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{stored_snapshot, test_state, ADMIN, EPOCH, GAUGE, TOKEN};
    use crate::commands::{bribes, tokens};
    use votemarket_crypto::AllocationTree;
    use votemarket_types::Amount;

    const USER: Address = Address::repeat_byte(0x01);
    const OTHER: Address = Address::repeat_byte(0x02);
    const RELAYER: Address = Address::repeat_byte(0x5e);
    const TOTAL: Amount = 1_000;

    /// ADMIN bribes `TOTAL` and publishes a two-claimer distribution over it.
    async fn distributed(state: &Arc<DaemonState>) -> AllocationTree {
        tokens::dev_mint(
            state,
            &serde_json::json!({"token": TOKEN.to_string(), "to": ADMIN.to_string(), "amount": TOTAL.to_string()}),
        )
        .await
        .expect("mint");
        let custody = state.market.lock().await.custody();
        tokens::approve(
            state,
            &serde_json::json!({
                "caller": ADMIN.to_string(),
                "token": TOKEN.to_string(),
                "spender": custody.to_string(),
                "amount": TOTAL.to_string(),
            }),
        )
        .await
        .expect("approve");
        bribes::add_bribe(
            state,
            &serde_json::json!({
                "caller": ADMIN.to_string(),
                "token": TOKEN.to_string(),
                "amount": TOTAL.to_string(),
                "gauge": GAUGE.to_string(),
            }),
        )
        .await
        .expect("bribe");

        let tree = AllocationTree::new(&[(USER, 600), (OTHER, 400)]).expect("tree");
        create_distribution(
            state,
            &serde_json::json!({
                "caller": ADMIN.to_string(),
                "token": TOKEN.to_string(),
                "gauge": GAUGE.to_string(),
                "epoch_start_time": EPOCH,
                "bribe_index": 0,
                "amount": TOTAL.to_string(),
                "distributor": ADMIN.to_string(),
                "distribution_id": 0,
                "merkle_root": hex_hash(&tree.merkle_root),
            }),
        )
        .await
        .expect("distribution");
        tree
    }

    fn claim_params(tree: &AllocationTree, claimer: Address) -> Value {
        let node = tree.node(&claimer).expect("node");
        let claims = vec![Claim {
            distribution_id: 0,
            amount: node.amount,
            distributor: ADMIN,
            token_index: 0,
            proof: node.proof.clone(),
        }];
        serde_json::json!({
            "caller": RELAYER.to_string(),
            "claimer": claimer.to_string(),
            "claims": claims,
            "tokens": [TOKEN],
        })
    }

    #[tokio::test]
    async fn test_distribution_queries() {
        let state = test_state();
        let tree = distributed(&state).await;
        let channel = serde_json::json!({"token": TOKEN.to_string(), "distributor": ADMIN.to_string()});

        let next = get_next_distribution_id(&state, &channel).await.expect("next id");
        assert_eq!(next, 1);
        let remaining = get_remaining_balance(&state, &channel).await.expect("remaining");
        assert_eq!(remaining, "1000");

        let root = get_distribution_root(
            &state,
            &serde_json::json!({"token": TOKEN.to_string(), "distributor": ADMIN.to_string(), "distribution_id": 0}),
        )
        .await
        .expect("root");
        assert_eq!(root, hex_hash(&tree.merkle_root));

        let node = tree.node(&USER).expect("node");
        let proof: Vec<String> = node.proof.iter().map(hex_hash).collect();
        let mut params = serde_json::json!({
            "token": TOKEN.to_string(),
            "distributor": ADMIN.to_string(),
            "distribution_id": 0,
            "claimer": USER.to_string(),
            "amount": "600",
            "proof": proof,
        });
        assert_eq!(verify_claim(&state, &params).await.expect("verify"), true);
        params["amount"] = serde_json::json!("601");
        assert_eq!(verify_claim(&state, &params).await.expect("verify"), false);
    }

    #[tokio::test]
    async fn test_relayed_claim_pays_claimer_once() {
        let state = test_state();
        let tree = distributed(&state).await;

        let receipt = claim_distributions(&state, &claim_params(&tree, USER))
            .await
            .expect("claim");
        assert_eq!(receipt["payouts"][0]["amount"], "600");

        let balance = tokens::balance_of(
            &state,
            &serde_json::json!({"token": TOKEN.to_string(), "holder": USER.to_string()}),
        )
        .await
        .expect("balance");
        assert_eq!(balance, "600");

        let claimed = is_claimed(
            &state,
            &serde_json::json!({
                "token": TOKEN.to_string(),
                "distributor": ADMIN.to_string(),
                "distribution_id": 0,
                "claimer": USER.to_string(),
            }),
        )
        .await
        .expect("is claimed");
        assert_eq!(claimed, true);

        let err = claim_distributions(&state, &claim_params(&tree, USER))
            .await
            .expect_err("second claim");
        assert_eq!(err.data, Some(serde_json::json!({"reason": "cannot claim twice"})));

        let live = state.market.lock().await.snapshot().expect("snapshot");
        assert_eq!(stored_snapshot(&state).await, live);
    }

    #[tokio::test]
    async fn test_unauthorized_distribution() {
        let state = test_state();
        let err = create_distribution(
            &state,
            &serde_json::json!({
                "caller": USER.to_string(),
                "token": TOKEN.to_string(),
                "gauge": GAUGE.to_string(),
                "epoch_start_time": EPOCH,
                "bribe_index": 0,
                "amount": "1",
                "distributor": USER.to_string(),
                "distribution_id": 0,
                "merkle_root": hex_hash(&[1u8; 32]),
            }),
        )
        .await
        .expect_err("not a distributor");
        assert_eq!(err.code, -32030);
    }
}
