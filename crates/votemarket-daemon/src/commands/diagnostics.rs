//! Epoch clock, custody and journal command handlers.

use std::sync::Arc;

use serde_json::Value;

use super::{persist, savepoint, to_json};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

const MAX_JOURNAL_ENTRIES: u64 = 1000;

pub async fn current_epoch_start(state: &Arc<DaemonState>) -> Result {
    let market = state.market.lock().await;
    Ok(serde_json::json!(market.current_epoch_start()?))
}

/// Bring the epoch oracle up to date.
pub async fn checkpoint(state: &Arc<DaemonState>) -> Result {
    let mut market = state.market.lock().await;
    let before = savepoint(&market)?;
    let epoch_start = market.checkpoint()?;
    persist(state, &mut market, before).await?;
    Ok(serde_json::json!(epoch_start))
}

pub async fn get_custody(state: &Arc<DaemonState>) -> Result {
    let market = state.market.lock().await;
    Ok(serde_json::json!(market.custody().to_string()))
}

/// Most recent journal entries, newest first.
pub async fn get_journal(state: &Arc<DaemonState>, params: &Value) -> Result {
    let limit = params
        .get("limit")
        .and_then(|v| v.as_u64())
        .unwrap_or(50)
        .min(MAX_JOURNAL_ENTRIES);

    let db = state.db.lock().await;
    let rows = votemarket_db::journal::recent(&db, limit as u32)
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;

    let entries = rows
        .iter()
        .map(|row| {
            Ok(serde_json::json!({
                "seq": row.seq,
                "recorded_at": row.recorded_at,
                "event": to_json(&row.event)?,
            }))
        })
        .collect::<std::result::Result<Vec<_>, RpcError>>()?;
    Ok(serde_json::json!(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registry;
    use crate::commands::tests::{test_state, ADMIN, CUSTODY, EPOCH};
    use votemarket_types::Address;

    #[tokio::test]
    async fn test_epoch_queries() {
        let state = test_state();
        assert_eq!(current_epoch_start(&state).await.expect("epoch"), EPOCH);
        // The clock has not reached the boundary yet.
        assert_eq!(checkpoint(&state).await.expect("checkpoint"), EPOCH);
        assert_eq!(
            get_custody(&state).await.expect("custody"),
            CUSTODY.to_string()
        );
    }

    #[tokio::test]
    async fn test_journal_lists_committed_calls() {
        let state = test_state();
        for byte in [0x41, 0x42] {
            registry::approve_gauge(
                &state,
                &serde_json::json!({
                    "caller": ADMIN.to_string(),
                    "gauge": Address::repeat_byte(byte).to_string(),
                }),
            )
            .await
            .expect("approve gauge");
        }
        // Rejected calls leave no entry.
        let _ = registry::approve_gauge(
            &state,
            &serde_json::json!({"caller": CUSTODY.to_string(), "gauge": Address::repeat_byte(0x43).to_string()}),
        )
        .await;

        let journal = get_journal(&state, &serde_json::json!({"limit": 10}))
            .await
            .expect("journal");
        let entries = journal.as_array().expect("array");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["event"]["event_type"], "gauge_approved");
        assert_eq!(
            entries[0]["event"]["gauge"],
            Address::repeat_byte(0x42).to_string()
        );
    }
}
