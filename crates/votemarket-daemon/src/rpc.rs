//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC calls to the command handlers. Every call that
//! touches the market goes through the single market lock, so calls are
//! processed one at a time.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};
use votemarket_bribes::BribeError;
use votemarket_distribution::DistributionError;
use votemarket_market::MarketError;
use votemarket_token::TokenError;

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// The operation rejected its input (-32000). `reason` is the stable
    /// failure string.
    pub fn execution_reverted(reason: &str) -> Self {
        Self {
            code: -32000,
            message: "EXECUTION_REVERTED".to_string(),
            data: Some(serde_json::json!({"reason": reason})),
        }
    }

    /// The caller lacks a capability (-32030).
    pub fn unauthorized(reason: &str) -> Self {
        Self {
            code: -32030,
            message: "UNAUTHORIZED".to_string(),
            data: Some(serde_json::json!({"reason": reason})),
        }
    }

    /// Insufficient balance or allowance (-32040).
    pub fn insufficient_funds(reason: &str) -> Self {
        Self {
            code: -32040,
            message: "INSUFFICIENT_FUNDS".to_string(),
            data: Some(serde_json::json!({"reason": reason})),
        }
    }
}

impl From<MarketError> for RpcError {
    fn from(err: MarketError) -> Self {
        let reason = err.to_string();
        match err {
            MarketError::Distribution(DistributionError::Unauthorized { .. }) => {
                RpcError::unauthorized(&reason)
            }
            MarketError::Token(token)
            | MarketError::Bribe(BribeError::Token(token))
            | MarketError::Distribution(DistributionError::Token(token)) => match token {
                TokenError::InsufficientBalance { .. } | TokenError::InsufficientAllowance { .. } => {
                    RpcError::insufficient_funds(&reason)
                }
                TokenError::Overflow { .. } => RpcError::execution_reverted(&reason),
            },
            MarketError::Bribe(BribeError::Oracle(_)) | MarketError::Oracle(_) => {
                RpcError::internal_error(&reason)
            }
            _ => RpcError::execution_reverted(&reason),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) if request.jsonrpc != "2.0" => {
                RpcResponse::error(request.id, RpcError::invalid_request())
            }
            Ok(request) => dispatch_request(&state, request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
async fn dispatch_request(state: &Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();
    let params = &request.params;

    debug!(method, "dispatching RPC method");

    let result = match method {
        // Bribes
        "add_bribe" => commands::bribes::add_bribe(state, params).await,
        "get_bribe" => commands::bribes::get_bribe(state, params).await,
        "get_gauge_bribes" => commands::bribes::get_gauge_bribes(state, params).await,

        // Distributions and claims
        "create_distribution" => commands::distribution::create_distribution(state, params).await,
        "verify_claim" => commands::distribution::verify_claim(state, params).await,
        "is_claimed" => commands::distribution::is_claimed(state, params).await,
        "claim_distributions" => commands::distribution::claim_distributions(state, params).await,
        "get_next_distribution_id" => {
            commands::distribution::get_next_distribution_id(state, params).await
        }
        "get_distribution_root" => {
            commands::distribution::get_distribution_root(state, params).await
        }
        "get_remaining_balance" => {
            commands::distribution::get_remaining_balance(state, params).await
        }

        // Registry and capabilities
        "is_whitelisted_token" => commands::registry::is_whitelisted_token(state, params).await,
        "is_gauge_approved" => commands::registry::is_gauge_approved(state, params).await,
        "whitelist_token" => commands::registry::whitelist_token(state, params).await,
        "delist_token" => commands::registry::delist_token(state, params).await,
        "approve_gauge" => commands::registry::approve_gauge(state, params).await,
        "revoke_gauge" => commands::registry::revoke_gauge(state, params).await,
        "has_capability" => commands::registry::has_capability(state, params).await,
        "grant_capability" => commands::registry::grant_capability(state, params).await,
        "revoke_capability" => commands::registry::revoke_capability(state, params).await,

        // Tokens
        "balance_of" => commands::tokens::balance_of(state, params).await,
        "allowance" => commands::tokens::allowance(state, params).await,
        "approve" => commands::tokens::approve(state, params).await,
        "transfer" => commands::tokens::transfer(state, params).await,

        // Epoch clock and journal
        "current_epoch_start" => commands::diagnostics::current_epoch_start(state).await,
        "checkpoint" => commands::diagnostics::checkpoint(state).await,
        "get_custody" => commands::diagnostics::get_custody(state).await,
        "get_journal" => commands::diagnostics::get_journal(state, params).await,

        // Dev-only commands
        "dev_mint" => commands::tokens::dev_mint(state, params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{test_state, ADMIN};
    use votemarket_types::Address;

    #[test]
    fn test_rpc_error_codes() {
        let err = RpcError::execution_reverted("Zero bribe amount");
        assert_eq!(err.code, -32000);
        assert_eq!(err.message, "EXECUTION_REVERTED");

        let err = RpcError::method_not_found("unknown");
        assert_eq!(err.code, -32601);
    }

    #[test]
    fn test_market_error_mapping() {
        let err = RpcError::from(MarketError::Bribe(BribeError::ZeroAmount));
        assert_eq!(err.code, -32000);
        assert_eq!(
            err.data,
            Some(serde_json::json!({"reason": "Zero bribe amount"}))
        );

        let err = RpcError::from(MarketError::Distribution(DistributionError::Unauthorized {
            account: Address::repeat_byte(0x01),
            capability: votemarket_types::Capability::Distributor,
        }));
        assert_eq!(err.code, -32030);

        let err = RpcError::from(MarketError::Bribe(BribeError::Token(
            TokenError::InsufficientAllowance {
                required: 10,
                available: 0,
            },
        )));
        assert_eq!(err.code, -32040);
    }

    #[test]
    fn test_rpc_response_error() {
        let resp = RpcResponse::error(serde_json::json!(1), RpcError::internal_error("test"));
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let state = test_state();
        let resp = dispatch_request(
            &state,
            RpcRequest {
                jsonrpc: "2.0".into(),
                id: serde_json::json!(7),
                method: "self_destruct".into(),
                params: serde_json::Value::Null,
            },
        )
        .await;
        assert_eq!(resp.error.map(|e| e.code), Some(-32601));
    }

    #[tokio::test]
    async fn test_connection_round_trip() {
        let state = test_state();
        let (client, server) = tokio::net::UnixStream::pair().expect("socket pair");
        let task = tokio::spawn(handle_connection(state, server));

        let (reader, mut writer) = client.into_split();
        let mut reader = BufReader::new(reader);
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "has_capability",
            "params": {"account": ADMIN.to_string(), "capability": "admin"},
        });
        writer
            .write_all(format!("{request}\nnot json\n").as_bytes())
            .await
            .expect("write");

        let mut line = String::new();
        reader.read_line(&mut line).await.expect("read");
        let resp: serde_json::Value = serde_json::from_str(&line).expect("response");
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"], true);

        line.clear();
        reader.read_line(&mut line).await.expect("read");
        let resp: serde_json::Value = serde_json::from_str(&line).expect("response");
        assert_eq!(resp["error"]["code"], -32700);

        drop(writer);
        task.await.expect("join").expect("connection");
    }
}
