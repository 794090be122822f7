//! votemarket-daemon: the bribe market service.
//!
//! Single OS process running a Tokio async runtime. Clients talk to the
//! daemon via newline-delimited JSON-RPC over a Unix socket. One market
//! instance serves every call, and each committed call is written to the
//! database before the next one starts.

mod commands;
mod config;
mod rpc;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};
use votemarket_market::Market;
use votemarket_oracle::{EpochOracleClient, GaugeController, SystemClock};
use votemarket_token::TokenBook;
use votemarket_types::Timestamp;

use crate::config::DaemonConfig;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// The market. Holding this lock serializes calls.
    pub market: Mutex<Market>,
    /// Database connection. Always locked after `market`.
    pub db: Mutex<rusqlite::Connection>,
    /// Configuration.
    pub config: DaemonConfig,
}

impl DaemonState {
    pub fn new(market: Market, db: rusqlite::Connection, config: DaemonConfig) -> Self {
        Self {
            market: Mutex::new(market),
            db: Mutex::new(db),
            config,
        }
    }
}

/// Current wall-clock time in Unix seconds.
pub(crate) fn unix_now() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Rebuild the market from the database, or seed both from config.
fn load_market(config: &DaemonConfig, conn: &mut rusqlite::Connection) -> anyhow::Result<Market> {
    if let Some(snapshot) = votemarket_db::snapshot::load_snapshot(conn)? {
        info!(
            custody = %snapshot.custody,
            epoch_start = snapshot.epoch_start,
            bribes = snapshot.bribes.len(),
            "restoring market from database"
        );
        let oracle =
            EpochOracleClient::new(GaugeController::new(snapshot.epoch_start, SystemClock));
        return Ok(Market::restore(snapshot, oracle)?);
    }

    info!("empty database, seeding market from config");
    let market = Market::new(
        config.market.to_market_config(),
        config.oracle.oracle(),
        TokenBook::new(),
    )?;
    votemarket_db::snapshot::save_snapshot(conn, &market.snapshot()?)?;
    Ok(market)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("votemarket={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("Votemarket daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open database and load the market
    let db_path = data_dir.join("votemarket.db");
    let mut conn = votemarket_db::open(&db_path)?;
    let market = load_market(&config, &mut conn)?;

    // 3. Build daemon state
    let state = Arc::new(DaemonState::new(market, conn, config));

    // 4. Start IPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 5. Run the RPC server until shutdown
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use votemarket_types::Address;

    fn seeded_config() -> DaemonConfig {
        let mut config = DaemonConfig::default();
        config.market.custody = Address::repeat_byte(0xcc);
        config.market.admin = Address::repeat_byte(0xad);
        config.market.whitelisted_tokens = vec![Address::repeat_byte(0x70)];
        config.oracle.epoch_start = 1_677_110_400;
        config
    }

    #[test]
    fn test_load_market_seeds_then_restores() {
        let config = seeded_config();
        let mut conn = votemarket_db::open_memory().expect("open test db");

        let seeded = load_market(&config, &mut conn).expect("seed");
        assert!(seeded.is_whitelisted_token(&Address::repeat_byte(0x70)));

        // A second start ignores the config and reads the database.
        let mut changed = config.clone();
        changed.market.whitelisted_tokens.clear();
        let restored = load_market(&changed, &mut conn).expect("restore");
        assert_eq!(
            restored.snapshot().expect("snapshot"),
            seeded.snapshot().expect("snapshot")
        );
    }

    #[test]
    fn test_load_market_rejects_missing_custody() {
        let mut conn = votemarket_db::open_memory().expect("open test db");
        assert!(load_market(&DaemonConfig::default(), &mut conn).is_err());
        assert!(votemarket_db::snapshot::load_snapshot(&conn)
            .expect("load")
            .is_none());
    }
}
