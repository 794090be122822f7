//! Configuration file management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use votemarket_market::MarketConfig;
use votemarket_oracle::{EpochOracleClient, GaugeController, SystemClock};
use votemarket_types::{Address, Timestamp};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Initial market parameters. Only read when the database is empty.
    #[serde(default)]
    pub market: MarketSettings,
    /// Epoch oracle settings.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Market seeding parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSettings {
    /// Account holding deposited bribes.
    #[serde(default)]
    pub custody: Address,
    /// Initial administrator.
    #[serde(default)]
    pub admin: Address,
    #[serde(default)]
    pub distributors: Vec<Address>,
    #[serde(default)]
    pub whitelisted_tokens: Vec<Address>,
    #[serde(default)]
    pub approved_gauges: Vec<Address>,
}

/// Epoch oracle configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Initial epoch boundary. 0 = the week containing the current time.
    #[serde(default)]
    pub epoch_start: Timestamp,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Enable `dev_mint`.
    #[serde(default)]
    pub dev_commands: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dev_commands: false,
        }
    }
}

impl MarketSettings {
    /// Parameters for [`votemarket_market::Market::new`].
    pub fn to_market_config(&self) -> MarketConfig {
        MarketConfig {
            custody: self.custody,
            admin: self.admin,
            distributors: self.distributors.clone(),
            whitelisted_tokens: self.whitelisted_tokens.clone(),
            approved_gauges: self.approved_gauges.clone(),
        }
    }
}

impl OracleConfig {
    /// A wall-clock oracle seeded from this config.
    pub fn oracle(&self) -> EpochOracleClient {
        if self.epoch_start == 0 {
            EpochOracleClient::new(GaugeController::starting_now(SystemClock))
        } else {
            EpochOracleClient::new(GaugeController::new(self.epoch_start, SystemClock))
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a `config.toml` body.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("VOTEMARKET_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            home_or_tmp("Library/Application Support/Votemarket")
        }
        #[cfg(not(target_os = "macos"))]
        {
            home_or_tmp(".votemarket")
        }
    }
}

fn home_or_tmp(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/votemarket"))
}
