/// Sync engine configuration
///
/// Controls the active network, the explorer/node endpoints and the polling
/// cadence. Loaded from environment variables, optionally layered over a TOML
/// file. Defaults to mainnet.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::WalletError;

/// Interval between two pending-transaction checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Number of confirmed transactions per explorer page.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkName {
    Mainnet,
    Testnet,
    Localhost,
}

impl NetworkName {
    fn default_node_url(&self) -> &'static str {
        match self {
            NetworkName::Mainnet => "https://wallet-v20.mainnet.alephium.org",
            NetworkName::Testnet => "https://wallet-v20.testnet.alephium.org",
            NetworkName::Localhost => "http://127.0.0.1:22973",
        }
    }

    fn default_explorer_url(&self) -> &'static str {
        match self {
            NetworkName::Mainnet => "https://backend-v113.mainnet.alephium.org",
            NetworkName::Testnet => "https://backend-v113.testnet.alephium.org",
            NetworkName::Localhost => "http://127.0.0.1:9090",
        }
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkName::Mainnet => "mainnet",
            NetworkName::Testnet => "testnet",
            NetworkName::Localhost => "localhost",
        };
        f.write_str(name)
    }
}

impl FromStr for NetworkName {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(NetworkName::Mainnet),
            "testnet" => Ok(NetworkName::Testnet),
            "localhost" | "devnet" => Ok(NetworkName::Localhost),
            other => Err(WalletError::Config(format!("Unknown network '{}'", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Network whose addresses are visible
    pub network: NetworkName,
    /// Explorer backend base URL
    pub explorer_api_url: String,
    /// Full node base URL (used for node API passthrough)
    pub node_api_url: String,
    /// Pending-transaction polling cadence
    pub poll_interval: Duration,
    /// Confirmed transactions per page
    pub page_limit: u32,
    /// Root of the per-wallet address metadata files
    pub data_dir: PathBuf,
}

/// On-disk shape of the optional TOML configuration file. Every field is
/// optional; missing fields fall back to the network defaults.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    network: Option<String>,
    explorer_api_url: Option<String>,
    node_api_url: Option<String>,
    poll_interval_ms: Option<u64>,
    page_limit: Option<u32>,
    data_dir: Option<PathBuf>,
}

impl SyncConfig {
    /// Defaults for a given network
    pub fn for_network(network: NetworkName) -> Self {
        Self {
            network,
            explorer_api_url: network.default_explorer_url().to_string(),
            node_api_url: network.default_node_url().to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            page_limit: DEFAULT_PAGE_LIMIT,
            data_dir: PathBuf::from("./wallets"),
        }
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `WALLET_NETWORK`: "mainnet" (default), "testnet" or "localhost"
    /// - `EXPLORER_API_URL`: explorer backend (optional, network default)
    /// - `NODE_API_URL`: full node (optional, network default)
    /// - `POLL_INTERVAL_MS`: pending check cadence (optional, 2000)
    /// - `PAGE_LIMIT`: confirmed transactions per page (optional, 20)
    /// - `WALLET_DATA_DIR`: address metadata directory (optional, ./wallets)
    pub fn from_env() -> Result<Self, WalletError> {
        dotenv::dotenv().ok();
        Self::layer_env(FileConfig::default())
    }

    /// Load a TOML file, then let environment variables override it
    pub fn from_toml_file(path: &Path) -> Result<Self, WalletError> {
        dotenv::dotenv().ok();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("{}: {}", path.display(), e)))?;
        Self::layer_env(Self::parse_toml(&contents)?)
    }

    fn parse_toml(contents: &str) -> Result<FileConfig, WalletError> {
        toml::from_str(contents).map_err(|e| WalletError::Config(e.to_string()))
    }

    fn layer_env(file: FileConfig) -> Result<Self, WalletError> {
        let network = match env::var("WALLET_NETWORK").ok().or(file.network) {
            Some(name) => name.parse()?,
            None => NetworkName::Mainnet,
        };
        log::info!("Using {} network", network);

        let mut config = Self::for_network(network);

        if let Some(url) = env::var("EXPLORER_API_URL").ok().or(file.explorer_api_url) {
            config.explorer_api_url = url;
        }
        if let Some(url) = env::var("NODE_API_URL").ok().or(file.node_api_url) {
            config.node_api_url = url;
        }
        log::info!("Explorer API URL: {}", config.explorer_api_url);
        log::info!("Node API URL: {}", config.node_api_url);

        let poll_ms = match env::var("POLL_INTERVAL_MS") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|e| WalletError::Config(format!("POLL_INTERVAL_MS: {}", e)))?,
            ),
            Err(_) => file.poll_interval_ms,
        };
        if let Some(ms) = poll_ms {
            if ms == 0 {
                return Err(WalletError::Config("poll interval must be positive".into()));
            }
            config.poll_interval = Duration::from_millis(ms);
        }

        let page_limit = match env::var("PAGE_LIMIT") {
            Ok(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|e| WalletError::Config(format!("PAGE_LIMIT: {}", e)))?,
            ),
            Err(_) => file.page_limit,
        };
        if let Some(limit) = page_limit {
            config.page_limit = limit.max(1);
        }

        if let Some(dir) = env::var("WALLET_DATA_DIR").ok().map(PathBuf::from).or(file.data_dir) {
            config.data_dir = dir;
        }

        Ok(config)
    }
}

impl Default for SyncConfig {
    /// Default configuration (Mainnet)
    fn default() -> Self {
        Self::for_network(NetworkName::Mainnet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_mainnet() {
        let config = SyncConfig::default();
        assert_eq!(config.network, NetworkName::Mainnet);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.page_limit, 20);
    }

    #[test]
    fn test_network_name_parsing() {
        assert_eq!("TestNet".parse::<NetworkName>().unwrap(), NetworkName::Testnet);
        assert_eq!("devnet".parse::<NetworkName>().unwrap(), NetworkName::Localhost);
        assert!("ropsten".parse::<NetworkName>().is_err());
        assert_eq!(NetworkName::Localhost.to_string(), "localhost");
    }

    #[test]
    fn test_toml_layer() {
        let file = SyncConfig::parse_toml(
            r#"
            network = "testnet"
            poll_interval_ms = 500
            page_limit = 50
            "#,
        )
        .unwrap();
        assert_eq!(file.network.as_deref(), Some("testnet"));
        assert_eq!(file.poll_interval_ms, Some(500));
        assert_eq!(file.page_limit, Some(50));
        assert!(file.explorer_api_url.is_none());
    }
}
