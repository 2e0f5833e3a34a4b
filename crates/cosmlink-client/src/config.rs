//! Configuration management for the cosmlink client

use crate::broadcast::BroadcastOptions;
use crate::rpc::{HttpEndpoint, RpcClient};
use crate::signing::SignerOptions;
use cosmlink_log::{LogConfig, LogFormat};
use cosmlink_math::{CoinError, GasPrice};
use cosmlink_types::{Fee, SignMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error
    #[error("io error:: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml parsing error:: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("toml serialization error:: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("unknown configuration key:: {0}")]
    UnknownKey(String),

    #[error("invalid value for {key}:: {value}")]
    InvalidValue { key: String, value: String },
}

/// How transactions are confirmed after broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub check_tx: bool,
    pub deliver_tx: bool,
    pub use_legacy_broadcast_tx_commit: bool,
    /// Confirmation timeout in seconds
    pub timeout: u64,
    /// Poll interval in milliseconds
    pub poll_interval: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            check_tx: true,
            deliver_tx: true,
            use_legacy_broadcast_tx_commit: false,
            timeout: 60,
            poll_interval: 1000,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Node RPC endpoint
    pub node: String,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Gas price, e.g. `0.025stake`
    pub gas_price: String,
    pub gas_limit: u64,
    pub sign_mode: SignMode,
    /// Extra headers sent with every RPC request
    pub headers: BTreeMap<String, String>,
    pub broadcast: BroadcastConfig,
    pub log: LogConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node: "http://localhost:26657".to_string(),
            timeout: 30,
            gas_price: "0.025stake".to_string(),
            gas_limit: 200_000,
            sign_mode: SignMode::Direct,
            headers: BTreeMap::new(),
            broadcast: BroadcastConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the client misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broadcast.poll_interval == 0 {
            return Err(invalid("broadcast.poll_interval", "0"));
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get default configuration directory
    pub fn default_config_dir() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            home.join(".cosmlink")
        } else {
            PathBuf::from(".cosmlink")
        }
    }

    /// Get default configuration file path
    pub fn default_config_file() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Load configuration from default location or fall back to defaults
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_file();

        if config_path.exists() {
            Self::load_from_file(config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Set a configuration value
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "node" => self.node = value.to_string(),
            "timeout" => self.timeout = parse(key, value)?,
            "gas_price" => {
                value
                    .parse::<GasPrice>()
                    .map_err(|_| invalid(key, value))?;
                self.gas_price = value.to_string();
            }
            "gas_limit" => self.gas_limit = parse(key, value)?,
            "sign_mode" => self.sign_mode = parse(key, value)?,
            "broadcast.check_tx" => self.broadcast.check_tx = parse(key, value)?,
            "broadcast.deliver_tx" => self.broadcast.deliver_tx = parse(key, value)?,
            "broadcast.use_legacy_broadcast_tx_commit" => {
                self.broadcast.use_legacy_broadcast_tx_commit = parse(key, value)?
            }
            "broadcast.timeout" => self.broadcast.timeout = parse(key, value)?,
            "broadcast.poll_interval" => {
                self.broadcast.poll_interval = match parse::<u64>(key, value)? {
                    0 => return Err(invalid(key, value)),
                    millis => millis,
                }
            }
            "log.level" => self.log.level = value.to_string(),
            "log.format" => {
                self.log.format = match value {
                    "json" => LogFormat::Json,
                    "text" => LogFormat::Text,
                    _ => return Err(invalid(key, value)),
                }
            }
            _ => match key.strip_prefix("headers.") {
                Some(name) if !name.is_empty() => {
                    self.headers.insert(name.to_string(), value.to_string());
                }
                _ => return Err(ConfigError::UnknownKey(key.to_string())),
            },
        }
        Ok(())
    }

    pub fn endpoint(&self) -> HttpEndpoint {
        HttpEndpoint {
            url: self.node.clone(),
            headers: self.headers.clone(),
        }
    }

    pub fn rpc_client(&self) -> crate::Result<RpcClient> {
        RpcClient::with_timeout(self.endpoint(), Duration::from_secs(self.timeout))
    }

    pub fn broadcast_options(&self) -> BroadcastOptions {
        BroadcastOptions {
            check_tx: self.broadcast.check_tx,
            deliver_tx: self.broadcast.deliver_tx,
            use_legacy_broadcast_tx_commit: self.broadcast.use_legacy_broadcast_tx_commit,
            timeout: Duration::from_secs(self.broadcast.timeout),
            poll_interval: Duration::from_millis(self.broadcast.poll_interval),
        }
    }

    pub fn signer_options(&self) -> SignerOptions {
        SignerOptions {
            sign_mode: self.sign_mode,
            broadcast: self.broadcast_options(),
            registry: Vec::new(),
        }
    }

    pub fn gas_price(&self) -> Result<GasPrice, CoinError> {
        self.gas_price.parse()
    }

    /// Fee for the configured gas limit at the configured gas price
    pub fn fee(&self) -> Result<Fee, CoinError> {
        Fee::from_gas_price(self.gas_limit, &self.gas_price()?)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
