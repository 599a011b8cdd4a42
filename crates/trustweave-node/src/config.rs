//! Node configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use trustweave_core::{Address, LedgerConfig};

/// Full configuration for the TrustWeave node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrustweaveConfig {
    /// API server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Ledger parameters applied when a fresh ledger is created.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Deploy-time principal.
    #[serde(default)]
    pub admin: AdminConfig,
}

/// HTTP API settings.
///
/// The API takes the calling principal from the unauthenticated `x-caller`
/// header, so anyone who can reach it can act as any principal, including
/// the deployer. Bind it only where every client is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API listen address. Loopback by default.
    #[serde(default = "default_api_addr")]
    pub listen_addr: String,
    /// API port.
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Capacity of the API → event loop command channel.
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
    /// Maximum number of event records returned by one events request.
    #[serde(default = "default_events_page_limit")]
    pub events_page_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the data directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// Address that receives the deploy-time roles of a fresh ledger.
    /// Ignored once a snapshot exists.
    #[serde(default)]
    pub deployer: Option<Address>,
}

// Default value functions
fn default_api_addr() -> String {
    "127.0.0.1".into()
}
fn default_api_port() -> u16 {
    9101
}
fn default_command_capacity() -> usize {
    256
}
fn default_events_page_limit() -> usize {
    1000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_addr(),
            port: default_api_port(),
            command_capacity: default_command_capacity(),
            events_page_limit: default_events_page_limit(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl TrustweaveConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: TrustweaveConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `host:port` the API server binds to.
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.listen_addr, self.api.port)
    }

    /// Whether the API listens on a loopback address only.
    pub fn api_is_loopback(&self) -> bool {
        match self.api.listen_addr.parse::<std::net::IpAddr>() {
            Ok(ip) => ip.is_loopback(),
            Err(_) => self.api.listen_addr == "localhost",
        }
    }

    /// Reject settings the node cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.ledger.validate()?;
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("unknown log format '{}'", self.logging.format);
        }
        if self.api.command_capacity == 0 {
            anyhow::bail!("api.command_capacity must be positive");
        }
        if self.api.events_page_limit == 0 {
            anyhow::bail!("api.events_page_limit must be positive");
        }
        Ok(())
    }
}
