//! Configuration for gavel-server.
//!
//! Supports loading from TOML file with environment and CLI overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use gavel_common::StoreConfig;
use serde::Deserialize;

/// Environment variable overrides, applied between file and CLI.
const ENV_LISTEN_ADDR: &str = "GAVEL_LISTEN_ADDR";
const ENV_CLICKHOUSE_URL: &str = "GAVEL_CLICKHOUSE_URL";
const ENV_LOG_LEVEL: &str = "GAVEL_LOG_LEVEL";

/// Top-level configuration for gavel-server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket gateway binds to.
    pub listen_addr: String,
    pub log_level: String,
    /// Maximum concurrent WebSocket clients.
    pub max_clients: usize,
    /// Commands a room mailbox holds before callers see a busy error.
    pub mailbox_depth: usize,
    /// How long a caller waits on a full mailbox before giving up.
    pub mailbox_timeout: Duration,
    pub store: StoreConfig,
    /// False disables the ClickHouse pump entirely.
    pub store_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9100".to_string(),
            log_level: "info".to_string(),
            max_clients: 500,
            mailbox_depth: 64,
            mailbox_timeout: Duration::from_millis(250),
            store: StoreConfig::default(),
            store_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlConfig = toml::from_str(content).context("Failed to parse TOML config")?;
        Ok(Self::from(file))
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var(ENV_LISTEN_ADDR) {
            self.listen_addr = addr;
        }
        if let Ok(url) = std::env::var(ENV_CLICKHOUSE_URL) {
            self.store.url = url;
        }
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
    }

    /// Apply CLI overrides. These win over both the file and the environment.
    pub fn apply_overrides(
        &mut self,
        listen_addr: Option<String>,
        clickhouse_url: Option<String>,
        no_store: bool,
    ) {
        if let Some(addr) = listen_addr {
            self.listen_addr = addr;
        }
        if let Some(url) = clickhouse_url {
            self.store.url = url;
        }
        if no_store {
            self.store_enabled = false;
        }
    }

    /// Reject configurations that cannot work before anything starts.
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            bail!("listen_addr must not be empty");
        }
        if self.mailbox_depth == 0 {
            bail!("mailbox_depth must be at least 1");
        }
        if self.mailbox_timeout.is_zero() {
            bail!("mailbox_timeout_ms must be at least 1");
        }
        if self.store_enabled && self.store.url.is_empty() {
            bail!("clickhouse.url must not be empty when the store is enabled");
        }
        Ok(())
    }
}

/// TOML file structure for deserialization.
#[derive(Debug, Deserialize)]
struct TomlConfig {
    #[serde(default)]
    server: ServerToml,
    #[serde(default)]
    clickhouse: ClickHouseToml,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ServerToml {
    listen_addr: String,
    log_level: String,
    max_clients: usize,
    mailbox_depth: usize,
    mailbox_timeout_ms: u64,
}

impl Default for ServerToml {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9100".to_string(),
            log_level: "info".to_string(),
            max_clients: 500,
            mailbox_depth: 64,
            mailbox_timeout_ms: 250,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ClickHouseToml {
    enabled: bool,
    url: String,
    database: String,
    max_rows: u64,
    max_bytes: u64,
    period_secs: u64,
}

impl Default for ClickHouseToml {
    fn default() -> Self {
        let store = StoreConfig::default();
        Self {
            enabled: true,
            url: store.url,
            database: store.database,
            max_rows: store.max_rows,
            max_bytes: store.max_bytes,
            period_secs: store.commit_period.as_secs(),
        }
    }
}

impl From<TomlConfig> for ServerConfig {
    fn from(toml: TomlConfig) -> Self {
        Self {
            listen_addr: toml.server.listen_addr,
            log_level: toml.server.log_level,
            max_clients: toml.server.max_clients,
            mailbox_depth: toml.server.mailbox_depth,
            mailbox_timeout: Duration::from_millis(toml.server.mailbox_timeout_ms),
            store: StoreConfig {
                url: toml.clickhouse.url,
                database: toml.clickhouse.database,
                user: None,
                password: None,
                max_rows: toml.clickhouse.max_rows,
                max_bytes: toml.clickhouse.max_bytes,
                commit_period: Duration::from_secs(toml.clickhouse.period_secs),
            },
            store_enabled: toml.clickhouse.enabled,
        }
    }
}
