//! Application configuration loaded from environment variables.

use anyhow::{Context, Result};
use relay_control::{InboundSpec, LinkRenderer};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Telegram Bot API configuration
    pub telegram: TelegramConfig,

    /// Relay control configuration
    pub relay: RelayConfig,

    /// Ledger database configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Bot configuration
    #[serde(default)]
    pub bot: BotConfig,

    /// Background reconciliation configuration
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    pub bot_token: SecretString,

    /// Bot API base URL
    #[serde(default = "default_telegram_api")]
    pub api_url: String,

    /// Long poll timeout for getUpdates
    #[serde(default = "default_poll_timeout", with = "humantime_serde")]
    pub poll_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Relay control gateway endpoint
    #[serde(default = "default_relay_api")]
    pub api_url: String,

    /// How long to wait for the relay at startup
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Per-request timeout for control calls
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Tag of the managed inbound
    #[serde(default = "default_inbound_tag")]
    pub inbound_tag: String,

    /// Port the managed inbound listens on
    #[serde(default = "default_inbound_port")]
    pub port: u16,

    /// Websocket path of the managed inbound
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Public domain clients connect to (e.g., "relay.example.org")
    pub client_domain: String,

    /// Port clients connect to, usually the TLS front
    #[serde(default = "default_client_port")]
    pub client_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Comma-separated Telegram user ids with admin rights
    #[serde(default)]
    pub admins: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    /// Interval between background passes; zero disables them
    #[serde(default = "default_reconcile_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Parallel activations while restoring credentials at startup
    #[serde(default = "default_restore_concurrency")]
    pub restore_concurrency: usize,
}

impl RelayConfig {
    pub fn inbound_spec(&self) -> InboundSpec {
        InboundSpec {
            tag: self.inbound_tag.clone(),
            port: self.port,
            path: self.ws_path.clone(),
        }
    }

    pub fn link_renderer(&self) -> LinkRenderer {
        LinkRenderer::new(&self.client_domain, self.client_port, &self.ws_path)
    }
}

impl BotConfig {
    /// Parse the admin list. Entries that are not user ids are ignored.
    pub fn admin_ids(&self) -> HashSet<i64> {
        self.admins
            .split(',')
            .filter_map(|id| id.trim().parse().ok())
            .collect()
    }
}

impl ReconcileConfig {
    pub fn periodic(&self) -> Option<Duration> {
        (!self.interval.is_zero()).then_some(self.interval)
    }
}

// Default implementations
impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            admins: String::new(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval: default_reconcile_interval(),
            restore_concurrency: default_restore_concurrency(),
        }
    }
}

// Default value functions
fn default_telegram_api() -> String {
    "https://api.telegram.org".into()
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_relay_api() -> String {
    "http://127.0.0.1:10086".into()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_inbound_tag() -> String {
    "vmess-ws".into()
}

fn default_inbound_port() -> u16 {
    12345
}

fn default_ws_path() -> String {
    "/ws".into()
}

fn default_client_port() -> u16 {
    443
}

fn default_store_path() -> PathBuf {
    PathBuf::from("warden.db")
}

fn default_log_level() -> String {
    "info".into()
}

fn default_reconcile_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_restore_concurrency() -> usize {
    8
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Admin ids are a comma list; keep every value a string.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
