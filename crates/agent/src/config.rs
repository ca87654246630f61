//! Agent configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Agent configuration, read from `MONITOR_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Name reported in logs
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// API server port for health/metrics/status
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// JSON-RPC endpoint to sample
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Fixed base fee to serve instead of querying a node (demo mode)
    #[serde(default)]
    pub static_base_fee: Option<String>,

    /// Observation period in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Timeout for a single fee read in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Total delivery attempts per alert
    #[serde(default = "default_delivery_attempts")]
    pub delivery_attempts: u32,

    /// Consecutive fetch failures before the sampler reports unhealthy
    #[serde(default = "default_unhealthy_after")]
    pub unhealthy_after: u32,

    /// Optional webhook receiving alert events
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Webhook request timeout in seconds
    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_secs: u64,
}

fn default_node_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_rpc_url() -> String {
    "http://localhost:8545".to_string()
}

fn default_interval() -> u64 {
    12
}

fn default_fetch_timeout() -> u64 {
    5
}

fn default_delivery_attempts() -> u32 {
    3
}

fn default_unhealthy_after() -> u32 {
    5
}

fn default_webhook_timeout() -> u64 {
    10
}

impl AgentConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_env(config::Environment::with_prefix("MONITOR"))
    }

    /// Load configuration from an environment source
    ///
    /// Values stay strings until deserialized so fee amounts keep full
    /// 256-bit precision.
    pub fn from_env(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(env)
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid MONITOR_* configuration")
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs.max(1))
    }
}
