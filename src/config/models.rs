// src/config/models.rs
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_ENDPOINT: &str = "https://example.com/api/health";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// The single endpoint being polled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: Url,
    /// Also bounds each fetch: a request slower than one interval counts as failed.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        self.poll_interval()
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    #[serde(default = "default_monitor_path")]
    pub monitor_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            metrics_path: default_metrics_path(),
            monitor_path: default_monitor_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_constant_score")]
    pub constant_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            constant_score: default_constant_score(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.monitor.poll_interval_secs == 0 {
            bail!("monitor.poll_interval_secs must be greater than zero");
        }

        match self.monitor.api_endpoint.scheme() {
            "http" | "https" => {}
            other => bail!(
                "monitor.api_endpoint must use http or https, got '{}'",
                other
            ),
        }

        for (name, path) in [
            ("server.metrics_path", &self.server.metrics_path),
            ("server.monitor_path", &self.server.monitor_path),
        ] {
            if !path.starts_with('/') {
                bail!("{} must start with '/', got '{}'", name, path);
            }
        }

        if self.server.metrics_path == self.server.monitor_path {
            bail!(
                "server.metrics_path and server.monitor_path must differ (both '{}')",
                self.server.metrics_path
            );
        }

        if !(0.0..=1.0).contains(&self.scoring.constant_score) {
            bail!(
                "scoring.constant_score must be within [0, 1], got {}",
                self.scoring.constant_score
            );
        }

        Ok(())
    }
}

fn default_api_endpoint() -> Url {
    Url::parse(DEFAULT_API_ENDPOINT).expect("default endpoint is a valid URL")
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_LISTEN_PORT))
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_monitor_path() -> String {
    "/monitor".to_string()
}

fn default_constant_score() -> f64 {
    1.0
}
