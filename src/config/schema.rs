//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sidecar.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::lifecycle::{ParamsError, ShutdownParameters};

/// Root configuration for the drain sidecar.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SidecarConfig {
    /// Where the sidecar's own HTTP server listens.
    pub listener: ListenerConfig,

    /// Envoy admin interface location.
    pub admin: AdminConfig,

    /// Default drain timing and force behaviour.
    pub drain: DrainConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// Port for the shutdown handler.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9001,
        }
    }
}

/// Envoy admin interface configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdminConfig {
    /// Admin interface host.
    pub host: String,

    /// Admin interface port.
    pub port: u16,

    /// `http` or `https`.
    pub scheme: String,

    /// Per-request timeout for admin calls, in seconds.
    pub timeout_secs: u64,
}

impl AdminConfig {
    /// Base URL all admin endpoints are joined onto.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}://{}:{}", self.scheme, self.host, self.port))
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9901,
            scheme: "http".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Default timing for shutdown and wait requests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DrainConfig {
    /// Delay after failing health checks, in seconds.
    pub initial_delay_secs: u64,

    /// Pause between connection checks, in seconds.
    pub check_period_secs: u64,

    /// Deadline for connections to close, in seconds.
    pub check_deadline_secs: u64,

    /// Force envoy to quit once connections are drained.
    pub force: bool,
}

impl DrainConfig {
    /// Defaults as validated parameters.
    pub fn parameters(&self) -> Result<ShutdownParameters, ParamsError> {
        ShutdownParameters::from_secs(
            self.initial_delay_secs,
            self.check_period_secs,
            self.check_deadline_secs,
        )
    }
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: 0,
            check_period_secs: 5,
            check_deadline_secs: 300,
            force: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Filter directives used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,

    /// Prometheus exporter bind address; metrics are off when unset.
    pub metrics_address: Option<String>,
}
