//! Envoy admin interface client.
//!
//! # Responsibilities
//! - Fail the proxy's health checks so load balancers stop routing to it
//! - Read the active downstream connection gauge
//! - Start graceful listener draining
//! - Force the proxy to exit
//!
//! Every call is bounded by the configured admin timeout. Transport
//! errors, non-2xx statuses and unparseable stats are all surfaced as
//! [`AdminError`]; callers treat them alike.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::admin::stats::{self, StatsParseError};
use crate::config::AdminConfig;

const HEALTHCHECK_FAIL: &str = "/healthcheck/fail";
const STATS: &str = "/stats?filter=http.envoy.downstream_cx_active";
const DRAIN_LISTENERS: &str = "/drain_listeners?graceful";
const QUIT: &str = "/quitquitquit";

/// Errors talking to the proxy's admin interface.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Connection, timeout or body read failure.
    #[error("request to envoy admin {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The admin interface answered with a non-2xx status.
    #[error("envoy admin {endpoint} returned {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },

    /// The stats payload had an unexpected shape.
    #[error(transparent)]
    Parse(#[from] StatsParseError),

    /// The configured admin address is not a valid URL.
    #[error("invalid envoy admin address: {0}")]
    Address(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("failed to build envoy admin client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Result type for admin operations.
pub type AdminResult<T> = Result<T, AdminError>;

/// The four admin operations the drain sequence relies on.
#[async_trait]
pub trait AdminControl: Send + Sync {
    /// Make the proxy's health checks fail.
    async fn fail_health_checks(&self) -> AdminResult<()>;

    /// Read the number of downstream connections currently open.
    async fn active_connections(&self) -> AdminResult<u64>;

    /// Stop accepting new connections and let existing ones finish.
    async fn begin_graceful_drain(&self) -> AdminResult<()>;

    /// Make the proxy exit immediately.
    async fn force_quit(&self) -> AdminResult<()>;
}

/// [`AdminControl`] over HTTP against a real Envoy admin listener.
#[derive(Debug, Clone)]
pub struct EnvoyAdminClient {
    http: reqwest::Client,
    base: Url,
}

impl EnvoyAdminClient {
    /// Create a client for the configured admin address.
    pub fn new(config: &AdminConfig) -> AdminResult<Self> {
        let base = config.base_url()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .no_proxy()
            .build()
            .map_err(AdminError::Build)?;

        tracing::debug!(admin_url = %base, "Envoy admin client initialized");
        Ok(Self { http, base })
    }

    /// Base URL of the admin interface.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, endpoint: &'static str) -> AdminResult<Url> {
        Ok(self.base.join(endpoint)?)
    }

    async fn post(&self, endpoint: &'static str) -> AdminResult<()> {
        let response = self
            .http
            .post(self.url(endpoint)?)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .send()
            .await
            .map_err(|source| AdminError::Transport { endpoint, source })?;

        check_status(endpoint, response.status())
    }
}

fn check_status(endpoint: &'static str, status: StatusCode) -> AdminResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(AdminError::Status { endpoint, status })
    }
}

#[async_trait]
impl AdminControl for EnvoyAdminClient {
    async fn fail_health_checks(&self) -> AdminResult<()> {
        tracing::info!("Failing envoy health checks");
        self.post(HEALTHCHECK_FAIL).await
    }

    async fn active_connections(&self) -> AdminResult<u64> {
        let response = self
            .http
            .get(self.url(STATS)?)
            .send()
            .await
            .map_err(|source| AdminError::Transport { endpoint: STATS, source })?;

        check_status(STATS, response.status())?;

        let body = response
            .text()
            .await
            .map_err(|source| AdminError::Transport { endpoint: STATS, source })?;

        let count = stats::parse_downstream_cx_active(&body)?;
        tracing::debug!(active = count, "Received envoy stats");
        Ok(count)
    }

    async fn begin_graceful_drain(&self) -> AdminResult<()> {
        tracing::info!("Starting graceful draining");
        self.post(DRAIN_LISTENERS).await
    }

    async fn force_quit(&self) -> AdminResult<()> {
        tracing::info!("Forcing envoy shutdown");
        self.post(QUIT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_onto_base() {
        let client = EnvoyAdminClient::new(&AdminConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:9901/");
        assert_eq!(
            client.url(STATS).unwrap().as_str(),
            "http://localhost:9901/stats?filter=http.envoy.downstream_cx_active"
        );
        assert_eq!(
            client.url(DRAIN_LISTENERS).unwrap().as_str(),
            "http://localhost:9901/drain_listeners?graceful"
        );
    }

    #[test]
    fn non_success_status_is_an_error() {
        assert!(check_status(QUIT, StatusCode::OK).is_ok());
        assert!(check_status(QUIT, StatusCode::NO_CONTENT).is_ok());

        let err = check_status(QUIT, StatusCode::SERVICE_UNAVAILABLE).unwrap_err();
        assert_eq!(err.to_string(), "envoy admin /quitquitquit returned 503 Service Unavailable");
    }

    #[tokio::test]
    async fn unreachable_admin_is_a_transport_error() {
        let config = AdminConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            timeout_secs: 1,
            ..AdminConfig::default()
        };
        let client = EnvoyAdminClient::new(&config).unwrap();

        let err = client.fail_health_checks().await.unwrap_err();
        assert!(matches!(err, AdminError::Transport { endpoint: HEALTHCHECK_FAIL, .. }));
    }
}
