//! Envoy drain sidecar.
//!
//! Runs next to an Envoy proxy and drives its graceful shutdown through
//! the admin interface.
//!
//! # Architecture Overview
//!
//! ```text
//!   preStop hook / orchestrator                     ┌──────────────────────────────┐
//!   ───────────────────────────▶ POST /shutdown ───▶│ DrainCoordinator             │
//!                                                   │  fail health checks          │──────▶ Envoy admin
//!                                                   │  delay                       │        /healthcheck/fail
//!                                                   │  poll downstream_cx_active   │        /stats
//!                                                   │  drain listeners             │        /drain_listeners
//!                                                   │  [force quit]                │        /quitquitquit
//!                                                   └──────────────┬───────────────┘
//!                                                                  │ publish outcome
//!                                                                  ▼
//!   other containers' hooks                         ┌──────────────────────────────┐
//!   ──────────────────────▶ GET /waitforshutdown ──▶│ CompletionSignal (broadcast) │
//!                                                   └──────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use envoy_drain_sidecar::admin::EnvoyAdminClient;
use envoy_drain_sidecar::config::{resolve, Args};
use envoy_drain_sidecar::http::{AppState, HttpServer};
use envoy_drain_sidecar::lifecycle::{signals, Shutdown};
use envoy_drain_sidecar::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve(&args)?;

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "envoy-drain-sidecar starting");
    tracing::info!(
        listen = %config.listener.bind_address(),
        admin_url = %config.admin.base_url()?,
        delay_secs = config.drain.initial_delay_secs,
        period_secs = config.drain.check_period_secs,
        deadline_secs = config.drain.check_deadline_secs,
        force = config.drain.force,
        "Configuration loaded"
    );

    if let Some(addr) = &config.observability.metrics_address {
        let addr: SocketAddr = addr.parse()?;
        metrics::init_metrics(addr)?;
    }

    let admin = Arc::new(EnvoyAdminClient::new(&config.admin)?);
    let shutdown = Shutdown::new();
    let state = AppState::new(admin, config.drain.clone(), shutdown.clone());

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tokio::spawn(signals::watch(shutdown));

    HttpServer::new(state).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
