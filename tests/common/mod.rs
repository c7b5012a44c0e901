//! Shared utilities for integration tests: a scripted Envoy admin and a running sidecar.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use envoy_drain_sidecar::admin::EnvoyAdminClient;
use envoy_drain_sidecar::config::{AdminConfig, DrainConfig};
use envoy_drain_sidecar::http::{AppState, HttpServer};
use envoy_drain_sidecar::lifecycle::Shutdown;

/// Envoy admin stand-in. Connection counts are served in order and the
/// last one repeats.
#[derive(Default)]
pub struct MockEnvoy {
    counts: Mutex<VecDeque<u64>>,
    /// Replaces the stats payload when set.
    pub stats_body: Mutex<Option<String>>,
    /// Status for `/healthcheck/fail`; 0 means 200.
    pub healthcheck_status: AtomicU16,
    pub health_checks: AtomicUsize,
    pub stats_reads: AtomicUsize,
    pub drains: AtomicUsize,
    pub quits: AtomicUsize,
}

#[allow(dead_code)]
impl MockEnvoy {
    pub fn with_counts(counts: &[u64]) -> Arc<Self> {
        Arc::new(Self {
            counts: Mutex::new(counts.iter().copied().collect()),
            ..Self::default()
        })
    }

    pub fn health_checks(&self) -> usize {
        self.health_checks.load(Ordering::SeqCst)
    }

    pub fn drains(&self) -> usize {
        self.drains.load(Ordering::SeqCst)
    }

    pub fn quits(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }

    fn next_count(&self) -> u64 {
        let mut counts = self.counts.lock().unwrap();
        if counts.len() > 1 {
            counts.pop_front().unwrap()
        } else {
            counts.front().copied().unwrap_or(0)
        }
    }
}

async fn healthcheck_fail(State(envoy): State<Arc<MockEnvoy>>) -> StatusCode {
    envoy.health_checks.fetch_add(1, Ordering::SeqCst);
    match envoy.healthcheck_status.load(Ordering::SeqCst) {
        0 => StatusCode::OK,
        code => StatusCode::from_u16(code).unwrap(),
    }
}

async fn stats(State(envoy): State<Arc<MockEnvoy>>) -> String {
    envoy.stats_reads.fetch_add(1, Ordering::SeqCst);
    if let Some(body) = envoy.stats_body.lock().unwrap().clone() {
        return body;
    }
    format!("http.envoy.downstream_cx_active: {}\n", envoy.next_count())
}

async fn drain_listeners(State(envoy): State<Arc<MockEnvoy>>) -> StatusCode {
    envoy.drains.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

async fn quit(State(envoy): State<Arc<MockEnvoy>>) -> StatusCode {
    envoy.quits.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

/// Serve `envoy` on an ephemeral port.
pub async fn start_mock_envoy(envoy: Arc<MockEnvoy>) -> SocketAddr {
    let app = Router::new()
        .route("/healthcheck/fail", post(healthcheck_fail))
        .route("/stats", get(stats))
        .route("/drain_listeners", post(drain_listeners))
        .route("/quitquitquit", post(quit))
        .with_state(envoy);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a sidecar pointed at the admin listener on `admin_addr`.
pub async fn start_sidecar(admin_addr: SocketAddr, drain: DrainConfig) -> (String, Shutdown) {
    let admin_config = AdminConfig {
        host: "127.0.0.1".to_string(),
        port: admin_addr.port(),
        timeout_secs: 2,
        ..AdminConfig::default()
    };
    let admin = Arc::new(EnvoyAdminClient::new(&admin_config).unwrap());
    let shutdown = Shutdown::new();
    let state = AppState::new(admin, drain, shutdown.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = HttpServer::new(state).run(listener).await;
    });

    (format!("http://{}", addr), shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
