//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing)
//! - Hold the shared state: admin client, completion signal, coordinator
//! - Serve until the sidecar's own shutdown is triggered

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::admin::AdminControl;
use crate::config::DrainConfig;
use crate::http::handlers;
use crate::http::request::{request_span, UuidRequestId};
use crate::lifecycle::{CompletionSignal, DrainCoordinator, Shutdown};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub admin: Arc<dyn AdminControl>,
    pub signal: Arc<CompletionSignal>,
    pub coordinator: Arc<DrainCoordinator>,
    pub drain: DrainConfig,
    pub shutdown: Shutdown,
}

impl AppState {
    /// Wire a fresh completion signal and coordinator around `admin`.
    pub fn new(admin: Arc<dyn AdminControl>, drain: DrainConfig, shutdown: Shutdown) -> Self {
        let signal = Arc::new(CompletionSignal::new());
        let coordinator = Arc::new(DrainCoordinator::new(admin.clone(), signal.clone(), drain.force));

        Self {
            admin,
            signal,
            coordinator,
            drain,
            shutdown,
        }
    }
}

/// HTTP server for the sidecar.
pub struct HttpServer {
    router: Router,
    shutdown: Shutdown,
}

impl HttpServer {
    /// Create a new HTTP server around the given state.
    pub fn new(state: AppState) -> Self {
        let shutdown = state.shutdown.clone();
        Self {
            router: build_router(state),
            shutdown,
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Running envoy shutdown handler server");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.triggered().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health/alive", get(handlers::alive))
        .route("/health/ready", get(handlers::ready))
        .route("/check/stats", get(handlers::check_stats))
        .route("/shutdown", post(handlers::shutdown))
        .route("/waitforshutdown", get(handlers::wait_for_shutdown))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
