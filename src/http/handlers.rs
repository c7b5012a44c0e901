//! Request handlers for the sidecar's HTTP surface.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::admin::stats::render_downstream_cx_active;
use crate::http::query::TimingQuery;
use crate::http::response::{outcome_status, status_line};
use crate::http::server::AppState;
use crate::lifecycle::WaitError;
use crate::observability::metrics;

pub async fn alive() -> StatusCode {
    StatusCode::OK
}

pub async fn ready() -> StatusCode {
    StatusCode::OK
}

/// Report envoy's current downstream connection count.
pub async fn check_stats(State(state): State<AppState>) -> Response {
    match state.admin.active_connections().await {
        Ok(count) => {
            metrics::record_active_connections(count);
            (StatusCode::OK, render_downstream_cx_active(count)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Error getting downstream connections");
            status_line(StatusCode::INTERNAL_SERVER_ERROR, "failed to query envoy stats")
        }
    }
}

/// Run the drain sequence and report how it ended.
///
/// The sequence runs on its own task: a caller that hangs up does not
/// stop it, only the sidecar's own shutdown does.
pub async fn shutdown(State(state): State<AppState>, Query(query): Query<TimingQuery>) -> Response {
    tracing::info!("Shutdown request received");

    let params = match query.resolve(&state.drain) {
        Ok(params) => params,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected shutdown parameters");
            return e.into_response();
        }
    };

    let coordinator = state.coordinator.clone();
    let cancel = state.shutdown.token();
    let sequence = tokio::spawn(async move { coordinator.initiate_shutdown(params, cancel).await });

    match sequence.await {
        Ok(Ok(completion)) => status_line(StatusCode::OK, completion),
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Shutdown task failed");
            status_line(StatusCode::INTERNAL_SERVER_ERROR, "shutdown task failed")
        }
    }
}

/// Wait for the outcome of the current or latest drain sequence.
pub async fn wait_for_shutdown(State(state): State<AppState>, Query(query): Query<TimingQuery>) -> Response {
    tracing::info!("Waiting for shutdown");

    let params = match query.resolve(&state.drain) {
        Ok(params) => params,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected wait parameters");
            return e.into_response();
        }
    };

    let cancel = state.shutdown.token();
    match state.signal.wait(&params, &cancel).await {
        Ok(outcome) => {
            metrics::record_wait(outcome.as_str());
            status_line(outcome_status(outcome), format!("shutdown outcome: {outcome}"))
        }
        Err(e) => {
            match &e {
                WaitError::Timeout { waited } => {
                    metrics::record_wait("timeout");
                    tracing::warn!(waited_secs = waited.as_secs(), "Timeout waiting for shutdown to complete");
                }
                WaitError::Cancelled => metrics::record_wait("cancelled"),
            }
            e.into_response()
        }
    }
}
