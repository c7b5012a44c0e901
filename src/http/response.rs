//! Mapping of drain and wait results onto HTTP responses.
//!
//! Bodies are a single human-readable status line.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::lifecycle::{DrainError, DrainOutcome, ParamsError, ShutdownError, WaitError};

/// Plain-text response with a trailing newline.
pub fn status_line(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (status, format!("{message}\n")).into_response()
}

impl IntoResponse for ParamsError {
    fn into_response(self) -> Response {
        status_line(StatusCode::BAD_REQUEST, self)
    }
}

impl IntoResponse for ShutdownError {
    fn into_response(self) -> Response {
        let status = match &self {
            ShutdownError::InFlight(_) => StatusCode::CONFLICT,
            ShutdownError::Drain(DrainError::Admin { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ShutdownError::Drain(DrainError::Timeout { .. }) => StatusCode::REQUEST_TIMEOUT,
            ShutdownError::Drain(DrainError::Cancelled { .. }) => StatusCode::SERVICE_UNAVAILABLE,
        };
        status_line(status, self)
    }
}

impl IntoResponse for WaitError {
    fn into_response(self) -> Response {
        let status = match self {
            WaitError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            WaitError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        };
        status_line(status, self)
    }
}

/// Status reported to a waiter for a published outcome.
///
/// A timed-out drain still lets the proxy terminate, so it reads as 200.
pub fn outcome_status(outcome: DrainOutcome) -> StatusCode {
    match outcome {
        DrainOutcome::Success | DrainOutcome::TimedOut => StatusCode::OK,
        DrainOutcome::Failure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
