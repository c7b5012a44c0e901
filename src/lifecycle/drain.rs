//! Drain coordination for the fronted proxy.
//!
//! # Sequence
//! ```text
//! FailingHealthCheck → Delaying → Checking ──(0 open)──────────────▶ Success
//!                                    │
//!                                    └─(n open)→ Draining ─poll─┐
//!                                                   ▲           │
//!                                                   └─ period ──┤
//!                                                               ├─(0 open)→ [ForceShutdown] → Success
//!                                                               └─(deadline)→ TimedOut
//! ```
//!
//! Any admin failure ends the sequence with `Failure`. A timed-out drain
//! never forces a quit; the proxy is left to finish on its own. The deadline is
//! measured from the start of the sequence and checked before each
//! sleep, so it can be overshot by at most one poll period.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::admin::{AdminControl, AdminError};
use crate::lifecycle::params::ShutdownParameters;
use crate::lifecycle::signal::{CompletionSignal, CycleInFlight, DrainOutcome};
use crate::observability::metrics;

/// Step of the drain sequence, carried in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainPhase {
    FailingHealthCheck,
    Delaying,
    Checking,
    Draining,
    ForceShutdown,
}

impl fmt::Display for DrainPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DrainPhase::FailingHealthCheck => "failing health checks",
            DrainPhase::Delaying => "delaying",
            DrainPhase::Checking => "checking connections",
            DrainPhase::Draining => "draining",
            DrainPhase::ForceShutdown => "forcing shutdown",
        };
        f.write_str(name)
    }
}

/// A drain sequence that ran but did not succeed.
#[derive(Debug, Error)]
pub enum DrainError {
    /// An admin call failed; the sequence was aborted.
    #[error("envoy admin call failed while {phase}: {source}")]
    Admin {
        phase: DrainPhase,
        #[source]
        source: AdminError,
    },

    /// Connections were still open when the deadline passed.
    #[error(
        "timeout waiting for {active} downstream connections to close after {}s (deadline {}s)",
        .elapsed.as_secs(),
        .deadline.as_secs()
    )]
    Timeout {
        active: u64,
        elapsed: Duration,
        deadline: Duration,
    },

    /// The sidecar started stopping while the sequence was suspended.
    #[error("shutdown sequence cancelled while {phase}")]
    Cancelled { phase: DrainPhase },
}

impl DrainError {
    /// Outcome published for this error.
    pub fn outcome(&self) -> DrainOutcome {
        match self {
            DrainError::Timeout { .. } => DrainOutcome::TimedOut,
            DrainError::Admin { .. } | DrainError::Cancelled { .. } => DrainOutcome::Failure,
        }
    }
}

/// Why `initiate_shutdown` did not complete successfully.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Another sequence is running; nothing was published.
    #[error(transparent)]
    InFlight(#[from] CycleInFlight),

    /// The sequence ran and published a non-success outcome.
    #[error(transparent)]
    Drain(#[from] DrainError),
}

/// How a successful sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// No connections were open at the first check.
    NoConnections,
    /// Connections were drained; `force_quit` records whether the proxy
    /// accepted a quit request.
    Drained { force_quit: bool },
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::NoConnections => f.write_str("no active downstream connections, shutdown complete"),
            Completion::Drained { force_quit: false } => f.write_str("all downstream connections closed, shutdown complete"),
            Completion::Drained { force_quit: true } => {
                f.write_str("all downstream connections closed, envoy shutdown forced")
            }
        }
    }
}

/// Runs the drain sequence and publishes its outcome.
pub struct DrainCoordinator {
    admin: Arc<dyn AdminControl>,
    signal: Arc<CompletionSignal>,
    force: bool,
}

impl DrainCoordinator {
    /// `force` enables the quit request once every connection has drained.
    pub fn new(admin: Arc<dyn AdminControl>, signal: Arc<CompletionSignal>, force: bool) -> Self {
        Self { admin, signal, force }
    }

    /// Signal this coordinator publishes into.
    pub fn signal(&self) -> &Arc<CompletionSignal> {
        &self.signal
    }

    /// Run one full drain sequence.
    ///
    /// Rejects the call if a sequence is already in flight. Otherwise
    /// exactly one outcome is published, whichever branch ends it.
    pub async fn initiate_shutdown(
        &self,
        params: ShutdownParameters,
        cancel: CancellationToken,
    ) -> Result<Completion, ShutdownError> {
        let cycle = self.signal.begin_cycle()?;
        let started = Instant::now();

        tracing::info!(
            generation = cycle.generation(),
            delay_secs = params.delay().as_secs(),
            period_secs = params.period().as_secs(),
            deadline_secs = params.deadline().as_secs(),
            force = self.force,
            "Shutdown sequence starting"
        );

        let result = self.run(&params, &cancel, started).await;
        let outcome = match &result {
            Ok(_) => DrainOutcome::Success,
            Err(e) => e.outcome(),
        };

        match &result {
            Ok(completion) => tracing::info!(
                elapsed_secs = started.elapsed().as_secs(),
                "{}",
                completion
            ),
            Err(e) => tracing::error!(
                elapsed_secs = started.elapsed().as_secs(),
                error = %e,
                "Shutdown sequence did not complete"
            ),
        }

        metrics::record_shutdown(outcome, started.elapsed());
        cycle.publish(outcome);

        result.map_err(ShutdownError::from)
    }

    async fn run(
        &self,
        params: &ShutdownParameters,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<Completion, DrainError> {
        self.admin
            .fail_health_checks()
            .await
            .map_err(|source| DrainError::Admin {
                phase: DrainPhase::FailingHealthCheck,
                source,
            })?;

        if !params.delay().is_zero() {
            tracing::info!(delay_secs = params.delay().as_secs(), "Delaying graceful shutdown");
            pause(params.delay(), cancel, DrainPhase::Delaying).await?;
        }

        let active = self.active_connections(DrainPhase::Checking).await?;
        if active == 0 {
            return Ok(Completion::NoConnections);
        }

        self.admin
            .begin_graceful_drain()
            .await
            .map_err(|source| DrainError::Admin {
                phase: DrainPhase::Draining,
                source,
            })?;
        tracing::info!(active, "Waiting for active downstream connections to close");

        loop {
            let active = self.active_connections(DrainPhase::Draining).await?;
            if active == 0 {
                break;
            }

            let elapsed = started.elapsed();
            if elapsed > params.deadline() {
                tracing::warn!(
                    active,
                    elapsed_secs = elapsed.as_secs(),
                    deadline_secs = params.deadline().as_secs(),
                    "Deadline exceeded with downstream connections still open"
                );
                return Err(DrainError::Timeout {
                    active,
                    elapsed,
                    deadline: params.deadline(),
                });
            }

            tracing::debug!(active, elapsed_secs = elapsed.as_secs(), "Downstream connections still open");
            pause(params.period(), cancel, DrainPhase::Draining).await?;
        }

        let force_quit = self.force && self.force_quit().await;
        Ok(Completion::Drained { force_quit })
    }

    async fn active_connections(&self, phase: DrainPhase) -> Result<u64, DrainError> {
        let active = self
            .admin
            .active_connections()
            .await
            .map_err(|source| DrainError::Admin { phase, source })?;
        metrics::record_active_connections(active);
        Ok(active)
    }

    /// Failures are logged only; they never change the outcome.
    async fn force_quit(&self) -> bool {
        match self.admin.force_quit().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(phase = %DrainPhase::ForceShutdown, error = %e, "Force shutdown request failed");
                false
            }
        }
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken, phase: DrainPhase) -> Result<(), DrainError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(DrainError::Cancelled { phase }),
        _ = time::sleep(duration) => Ok(()),
    }
}
