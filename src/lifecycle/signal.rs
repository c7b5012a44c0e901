//! Cross-request completion signal.
//!
//! A drain sequence and any number of waiters share one
//! [`CompletionSignal`]. The coordinator opens a [`Cycle`], runs, and
//! publishes exactly one [`DrainOutcome`] through it. Waiters observe
//! that outcome without consuming it: every waiter sees the same
//! result, and it stays visible until the next cycle begins.
//!
//! # States
//! ```text
//! Idle ──begin_cycle──▶ InFlight{g} ──publish──▶ Complete{g, outcome}
//!                           ▲                           │
//!                           └────────begin_cycle────────┘
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::lifecycle::params::ShutdownParameters;

/// Result of one drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrainOutcome {
    /// No connections were open, or all of them closed in time.
    Success,
    /// An admin call failed or the sequence was aborted.
    Failure,
    /// Connections were still open when the deadline passed.
    TimedOut,
}

impl DrainOutcome {
    /// Stable lowercase label, used for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            DrainOutcome::Success => "success",
            DrainOutcome::Failure => "failure",
            DrainOutcome::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for DrainOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state of the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// No cycle has run since startup.
    Idle,
    /// A drain sequence is running.
    InFlight { generation: u64 },
    /// The latest cycle finished with `outcome`.
    Complete { generation: u64, outcome: DrainOutcome },
}

impl CycleState {
    /// Generation of the latest cycle, `0` before the first one.
    pub fn generation(&self) -> u64 {
        match *self {
            CycleState::Idle => 0,
            CycleState::InFlight { generation } | CycleState::Complete { generation, .. } => generation,
        }
    }
}

/// A second cycle was requested while one is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("shutdown cycle {generation} is already in progress")]
pub struct CycleInFlight {
    pub generation: u64,
}

/// Why a waiter returned without an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    /// Nothing was published within the waiter's own deadline.
    #[error("no shutdown outcome published after {}s", .waited.as_secs())]
    Timeout { waited: Duration },

    /// The sidecar itself is stopping.
    #[error("wait for shutdown cancelled")]
    Cancelled,
}

/// Broadcast slot shared by the coordinator and all waiters.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: watch::Sender<CycleState>,
}

impl CompletionSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(CycleState::Idle);
        Self { tx }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CycleState {
        *self.tx.borrow()
    }

    /// Open a new cycle, hiding any previously published outcome.
    ///
    /// Fails without touching the state if a cycle is already in flight.
    pub fn begin_cycle(self: &Arc<Self>) -> Result<Cycle, CycleInFlight> {
        let mut result = Err(CycleInFlight { generation: 0 });

        self.tx.send_if_modified(|state| match *state {
            CycleState::InFlight { generation } => {
                result = Err(CycleInFlight { generation });
                false
            }
            previous => {
                let generation = previous.generation() + 1;
                *state = CycleState::InFlight { generation };
                result = Ok(generation);
                true
            }
        });

        let generation = result?;
        tracing::debug!(generation, "Shutdown cycle started");

        Ok(Cycle {
            signal: Arc::clone(self),
            generation,
            published: false,
        })
    }

    /// Wait for the outcome of the current (or latest) cycle.
    ///
    /// Sleeps `params.delay()` first, then waits until an outcome is
    /// published or `params.deadline()` has elapsed since the call began.
    /// Publishing wakes waiters directly, so no polling happens here.
    pub async fn wait(
        &self,
        params: &ShutdownParameters,
        cancel: &CancellationToken,
    ) -> Result<DrainOutcome, WaitError> {
        let started = Instant::now();
        let mut rx = self.tx.subscribe();

        if !params.delay().is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                _ = time::sleep(params.delay()) => {}
            }
        }

        loop {
            let state = *rx.borrow_and_update();
            if let CycleState::Complete { generation, outcome } = state {
                tracing::debug!(generation, %outcome, "Waiter observed shutdown outcome");
                return Ok(outcome);
            }

            let remaining = params.deadline().saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(WaitError::Timeout {
                    waited: started.elapsed(),
                });
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                _ = time::sleep(remaining) => {}
                changed = rx.changed() => {
                    if changed.is_err() {
                        return Err(WaitError::Cancelled);
                    }
                }
            }
        }
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one in-flight cycle.
///
/// Publishing consumes the handle, so each cycle reports exactly once.
/// A handle dropped without publishing reports [`DrainOutcome::Failure`].
#[derive(Debug)]
pub struct Cycle {
    signal: Arc<CompletionSignal>,
    generation: u64,
    published: bool,
}

impl Cycle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Publish the outcome and wake every waiter.
    pub fn publish(mut self, outcome: DrainOutcome) {
        self.store(outcome);
    }

    fn store(&mut self, outcome: DrainOutcome) {
        self.published = true;
        let generation = self.generation;
        self.signal
            .tx
            .send_modify(|state| *state = CycleState::Complete { generation, outcome });
        tracing::info!(generation, %outcome, "Shutdown outcome published");
    }
}

impl Drop for Cycle {
    fn drop(&mut self) {
        if !self.published {
            tracing::warn!(generation = self.generation, "Shutdown cycle abandoned without an outcome");
            self.store(DrainOutcome::Failure);
        }
    }
}
