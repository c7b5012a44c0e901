//! Timing parameters for one shutdown or wait request.
//!
//! Every request may override the process defaults field by field; the
//! merged values are validated once and are immutable afterwards.

use std::time::Duration;
use thiserror::Error;

/// Validated timing for a drain sequence or a waiter.
///
/// Invariant: `deadline >= delay + period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownParameters {
    delay: Duration,
    period: Duration,
    deadline: Duration,
}

/// Rejected timing parameters. Maps to `400 Bad Request`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    /// Value is not an integer at all.
    #[error("{name} must be an integer number of seconds, got {value:?}")]
    NotAnInteger { name: &'static str, value: String },

    /// Value parsed but is below zero.
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: i64 },

    /// The deadline leaves no room for the delay plus one poll period.
    #[error("deadline ({deadline}s) must be at least delay ({delay}s) + period ({period}s)")]
    DeadlineTooShort { delay: u64, period: u64, deadline: u64 },
}

impl ShutdownParameters {
    /// Build parameters from whole seconds, enforcing the deadline invariant.
    pub fn from_secs(delay: u64, period: u64, deadline: u64) -> Result<Self, ParamsError> {
        if deadline < delay.saturating_add(period) {
            return Err(ParamsError::DeadlineTooShort {
                delay,
                period,
                deadline,
            });
        }

        Ok(Self {
            delay: Duration::from_secs(delay),
            period: Duration::from_secs(period),
            deadline: Duration::from_secs(deadline),
        })
    }

    /// Pause after failing health checks (coordinator) or before the first look (waiter).
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep between connection-count polls.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Upper bound on the whole sequence, measured from its start.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Parse one optional query value, in seconds.
///
/// `None` and blank strings fall back to `default`.
pub fn parse_seconds(name: &'static str, raw: Option<&str>, default: u64) -> Result<u64, ParamsError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(raw) => raw,
    };

    let value: i64 = raw.parse().map_err(|_| ParamsError::NotAnInteger {
        name,
        value: raw.to_string(),
    })?;

    u64::try_from(value).map_err(|_| ParamsError::Negative { name, value })
}
