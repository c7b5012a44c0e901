//! Timing overrides carried in request query strings.

use serde::Deserialize;

use crate::config::DrainConfig;
use crate::lifecycle::params::{parse_seconds, ParamsError, ShutdownParameters};

/// `?delay=&period=&deadline=`, all optional, in seconds.
///
/// Values stay raw strings so that empty, negative and non-numeric
/// inputs can be told apart and reported precisely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimingQuery {
    pub delay: Option<String>,
    pub period: Option<String>,
    pub deadline: Option<String>,
}

impl TimingQuery {
    /// Merge with `defaults` field by field and validate the result.
    pub fn resolve(&self, defaults: &DrainConfig) -> Result<ShutdownParameters, ParamsError> {
        let delay = parse_seconds("delay", self.delay.as_deref(), defaults.initial_delay_secs)?;
        let period = parse_seconds("period", self.period.as_deref(), defaults.check_period_secs)?;
        let deadline = parse_seconds("deadline", self.deadline.as_deref(), defaults.check_deadline_secs)?;

        ShutdownParameters::from_secs(delay, period, deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn query(delay: Option<&str>, period: Option<&str>, deadline: Option<&str>) -> TimingQuery {
        TimingQuery {
            delay: delay.map(String::from),
            period: period.map(String::from),
            deadline: deadline.map(String::from),
        }
    }

    #[test]
    fn empty_query_uses_defaults() {
        let params = TimingQuery::default().resolve(&DrainConfig::default()).unwrap();
        assert_eq!(params.delay(), Duration::ZERO);
        assert_eq!(params.period(), Duration::from_secs(5));
        assert_eq!(params.deadline(), Duration::from_secs(300));
    }

    #[test]
    fn fields_override_individually() {
        let params = query(Some("2"), Some(""), Some("20"))
            .resolve(&DrainConfig::default())
            .unwrap();
        assert_eq!(params.delay(), Duration::from_secs(2));
        assert_eq!(params.period(), Duration::from_secs(5));
        assert_eq!(params.deadline(), Duration::from_secs(20));
    }

    #[test]
    fn merged_values_must_be_consistent() {
        let err = query(None, None, Some("4"))
            .resolve(&DrainConfig::default())
            .unwrap_err();
        assert!(matches!(err, ParamsError::DeadlineTooShort { deadline: 4, .. }));
    }

    #[test]
    fn negative_override_is_rejected() {
        let err = query(Some("-3"), None, None)
            .resolve(&DrainConfig::default())
            .unwrap_err();
        assert_eq!(err, ParamsError::Negative { name: "delay", value: -3 });
    }
}
