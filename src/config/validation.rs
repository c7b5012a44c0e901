//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, known schemes, parseable addresses)
//! - Check the default drain timing satisfies the deadline invariant
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SidecarConfig → Result<(), Vec<ValidationError>>
//! - Runs after file and flag layers are merged, before anything starts

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SidecarConfig;
use crate::lifecycle::ParamsError;

/// One semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("admin.scheme must be \"http\" or \"https\", got {0:?}")]
    AdminScheme(String),

    #[error("admin.host must not be empty")]
    AdminHost,

    #[error("admin address is not a valid URL: {0}")]
    AdminAddress(String),

    #[error("admin.timeout_secs must be greater than 0")]
    AdminTimeout,

    #[error("default drain timing is inconsistent: {0}")]
    DrainTiming(ParamsError),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Check a merged configuration.
pub fn validate_config(config: &SidecarConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let admin = &config.admin;
    if admin.scheme != "http" && admin.scheme != "https" {
        errors.push(ValidationError::AdminScheme(admin.scheme.clone()));
    }
    if admin.host.trim().is_empty() {
        errors.push(ValidationError::AdminHost);
    } else if let Err(e) = admin.base_url() {
        errors.push(ValidationError::AdminAddress(e.to_string()));
    }
    if admin.timeout_secs == 0 {
        errors.push(ValidationError::AdminTimeout);
    }

    if let Err(e) = config.drain.parameters() {
        errors.push(ValidationError::DrainTiming(e));
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&SidecarConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = SidecarConfig::default();
        config.admin.scheme = "ftp".to_string();
        config.admin.timeout_secs = 0;
        config.drain.initial_delay_secs = 5;
        config.drain.check_period_secs = 5;
        config.drain.check_deadline_secs = 9;
        config.observability.metrics_address = Some("not-an-addr".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::AdminScheme("ftp".to_string())));
        assert!(errors.contains(&ValidationError::AdminTimeout));
        assert!(errors.contains(&ValidationError::DrainTiming(ParamsError::DeadlineTooShort {
            delay: 5,
            period: 5,
            deadline: 9,
        })));
        assert!(errors.contains(&ValidationError::MetricsAddress("not-an-addr".to_string())));
    }

    #[test]
    fn empty_admin_host_is_rejected() {
        let mut config = SidecarConfig::default();
        config.admin.host = " ".to_string();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::AdminHost]));
    }
}
