//! Command-line flags.
//!
//! Every flag is optional and also readable from an environment
//! variable; only flags that are present override the file or defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{LogFormat, SidecarConfig};

#[derive(Debug, Clone, Parser)]
#[command(name = "envoy-drain-sidecar", version)]
#[command(about = "Coordinates graceful shutdown of an Envoy proxy through its admin interface", long_about = None)]
pub struct Args {
    /// TOML configuration file
    #[arg(long, env = "SIDECAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on [default: 9001]
    #[arg(long = "shutdown-handler-port", env = "SHUTDOWN_HANDLER_PORT")]
    pub port: Option<u16>,

    /// Envoy admin interface host [default: localhost]
    #[arg(long = "envoy-admin-host", env = "ENVOY_ADMIN_HOST")]
    pub admin_host: Option<String>,

    /// Envoy admin interface port [default: 9901]
    #[arg(long = "envoy-admin-port", env = "ENVOY_ADMIN_PORT")]
    pub admin_port: Option<u16>,

    /// Envoy admin interface HTTP/S scheme [default: http]
    #[arg(long = "envoy-admin-scheme", env = "ENVOY_ADMIN_SCHEME")]
    pub admin_scheme: Option<String>,

    /// Timeout in seconds for each envoy admin request [default: 5]
    #[arg(long = "admin-timeout-seconds", env = "ENVOY_ADMIN_TIMEOUT_SECONDS")]
    pub admin_timeout: Option<u64>,

    /// Delay in seconds before starting shutdown [default: 0]
    #[arg(long = "initial-delay-seconds", env = "INITIAL_DELAY_SECONDS")]
    pub delay: Option<u64>,

    /// Period in seconds to pause while checking for active connections [default: 5]
    #[arg(long = "check-period-seconds", env = "CHECK_PERIOD_SECONDS")]
    pub period: Option<u64>,

    /// Deadline in seconds to wait for active connections to close [default: 300]
    #[arg(long = "check-deadline-seconds", env = "CHECK_DEADLINE_SECONDS")]
    pub deadline: Option<u64>,

    /// Force shutdown when active connections are drained
    #[arg(long, env = "FORCE_SHUTDOWN")]
    pub force: bool,

    /// Prometheus exporter address, e.g. 0.0.0.0:9102
    #[arg(long = "metrics-address", env = "METRICS_ADDRESS")]
    pub metrics_address: Option<String>,

    /// Log output format
    #[arg(long = "log-format", env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Args {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut SidecarConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(host) = &self.admin_host {
            config.admin.host = host.clone();
        }
        if let Some(port) = self.admin_port {
            config.admin.port = port;
        }
        if let Some(scheme) = &self.admin_scheme {
            config.admin.scheme = scheme.clone();
        }
        if let Some(timeout) = self.admin_timeout {
            config.admin.timeout_secs = timeout;
        }
        if let Some(delay) = self.delay {
            config.drain.initial_delay_secs = delay;
        }
        if let Some(period) = self.period {
            config.drain.check_period_secs = period;
        }
        if let Some(deadline) = self.deadline {
            config.drain.check_deadline_secs = deadline;
        }
        if self.force {
            config.drain.force = true;
        }
        if let Some(addr) = &self.metrics_address {
            config.observability.metrics_address = Some(addr.clone());
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_leave_config_untouched() {
        let args = Args::try_parse_from(["envoy-drain-sidecar"]).unwrap();
        let mut config = SidecarConfig::default();
        args.apply(&mut config);
        assert_eq!(config, SidecarConfig::default());
    }

    #[test]
    fn long_flags_apply_to_config() {
        let args = Args::try_parse_from([
            "envoy-drain-sidecar",
            "--shutdown-handler-port",
            "9100",
            "--envoy-admin-host",
            "10.0.0.1",
            "--envoy-admin-scheme",
            "https",
            "--initial-delay-seconds",
            "3",
            "--check-period-seconds",
            "1",
            "--check-deadline-seconds",
            "30",
            "--log-format",
            "json",
        ])
        .unwrap();

        let mut config = SidecarConfig::default();
        args.apply(&mut config);

        assert_eq!(config.listener.port, 9100);
        assert_eq!(config.admin.host, "10.0.0.1");
        assert_eq!(config.admin.scheme, "https");
        assert_eq!(config.drain.initial_delay_secs, 3);
        assert_eq!(config.drain.check_period_secs, 1);
        assert_eq!(config.drain.check_deadline_secs, 30);
        assert!(!config.drain.force);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn negative_seconds_are_rejected() {
        let result = Args::try_parse_from(["envoy-drain-sidecar", "--check-deadline-seconds", "-5"]);
        assert!(result.is_err());
    }
}
