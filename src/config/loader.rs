//! Configuration loading from disk and flags.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::args::Args;
use crate::config::schema::SidecarConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<SidecarConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SidecarConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Resolve the effective configuration: defaults, then file, then flags.
pub fn resolve(args: &Args) -> Result<SidecarConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => SidecarConfig::default(),
    };

    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_valid_file() {
        let file = write_config(
            r#"
            [listener]
            port = 9100

            [drain]
            check_period_secs = 2
            check_deadline_secs = 60
            "#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.port, 9100);
        assert_eq!(config.drain.check_period_secs, 2);
        assert_eq!(config.drain.check_deadline_secs, 60);
    }

    #[test]
    fn rejects_inconsistent_file() {
        let file = write_config(
            r#"
            [drain]
            initial_delay_secs = 10
            check_period_secs = 10
            check_deadline_secs = 5
            "#,
        );

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().starts_with("validation failed: default drain timing"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_config(Path::new("/nonexistent/sidecar.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let file = write_config("[admin\nport = ");
        assert!(matches!(read_config(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn flags_override_file() {
        let file = write_config(
            r#"
            [admin]
            host = "envoy"
            port = 15000

            [drain]
            check_deadline_secs = 120
            "#,
        );
        let path = file.path().to_str().unwrap().to_string();

        let args = Args::try_parse_from([
            "envoy-drain-sidecar",
            "--config",
            path.as_str(),
            "--envoy-admin-port",
            "9902",
            "--force",
        ])
        .unwrap();

        let config = resolve(&args).unwrap();
        assert_eq!(config.admin.host, "envoy");
        assert_eq!(config.admin.port, 9902);
        assert_eq!(config.drain.check_deadline_secs, 120);
        assert!(config.drain.force);
    }

    #[test]
    fn flags_are_validated_after_merge() {
        let args = Args::try_parse_from([
            "envoy-drain-sidecar",
            "--check-period-seconds",
            "400",
        ])
        .unwrap();

        assert!(matches!(resolve(&args), Err(ConfigError::Validation(_))));
    }
}
