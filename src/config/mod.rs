//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → command-line flags / environment (args.rs)
//!     → validation.rs (semantic checks)
//!     → SidecarConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow running with no file and no flags
//! - Validation separates syntactic (serde/clap) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::Args;
pub use loader::{load_config, resolve, ConfigError};
pub use schema::{AdminConfig, DrainConfig, ListenerConfig, LogFormat, ObservabilityConfig, SidecarConfig};
pub use validation::{validate_config, ValidationError};
