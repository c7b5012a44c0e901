//! Envoy drain sidecar library.
//!
//! Fails an Envoy proxy's health checks, drains its listeners through
//! the admin interface, and reports the outcome to any number of
//! waiting callers.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::SidecarConfig;
pub use http::HttpServer;
pub use lifecycle::{DrainCoordinator, DrainOutcome, Shutdown};
