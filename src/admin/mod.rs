//! Envoy admin interface subsystem.
//!
//! # Data Flow
//! ```text
//! drain coordinator / stats handler
//!     → client.rs (AdminControl trait, reqwest-backed EnvoyAdminClient)
//!     → Envoy admin listener (/healthcheck/fail, /stats, /drain_listeners, /quitquitquit)
//!     → stats.rs (parse downstream_cx_active from the stats payload)
//! ```
//!
//! # Design Decisions
//! - The coordinator only sees the trait, so tests swap in an in-memory fake
//! - Transport, status and parse failures share one error type

pub mod client;
pub mod stats;

pub use client::{AdminControl, AdminError, AdminResult, EnvoyAdminClient};
pub use stats::{parse_downstream_cx_active, StatsParseError, DOWNSTREAM_CX_ACTIVE};
