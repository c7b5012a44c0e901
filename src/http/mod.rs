//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, tracing span)
//!     → query.rs (timing overrides → ShutdownParameters)
//!     → handlers.rs (health, stats, shutdown, waitforshutdown)
//!     → response.rs (map outcomes and errors to status lines)
//! ```

pub mod handlers;
pub mod query;
pub mod request;
pub mod response;
pub mod server;

pub use query::TimingQuery;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{build_router, AppState, HttpServer};
