//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! POST /shutdown:
//!     params.rs (validate timing) → drain.rs (run sequence against envoy admin)
//!     → signal.rs (publish outcome for the cycle)
//!
//! GET /waitforshutdown:
//!     params.rs (validate timing) → signal.rs (wait for the published outcome)
//!
//! SIGTERM/SIGINT (signals.rs):
//!     → shutdown.rs (cancel every suspended request, stop the server)
//! ```
//!
//! # Design Decisions
//! - One drain cycle at a time; overlapping requests are rejected
//! - Outcomes are broadcast to all waiters, never consumed
//! - Every sleep races a cancellation token

pub mod drain;
pub mod params;
pub mod shutdown;
pub mod signal;
pub mod signals;

pub use drain::{Completion, DrainCoordinator, DrainError, DrainPhase, ShutdownError};
pub use params::{ParamsError, ShutdownParameters};
pub use shutdown::Shutdown;
pub use signal::{CompletionSignal, Cycle, CycleInFlight, CycleState, DrainOutcome, WaitError};
