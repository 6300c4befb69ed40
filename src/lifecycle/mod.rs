//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind listener → Spawn accept loop                    STARTING → RUNNING
//!
//! Signals (signals.rs):
//!     SIGINT/SIGHUP/SIGTERM → Fire the shutdown gate (first one wins)
//!
//! Coordinator (coordinator.rs):
//!     Gate fired → Compute deadline → Stop accepting       RUNNING → DRAINING
//!     → Drain connections until deadline                   DRAINING → STOPPED | FAILED
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has one hard deadline; a drain that misses it is an error
//! - Gates and state live in the coordinator value, never in globals

pub mod coordinator;
pub mod error;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use coordinator::{Coordinator, LifecycleState, RunningService};
pub use error::LifecycleError;
pub use shutdown::{ShutdownDeadline, ShutdownGate};
pub use signals::{TerminationSignal, TerminationSignals};
