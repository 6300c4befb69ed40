//! Lifecycle error kinds.
//!
//! None of these are retried. `Serve` is reported while the service keeps
//! running; the others end the process lifetime.

use std::time::Duration;

use tokio::task::JoinError;

use crate::net::ListenerError;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The listener could not start.
    #[error("failed to start listener: {0}")]
    Bind(#[source] ListenerError),
    /// The accept loop failed for a reason other than being told to stop.
    #[error("unexpected server error: {0}")]
    Serve(#[source] ListenerError),
    /// The grace period elapsed with connections still open.
    #[error(
        "drain did not finish within {grace:?}; {open_connections} connection(s) forcibly closed"
    )]
    DrainTimeout {
        grace: Duration,
        open_connections: u64,
    },
    /// Stopping the listener failed in some other way.
    #[error("listener shutdown failed: {0}")]
    Shutdown(#[source] JoinError),
    /// Termination signal handlers could not be registered.
    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

impl LifecycleError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleError::Bind(_) => "bind_failure",
            LifecycleError::Serve(_) => "serve_failure",
            LifecycleError::DrainTimeout { .. } => "drain_timeout",
            LifecycleError::Shutdown(_) => "shutdown_failure",
            LifecycleError::Signal(_) => "signal_failure",
        }
    }
}
