//! The lifecycle coordinator.
//!
//! # States
//! ```text
//! STARTING → RUNNING → DRAINING → STOPPED
//!     │                   │
//!     └──────→ FAILED ←───┘
//! ```
//!
//! - STARTING → RUNNING: listener bound and accepting on its own task
//! - STARTING → FAILED: bind failed; no signal wait happens
//! - RUNNING → DRAINING: the shutdown gate fired (first signal only)
//! - DRAINING → STOPPED: every connection closed before the deadline
//! - DRAINING → FAILED: deadline elapsed, or stopping the listener failed
//!
//! Accept loop failures while RUNNING are reported and change nothing.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::config::ServiceConfig;
use crate::http::ServerHandle;
use crate::lifecycle::{
    signals, startup, LifecycleError, ShutdownDeadline, ShutdownGate, TerminationSignals,
};
use crate::observability::metrics;
use crate::worker::Worker;

/// Observable phase of a service lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    Draining,
    Stopped,
    Failed,
}

impl LifecycleState {
    /// Whether no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Stopped | LifecycleState::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn transition(state: &watch::Sender<LifecycleState>, next: LifecycleState) {
    let previous = state.send_replace(next);
    tracing::debug!(from = %previous, to = %next, "Lifecycle transition");
}

/// Owns one service lifetime: start, wait for shutdown, drain, stop.
pub struct Coordinator<W> {
    config: ServiceConfig,
    worker: W,
    trigger: ShutdownGate,
    state: watch::Sender<LifecycleState>,
}

impl<W: Worker> Coordinator<W> {
    pub fn new(config: ServiceConfig, worker: W) -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            config,
            worker,
            trigger: ShutdownGate::new(),
            state,
        }
    }

    /// Gate that initiates shutdown when fired.
    pub fn trigger(&self) -> ShutdownGate {
        self.trigger.clone()
    }

    /// Observe lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Bind the listener and start serving.
    pub async fn start(self) -> Result<RunningService, LifecycleError> {
        let (serve_errors_tx, serve_errors) = mpsc::unbounded_channel();

        match startup::start_server(&self.config.listener, self.worker, serve_errors_tx).await {
            Ok(server) => {
                transition(&self.state, LifecycleState::Running);
                Ok(RunningService {
                    server,
                    trigger: self.trigger,
                    state: self.state,
                    grace: self.config.shutdown.grace_period(),
                    serve_errors,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "Startup failed");
                transition(&self.state, LifecycleState::Failed);
                Err(e)
            }
        }
    }

    /// Run a full lifetime driven by OS termination signals.
    pub async fn run(self) -> Result<(), LifecycleError> {
        // Handlers go in before binding so an early signal is not lost.
        let signals = match TerminationSignals::install() {
            Ok(signals) => signals,
            Err(e) => {
                let e = LifecycleError::Signal(e);
                tracing::error!(error = %e, "Startup failed");
                transition(&self.state, LifecycleState::Failed);
                return Err(e);
            }
        };
        let relay = tokio::spawn(signals::relay(signals, self.trigger.clone()));

        let result = match self.start().await {
            Ok(running) => running.wait_for_shutdown().await,
            Err(e) => Err(e),
        };

        relay.abort();
        result
    }
}

/// A started service waiting for its shutdown trigger.
pub struct RunningService {
    server: ServerHandle,
    trigger: ShutdownGate,
    state: watch::Sender<LifecycleState>,
    grace: Duration,
    serve_errors: mpsc::UnboundedReceiver<LifecycleError>,
}

impl RunningService {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    pub fn trigger(&self) -> ShutdownGate {
        self.trigger.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Wait for the trigger, then drain within the grace period.
    pub async fn wait_for_shutdown(mut self) -> Result<(), LifecycleError> {
        tracing::info!(address = %self.server.local_addr(), "Waiting for termination signal");

        loop {
            tokio::select! {
                biased;
                _ = self.trigger.fired() => break,
                Some(e) = self.serve_errors.recv() => {
                    tracing::error!(error = %e, "Unexpected server error");
                }
            }
        }
        tracing::info!("Shutdown trigger observed, stopping listener");

        let deadline = ShutdownDeadline::starting_now(self.grace);
        transition(&self.state, LifecycleState::Draining);
        tracing::info!(
            grace_period_ms = self.grace.as_millis() as u64,
            open_connections = self.server.open_connections(),
            "Shutdown initiated, draining in-flight requests"
        );

        let result = self.server.shutdown(deadline).await;
        let elapsed = deadline.initiated_at().elapsed();

        match &result {
            Ok(()) => {
                transition(&self.state, LifecycleState::Stopped);
                metrics::record_shutdown("stopped", elapsed);
                tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "Drain complete");
            }
            Err(e) => {
                transition(&self.state, LifecycleState::Failed);
                metrics::record_shutdown(e.kind(), elapsed);
                tracing::error!(error = %e, "Shutdown error");
            }
        }

        tracing::info!("Service closed");
        result
    }
}
