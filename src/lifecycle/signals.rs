//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGINT, SIGHUP, SIGTERM)
//! - Translate every one of them into the same shutdown request
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The first signal fires the gate; repeats are logged and absorbed
//! - Handlers stay registered, so repeats never fall back to the default
//!   action of killing the process

use std::fmt;
use std::io;

use crate::lifecycle::ShutdownGate;

/// A signal that requests termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Hangup,
    Terminate,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Hangup => "SIGHUP",
            TerminationSignal::Terminate => "SIGTERM",
        };
        f.write_str(name)
    }
}

/// Registered handlers for every termination signal.
#[derive(Debug)]
pub struct TerminationSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    hangup: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl TerminationSignals {
    /// Register the handlers. Must be called from within a Tokio runtime.
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            hangup: signal(SignalKind::hangup())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next termination signal.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> TerminationSignal {
        tokio::select! {
            Some(()) = self.interrupt.recv() => TerminationSignal::Interrupt,
            Some(()) = self.hangup.recv() => TerminationSignal::Hangup,
            Some(()) = self.terminate.recv() => TerminationSignal::Terminate,
            else => std::future::pending().await,
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> TerminationSignal {
        match tokio::signal::ctrl_c().await {
            Ok(()) => TerminationSignal::Interrupt,
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending().await
            }
        }
    }
}

/// Fire `gate` on every termination signal. Runs until aborted.
pub async fn relay(mut signals: TerminationSignals, gate: ShutdownGate) {
    loop {
        let signal = signals.recv().await;
        if gate.fire() {
            tracing::info!(signal = %signal, "Termination signal received");
        } else {
            tracing::warn!(signal = %signal, "Shutdown already in progress, ignoring signal");
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Returns false when no `kill` binary is available.
    fn send_hangup_to_self() -> bool {
        std::process::Command::new("kill")
            .args(["-HUP", &std::process::id().to_string()])
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn repeated_signals_fire_gate_once() {
        let signals = TerminationSignals::install().unwrap();
        let gate = ShutdownGate::new();
        let relay = tokio::spawn(relay(signals, gate.clone()));

        if !send_hangup_to_self() {
            relay.abort();
            return;
        }
        tokio::time::timeout(Duration::from_secs(5), gate.fired())
            .await
            .expect("SIGHUP should fire the gate");

        assert!(send_hangup_to_self());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!relay.is_finished(), "relay keeps absorbing signals");
        assert!(!gate.fire(), "gate stays fired");

        relay.abort();
    }

    #[test]
    fn signal_names() {
        assert_eq!(TerminationSignal::Hangup.to_string(), "SIGHUP");
        assert_eq!(TerminationSignal::Terminate.to_string(), "SIGTERM");
    }
}
