//! Shutdown primitives: the one-shot gate and the drain deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// One-shot gate for shutdown.
///
/// Fires at most once. Any number of tasks can await it, including tasks
/// that start waiting after it fired.
#[derive(Debug, Clone)]
pub struct ShutdownGate {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownGate {
    /// Create a gate that has not fired.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the gate. Returns `true` only for the call that actually fired it.
    pub fn fire(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the gate has fired.
    pub async fn fired(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for ShutdownGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Point in time by which draining must finish.
///
/// Computed once when shutdown starts and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownDeadline {
    initiated_at: Instant,
    grace: Duration,
}

impl ShutdownDeadline {
    /// Deadline for a shutdown initiated now.
    pub fn starting_now(grace: Duration) -> Self {
        Self {
            initiated_at: Instant::now(),
            grace,
        }
    }

    pub fn initiated_at(&self) -> Instant {
        self.initiated_at
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// The deadline itself.
    pub fn instant(&self) -> Instant {
        self.initiated_at + self.grace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_exactly_once() {
        let gate = ShutdownGate::new();
        assert!(!gate.is_fired());

        assert!(gate.fire());
        assert!(!gate.fire());
        assert!(!gate.clone().fire());
        assert!(gate.is_fired());
    }

    #[tokio::test]
    async fn wakes_every_waiter() {
        let gate = ShutdownGate::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.fired().await })
            })
            .collect();

        tokio::task::yield_now().await;
        gate.fire();

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter not woken")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn late_waiter_sees_fired_gate() {
        let gate = ShutdownGate::new();
        gate.fire();
        tokio::time::timeout(Duration::from_millis(100), gate.fired())
            .await
            .expect("fired gate must resolve immediately");
    }

    #[tokio::test]
    async fn unfired_gate_keeps_waiting() {
        let gate = ShutdownGate::new();
        let result = tokio::time::timeout(Duration::from_millis(50), gate.fired()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_is_fixed_at_creation() {
        let started = Instant::now();
        let deadline = ShutdownDeadline::starting_now(Duration::from_secs(20));
        assert_eq!(deadline.initiated_at(), started);
        assert_eq!(deadline.instant(), started + Duration::from_secs(20));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(deadline.instant(), started + Duration::from_secs(20));
        assert_eq!(deadline.grace(), Duration::from_secs(20));
    }
}
