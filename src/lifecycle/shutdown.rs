//! Shutdown coordination.
//!
//! ```text
//! Running → ShutdownRequested → Draining → Stopped
//! ```
//!
//! The coordinator waits for the shutdown signal, then asks every listener
//! unit to drain concurrently under one deadline. Units still holding
//! connections at the deadline are force-closed; that is a warning, not an
//! error.

use std::future::Future;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::sync::watch;

use crate::lifecycle::startup::Supervised;
use crate::net::listener::StopReport;

/// Drain deadline used when none is configured.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(15);

/// Where the process is in its shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Running,
    ShutdownRequested,
    Draining,
    Stopped,
}

/// Result of a completed shutdown.
#[derive(Debug)]
pub struct ShutdownReport {
    pub listeners: Vec<StopReport>,
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// True when every unit drained before the deadline and stopped cleanly.
    pub fn is_clean(&self) -> bool {
        self.listeners
            .iter()
            .all(|r| !r.forced && r.exit.is_clean())
    }
}

/// Drives the bounded graceful stop of all listener units.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    grace: Duration,
    phase: watch::Sender<ShutdownPhase>,
}

impl ShutdownCoordinator {
    pub fn new(grace: Duration) -> Self {
        let (phase, _) = watch::channel(ShutdownPhase::Running);
        Self { grace, phase }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.borrow()
    }

    /// Observe phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<ShutdownPhase> {
        self.phase.subscribe()
    }

    /// Wait for `signal`, then drain `listeners`.
    pub async fn run<S>(&self, signal: S, listeners: Supervised) -> ShutdownReport
    where
        S: Future<Output = ()>,
    {
        tracing::info!(
            listeners = listeners.listener_count(),
            grace = ?self.grace,
            "Running until shutdown is requested"
        );
        signal.await;
        self.transition(ShutdownPhase::ShutdownRequested);
        self.drain(listeners).await
    }

    /// Stop every listener unit concurrently, bounded by the grace period.
    pub async fn drain(&self, listeners: Supervised) -> ShutdownReport {
        self.transition(ShutdownPhase::Draining);
        let started = Instant::now();

        let reports = join_all(
            listeners
                .into_handles()
                .into_iter()
                .map(|handle| handle.stop(self.grace)),
        )
        .await;

        for report in &reports {
            tracing::info!(
                listener = %report.kind,
                forced = report.forced,
                clean = report.exit.is_clean(),
                elapsed = ?report.elapsed,
                "Listener drained"
            );
        }

        let elapsed = started.elapsed();
        metrics::histogram!("muxd_shutdown_seconds").record(elapsed.as_secs_f64());
        self.transition(ShutdownPhase::Stopped);

        ShutdownReport {
            listeners: reports,
            elapsed,
        }
    }

    fn transition(&self, next: ShutdownPhase) {
        let previous = self.phase.send_replace(next);
        tracing::debug!(from = ?previous, to = ?next, "Shutdown phase changed");
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}
