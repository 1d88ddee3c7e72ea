//! OS signal handling.
//!
//! Only the interrupt signal (Ctrl-C / SIGINT) is observed, and only its
//! first delivery matters. A second interrupt while draining gets no special
//! treatment.

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One-shot shutdown event shared by everything that needs to observe it.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raise the signal. Returns `true` only for the call that raised it.
    pub fn trigger(&self) -> bool {
        self.tx.send_if_modified(|raised| !std::mem::replace(raised, true))
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the signal has been raised (immediately if it already was).
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|raised| *raised).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Raise `signal` when the process receives an interrupt.
///
/// Call this before starting listeners. If the handler cannot be installed
/// the signal is raised at once, so nothing waits on an interrupt that can
/// never be delivered, and the task resolves to the install error.
pub fn forward_interrupt(signal: ShutdownSignal) -> JoinHandle<io::Result<()>> {
    tokio::spawn(forward(signal, tokio::signal::ctrl_c()))
}

async fn forward<F>(signal: ShutdownSignal, interrupt: F) -> io::Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    match interrupt.await {
        Ok(()) => {
            tracing::info!("Interrupt received");
            signal.trigger();
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install interrupt handler, shutting down");
            signal.trigger();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn first_trigger_wins() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
        assert!(signal.trigger());
        assert!(!signal.trigger());
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn waiters_observe_trigger() {
        let signal = ShutdownSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        // Late waiters return immediately.
        tokio::time::timeout(Duration::from_millis(50), signal.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn interrupt_raises_signal() {
        let signal = ShutdownSignal::new();
        forward(signal.clone(), async { Ok(()) }).await.unwrap();
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn install_failure_raises_signal_and_reports() {
        let signal = ShutdownSignal::new();
        let err = forward(signal.clone(), async {
            Err(io::Error::other("no signal handler"))
        })
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "no signal handler");
        assert!(signal.is_triggered());
    }
}
