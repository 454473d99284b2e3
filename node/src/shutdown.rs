//! Stop signal shared by the reconcile pipeline, the announcer and the
//! status server.
//!
//! The loops hold `broadcast` receivers and `select!` on them between
//! blocks and before each sleep. A receiver created after the signal was
//! sent never sees it, so the controller also latches a flag that
//! [`ShutdownController::signalled`] consults.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal;
use tokio::sync::broadcast;

/// Cloneable handle; every clone triggers and observes the same shutdown.
#[derive(Clone)]
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Receiver for a loop that selects on shutdown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown is triggered, immediately if it already was.
    /// Suitable for axum's `with_graceful_shutdown`.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        // Subscribe before reading the flag so a concurrent trigger is seen
        // by one of the two.
        let mut rx = self.subscribe();
        let triggered = self.triggered.clone();
        async move {
            if !triggered.load(Ordering::SeqCst) {
                let _ = rx.recv().await;
            }
        }
    }

    /// Stop every loop. Calling it again is harmless.
    pub fn shutdown(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            tracing::debug!("shutdown triggered");
        }
        let _ = self.tx.send(());
    }

    /// Block until SIGINT or SIGTERM, then [`shutdown`](Self::shutdown).
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            result = signal::ctrl_c() => match result {
                Ok(()) => tracing::info!("SIGINT received, stopping warden"),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot listen for SIGINT");
                    terminate().await;
                    tracing::info!("SIGTERM received, stopping warden");
                }
            },
            _ = terminate() => tracing::info!("SIGTERM received, stopping warden"),
        }
        self.shutdown();
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn subscribers_and_clones_see_the_signal() {
        let controller = ShutdownController::new();
        let mut first = controller.subscribe();
        let mut second = controller.clone().subscribe();

        controller.clone().shutdown();

        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
        assert!(controller.is_triggered());
    }

    #[tokio::test]
    async fn signalled_resolves_on_shutdown() {
        let controller = ShutdownController::new();
        let signalled = controller.signalled();
        controller.shutdown();
        tokio::time::timeout(Duration::from_secs(1), signalled)
            .await
            .expect("signalled future resolves");
    }

    #[tokio::test]
    async fn signalled_created_after_shutdown_resolves_immediately() {
        let controller = ShutdownController::new();
        controller.shutdown();
        controller.shutdown();
        tokio::time::timeout(Duration::from_secs(1), controller.signalled())
            .await
            .expect("late signalled future resolves");
    }

    #[test]
    fn fresh_controller_is_not_triggered() {
        assert!(!ShutdownController::default().is_triggered());
    }
}
