//! Nullable clock: records sleeps instead of waiting.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use warden_utils::Clock;

/// A clock whose `sleep` returns immediately.
///
/// Every requested duration is recorded so tests can assert on rate-limit
/// waits and backoffs without real time passing. Sleeping still yields to
/// the runtime so other tasks make progress.
#[derive(Debug, Default)]
pub struct NullClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl NullClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requested sleeps, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The most recent sleep, if any.
    pub fn last_sleep(&self) -> Option<Duration> {
        self.sleeps().last().copied()
    }

    /// Sum of all requested sleeps.
    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }

    /// Clear recorded sleeps.
    pub fn reset(&self) {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[async_trait]
impl Clock for NullClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sleeps_in_order() {
        let clock = NullClock::new();
        clock.sleep(Duration::from_secs(5)).await;
        clock.sleep(Duration::from_secs(360)).await;
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(5), Duration::from_secs(360)]
        );
        assert_eq!(clock.last_sleep(), Some(Duration::from_secs(360)));
        assert_eq!(clock.total_slept(), Duration::from_secs(365));
    }

    #[tokio::test]
    async fn reset_clears() {
        let clock = NullClock::new();
        clock.sleep(Duration::from_millis(1)).await;
        clock.reset();
        assert!(clock.sleeps().is_empty());
    }
}
