//! Debounce/throttle helpers (spec §4.Q).
//!
//! Throttle gates calls to at most once per interval; debounce delays a call
//! until no further calls arrive within the quiet window, superseding any
//! call still pending when a new one comes in.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Allows at most one call per `interval`; calls inside the window are
/// silently dropped (the caller checks the return value to know which).
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Throttle { interval, last: Mutex::new(None) }
    }

    /// Returns `true` if this call is allowed to proceed right now.
    pub fn try_call(&self) -> bool {
        let now = Instant::now();
        let mut last = self.last.lock();
        let allowed = match *last {
            None => true,
            Some(prev) => now.duration_since(prev) >= self.interval,
        };
        if allowed {
            *last = Some(now);
        }
        allowed
    }
}

/// Delays execution of the latest call by `delay`; a call that arrives
/// before the delay elapses supersedes the pending one (classic trailing-
/// edge debounce).
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer { delay, generation: Arc::new(AtomicU64::new(0)) }
    }

    /// Schedules `task` to run after the quiet window, unless another call
    /// supersedes it first.
    pub fn call<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.generation.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == my_generation {
                task().await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn throttle_allows_first_call_then_blocks() {
        let t = Throttle::new(Duration::from_secs(60));
        assert!(t.try_call());
        assert!(!t.try_call());
    }

    #[tokio::test]
    async fn debounce_only_runs_latest_call() {
        let counter = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new(Duration::from_millis(20));

        for _ in 0..5 {
            let c = counter.clone();
            debouncer.call(move || async move {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
