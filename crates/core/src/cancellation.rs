//! A cooperative cancellation signal shared by long-running operations
//! (all-paths, betweenness, import/export — spec §5 "Cancellation &
//! timeouts"). Checked at named yield points, roughly every 100 iterations
//! by convention, independent of whatever concurrency primitive drives the
//! caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
