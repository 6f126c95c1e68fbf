//! Batched processing with per-item timeouts and throttled progress
//! reporting (spec §4.Q "Batched processing").

use kgraph_core::Error;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// One progress update: how many of `total` items have been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressReport {
    pub processed: usize,
    pub total: usize,
}

/// Wraps a progress callback so it fires at most once per `min_interval`,
/// except the final report (`processed == total`), which always fires.
pub struct ThrottledProgress<F: FnMut(ProgressReport)> {
    callback: F,
    min_interval: Duration,
    last: Option<Instant>,
}

impl<F: FnMut(ProgressReport)> ThrottledProgress<F> {
    pub fn new(callback: F, min_interval: Duration) -> Self {
        ThrottledProgress { callback, min_interval, last: None }
    }

    pub fn report(&mut self, processed: usize, total: usize) {
        let now = Instant::now();
        let due = processed == total
            || match self.last {
                None => true,
                Some(last) => now.duration_since(last) >= self.min_interval,
            };
        if due {
            (self.callback)(ProgressReport { processed, total });
            self.last = Some(now);
        }
    }
}

/// Runs `op` over `items` in chunks of `batch_size`, applying `per_item_timeout`
/// to each call and reporting throttled progress after each item. Per-item
/// failures (including timeout) are captured in the result vector rather
/// than aborting the batch — callers decide whether any failure is fatal.
/// Yields to the runtime at each batch boundary so a large job does not
/// monopolise a worker thread.
pub async fn process_in_batches<T, F, Fut, R>(
    items: Vec<T>,
    batch_size: usize,
    per_item_timeout: Duration,
    op: F,
    mut progress: Option<ThrottledProgress<impl FnMut(ProgressReport)>>,
) -> Vec<Result<R, Error>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    let chunk_size = batch_size.max(1);

    for (i, item) in items.into_iter().enumerate() {
        let outcome = match tokio::time::timeout(per_item_timeout, op(item)).await {
            Ok(value) => Ok(value),
            Err(_) => Err(Error::OperationCancelled),
        };
        results.push(outcome);
        if let Some(p) = progress.as_mut() {
            p.report(results.len(), total);
        }
        if (i + 1) % chunk_size == 0 {
            tokio::task::yield_now().await;
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn processes_every_item() {
        let items = vec![1, 2, 3, 4, 5];
        let results = process_in_batches(
            items,
            2,
            Duration::from_millis(100),
            |i| async move { i * 2 },
            None::<ThrottledProgress<fn(ProgressReport)>>,
        )
        .await;
        let values: Vec<i32> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![2, 4, 6, 8, 10]);
    }

    #[tokio::test]
    async fn per_item_timeout_is_enforced() {
        let items = vec![1];
        let results = process_in_batches(
            items,
            1,
            Duration::from_millis(10),
            |_| async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                "late"
            },
            None::<ThrottledProgress<fn(ProgressReport)>>,
        )
        .await;
        assert!(results[0].is_err());
    }

    #[tokio::test]
    async fn progress_reports_final_update() {
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let progress = ThrottledProgress::new(
            move |report: ProgressReport| {
                if report.processed == report.total {
                    count2.fetch_add(1, Ordering::SeqCst);
                }
            },
            Duration::from_secs(60),
        );
        let items = vec![1, 2, 3];
        let _ = process_in_batches(items, 3, Duration::from_millis(100), |i| async move { i }, Some(progress)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
