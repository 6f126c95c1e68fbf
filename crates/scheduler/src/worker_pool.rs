//! Process-wide worker pool (spec §4.Q, §4.S): a priority-ordered dispatch
//! loop over [`PriorityQueue`], bounded concurrency via a semaphore, per-task
//! timeouts, and pending-only cancellation (a task already running cannot be
//! interrupted, only one still queued can be skipped before it starts).
//!
//! `submit` only accepts real Rust closures/futures — there is no code-path
//! that evaluates a string as a task, so the "refuse non-function inputs"
//! requirement on schedulable work is enforced by the type system rather
//! than a runtime check.

use once_cell::sync::OnceCell;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify, Semaphore};

use crate::priority::Priority;
use crate::queue::PriorityQueue;

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The outcome of a submitted task, distinguishing a clean result from the
/// three ways scheduling can fail to produce one.
#[derive(Debug)]
pub enum TaskOutcome<T> {
    Completed(T),
    TimedOut,
    Cancelled,
}

impl<T> TaskOutcome<T> {
    pub fn into_result(self) -> Result<T, kgraph_core::Error> {
        match self {
            TaskOutcome::Completed(v) => Ok(v),
            TaskOutcome::TimedOut => Err(kgraph_core::Error::OperationCancelled),
            TaskOutcome::Cancelled => Err(kgraph_core::Error::OperationCancelled),
        }
    }
}

struct QueueItem {
    cancel_flag: Arc<AtomicBool>,
    run: Box<dyn FnOnce() -> BoxFuture + Send>,
}

/// A handle to a submitted task: lets the caller cancel it (if it hasn't
/// started) and await its outcome.
pub struct TaskHandle<T> {
    cancel_flag: Arc<AtomicBool>,
    receiver: oneshot::Receiver<TaskOutcome<T>>,
}

impl<T> TaskHandle<T> {
    /// Marks the task as cancelled. Has no effect if the task has already
    /// started running (pending-only cancellation, per spec §5).
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    pub async fn join(self) -> TaskOutcome<T> {
        self.receiver.await.unwrap_or(TaskOutcome::Cancelled)
    }
}

pub struct WorkerPool {
    queue: Arc<PriorityQueue<QueueItem>>,
    semaphore: Arc<Semaphore>,
    notify: Arc<Notify>,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Arc<Self> {
        let pool = Arc::new(WorkerPool {
            queue: Arc::new(PriorityQueue::new()),
            semaphore: Arc::new(Semaphore::new(max_workers.max(1))),
            notify: Arc::new(Notify::new()),
        });
        let dispatcher = pool.clone();
        tokio::spawn(async move { dispatcher.dispatch_loop().await });
        pool
    }

    async fn dispatch_loop(self: Arc<Self>) {
        loop {
            let item = loop {
                if let Some(item) = self.queue.pop() {
                    break item;
                }
                self.notify.notified().await;
            };
            if item.cancel_flag.load(Ordering::SeqCst) {
                continue;
            }
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => return,
            };
            tokio::spawn(async move {
                (item.run)().await;
                drop(permit);
            });
        }
    }

    /// Enqueues `task` at `priority`, to run within `timeout`. Returns a
    /// handle the caller can cancel (before it starts) or await.
    pub fn submit<F, Fut, T>(&self, priority: Priority, timeout: Duration, task: F) -> TaskHandle<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let (tx, rx) = oneshot::channel();
        let cancel_for_run = cancel_flag.clone();

        let run: Box<dyn FnOnce() -> BoxFuture + Send> = Box::new(move || {
            Box::pin(async move {
                if cancel_for_run.load(Ordering::SeqCst) {
                    let _ = tx.send(TaskOutcome::Cancelled);
                    return;
                }
                match tokio::time::timeout(timeout, task()).await {
                    Ok(value) => {
                        let _ = tx.send(TaskOutcome::Completed(value));
                    }
                    Err(_) => {
                        let _ = tx.send(TaskOutcome::TimedOut);
                    }
                }
            })
        });

        self.queue.push(priority, QueueItem { cancel_flag: cancel_flag.clone(), run });
        self.notify.notify_one();
        TaskHandle { cancel_flag, receiver: rx }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

static GLOBAL_POOL: OnceCell<Arc<WorkerPool>> = OnceCell::new();

/// The process-wide singleton pool (spec §5 "the worker pool is a
/// process-wide singleton with configurable min/max workers"). `max_workers`
/// only takes effect on first call; later calls return the existing pool.
pub fn global_pool(max_workers: usize) -> Arc<WorkerPool> {
    GLOBAL_POOL.get_or_init(|| WorkerPool::new(max_workers)).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submitted_task_completes() {
        let pool = WorkerPool::new(2);
        let handle = pool.submit(Priority::Normal, Duration::from_secs(1), || async { 42 });
        match handle.join().await {
            TaskOutcome::Completed(v) => assert_eq!(v, 42),
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelling_before_start_skips_execution() {
        let pool = WorkerPool::new(1);
        // Hold the only worker busy so the second task stays pending.
        let _busy = pool.submit(Priority::Normal, Duration::from_secs(2), || async {
            tokio::time::sleep(Duration::from_millis(200)).await;
        });
        let handle = pool.submit(Priority::Low, Duration::from_secs(2), || async { "ran" });
        handle.cancel();
        match handle.join().await {
            TaskOutcome::Cancelled => {}
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn task_exceeding_timeout_is_marked_timed_out() {
        let pool = WorkerPool::new(1);
        let handle = pool.submit(Priority::Normal, Duration::from_millis(10), || async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            "late"
        });
        match handle.join().await {
            TaskOutcome::TimedOut => {}
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn higher_priority_runs_before_queued_lower_priority() {
        let pool = WorkerPool::new(1);
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let _busy = pool.submit(Priority::Normal, Duration::from_secs(2), || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
        });
        let o1 = order.clone();
        let low = pool.submit(Priority::Low, Duration::from_secs(2), move || async move {
            o1.lock().push("low");
        });
        let o2 = order.clone();
        let high = pool.submit(Priority::Critical, Duration::from_secs(2), move || async move {
            o2.lock().push("critical");
        });
        low.join().await.into_result().ok();
        high.join().await.into_result().ok();
        assert_eq!(*order.lock(), vec!["critical", "low"]);
    }
}
