//! Scheduling primitives shared by the rest of the workspace: a priority
//! task queue, a bounded-concurrency worker pool, batched processing with
//! progress reporting, a token-bucket rate limiter, retry-with-backoff, and
//! debounce/throttle helpers (spec §4.Q).

pub mod batch;
pub mod debounce;
pub mod priority;
pub mod queue;
pub mod rate_limiter;
pub mod retry;
pub mod worker_pool;

pub use batch::{process_in_batches, ProgressReport, ThrottledProgress};
pub use debounce::{Debouncer, Throttle};
pub use priority::Priority;
pub use queue::PriorityQueue;
pub use rate_limiter::RateLimiter;
pub use retry::{retry_with_backoff, RetryConfig};
pub use worker_pool::{global_pool, TaskHandle, TaskOutcome, WorkerPool};
