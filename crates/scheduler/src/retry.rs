//! Retry-with-backoff (spec §4.Q, §7 "local recovery only for transient
//! I/O"): exponential delay `base * 2^attempt`, capped at `max_delay`, with
//! an optional callback invoked before each retry.

use std::future::Future;
use std::time::Duration;

pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig { max_attempts: 3, base_delay: Duration::from_millis(100), max_delay: Duration::from_secs(10) }
    }
}

impl RetryConfig {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_secs_f64() * 2f64.powi(attempt as i32);
        Duration::from_secs_f64(scaled).min(self.max_delay)
    }
}

/// Runs `op` up to `cfg.max_attempts` times, retrying only when `op` returns
/// `Err` and `is_retryable` accepts the error. `on_retry(attempt, &error)` is
/// called before each retry's backoff sleep, attempt numbers starting at 0
/// for the first retry.
pub async fn retry_with_backoff<T, E, F, Fut>(
    cfg: &RetryConfig,
    mut op: F,
    is_retryable: impl Fn(&E) -> bool,
    mut on_retry: impl FnMut(u32, &E),
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt + 1 >= cfg.max_attempts as u32 || !is_retryable(&err) {
                    return Err(err);
                }
                on_retry(attempt, &err);
                tokio::time::sleep(cfg.delay_for_attempt(attempt)).await;
                attempt += 1;
            }
        }
    }
}
