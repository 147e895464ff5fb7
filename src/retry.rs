//! Bounded fixed-interval retry for operations that may transiently fail.
//!
//! No jitter, no exponential backoff: operation volume is human-paced, so
//! the simple form is enough. On exhaustion the last failure propagates.

use std::future::Future;
use std::time::Duration;

use log::debug;

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    pub fn new(attempts: u32, interval_ms: u64) -> Self {
        Self {
            attempts: attempts.max(1),
            interval: Duration::from_millis(interval_ms),
        }
    }
}

/// Run `op`, retrying on failure every `config.interval` until
/// `config.attempts` invocations have been spent.
pub async fn retry<T, E, F, Fut>(config: RetryConfig, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < config.attempts => {
                debug!("attempt {attempt}/{} failed: {err}", config.attempts);
                attempt += 1;
                tokio::time::sleep(config.interval).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick(attempts: u32) -> RetryConfig {
        RetryConfig::new(attempts, 1)
    }

    #[tokio::test]
    async fn succeeds_on_fifth_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry(quick(5), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 5 {
                    Err(format!("failure {n}"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(5));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn stops_after_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<&str, String> = retry(quick(5), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("done")
            }
        })
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exactly_five_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), String> = retry(quick(5), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("failure {n}"))
            }
        })
        .await;

        assert_eq!(result, Err("failure 5".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }
}
