//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Run `op` up to `tries` times, sleeping `base^attempt` seconds between
/// failures. The attempt number (1-based) is passed to `op`; the last
/// error is returned once the budget is spent.
pub async fn retry_with_backoff<T, E, F, Fut>(tries: u32, base: f64, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= tries => return Err(e),
            Err(e) => {
                let delay = base.powi(attempt as i32);
                debug!(
                    "Attempt {}/{} failed ({}), retrying in {:.1}s",
                    attempt, tries, e, delay
                );
                tokio::time::sleep(Duration::from_secs_f64(delay)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn persistent_failure_uses_exactly_the_attempt_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(3, 0.0, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("transient".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_retrying_after_the_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff(3, 0.0, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn immediate_success_is_a_single_call() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(3, 0.0, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
