//! Retry envelope for flaky exterior calls — reconnaissance navigation, the
//! codegen LLM call, and final-run script execution. Exponential backoff,
//! base ~2s, capped at `constants::retry::MAX_DELAY_SECS`, 2-3 attempts,
//! independent of whatever state the retried call may have partially
//! mutated (no shared retry state between attempts).

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::warn;

use crate::constants::retry as retry_constants;
use crate::types::Result;

pub async fn with_retry<T, F, Fut>(label: &str, f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let backoff = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(retry_constants::BASE_DELAY_MS))
        .with_max_delay(Duration::from_secs(retry_constants::MAX_DELAY_SECS))
        .with_factor(retry_constants::BACKOFF_FACTOR as f32)
        .with_max_times(retry_constants::MAX_ATTEMPTS - 1);

    f.retry(backoff).await.map_err(|e| {
        warn!(call = label, error = %e, "exterior call exhausted its retry budget");
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use crate::types::ScrapeError;

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let result = with_retry("test call", || async {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(ScrapeError::Llm("transient".to_string()))
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_budget_and_returns_err() {
        let attempts = AtomicU32::new(0);
        let result: Result<i32> = with_retry("always fails", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ScrapeError::Llm("permanent".to_string()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), retry_constants::MAX_ATTEMPTS as u32);
    }
}
