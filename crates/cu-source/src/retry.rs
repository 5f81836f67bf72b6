//! Bounded exponential backoff for `TransientIO` failures (distilled spec
//! §7): a transient error is retried until the budget is exhausted, at
//! which point it's promoted to [`crate::error::SourceError::RetryExhausted`].

use std::time::Duration;

use crate::error::SourceError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Run `op` up to `policy.max_attempts` times, doubling the delay between
/// attempts, as long as the error it returns is retryable. A non-retryable
/// error is returned immediately without consuming the budget.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0;
    let mut delay = policy.base_delay;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) if attempt >= policy.max_attempts => {
                return Err(SourceError::RetryExhausted {
                    attempts: attempt,
                    last: err.to_string(),
                });
            }
            Err(_) => {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_on_first_try() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };
        let result: Result<i32, SourceError> = with_retry(policy, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
        };
        let result: Result<i32, SourceError> = with_retry(policy, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::Malformed("bad".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retryable_error_is_promoted_after_budget_exhausted() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };
        let result: Result<i32, SourceError> = with_retry(policy, || async {
            Err(SourceError::Transient("connection refused".into()))
        })
        .await;
        match result {
            Err(SourceError::RetryExhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }
}
