//! Bounded retry for the Evaluation Cache's `save` (distilled spec §4.4.e,
//! §7 `TransientIO`): a storage failure is retried with exponential
//! backoff; an integrity conflict or codec failure is fatal and is never
//! retried. Reuses [`cu_source::RetryPolicy`] — the shape of "how many
//! attempts, how much backoff" is identical to the Interaction Source's
//! retry policy even though the error type differs.

use cu_cache::{CacheError, EvaluationCache};
use cu_core::EvaluationRecord;
use cu_source::RetryPolicy;

/// Persist `record`, retrying `CacheError::Storage` failures up to
/// `policy.max_attempts` times with doubling backoff. An
/// `Integrity`/`Codec` failure is returned immediately without consuming
/// the retry budget.
pub async fn save_with_retry(
    cache: &dyn EvaluationCache,
    policy: RetryPolicy,
    record: EvaluationRecord,
) -> Result<(), CacheError> {
    let mut attempt = 0;
    let mut delay = policy.base_delay;
    loop {
        attempt += 1;
        match cache.save(record.clone()).await {
            Ok(()) => return Ok(()),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) if attempt >= policy.max_attempts => return Err(err),
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
    use async_trait::async_trait;
    use cu_core::{FromBound, ProcessId, SortKey, ToBound};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct FlakyCache {
        fail_times: AtomicU32,
    }

    #[async_trait]
    impl EvaluationCache for FlakyCache {
        async fn latest_at_or_before(
            &self,
            _process_id: &ProcessId,
            _sort_key: &SortKey,
        ) -> Result<Option<EvaluationRecord>, CacheError> {
            Ok(None)
        }

        async fn save(&self, _record: EvaluationRecord) -> Result<(), CacheError> {
            if self.fail_times.load(Ordering::SeqCst) > 0 {
                self.fail_times.fetch_sub(1, Ordering::SeqCst);
                return Err(CacheError::Storage("disk full".to_string()));
            }
            Ok(())
        }

        async fn range(
            &self,
            _process_id: &ProcessId,
            _from: &FromBound,
            _to: &ToBound,
        ) -> Result<Vec<EvaluationRecord>, CacheError> {
            Ok(Vec::new())
        }
    }

    fn sample_record() -> EvaluationRecord {
        EvaluationRecord {
            process_id: ProcessId::from("proc-1"),
            sort_key: SortKey::from("0001"),
            action: serde_json::json!({}),
            output: cu_core::HandlerOutput::carry_forward(serde_json::json!({})),
            cached_at: 0,
        }
    }

    #[tokio::test]
    async fn retries_then_succeeds_within_budget() {
        let cache = FlakyCache {
            fail_times: AtomicU32::new(2),
        };
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };
        save_with_retry(&cache, policy, sample_record()).await.unwrap();
    }

    #[tokio::test]
    async fn exhausts_budget_and_surfaces_fatal() {
        let cache = FlakyCache {
            fail_times: AtomicU32::new(10),
        };
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };
        let err = save_with_retry(&cache, policy, sample_record()).await.unwrap_err();
        assert!(matches!(err, CacheError::Storage(_)));
    }
}
