use cu_core::{ProcessId, SortKey};
use thiserror::Error;

/// Evaluation Cache failures (distilled spec §4.3, §7).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The embedded store failed — disk full, corruption, etc. Retryable
    /// at the caller's discretion; the cache itself does not retry.
    #[error("cache storage error: {0}")]
    Storage(String),

    /// A second writer observed bytes for `(process_id, sort_key)` that
    /// differ from what's already cached. Fatal and non-retryable: it
    /// implies the evaluation is non-deterministic (distilled spec §4.3,
    /// §7 `IntegrityError`).
    #[error("integrity conflict at ({process_id}, {sort_key}): two evaluations disagree")]
    Integrity {
        process_id: ProcessId,
        sort_key: SortKey,
    },

    #[error("failed to encode cached record: {0}")]
    Codec(#[from] cu_codec::Error),
}

impl CacheError {
    /// `Storage` failures are transient I/O (distilled spec §7
    /// `TransientIO`); `Integrity`/`Codec` are fatal and must not be
    /// retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
