use cu_core::ProcessId;
use thiserror::Error;

/// Failures from the Interaction Source / Module Binary Store collaborators
/// (distilled spec §7's `TransientIO` and `ConfigurationError` taxonomy as
/// it applies to fetching, not to the engine itself).
#[derive(Debug, Error)]
pub enum SourceError {
    /// Retryable: connection refused, timed out, or a 5xx from the
    /// Scheduler Unit. Retried with bounded backoff by [`crate::retry`];
    /// only surfaces once the retry budget is exhausted.
    #[error("interaction source unavailable: {0}")]
    Transient(String),

    /// The process has no registered src — not retryable.
    #[error("no src registered for process {0}")]
    NotFound(ProcessId),

    /// The upstream returned data that doesn't parse as the expected
    /// shape — not retryable, implies a protocol mismatch.
    #[error("malformed response from source: {0}")]
    Malformed(String),

    /// Retry budget exhausted on a transient failure; promoted to fatal
    /// per distilled spec §7.
    #[error("retry budget exhausted after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: String },
}

impl SourceError {
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
