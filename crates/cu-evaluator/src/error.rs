//! Engine-level (non-contained) failures for `readState` (distilled spec
//! §7). A `StepError`/`ResourceExhaustion` never appears here — those are
//! values on `HandlerOutput.result.error`, folded into the returned
//! [`cu_core::EvaluationOutput`], not propagated as an `Err`. Only
//! `IntegrityError`, `ConfigurationError`, and an exhausted `TransientIO`
//! retry budget abort the call.

use cu_cache::CacheError;
use cu_core::HostError;
use cu_source::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The Interaction Source or Module Binary Store failed past its retry
    /// budget, or the process is unknown to them.
    #[error("interaction source failure: {0}")]
    Source(#[from] SourceError),

    /// The Evaluation Cache failed — either storage I/O past retry, or a
    /// fatal, non-retryable integrity conflict.
    #[error("evaluation cache failure: {0}")]
    Cache(#[from] CacheError),

    /// The Module Host could not instantiate `src` — missing export,
    /// unlinkable import, or a compile failure.
    #[error("module host failure: {0}")]
    Host(#[from] HostError),
}

impl EngineError {
    /// True for the distilled spec's `IntegrityError`: a second writer
    /// observed bytes for a `(processId, sortKey)` that conflict with
    /// what's cached. Implies non-determinism; the process's evaluation
    /// must be refused until an operator intervenes.
    #[must_use]
    pub const fn is_integrity_conflict(&self) -> bool {
        matches!(self, Self::Cache(CacheError::Integrity { .. }))
    }
}
