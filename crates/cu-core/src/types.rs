//! The process/interaction/state data model (distilled spec §3).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque process identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub String);

impl ProcessId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProcessId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProcessId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A totally ordered, lexicographically comparable opaque identifier
/// assigned by the Scheduler Unit. `Ord` on this type *is* the canonical
/// interaction order; nothing else in the engine is allowed to reorder by
/// any other key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortKey(pub String);

impl SortKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SortKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lower bound for an interaction range query. `Genesis` means "from the
/// start of the process's history", distinct from any real `SortKey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FromBound {
    Genesis,
    Exclusive(SortKey),
}

/// Upper bound for an interaction range query. `Latest` means "up to
/// whatever the Scheduler Unit currently reports as the end of the log".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToBound {
    Latest,
    Inclusive(SortKey),
}

/// A single ordered input to a process. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub sort_key: SortKey,
    pub action: serde_json::Value,
    pub env: serde_json::Value,
}

/// `{ error }` — present and truthy iff the producing step failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HandlerResult {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// The raw output of one `handle` invocation. Field order here is the
/// canonical field order for serialisation (distilled spec §6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawns: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<HandlerResult>,
}

impl HandlerOutput {
    /// An output with no state change and no failure — the result of an
    /// empty interaction stream (distilled spec §8 scenario 1).
    #[must_use]
    pub fn carry_forward(state: serde_json::Value) -> Self {
        Self {
            state: Some(state),
            result: Some(HandlerResult::default()),
            ..Self::default()
        }
    }

    /// A contained step failure: no state field, a truthy `result.error`.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            result: Some(HandlerResult {
                error: Some(reason.into()),
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.result.as_ref().is_some_and(HandlerResult::is_failure)
    }
}

/// A cached artifact recording one step's outcome. Written exactly once per
/// `(process_id, sort_key)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub process_id: ProcessId,
    pub sort_key: SortKey,
    pub action: serde_json::Value,
    pub output: HandlerOutput,
    /// Wall-clock metadata. Never used for correctness — see
    /// [`EvaluationRecord::canonical_eq`].
    pub cached_at: i64,
}

impl EvaluationRecord {
    /// Equality that excludes `cached_at`, the only non-deterministic
    /// field (distilled spec §9 open question). The cache's write-once
    /// contract must use this, not derived `PartialEq`, to decide whether a
    /// rewrite of an existing key is an idempotent no-op or an integrity
    /// violation.
    #[must_use]
    pub fn canonical_eq(&self, other: &Self) -> bool {
        self.process_id == other.process_id
            && self.sort_key == other.sort_key
            && self.action == other.action
            && self.output == other.output
    }
}

/// The final, merged result of folding a stream of interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutput {
    pub state: serde_json::Value,
    pub output: HandlerOutput,
    pub last_sort_key: Option<SortKey>,
}
