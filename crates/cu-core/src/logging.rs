//! An injected, hierarchical logging capability (distilled spec §9): side
//! effect only, never returns a value used in logic, and never reaches for
//! a process-wide singleton. `Logger::child` names a sub-scope the way
//! `logger.child("evaluate")` would in the distilled spec's pseudocode; the
//! Rust encoding threads a `tracing::Span` instead of a string-keyed logger
//! tree, so child scopes still nest correctly when multiple evaluations run
//! concurrently.

use tracing::Span;

/// A named point in the logger hierarchy. Cheap to clone: the only state is
/// the `tracing::Span` handle itself.
#[derive(Debug, Clone)]
pub struct Logger {
    span: Span,
}

impl Logger {
    /// Construct a root logger named `name`.
    #[must_use]
    pub fn named(name: &'static str) -> Self {
        Self {
            span: tracing::info_span!("logger", name),
        }
    }

    /// Derive a child scope. The parent span remains the structural parent
    /// in the emitted trace tree even though no singleton registry tracks
    /// the relationship.
    #[must_use]
    pub fn child(&self, name: &'static str) -> Self {
        Self {
            span: tracing::info_span!(parent: &self.span, "logger", name),
        }
    }

    pub fn info(&self, message: &str) {
        let _enter = self.span.enter();
        tracing::info!("{message}");
    }

    pub fn warn(&self, message: &str) {
        let _enter = self.span.enter();
        tracing::warn!("{message}");
    }

    pub fn error(&self, message: &str) {
        let _enter = self.span.enter();
        tracing::error!("{message}");
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::named("ao-cu")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_does_not_panic_and_can_log() {
        let root = Logger::named("root");
        let child = root.child("evaluate");
        child.info("folding interactions");
        child.warn("retrying transient failure");
    }
}
