//! The Evaluator (distilled spec §4.4): the reducer at the heart of the
//! engine. Folds interactions over a starting state, containing per-step
//! failures, emitting one [`EvaluationRecord`] per step, short-circuiting
//! on the first failed step while still returning a well-formed
//! [`EvaluationOutput`] to the caller — failure is a property of the
//! interaction, not of the engine (§4.4's design note).

use std::sync::Arc;

use cu_cache::{EvaluationCache, SingleFlight};
use cu_core::{
    EvaluationOutput, EvaluationRecord, FromBound, Handler, HandlerOutput, Interaction, Logger,
    ModuleHost, ProcessId, SortKey, ToBound,
};
use cu_source::{InteractionSource, ModuleBinaryStore, RetryPolicy};
use cu_pipeline::Flow;
use serde_json::Value;

use crate::error::EngineError;
use crate::persist_retry::save_with_retry;

/// Wires the Module Host, Interaction Source, Module Binary Store, and
/// Evaluation Cache together into the `readState` operation (distilled
/// spec §2's data-flow diagram). Cheap to clone and share: every field is
/// already reference-counted or `Copy`.
#[derive(Clone)]
pub struct Evaluator {
    host: ModuleHost,
    cache: Arc<dyn EvaluationCache>,
    source: Arc<dyn InteractionSource>,
    store: Arc<dyn ModuleBinaryStore>,
    persist_retry: RetryPolicy,
    logger: Logger,
    single_flight: Arc<SingleFlight<(ProcessId, Option<SortKey>), EvaluationOutput>>,
}

impl Evaluator {
    #[must_use]
    pub fn new(
        host: ModuleHost,
        cache: Arc<dyn EvaluationCache>,
        source: Arc<dyn InteractionSource>,
        store: Arc<dyn ModuleBinaryStore>,
    ) -> Self {
        Self {
            host,
            cache,
            source,
            store,
            persist_retry: RetryPolicy::default(),
            logger: Logger::named("ao-cu"),
            single_flight: Arc::new(SingleFlight::new()),
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    #[must_use]
    pub const fn with_persist_retry(mut self, policy: RetryPolicy) -> Self {
        self.persist_retry = policy;
        self
    }

    /// Resolve the current state of `process_id`, folding through
    /// `up_to` (or the latest known interaction if `None`). Concurrent
    /// callers targeting the same `(process_id, up_to)` single-flight
    /// onto one fold (distilled spec §5).
    ///
    /// # Errors
    /// Returns [`EngineError`] for a fatal, engine-level failure
    /// (integrity conflict, configuration error, or an exhausted retry
    /// budget). A contained per-interaction failure is never an `Err` —
    /// it is folded into the returned output's `result.error`.
    pub async fn read_state(
        &self,
        process_id: &ProcessId,
        up_to: Option<SortKey>,
    ) -> Result<EvaluationOutput, EngineError> {
        let key = (process_id.clone(), up_to.clone());
        let process_id = process_id.clone();
        self.single_flight
            .run(key, || self.fold(process_id, up_to))
            .await
    }

    async fn fold(
        &self,
        process_id: ProcessId,
        up_to: Option<SortKey>,
    ) -> Result<EvaluationOutput, EngineError> {
        let logger = self.logger.child("evaluate");

        let start = match &up_to {
            Some(sort_key) => self.cache.latest_at_or_before(&process_id, sort_key).await?,
            None => self.cache.latest(&process_id).await?,
        };

        // Process genesis has no prior state of its own (distilled spec
        // §3: "a genesis state"); this engine models it as the handler
        // receiving `null` on its first invocation rather than inventing
        // any other default (§9 open question: no field-level defaulting
        // beyond carry-forward).
        let (mut state, mut last_sort_key, mut last_output) = match start {
            Some(record) if record.output.is_failure() => {
                // A failure record's own `output.state` is absent (distilled
                // spec §3: a failed step never updates state) — the carried
                // state lives on the latest *non-failure* record at or
                // before this one, not on this record itself. `from_bound`
                // below still resumes strictly after the failure's own
                // sort_key, so nothing already recorded is re-executed.
                let carried = self
                    .carried_state_before_failure(&process_id, &record.sort_key)
                    .await?;
                (carried, Some(record.sort_key), record.output)
            }
            Some(record) => {
                let carried = record.output.state.clone().unwrap_or(Value::Null);
                (carried, Some(record.sort_key), record.output)
            }
            None => (Value::Null, None, HandlerOutput::carry_forward(Value::Null)),
        };

        let from_bound = last_sort_key
            .clone()
            .map_or(FromBound::Genesis, FromBound::Exclusive);
        let to_bound = up_to.clone().map_or(ToBound::Latest, ToBound::Inclusive);

        let interactions = self
            .source
            .list_interactions(&process_id, &from_bound, &to_bound)
            .await?;

        if interactions.is_empty() {
            logger.info("no interactions past the cached prefix; nothing to fold");
            return Ok(EvaluationOutput {
                state,
                output: last_output,
                last_sort_key,
            });
        }

        let src = self.store.load_src(&process_id).await?;
        let mut handler = self.host.instantiate(&src).await?;

        for interaction in interactions {
            let flow = self.step(&mut handler, &state, &interaction);

            let (record_output, control) = match flow {
                Flow::Continue(output) => (output, Flow::Continue(())),
                Flow::Halt(output) => (*output, Flow::Halt(())),
            };

            let record = EvaluationRecord {
                process_id: process_id.clone(),
                sort_key: interaction.sort_key.clone(),
                action: interaction.action.clone(),
                output: record_output.clone(),
                cached_at: wall_clock_millis(),
            };

            save_with_retry(self.cache.as_ref(), self.persist_retry, record).await?;

            last_sort_key = Some(interaction.sort_key.clone());
            last_output = record_output.clone();

            if control.is_halted() {
                logger.warn(&format!(
                    "short-circuiting fold at sort_key={} after a contained step failure",
                    interaction.sort_key
                ));
                break;
            }

            state = record_output.state.unwrap_or(state);
        }

        Ok(EvaluationOutput {
            state,
            output: last_output,
            last_sort_key,
        })
    }

    /// The state carried into the step that produced `failure_sort_key`: the
    /// `state` field of the latest record at or before it whose step
    /// actually succeeded. Cached failures never carry a `state` of their
    /// own (distilled spec §3), and since a short-circuited evaluation never
    /// persists a record past its first failure, this is always exactly one
    /// cache lookup away — the record immediately preceding the failure in
    /// the process's contiguous cached prefix.
    async fn carried_state_before_failure(
        &self,
        process_id: &ProcessId,
        failure_sort_key: &SortKey,
    ) -> Result<Value, EngineError> {
        let prefix = self
            .cache
            .range(
                process_id,
                &FromBound::Genesis,
                &ToBound::Inclusive(failure_sort_key.clone()),
            )
            .await?;
        Ok(prefix
            .into_iter()
            .rev()
            .find(|record| !record.output.is_failure())
            .and_then(|record| record.output.state)
            .unwrap_or(Value::Null))
    }

    /// One step of the fold (distilled spec §4.4 algorithm, steps a-c):
    /// invoke the handler, classify the outcome, and report whether the
    /// driver should keep consuming interactions (`Continue`) or stop
    /// (`Halt`) — the explicit tagged control value from §9's redesign
    /// flag, not a sentinel smuggled into the handler output itself.
    fn step(
        &self,
        handler: &mut Handler,
        state: &Value,
        interaction: &Interaction,
    ) -> Flow<HandlerOutput, Box<HandlerOutput>> {
        let raw = handler.handle(state, &interaction.action, &interaction.env);

        if raw.is_failure() {
            let reason = raw
                .result
                .and_then(|r| r.error)
                .unwrap_or_else(|| "unknown handler error".to_string());
            Flow::Halt(Box::new(HandlerOutput::failure(reason)))
        } else {
            let mut output = raw;
            output.state.get_or_insert_with(|| state.clone());
            Flow::Continue(output)
        }
    }
}

fn wall_clock_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
