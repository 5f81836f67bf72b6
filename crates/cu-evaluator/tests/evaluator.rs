//! End-to-end scenarios mirroring the distilled spec §8's six concrete
//! test cases: empty, single success, success-then-failure, handler trap,
//! resume-from-cache, and interleaved (single-flighted) readers.

use std::sync::Arc;

use async_trait::async_trait;
use cu_cache::{EvaluationCache, RedbEvaluationCache};
use cu_core::{FromBound, Interaction, ModuleHost, ProcessId, ResourcePolicy, SortKey, ToBound};
use cu_evaluator::Evaluator;
use cu_source::{InteractionSource, ModuleBinaryStore, SourceError};
use serde_json::json;

/// Succeeds on its first `handle` call with a fixed `{n: 1}` state, traps
/// (unreachable) on every call after that — enough to drive a
/// success-then-failure fold without needing a real compiled guest.
const SUCCEED_ONCE_THEN_TRAP_WAT: &str = r#"
(module
  (memory (export "memory") 2)
  (global $bump (mut i32) (i32.const 2048))
  (global $calls (mut i32) (i32.const 0))
  (func $alloc (export "alloc") (param $size i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $bump))
    (global.set $bump (i32.add (global.get $bump) (local.get $size)))
    (local.get $ptr))
  (data (i32.const 0) "{\"state\":{\"n\":1},\"result\":{}}")
  (func $handle (export "handle")
    (param i32 i32 i32 i32 i32 i32) (result i32 i32)
    (global.set $calls (i32.add (global.get $calls) (i32.const 1)))
    (if (i32.gt_s (global.get $calls) (i32.const 1))
      (then unreachable))
    (i32.const 0)
    (i32.const 29))
)
"#;

/// Traps unconditionally — used to test that a trap on the very first
/// step is recorded with the pre-step (genesis) state carried forward.
const ALWAYS_TRAP_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (func $alloc (export "alloc") (param i32) (result i32) (i32.const 0))
  (func $handle (export "handle")
    (param i32 i32 i32 i32 i32 i32) (result i32 i32)
    unreachable)
)
"#;

/// Always succeeds with `{n: 1}` — used for the single-interaction and
/// empty-stream scenarios where no trap behaviour is needed.
const ALWAYS_SUCCEED_WAT: &str = r#"
(module
  (memory (export "memory") 2)
  (global $bump (mut i32) (i32.const 2048))
  (func $alloc (export "alloc") (param $size i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $bump))
    (global.set $bump (i32.add (global.get $bump) (local.get $size)))
    (local.get $ptr))
  (data (i32.const 0) "{\"state\":{\"n\":1},\"result\":{}}")
  (func $handle (export "handle")
    (param i32 i32 i32 i32 i32 i32) (result i32 i32)
    (i32.const 0)
    (i32.const 29))
)
"#;

struct FixedSource {
    interactions: Vec<Interaction>,
}

#[async_trait]
impl InteractionSource for FixedSource {
    async fn list_interactions(
        &self,
        _process_id: &ProcessId,
        from: &FromBound,
        to: &ToBound,
    ) -> Result<Vec<Interaction>, SourceError> {
        let lower = match from {
            FromBound::Genesis => None,
            FromBound::Exclusive(sort_key) => Some(sort_key.clone()),
        };
        let upper = match to {
            ToBound::Latest => None,
            ToBound::Inclusive(sort_key) => Some(sort_key.clone()),
        };

        Ok(self
            .interactions
            .iter()
            .filter(|i| lower.as_ref().is_none_or(|l| i.sort_key > *l))
            .filter(|i| upper.as_ref().is_none_or(|u| i.sort_key <= *u))
            .cloned()
            .collect())
    }
}

struct FixedStore {
    wasm: Vec<u8>,
}

#[async_trait]
impl ModuleBinaryStore for FixedStore {
    async fn load_src(&self, _process_id: &ProcessId) -> Result<Vec<u8>, SourceError> {
        Ok(self.wasm.clone())
    }
}

fn interaction(sort_key: &str, action: serde_json::Value) -> Interaction {
    Interaction {
        sort_key: SortKey::from(sort_key),
        action,
        env: json!({}),
    }
}

fn make_evaluator(wat: &str, interactions: Vec<Interaction>) -> (tempfile::TempDir, Evaluator) {
    let dir = tempfile::tempdir().unwrap();
    let cache = RedbEvaluationCache::open(&dir.path().join("cache.redb")).unwrap();
    let host = ModuleHost::new(None, ResourcePolicy::default()).unwrap();
    let wasm = wat::parse_str(wat).unwrap();

    let evaluator = Evaluator::new(
        host,
        Arc::new(cache),
        Arc::new(FixedSource { interactions }),
        Arc::new(FixedStore { wasm }),
    );
    (dir, evaluator)
}

#[tokio::test]
async fn scenario_empty_interactions_returns_genesis_state() {
    let (_dir, evaluator) = make_evaluator(ALWAYS_SUCCEED_WAT, vec![]);
    let process_id = ProcessId::from("proc-1");

    let result = evaluator.read_state(&process_id, None).await.unwrap();

    assert_eq!(result.state, json!(null));
    assert!(!result.output.is_failure());
    assert_eq!(result.last_sort_key, None);
}

#[tokio::test]
async fn scenario_single_success_caches_one_record() {
    let interactions = vec![interaction("0001", json!({"type": "inc"}))];
    let (_dir, evaluator) = make_evaluator(ALWAYS_SUCCEED_WAT, interactions);
    let process_id = ProcessId::from("proc-1");

    let result = evaluator.read_state(&process_id, None).await.unwrap();

    assert_eq!(result.state, json!({"n": 1}));
    assert_eq!(result.last_sort_key, Some(SortKey::from("0001")));
}

#[tokio::test]
async fn scenario_success_then_failure_short_circuits() {
    let interactions = vec![
        interaction("0001", json!({"type": "inc"})),
        interaction("0002", json!({"type": "boom"})),
        interaction("0003", json!({"type": "inc"})),
    ];
    let (dir, evaluator) = make_evaluator(SUCCEED_ONCE_THEN_TRAP_WAT, interactions);
    let process_id = ProcessId::from("proc-1");

    let result = evaluator.read_state(&process_id, None).await.unwrap();

    assert!(result.output.is_failure());
    assert_eq!(result.state, json!({"n": 1}));
    assert_eq!(result.last_sort_key, Some(SortKey::from("0002")));

    let cache = RedbEvaluationCache::open(&dir.path().join("cache.redb")).unwrap();
    let records = cache
        .range(&process_id, &FromBound::Genesis, &ToBound::Latest)
        .await
        .unwrap();
    assert_eq!(records.len(), 2, "the third interaction must not be consumed");
    assert_eq!(records[0].sort_key, SortKey::from("0001"));
    assert_eq!(records[1].sort_key, SortKey::from("0002"));
    assert!(records[1].output.is_failure());
}

#[tokio::test]
async fn scenario_handler_trap_is_recorded_with_prestep_state() {
    let interactions = vec![interaction("0005", json!({"type": "trigger-trap"}))];
    let (dir, evaluator) = make_evaluator(ALWAYS_TRAP_WAT, interactions);
    let process_id = ProcessId::from("proc-1");

    let result = evaluator.read_state(&process_id, None).await.unwrap();

    assert!(result.output.is_failure());
    assert_eq!(result.state, json!(null), "state is the pre-step (genesis) state");
    assert_eq!(result.last_sort_key, Some(SortKey::from("0005")));

    let cache = RedbEvaluationCache::open(&dir.path().join("cache.redb")).unwrap();
    let record = cache
        .latest_at_or_before(&process_id, &SortKey::from("0005"))
        .await
        .unwrap()
        .unwrap();
    assert!(record.output.is_failure());
}

#[tokio::test]
async fn scenario_resume_from_cache_matches_byte_for_byte_excluding_cached_at() {
    let interactions = vec![
        interaction("0001", json!({"type": "inc"})),
        interaction("0002", json!({"type": "boom"})),
    ];
    let (_dir, evaluator) = make_evaluator(SUCCEED_ONCE_THEN_TRAP_WAT, interactions);
    let process_id = ProcessId::from("proc-1");

    let first = evaluator.read_state(&process_id, None).await.unwrap();
    let second = evaluator
        .read_state(&process_id, Some(SortKey::from("0002")))
        .await
        .unwrap();

    assert_eq!(first.state, second.state);
    assert_eq!(first.output, second.output);
    assert_eq!(first.last_sort_key, second.last_sort_key);
}

#[tokio::test]
async fn scenario_interleaved_readers_single_flight_to_one_fold() {
    let interactions: Vec<Interaction> = (1..=10)
        .map(|n| interaction(&format!("{n:04}"), json!({"type": "inc"})))
        .collect();
    let (dir, evaluator) = make_evaluator(ALWAYS_SUCCEED_WAT, interactions);
    let evaluator = Arc::new(evaluator);
    let process_id = ProcessId::from("proc-1");

    let a = {
        let evaluator = Arc::clone(&evaluator);
        let process_id = process_id.clone();
        tokio::spawn(async move {
            evaluator
                .read_state(&process_id, Some(SortKey::from("0010")))
                .await
        })
    };
    let b = {
        let evaluator = Arc::clone(&evaluator);
        let process_id = process_id.clone();
        tokio::spawn(async move {
            evaluator
                .read_state(&process_id, Some(SortKey::from("0010")))
                .await
        })
    };

    let (result_a, result_b) = tokio::join!(a, b);
    let result_a = result_a.unwrap().unwrap();
    let result_b = result_b.unwrap().unwrap();
    assert_eq!(result_a.state, result_b.state);
    assert_eq!(result_a.last_sort_key, result_b.last_sort_key);

    let cache = RedbEvaluationCache::open(&dir.path().join("cache.redb")).unwrap();
    let records = cache
        .range(&process_id, &FromBound::Genesis, &ToBound::Latest)
        .await
        .unwrap();
    assert_eq!(records.len(), 10, "no duplicate or conflicting records");
}
