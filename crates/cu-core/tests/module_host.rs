use cu_core::{ModuleHost, ResourcePolicy};
use serde_json::json;

const FIXED_OUTPUT_WAT: &str = r#"
(module
  (memory (export "memory") 2)
  (global $bump (mut i32) (i32.const 1024))
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

const TRAP_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (func $alloc (export "alloc") (param i32) (result i32) (i32.const 0))
  (func $handle (export "handle")
    (param i32 i32 i32 i32 i32 i32) (result i32 i32)
    unreachable)
)
"#;

const MISSING_HANDLE_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (func $alloc (export "alloc") (param i32) (result i32) (i32.const 0))
)
"#;

/// Starts at the policy's memory ceiling (one page) and tries to grow by
/// two more; reports whether the grow succeeded via `state.grew`.
const GROW_MEMORY_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (global $bump (mut i32) (i32.const 2048))
  (func $alloc (export "alloc") (param $size i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $bump))
    (global.set $bump (i32.add (global.get $bump) (local.get $size)))
    (local.get $ptr))
  (data (i32.const 0) "{\"state\":{\"grew\":-1},\"result\":{}}")
  (data (i32.const 64) "{\"state\":{\"grew\":1},\"result\":{}}")
  (func $handle (export "handle")
    (param i32 i32 i32 i32 i32 i32) (result i32 i32)
    (local $grown i32)
    (local.set $grown (memory.grow (i32.const 2)))
    (if (result i32 i32) (i32.eq (local.get $grown) (i32.const -1))
      (then (i32.const 0) (i32.const 33))
      (else (i32.const 64) (i32.const 32))))
)
"#;

#[tokio::test]
async fn handle_returns_decoded_output() {
    let wasm = wat::parse_str(FIXED_OUTPUT_WAT).unwrap();
    let host = ModuleHost::new(None, ResourcePolicy::default()).unwrap();
    let mut handler = host.instantiate(&wasm).await.unwrap();

    let output = handler.handle(&json!({"n": 0}), &json!({"type": "inc"}), &json!({}));

    assert!(!output.is_failure());
    assert_eq!(output.state, Some(json!({"n": 1})));
}

#[tokio::test]
async fn trap_is_contained_as_failure_output() {
    let wasm = wat::parse_str(TRAP_WAT).unwrap();
    let host = ModuleHost::new(None, ResourcePolicy::default()).unwrap();
    let mut handler = host.instantiate(&wasm).await.unwrap();

    let output = handler.handle(&json!({}), &json!({}), &json!({}));

    assert!(output.is_failure());
    assert!(output.state.is_none());
}

#[tokio::test]
async fn missing_handle_export_is_configuration_error() {
    let wasm = wat::parse_str(MISSING_HANDLE_WAT).unwrap();
    let host = ModuleHost::new(None, ResourcePolicy::default()).unwrap();
    let err = host.instantiate(&wasm).await.unwrap_err();
    assert!(matches!(err, cu_core::HostError::Configuration(_)));
}

#[tokio::test]
async fn instantiation_is_deterministic_across_instances() {
    let wasm = wat::parse_str(FIXED_OUTPUT_WAT).unwrap();
    let host = ModuleHost::new(None, ResourcePolicy::default()).unwrap();

    let mut a = host.instantiate(&wasm).await.unwrap();
    let mut b = host.instantiate(&wasm).await.unwrap();

    let out_a = a.handle(&json!({"n": 0}), &json!({}), &json!({}));
    let out_b = b.handle(&json!({"n": 0}), &json!({}), &json!({}));
    assert_eq!(out_a, out_b);
}

#[tokio::test]
async fn memory_growth_past_policy_ceiling_is_denied() {
    let wasm = wat::parse_str(GROW_MEMORY_WAT).unwrap();
    let policy = ResourcePolicy {
        max_memory: 64 * 1024,
        ..ResourcePolicy::default()
    };
    let host = ModuleHost::new(None, policy).unwrap();
    let mut handler = host.instantiate(&wasm).await.unwrap();

    let output = handler.handle(&json!(null), &json!({}), &json!({}));

    assert!(!output.is_failure());
    assert_eq!(output.state, Some(json!({"grew": -1})));
}

#[tokio::test]
async fn compiled_module_cache_round_trips() {
    let wasm = wat::parse_str(FIXED_OUTPUT_WAT).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let host = ModuleHost::new(Some(dir.path().to_path_buf()), ResourcePolicy::default()).unwrap();

    let mut first = host.instantiate(&wasm).await.unwrap();
    let mut second = host.instantiate(&wasm).await.unwrap();

    let out_first = first.handle(&json!({"n": 0}), &json!({}), &json!({}));
    let out_second = second.handle(&json!({"n": 0}), &json!({}), &json!({}));
    assert_eq!(out_first, out_second);

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert!(!entries.is_empty(), "expected a .cwasm file to be written");
}
