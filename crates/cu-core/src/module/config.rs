use wasmtime::Config;

/// Deterministic engine configuration: no threads, no wall-clock-sensitive
/// SIMD relaxations, NaN canonicalisation on, fuel metering for the gas
/// budget and epoch interruption for the wall-clock deadline. Mirrors the
/// teacher's `configure_engine`, adapted from the component model to the
/// flat-ABI core `Module` API, plus fuel metering grounded on the sandbox
/// runtime's `create_engine`.
pub fn configure_engine(cfg: &mut Config) {
    cfg.consume_fuel(true);
    cfg.epoch_interruption(true);
    cfg.wasm_threads(false);
    cfg.wasm_simd(false);
    cfg.wasm_relaxed_simd(false);
    cfg.wasm_multi_memory(false);
    cfg.cranelift_nan_canonicalization(true);
    cfg.generate_address_map(false);
    cfg.wasm_backtrace(false);
    cfg.native_unwind_info(false);
    cfg.cranelift_opt_level(wasmtime::OptLevel::Speed);
}

/// Per-call resource policy (distilled spec §4.1).
#[derive(Debug, Clone, Copy)]
pub struct ResourcePolicy {
    /// Fuel budget consumed per `handle` invocation.
    pub fuel: u64,
    /// Epoch deadline ticks (paired with a fixed tick interval) per call.
    pub deadline_ticks: u64,
    /// Linear-memory ceiling for the instance, in bytes.
    pub max_memory: usize,
}

impl Default for ResourcePolicy {
    fn default() -> Self {
        Self {
            fuel: 10_000_000,
            deadline_ticks: 100,
            max_memory: 256 * 1024 * 1024,
        }
    }
}
