//! Module Host (distilled spec §4.1): wraps a WASM binary so it exposes a
//! single synchronous-in-semantics `handle` entrypoint across the sandbox
//! boundary.

pub mod cache;
pub mod call;
pub mod config;
pub mod epoch;
pub mod limiter;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::instrument;
use wasmtime::{Config, Engine, Linker, Memory, Module, Store};

use crate::error::{HostError, Result};
use crate::types::HandlerOutput;
use call::{AllocFunc, HandleFunc};
use config::ResourcePolicy;
use epoch::EpochTickerRegistration;
use limiter::MemoryLimiter;

/// Template for compiling and instantiating processes' WASM binaries.
/// Cheap to clone; the compiled-module disk cache and the engine are the
/// only shared state.
#[derive(Clone)]
pub struct ModuleHost {
    engine: Engine,
    cache_dir: Option<PathBuf>,
    policy: ResourcePolicy,
    _epoch: Arc<EpochTickerRegistration>,
}

impl ModuleHost {
    /// # Errors
    /// Returns an error if the global epoch ticker thread fails to start.
    pub fn new(cache_dir: Option<PathBuf>, policy: ResourcePolicy) -> Result<Self> {
        let mut cfg = Config::new();
        config::configure_engine(&mut cfg);
        let engine = Engine::new(&cfg).map_err(HostError::Wasm)?;

        let ticker = epoch::global_epoch_ticker()?;
        let registration = ticker.register(engine.clone());

        Ok(Self {
            engine,
            cache_dir,
            policy,
            _epoch: registration,
        })
    }

    /// Instantiate a handler for `src`. Deterministic: identical `src`
    /// bytes always produce a handler that behaves identically (distilled
    /// spec §4.1).
    ///
    /// # Errors
    /// Returns [`HostError::Configuration`] if the module doesn't export
    /// `handle`/`alloc`/`memory`, or [`HostError::Wasm`]/[`HostError::Io`]
    /// if compilation or the cache I/O fails.
    #[instrument(skip(self, src), fields(src_len = src.len()))]
    pub async fn instantiate(&self, src: &[u8]) -> Result<Handler> {
        let module = self.load_or_compile(src).await?;

        let linker: Linker<MemoryLimiter> = Linker::new(&self.engine);
        let mut store = Store::new(&self.engine, MemoryLimiter::new(self.policy.max_memory));
        store.limiter(|limiter| limiter);
        store.set_fuel(self.policy.fuel).map_err(HostError::Wasm)?;
        store.set_epoch_deadline(self.policy.deadline_ticks);

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| HostError::Configuration(format!("link/instantiate failed: {e}")))?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| call::missing_export("memory"))?;
        let alloc: AllocFunc = instance
            .get_typed_func(&mut store, "alloc")
            .map_err(|_| call::missing_export("alloc"))?;
        let handle: HandleFunc = instance
            .get_typed_func(&mut store, "handle")
            .map_err(|_| call::missing_export("handle"))?;

        Ok(Handler {
            store,
            memory,
            alloc,
            handle,
            policy: self.policy,
        })
    }

    async fn load_or_compile(&self, src: &[u8]) -> Result<Module> {
        let Some(cache_dir) = &self.cache_dir else {
            return Module::new(&self.engine, src).map_err(HostError::Wasm);
        };

        tokio::fs::create_dir_all(cache_dir).await?;
        let key = cache::cache_key(&self.engine, src);
        let cache_path = cache_dir.join(format!("{key}.cwasm"));

        // SAFETY: the cache file is produced by this process's own
        // `Module::serialize` for the same engine version/config; if stale
        // or foreign, deserialization fails and we fall through to a fresh
        // compile.
        if let Ok(module) = unsafe { Module::deserialize_file(&self.engine, &cache_path) } {
            return Ok(module);
        }

        let module = Module::new(&self.engine, src).map_err(HostError::Wasm)?;
        let bytes = module.serialize().map_err(HostError::Wasm)?;
        cache::write_cache_file_atomic(&cache_path, &bytes).await?;
        Ok(module)
    }
}

/// One sandboxed instance of a process's WASM module, owning its own linear
/// memory. Never reused across concurrent evaluations of different
/// processes (distilled spec §5).
pub struct Handler {
    store: Store<MemoryLimiter>,
    memory: Memory,
    alloc: AllocFunc,
    handle: HandleFunc,
    policy: ResourcePolicy,
}

impl Handler {
    /// Invoke the guest `handle` export. Infallible: any trap, memory
    /// fault, or marshalling failure is contained into a failing
    /// [`HandlerOutput`] rather than propagated (distilled spec §4.1).
    #[instrument(skip(self, state, action, env))]
    pub fn handle(
        &mut self,
        state: &serde_json::Value,
        action: &serde_json::Value,
        env: &serde_json::Value,
    ) -> HandlerOutput {
        match self.try_handle(state, action, env) {
            Ok(output) => output,
            Err(err) => HandlerOutput::failure(call::describe_trap(&err)),
        }
    }

    fn try_handle(
        &mut self,
        state: &serde_json::Value,
        action: &serde_json::Value,
        env: &serde_json::Value,
    ) -> anyhow::Result<HandlerOutput> {
        self.store.set_fuel(self.policy.fuel)?;
        self.store.set_epoch_deadline(self.policy.deadline_ticks);

        let state_bytes = cu_codec::canonical_bytes(state)?;
        let action_bytes = cu_codec::canonical_bytes(action)?;
        let env_bytes = cu_codec::canonical_bytes(env)?;

        let (state_ptr, state_len) =
            call::alloc_and_write(&mut self.store, &self.memory, &self.alloc, &state_bytes)?;
        let (action_ptr, action_len) =
            call::alloc_and_write(&mut self.store, &self.memory, &self.alloc, &action_bytes)?;
        let (env_ptr, env_len) =
            call::alloc_and_write(&mut self.store, &self.memory, &self.alloc, &env_bytes)?;

        let (out_ptr, out_len) = self.handle.call(
            &mut self.store,
            (
                state_ptr, state_len, action_ptr, action_len, env_ptr, env_len,
            ),
        )?;

        let out_bytes = call::read_bytes(&self.store, &self.memory, out_ptr, out_len)?;
        let output: HandlerOutput = serde_json::from_slice(&out_bytes)
            .map_err(|e| anyhow::anyhow!("malformed handler output: {e}"))?;
        Ok(output)
    }
}
