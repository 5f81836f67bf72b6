//! The flat ptr/len handler ABI: write three JSON buffers into guest
//! memory via the guest's exported `alloc`, call `handle`, read back one
//! JSON buffer. Grounded on the pack's WASM sandbox runtime reference
//! (`alloc_and_write` / `handle_trap`), adapted from a single combined
//! request/response envelope to the distilled spec's three-argument
//! `handle(state, action, env) -> output` signature.

use wasmtime::{Memory, Store, TypedFunc};

use crate::error::{HostError, Result};

pub type HandleFunc = TypedFunc<(i32, i32, i32, i32, i32, i32), (i32, i32)>;
pub type AllocFunc = TypedFunc<i32, i32>;

/// Allocate `len(bytes)` inside the guest via its exported `alloc`, then
/// copy `bytes` into the returned region. Returns `(ptr, len)`.
pub fn alloc_and_write<T>(
    store: &mut Store<T>,
    memory: &Memory,
    alloc: &AllocFunc,
    bytes: &[u8],
) -> anyhow::Result<(i32, i32)> {
    if bytes.is_empty() {
        return Ok((0, 0));
    }
    let len = i32::try_from(bytes.len()).map_err(|_| anyhow::anyhow!("buffer too large"))?;
    let ptr = alloc.call(&mut *store, len)?;
    let ptr_usize = usize::try_from(ptr).map_err(|_| anyhow::anyhow!("alloc returned negative pointer"))?;
    memory
        .data_mut(&mut *store)
        .get_mut(ptr_usize..ptr_usize + bytes.len())
        .ok_or_else(|| anyhow::anyhow!("alloc returned out-of-bounds region"))?
        .copy_from_slice(bytes);
    Ok((ptr, len))
}

/// Read `len` bytes at `ptr` out of guest linear memory.
pub fn read_bytes<T>(store: &Store<T>, memory: &Memory, ptr: i32, len: i32) -> anyhow::Result<Vec<u8>> {
    if len == 0 {
        return Ok(Vec::new());
    }
    let ptr = usize::try_from(ptr).map_err(|_| anyhow::anyhow!("negative out pointer"))?;
    let len = usize::try_from(len).map_err(|_| anyhow::anyhow!("negative out length"))?;
    memory
        .data(store)
        .get(ptr..ptr + len)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| anyhow::anyhow!("out-of-bounds output region"))
}

/// Classify a guest trap/link failure. `fuel`/`epoch` exhaustion is a
/// resource-budget trap (`ResourceExhaustion`, contained as a `StepError`
/// per distilled spec §7); anything else is an opaque guest trap, also
/// contained. Neither path produces a `HostError` — only instantiation
/// failures do.
pub fn describe_trap(err: &anyhow::Error) -> String {
    let msg = err.to_string();
    if msg.contains("fuel") {
        "resource exhaustion: out of fuel".to_string()
    } else if msg.contains("epoch") || msg.contains("interrupt") {
        "resource exhaustion: deadline exceeded".to_string()
    } else {
        format!("trap: {msg}")
    }
}

pub fn missing_export(name: &str) -> HostError {
    HostError::Configuration(format!("module does not export `{name}`"))
}

pub type HandleResult<T> = Result<T>;
