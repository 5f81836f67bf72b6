//! Compiled-module disk cache, keyed by a digest of the WASM source and the
//! engine's precompile-compatibility fingerprint.
//!
//! Grounded on the teacher's `internal::module::cache`: same SHA-256 key
//! construction and same atomic-write-via-rename strategy, adapted from
//! caching a `Component` to caching a core `Module`.

use std::{
    hash::{Hash, Hasher},
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};
use std::collections::hash_map::DefaultHasher;

use sha2::{Digest, Sha256};
use wasmtime::Engine;

use crate::error::{HostError, Result};

fn engine_fingerprint(engine: &Engine) -> u64 {
    let mut hasher = DefaultHasher::new();
    engine.precompile_compatibility_hash().hash(&mut hasher);
    hasher.finish()
}

/// Content-addressed cache key for a compiled module: a function of the
/// WASM bytes and the engine configuration only. Identical source always
/// compiles to the same key, which is what makes `instantiate` deterministic
/// across process restarts (distilled spec §4.1).
#[must_use]
pub fn cache_key(engine: &Engine, wasm_bytes: &[u8]) -> String {
    let mut wasm_hash = Sha256::new();
    wasm_hash.update(wasm_bytes);
    let wasm_digest = wasm_hash.finalize();

    let mut h = Sha256::new();
    h.update(b"ao-cu-module-cache-v1\0");
    h.update(wasm_digest);
    h.update(engine_fingerprint(engine).to_le_bytes());

    let digest = h.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

pub async fn write_cache_file_atomic(cache_path: &Path, bytes: &[u8]) -> Result<()> {
    static CACHE_WRITE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

    let sequence = CACHE_WRITE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let tmp_path =
        cache_path.with_extension(format!("cwasm.tmp-{}-{sequence}", std::process::id()));

    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(HostError::from)?;
    match tokio::fs::rename(&tmp_path, cache_path).await {
        Ok(()) => Ok(()),
        // A concurrent compiler for the same key already won the race.
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            Ok(())
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            Err(e.into())
        }
    }
}
