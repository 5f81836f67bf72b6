use thiserror::Error;

pub type Result<T, E = HostError> = core::result::Result<T, E>;

/// Engine-level failures for the Module Host. `HostError` is returned only
/// from instantiation and link-time setup — a trap or guest error during
/// `Handler::handle` is contained into a `HandlerOutput` instead, never
/// propagated here (distilled spec §4.1, §7).
#[derive(Debug, Error)]
pub enum HostError {
    /// Missing src, bad binary, or an import the host does not expose.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Wasmtime engine/runtime failure during compile or instantiate.
    #[error("wasm engine error: {0}")]
    Wasm(#[source] anyhow::Error),

    /// Filesystem I/O error against the compiled-module cache.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
