//! Module Host and data model for the AO Compute Unit's deterministic
//! state-evaluation engine.
//!
//! This crate exposes:
//! - [`types`]: the process/interaction/state data model.
//! - [`module`]: the sandboxed WASM handler host (`ModuleHost`/`Handler`).
//! - [`error`]: engine-level (non-contained) failure taxonomy.
//! - [`logging`]: the injected hierarchical logging capability.

pub mod error;
pub mod logging;
pub mod module;
pub mod types;

pub use error::{HostError, Result};
pub use logging::Logger;
pub use module::{config::ResourcePolicy, Handler, ModuleHost};
pub use types::{
    EvaluationOutput, EvaluationRecord, FromBound, HandlerOutput, HandlerResult, Interaction,
    ProcessId, SortKey, ToBound,
};
