//! Canonical serialisation for evaluation records and wire types.
//!
//! The evaluation cache's write-once contract depends on byte-identical
//! serialisation for identical records: fixed field order, decimal numbers,
//! UTF-8 strings, no trailing whitespace. [`serde_json`]'s compact writer
//! already gives us the last three; this module only has to make sure we
//! never reach for the pretty-printer or an order-preserving map by accident.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Serialize `value` to its canonical compact JSON byte representation.
///
/// # Errors
/// Returns an error if `value`'s `Serialize` impl fails.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Serialize `value` to its canonical compact JSON string representation.
///
/// # Errors
/// Returns an error if `value`'s `Serialize` impl fails.
pub fn canonical_string<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Compare two values for canonical equality: identical canonical bytes.
///
/// # Errors
/// Returns an error if either value fails to serialize.
pub fn canonical_eq<T: Serialize>(a: &T, b: &T) -> Result<bool> {
    Ok(canonical_bytes(a)? == canonical_bytes(b)?)
}
