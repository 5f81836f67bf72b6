//! The Evaluation Cache (distilled spec §4.3): persists
//! `(processId, sortKey) -> EvaluationRecord`, answers "closest cached
//! state at or before sortKey S", and deduplicates concurrent evaluations
//! of the same process via single-flight.

pub mod cache;
pub mod error;
pub mod key;
pub mod single_flight;

pub use cache::{EvaluationCache, RedbEvaluationCache};
pub use error::CacheError;
pub use single_flight::SingleFlight;
