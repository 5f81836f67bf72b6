//! The Interaction Source and Module Binary Store collaborators (distilled
//! spec §4.2, §6): everything the core engine needs from the Scheduler
//! Unit, reached only through these two traits.

pub mod error;
pub mod retry;
pub mod scheduler;
pub mod source;
pub mod store;

pub use error::SourceError;
pub use retry::RetryPolicy;
pub use scheduler::{HttpSchedulerClient, SchedulerClient};
pub use source::{HttpInteractionSource, InteractionSource};
pub use store::{HttpModuleBinaryStore, LocalModuleBinaryStore, ModuleBinaryStore};
