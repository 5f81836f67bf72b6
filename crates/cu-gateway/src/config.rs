//! Typed configuration loaded from environment variables, in the style of
//! the teacher's `AppState::new` (`std::env::var` plus typed fields, no
//! config file parser for a handful of knobs).

use std::path::PathBuf;

use cu_core::ResourcePolicy;

#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the HTTP surface binds to.
    pub port: u16,
    /// Base URL of the Scheduler Unit (Interaction Source, Module Binary
    /// Store, and the `writeInteraction` forwarding target).
    pub scheduler_base_url: reqwest::Url,
    /// On-disk path for the `redb` evaluation cache.
    pub cache_path: PathBuf,
    /// On-disk directory for the compiled-module cache. `None` disables
    /// it (every `instantiate` recompiles).
    pub module_cache_dir: Option<PathBuf>,
    /// Per-`handle`-call resource policy (fuel budget, deadline, memory
    /// ceiling).
    pub resource_policy: ResourcePolicy,
}

impl Config {
    /// # Errors
    /// Returns an error if `SU_BASE_URL` is set but not a valid URL, or if
    /// `PORT` is set but not a valid `u16`.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .map(|p| p.parse::<u16>())
            .transpose()?
            .unwrap_or(3000);

        let scheduler_base_url = std::env::var("SU_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:4000".to_string())
            .parse()?;

        let cache_path = std::env::var("CU_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("cu-cache.redb"));

        let module_cache_dir = std::env::var("CU_MODULE_CACHE_DIR")
            .ok()
            .map(PathBuf::from);

        Ok(Self {
            port,
            scheduler_base_url,
            cache_path,
            module_cache_dir,
            resource_policy: ResourcePolicy::default(),
        })
    }
}
