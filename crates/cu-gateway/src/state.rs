use std::sync::Arc;

use cu_cache::RedbEvaluationCache;
use cu_core::ModuleHost;
use cu_evaluator::Evaluator;
use cu_source::{HttpInteractionSource, HttpModuleBinaryStore, HttpSchedulerClient, SchedulerClient};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Evaluator,
    pub scheduler: Arc<dyn SchedulerClient>,
}

impl AppState {
    /// # Errors
    /// Returns an error if the Module Host's epoch ticker fails to start,
    /// or the evaluation cache file can't be opened.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::new();

        let host = ModuleHost::new(config.module_cache_dir.clone(), config.resource_policy)?;
        let cache = RedbEvaluationCache::open(&config.cache_path)?;
        let source = HttpInteractionSource::new(client.clone(), config.scheduler_base_url.clone());
        let store = HttpModuleBinaryStore::new(client.clone(), config.scheduler_base_url.clone());
        let scheduler = HttpSchedulerClient::new(client, config.scheduler_base_url.clone());

        let evaluator = Evaluator::new(host, Arc::new(cache), Arc::new(source), Arc::new(store));

        Ok(Self {
            evaluator,
            scheduler: Arc::new(scheduler),
        })
    }
}
