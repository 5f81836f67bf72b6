//! Module Binary Store: `loadSrc(processId) -> bytes`, immutable per
//! process version (distilled spec §6).

use async_trait::async_trait;
use cu_core::ProcessId;
use std::path::PathBuf;
use tracing::instrument;

use crate::error::SourceError;
use crate::retry::{with_retry, RetryPolicy};

#[async_trait]
pub trait ModuleBinaryStore: Send + Sync {
    /// # Errors
    /// Returns [`SourceError::NotFound`] if the process has no registered
    /// src, or a transient/exhausted error on upstream failure.
    async fn load_src(&self, process_id: &ProcessId) -> Result<Vec<u8>, SourceError>;
}

/// Fetches process WASM binaries from the Scheduler Unit's HTTP surface.
pub struct HttpModuleBinaryStore {
    client: reqwest::Client,
    base_url: reqwest::Url,
    retry: RetryPolicy,
}

impl HttpModuleBinaryStore {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: reqwest::Url) -> Self {
        Self {
            client,
            base_url,
            retry: RetryPolicy::default(),
        }
    }

    async fn fetch_once(&self, process_id: &ProcessId) -> Result<Vec<u8>, SourceError> {
        let url = self
            .base_url
            .join(&format!("/processes/{}/src", process_id.as_str()))
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                SourceError::Transient(e.to_string())
            } else {
                SourceError::Malformed(e.to_string())
            }
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(process_id.clone()));
        }
        if response.status().is_server_error() {
            return Err(SourceError::Transient(format!(
                "upstream status {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ModuleBinaryStore for HttpModuleBinaryStore {
    #[instrument(skip(self), fields(process_id = %process_id))]
    async fn load_src(&self, process_id: &ProcessId) -> Result<Vec<u8>, SourceError> {
        with_retry(self.retry, || self.fetch_once(process_id)).await
    }
}

/// Reads process WASM binaries named `<processId>.wasm` out of a local
/// directory. Used for local development and tests, where standing up a
/// Scheduler Unit would be overkill.
pub struct LocalModuleBinaryStore {
    dir: PathBuf,
}

impl LocalModuleBinaryStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl ModuleBinaryStore for LocalModuleBinaryStore {
    async fn load_src(&self, process_id: &ProcessId) -> Result<Vec<u8>, SourceError> {
        let path = self.dir.join(format!("{}.wasm", process_id.as_str()));
        tokio::fs::read(&path)
            .await
            .map_err(|_| SourceError::NotFound(process_id.clone()))
    }
}
