//! `writeInteraction` (distilled spec §6): forwards an action to the
//! Scheduler Unit, which assigns it a sort key. The SU's key-assignment
//! policy is explicitly out of scope (distilled spec §1) — this is a
//! thin, opaque forwarding call, not a collaborator the core reasons
//! about.

use async_trait::async_trait;
use cu_core::{ProcessId, SortKey};
use serde::Deserialize;
use tracing::instrument;

use crate::error::SourceError;
use crate::retry::{with_retry, RetryPolicy};

#[async_trait]
pub trait SchedulerClient: Send + Sync {
    /// Submit `action` for `process_id` and return the sort key the
    /// Scheduler Unit assigned it.
    ///
    /// # Errors
    /// Returns [`SourceError`] if the Scheduler Unit is unavailable past
    /// the retry budget, or the process is unknown.
    async fn submit_interaction(
        &self,
        process_id: &ProcessId,
        action: &serde_json::Value,
    ) -> Result<SortKey, SourceError>;
}

#[derive(Deserialize)]
struct SubmitResponse {
    sort_key: SortKey,
}

/// Forwards interactions to the Scheduler Unit's HTTP surface.
pub struct HttpSchedulerClient {
    client: reqwest::Client,
    base_url: reqwest::Url,
    retry: RetryPolicy,
}

impl HttpSchedulerClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: reqwest::Url) -> Self {
        Self {
            client,
            base_url,
            retry: RetryPolicy::default(),
        }
    }

    async fn submit_once(
        &self,
        process_id: &ProcessId,
        action: &serde_json::Value,
    ) -> Result<SortKey, SourceError> {
        let url = self
            .base_url
            .join(&format!("/processes/{}/interactions", process_id.as_str()))
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let response = self
            .client
            .post(url)
            .json(action)
            .send()
            .await
            .map_err(|e| {
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

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;
        Ok(parsed.sort_key)
    }
}

#[async_trait]
impl SchedulerClient for HttpSchedulerClient {
    #[instrument(skip(self, action), fields(process_id = %process_id))]
    async fn submit_interaction(
        &self,
        process_id: &ProcessId,
        action: &serde_json::Value,
    ) -> Result<SortKey, SourceError> {
        with_retry(self.retry, || self.submit_once(process_id, action)).await
    }
}
