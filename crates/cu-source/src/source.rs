//! Interaction Source (distilled spec §4.2): yields a finite, totally
//! ordered sequence of interactions for a process from the Scheduler Unit.

use async_trait::async_trait;
use cu_core::{FromBound, Interaction, ProcessId, ToBound};
use tracing::instrument;

use crate::error::SourceError;
use crate::retry::{with_retry, RetryPolicy};

#[async_trait]
pub trait InteractionSource: Send + Sync {
    /// Yield interactions strictly after `from` up to and including `to`,
    /// in strictly increasing sort-key order. No duplicates, no gaps
    /// relative to the Scheduler Unit's canonical order.
    ///
    /// # Errors
    /// Returns [`SourceError`] if the upstream is unavailable past the
    /// retry budget, or the process is unknown.
    async fn list_interactions(
        &self,
        process_id: &ProcessId,
        from: &FromBound,
        to: &ToBound,
    ) -> Result<Vec<Interaction>, SourceError>;
}

/// Fetches interactions from the Scheduler Unit's HTTP surface.
pub struct HttpInteractionSource {
    client: reqwest::Client,
    base_url: reqwest::Url,
    retry: RetryPolicy,
}

impl HttpInteractionSource {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: reqwest::Url) -> Self {
        Self {
            client,
            base_url,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn bound_query(from: &FromBound, to: &ToBound) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(2);
        match from {
            FromBound::Genesis => {}
            FromBound::Exclusive(sort_key) => {
                query.push(("from-exclusive", sort_key.as_str().to_string()));
            }
        }
        match to {
            ToBound::Latest => query.push(("to", "latest".to_string())),
            ToBound::Inclusive(sort_key) => {
                query.push(("to", sort_key.as_str().to_string()));
            }
        }
        query
    }

    async fn fetch_once(
        &self,
        process_id: &ProcessId,
        from: &FromBound,
        to: &ToBound,
    ) -> Result<Vec<Interaction>, SourceError> {
        let url = self
            .base_url
            .join(&format!("/processes/{}/interactions", process_id.as_str()))
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .query(&Self::bound_query(from, to))
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(process_id.clone()));
        }
        if response.status().is_server_error() {
            return Err(SourceError::Transient(format!(
                "upstream status {}",
                response.status()
            )));
        }
        if !response.status().is_success() {
            return Err(SourceError::Malformed(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        response
            .json::<Vec<Interaction>>()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl InteractionSource for HttpInteractionSource {
    #[instrument(skip(self), fields(process_id = %process_id))]
    async fn list_interactions(
        &self,
        process_id: &ProcessId,
        from: &FromBound,
        to: &ToBound,
    ) -> Result<Vec<Interaction>, SourceError> {
        with_retry(self.retry, || self.fetch_once(process_id, from, to)).await
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() || err.is_connect() {
        SourceError::Transient(err.to_string())
    } else {
        SourceError::Malformed(err.to_string())
    }
}
