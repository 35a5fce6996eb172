//! HTTP call that asks the backend to (re)generate a summary.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use appointly_core::BearerToken;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("http client setup failed: {0}")]
    Client(String),
    #[error("request failed: {0}")]
    Transport(String),
}

/// One summary-generation request against the backend.
///
/// Returns the HTTP status of the response; transport problems (connect
/// failure, timeout) are errors.
#[async_trait]
pub trait SummaryTrigger: Send + Sync + 'static {
    async fn trigger(&self, token: &BearerToken) -> Result<u16, TriggerError>;
}

/// `POST {backend_url}/summary/` with an empty body.
#[derive(Debug, Clone)]
pub struct HttpSummaryTrigger {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSummaryTrigger {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self, TriggerError> {
        let base = backend_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(TriggerError::InvalidUrl(backend_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TriggerError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{base}/summary/"),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SummaryTrigger for HttpSummaryTrigger {
    async fn trigger(&self, token: &BearerToken) -> Result<u16, TriggerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| TriggerError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        debug!(endpoint = %self.endpoint, status, "summary trigger answered");
        Ok(status)
    }
}
