//! Idempotent, bounded-concurrency summary refresh.
//!
//! For every label the dispatcher waits for a concurrency slot, skips labels
//! whose marker is still live, and otherwise asks the backend to generate a
//! summary, retrying with exponential backoff. Only a `200` response counts
//! as success; it is recorded by writing `done` under the label's key with
//! the cooldown as expiry.
//!
//! The existence check and the marker write are not atomic. Two runs that
//! overlap on the same label can both trigger the backend; the backend tolerates
//! a duplicate request.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, instrument, warn};

use appointly_core::{BearerToken, Label, RunId};

use crate::store::IdempotencyStore;

use super::backoff::RetryPolicy;
use super::outcome::{DispatchOutcome, DispatchReport};
use super::sleeper::{Sleeper, TokioSleeper};
use super::trigger::{HttpSummaryTrigger, SummaryTrigger, TriggerError};

/// Value stored under an idempotency key after a successful refresh.
pub const DONE_MARKER: &str = "done";

const SUCCESS_STATUS: u16 = 200;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// A label needed a backend call but no bearer token was configured.
    #[error("JWT_TOKEN is required to call the API")]
    MissingToken,
    #[error("concurrency limit must be at least 1")]
    InvalidConcurrency,
    #[error("concurrency slots closed")]
    SlotsClosed,
    #[error("dispatch task failed: {0}")]
    Task(String),
    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// Lifetime of the marker written after a successful refresh.
    pub cooldown: Duration,
    pub retry: RetryPolicy,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        }
    }
}

impl RefreshPolicy {
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Clone)]
pub struct RefreshDispatcher {
    store: Arc<dyn IdempotencyStore>,
    trigger: Arc<dyn SummaryTrigger>,
    sleeper: Arc<dyn Sleeper>,
    policy: RefreshPolicy,
}

impl RefreshDispatcher {
    pub fn new(store: Arc<dyn IdempotencyStore>, trigger: Arc<dyn SummaryTrigger>) -> Self {
        Self {
            store,
            trigger,
            sleeper: Arc::new(TokioSleeper),
            policy: RefreshPolicy::default(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    /// Dispatch every label concurrently, at most `concurrency_limit` at a time.
    ///
    /// Limits above [`Semaphore::MAX_PERMITS`] are clamped to it.
    ///
    /// A label listed twice is dispatched twice; the report keeps whichever
    /// outcome finished last. A missing token aborts the whole run as soon as
    /// one label needs it; labels already in flight are cancelled.
    pub async fn dispatch_all<I>(
        &self,
        labels: I,
        concurrency_limit: usize,
        token: Option<&BearerToken>,
    ) -> Result<DispatchReport, DispatchError>
    where
        I: IntoIterator<Item = Label>,
    {
        if concurrency_limit == 0 {
            return Err(DispatchError::InvalidConcurrency);
        }

        let run_id = RunId::new();
        self.run(run_id, labels.into_iter().collect(), concurrency_limit, token)
            .await
    }

    #[instrument(
        name = "refresh_run",
        skip_all,
        fields(run_id = %run_id, labels = labels.len(), concurrency_limit = concurrency_limit)
    )]
    async fn run(
        &self,
        run_id: RunId,
        labels: Vec<Label>,
        concurrency_limit: usize,
        token: Option<&BearerToken>,
    ) -> Result<DispatchReport, DispatchError> {
        let slots = Arc::new(Semaphore::new(concurrency_limit.min(Semaphore::MAX_PERMITS)));
        let mut tasks = JoinSet::new();

        for label in labels {
            let this = self.clone();
            let slots = slots.clone();
            let token = token.cloned();
            tasks.spawn(
                async move {
                    let outcome = this.dispatch_one(&label, &slots, token.as_ref()).await;
                    (label, outcome)
                }
                .in_current_span(),
            );
        }

        let mut report = DispatchReport::new(run_id);
        while let Some(joined) = tasks.join_next().await {
            let (label, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tasks.abort_all();
                    error!(error = %e, "dispatch task did not complete");
                    return Err(DispatchError::Task(e.to_string()));
                }
            };
            match outcome {
                Ok(outcome) => report.record(label, outcome),
                Err(e) => {
                    tasks.abort_all();
                    error!(label = %label, error = %e, "refresh run aborted");
                    return Err(e);
                }
            }
        }

        info!(
            done = report.done(),
            skipped = report.skipped(),
            failed = report.failed(),
            "refresh run finished"
        );
        Ok(report)
    }

    /// Dispatch a single label while holding one of `slots`.
    ///
    /// The marker check happens before the token check, so a label that is
    /// still in cooldown reports `Skipped` even without a token.
    #[instrument(skip(self, slots, token), fields(label = %label))]
    pub async fn dispatch_one(
        &self,
        label: &Label,
        slots: &Semaphore,
        token: Option<&BearerToken>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let _permit = slots.acquire().await.map_err(|_| DispatchError::SlotsClosed)?;

        let key = label.idempotency_key();
        match self.store.exists(&key).await {
            Ok(true) => {
                info!("already refreshed recently; skipping");
                return Ok(DispatchOutcome::Skipped);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "idempotency check failed");
                return Ok(DispatchOutcome::Failed);
            }
        }

        let token = token.ok_or(DispatchError::MissingToken)?;
        let retry = &self.policy.retry;

        for attempt in 0..retry.max_attempts {
            match self.trigger.trigger(token).await {
                Ok(SUCCESS_STATUS) => {
                    if let Err(e) = self
                        .store
                        .set_with_expiry(&key, DONE_MARKER, self.policy.cooldown)
                        .await
                    {
                        warn!(error = %e, "summary triggered but marker write failed");
                    }
                    info!(attempt = attempt + 1, "summary refresh triggered");
                    return Ok(DispatchOutcome::Done);
                }
                Ok(status) => {
                    warn!(attempt = attempt + 1, status, "backend did not accept refresh");
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "refresh attempt failed");
                }
            }

            if retry.should_retry(attempt) {
                let delay = retry.delay_for_attempt(attempt);
                debug!(delay_ms = delay.as_millis() as u64, "backing off");
                self.sleeper.sleep(delay).await;
            }
        }

        error!(attempts = retry.max_attempts, "summary refresh failed after retries");
        Ok(DispatchOutcome::Failed)
    }
}

/// Refresh `labels` against `backend_url` with the default policy.
pub async fn refresh_summaries<I>(
    store: Arc<dyn IdempotencyStore>,
    labels: I,
    concurrency_limit: usize,
    backend_url: &str,
    token: Option<&BearerToken>,
    request_timeout: Duration,
) -> Result<DispatchReport, DispatchError>
where
    I: IntoIterator<Item = Label>,
{
    let trigger = HttpSummaryTrigger::new(backend_url, request_timeout)?;
    RefreshDispatcher::new(store, Arc::new(trigger))
        .dispatch_all(labels, concurrency_limit, token)
        .await
}
