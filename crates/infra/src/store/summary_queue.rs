use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::StoreError;

/// Summary job list plus the single latest-result slot.
///
/// Producers push to the head and consumers pop from the head, so the most
/// recently queued job is served first.
#[async_trait]
pub trait SummaryQueue: Send + Sync + 'static {
    async fn push(&self, payload: &str) -> Result<(), StoreError>;

    /// Wait up to `timeout` for a job. `Ok(None)` means nothing arrived.
    async fn pop(&self, timeout: Duration) -> Result<Option<String>, StoreError>;

    /// Overwrite the latest-result slot.
    async fn store_result(&self, summary: &str) -> Result<(), StoreError>;

    async fn latest_result(&self) -> Result<Option<String>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemorySummaryQueue {
    jobs: Mutex<VecDeque<String>>,
    result: Mutex<Option<String>>,
    available: Notify,
}

impl InMemorySummaryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn jobs(&self) -> Result<MutexGuard<'_, VecDeque<String>>, StoreError> {
        self.jobs.lock().map_err(|_| StoreError::Poisoned)
    }

    fn result(&self) -> Result<MutexGuard<'_, Option<String>>, StoreError> {
        self.result.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Number of jobs waiting.
    pub fn pending(&self) -> usize {
        self.jobs().map(|j| j.len()).unwrap_or_default()
    }

    /// Waiting jobs, head first.
    pub fn snapshot(&self) -> Vec<String> {
        self.jobs()
            .map(|j| j.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SummaryQueue for InMemorySummaryQueue {
    async fn push(&self, payload: &str) -> Result<(), StoreError> {
        self.jobs()?.push_front(payload.to_string());
        self.available.notify_one();
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<String>, StoreError> {
        let deadline = Instant::now() + timeout;
        loop {
            let next = {
                let mut jobs = self.jobs()?;
                jobs.pop_front()
            };
            if next.is_some() {
                return Ok(next);
            }
            if tokio::time::timeout_at(deadline, self.available.notified())
                .await
                .is_err()
            {
                return Ok(None);
            }
        }
    }

    async fn store_result(&self, summary: &str) -> Result<(), StoreError> {
        *self.result()? = Some(summary.to_string());
        Ok(())
    }

    async fn latest_result(&self) -> Result<Option<String>, StoreError> {
        Ok(self.result()?.clone())
    }
}
