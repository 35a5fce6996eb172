//! Consumes summary jobs, asks the text generator for a summary and stores it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use appointly_ai::{AiError, TextGenerator, summarize};
use appointly_core::{DomainError, SummaryJob};

use crate::jobs::{Sleeper, TokioSleeper};
use crate::store::{StoreError, SummaryQueue};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Payload(#[from] DomainError),
    #[error(transparent)]
    Generation(#[from] AiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct SummaryWorkerConfig {
    /// How long one pop waits for a job.
    pub pop_timeout: Duration,
    /// Pause after a failed job or a store error.
    pub error_pause: Duration,
    /// Name for logging
    pub name: String,
}

impl Default for SummaryWorkerConfig {
    fn default() -> Self {
        Self {
            pop_timeout: Duration::from_secs(5),
            error_pause: Duration::from_secs(5),
            name: "summary-worker".to_string(),
        }
    }
}

impl SummaryWorkerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_pop_timeout(mut self, timeout: Duration) -> Self {
        self.pop_timeout = timeout;
        self
    }

    pub fn with_error_pause(mut self, pause: Duration) -> Self {
        self.error_pause = pause;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct WorkerStats {
    pub jobs_processed: u64,
    pub jobs_failed: u64,
}

/// Handle to stop a spawned worker and collect its stats.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: CancellationToken,
    join: JoinHandle<WorkerStats>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl WorkerHandle {
    /// Stats so far.
    pub fn stats(&self) -> WorkerStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Request shutdown and wait for the loop to exit.
    pub async fn shutdown(self) -> WorkerStats {
        self.shutdown.cancel();
        match self.join.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "summary worker task ended abnormally");
                self.stats.lock().map(|s| s.clone()).unwrap_or_default()
            }
        }
    }
}

#[derive(Clone)]
pub struct SummaryWorker {
    queue: Arc<dyn SummaryQueue>,
    generator: Arc<dyn TextGenerator>,
    sleeper: Arc<dyn Sleeper>,
    config: SummaryWorkerConfig,
}

impl SummaryWorker {
    pub fn new(queue: Arc<dyn SummaryQueue>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            queue,
            generator,
            sleeper: Arc::new(TokioSleeper),
            config: SummaryWorkerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SummaryWorkerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Summarise one raw job payload and store the result.
    ///
    /// Returns the number of appointments that were summarised.
    #[instrument(skip(self, raw), fields(worker = %self.config.name, model = self.generator.model()))]
    pub async fn process_job(&self, raw: &str) -> Result<usize, WorkerError> {
        let job = SummaryJob::from_payload(raw)?;
        let count = job.appointments.len();
        debug!(job_id = ?job.id, count, "summarising appointments");

        let summary = summarize(self.generator.as_ref(), &job).await?;
        self.queue.store_result(&summary).await?;
        Ok(count)
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Failures never stop the loop: the job is dropped, the error logged and
    /// the worker pauses before polling again.
    pub async fn run(&self, shutdown: CancellationToken) -> WorkerStats {
        let stats = Arc::new(Mutex::new(WorkerStats::default()));
        self.run_with_stats(shutdown, stats).await
    }

    /// Spawn the loop onto the current runtime.
    pub fn spawn(self) -> WorkerHandle {
        let shutdown = CancellationToken::new();
        let stats = Arc::new(Mutex::new(WorkerStats::default()));
        let join = {
            let shutdown = shutdown.clone();
            let stats = stats.clone();
            tokio::spawn(async move { self.run_with_stats(shutdown, stats).await })
        };
        WorkerHandle {
            shutdown,
            join,
            stats,
        }
    }

    async fn run_with_stats(
        &self,
        shutdown: CancellationToken,
        stats: Arc<Mutex<WorkerStats>>,
    ) -> WorkerStats {
        let name = self.config.name.as_str();
        info!(worker = name, "summary worker started");

        loop {
            let popped = tokio::select! {
                _ = shutdown.cancelled() => break,
                popped = self.queue.pop(self.config.pop_timeout) => popped,
            };

            let result = match popped {
                Ok(None) => continue,
                Ok(Some(raw)) => self.process_job(&raw).await,
                Err(e) => Err(e.into()),
            };

            match result {
                Ok(count) => {
                    if let Ok(mut s) = stats.lock() {
                        s.jobs_processed += 1;
                    }
                    info!(worker = name, count, "summary generated");
                }
                Err(e) => {
                    if let Ok(mut s) = stats.lock() {
                        s.jobs_failed += 1;
                    }
                    error!(worker = name, error = %e, "summary job failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = self.sleeper.sleep(self.config.error_pause) => {}
                    }
                }
            }
        }

        info!(worker = name, "summary worker stopped");
        stats.lock().map(|s| s.clone()).unwrap_or_default()
    }
}
