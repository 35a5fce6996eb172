use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use appointly_core::{DomainError, QueuedSummary, SummaryJob, SummaryResult};

use crate::appointments::{AppointmentRepository, RepositoryError};
use crate::store::{StoreError, SummaryQueue};

#[derive(Debug, Error)]
pub enum SummaryServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Payload(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct SummaryService {
    appointments: Arc<dyn AppointmentRepository>,
    queue: Arc<dyn SummaryQueue>,
}

impl SummaryService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>, queue: Arc<dyn SummaryQueue>) -> Self {
        Self {
            appointments,
            queue,
        }
    }

    /// Queue a summary of every current appointment.
    #[instrument(skip(self))]
    pub async fn request_summary(&self) -> Result<QueuedSummary, SummaryServiceError> {
        let appointments = self.appointments.list()?;
        let count = appointments.len();
        let job = SummaryJob::new(&appointments)?;
        let payload = job.to_payload()?;

        self.queue.push(&payload).await?;
        info!(job_id = ?job.id, count, "summary job queued");
        Ok(QueuedSummary::new(count))
    }

    pub async fn summary_result(&self) -> Result<SummaryResult, SummaryServiceError> {
        let slot = self.queue.latest_result().await?;
        Ok(SummaryResult::from_slot(slot))
    }
}
