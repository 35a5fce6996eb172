//! Background workers.

pub mod summary_worker;

pub use summary_worker::{SummaryWorker, SummaryWorkerConfig, WorkerError, WorkerHandle, WorkerStats};
