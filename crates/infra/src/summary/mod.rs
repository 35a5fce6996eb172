//! Request path of the summary pipeline: queue a snapshot, read the result.

mod service;

pub use service::{SummaryService, SummaryServiceError};
