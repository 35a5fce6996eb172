//! Domain building blocks shared by the API service, the refresh dispatcher
//! and the summary worker.
//!
//! This crate contains **pure domain** types (no I/O, no runtime).

pub mod appointment;
pub mod error;
pub mod id;
pub mod label;
pub mod summary;
pub mod token;
pub mod user;

pub use appointment::{Appointment, AppointmentPatch, NewAppointment, export_csv};
pub use error::{DomainError, DomainResult};
pub use id::{AppointmentId, JobId, RunId, UserId};
pub use label::{IDEMPOTENCY_KEY_PREFIX, Label};
pub use summary::{
    QueuedSummary, SUMMARY_QUEUE_KEY, SUMMARY_RESULT_KEY, SummaryJob, SummaryResult, SummaryState,
};
pub use token::BearerToken;
pub use user::{AccessToken, Credentials, DEFAULT_ROLE, User};
