//! Summary refresh jobs.
//!
//! - `RetryPolicy`: attempt count and exponential backoff schedule
//! - `SummaryTrigger`: the backend call (`HttpSummaryTrigger` over reqwest)
//! - `RefreshDispatcher`: per-label idempotency check, retries, marker write,
//!   bounded concurrency across labels

pub mod backoff;
pub mod dispatcher;
pub mod outcome;
pub mod sleeper;
pub mod trigger;

pub use backoff::RetryPolicy;
pub use dispatcher::{DONE_MARKER, DispatchError, RefreshDispatcher, RefreshPolicy, refresh_summaries};
pub use outcome::{DispatchOutcome, DispatchReport};
pub use sleeper::{Sleeper, TokioSleeper};
#[cfg(any(test, feature = "test-util"))]
pub use sleeper::RecordingSleeper;
pub use trigger::{HttpSummaryTrigger, SummaryTrigger, TriggerError};
