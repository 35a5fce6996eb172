//! `appointly-ai`
//!
//! **Responsibility:** boundary to the text-generation service used to
//! summarise appointments.
//!
//! - It does not talk to stores or queues; callers hand it a [`SummaryJob`].
//! - It produces plain text; persisting the result is the worker's job.
//! - The concrete third-party client lives behind [`TextGenerator`].
//!
//! [`SummaryJob`]: appointly_core::SummaryJob

pub mod generator;
pub mod prompt;
pub mod result;

pub use generator::{TextGenerator, summarize};
#[cfg(any(test, feature = "test-util"))]
pub use generator::FixedTextGenerator;
pub use prompt::{SUMMARY_PROMPT_PREFIX, summary_prompt};
pub use result::AiError;
