//! Key/value stores shared with the API service and the summary worker.
//!
//! Two traits cover what this workspace needs from the store:
//!
//! - [`IdempotencyStore`]: existence checks and set-with-expiry for refresh markers
//! - [`SummaryQueue`]: the summary job list plus the latest-result slot
//!
//! In-memory implementations back tests and local runs; the Redis
//! implementation (feature `redis`) is what deployments use.

mod error;
mod idempotency;
mod summary_queue;

#[cfg(feature = "redis")]
mod redis_store;

pub use error::StoreError;
pub use idempotency::{IdempotencyStore, InMemoryIdempotencyStore};
pub use summary_queue::{InMemorySummaryQueue, SummaryQueue};

#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
