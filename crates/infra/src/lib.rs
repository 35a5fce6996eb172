//! Infrastructure layer: accounts, stores, the refresh dispatcher, the summary pipeline.

pub mod accounts;
pub mod appointments;
pub mod jobs;
pub mod store;
pub mod summary;
pub mod workers;
