//! Shared tracing setup for the workspace binaries.

/// Initialize process-wide logging from the environment.
///
/// `RUST_LOG` selects the filter (default `info`), `LOG_FORMAT` the output
/// (`json` by default, or `pretty`). Calling this more than once is a no-op.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration.
pub mod tracing;

pub use crate::tracing::LogFormat;
