//! Refresh labels and the idempotency keys derived from them.

use serde::{Deserialize, Serialize};

/// Prefix of every idempotency key written by the refresh dispatcher.
pub const IDEMPOTENCY_KEY_PREFIX: &str = "refresh_lock:summary:";

/// Logical identifier of one refresh target (e.g. a schedule name such as `daily`).
///
/// Labels are opaque: no normalisation is applied, so `"daily"` and `"Daily"`
/// are different targets with different idempotency keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which a successful refresh of this label is recorded.
    pub fn idempotency_key(&self) -> String {
        format!("{IDEMPOTENCY_KEY_PREFIX}{}", self.0)
    }

    /// Split a comma-separated list, trimming entries and dropping empty ones.
    pub fn parse_list(raw: &str) -> Vec<Label> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Label::new)
            .collect()
    }
}

impl core::fmt::Display for Label {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self(value)
    }
}
