use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::StoreError;

/// Markers recording that a unit of work already completed.
///
/// Keys expire on their own; an expired key reads as absent.
#[async_trait]
pub trait IdempotencyStore: Send + Sync + 'static {
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Write `value` under `key`, replacing any previous value and expiry.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;
}

#[derive(Debug)]
struct Marker {
    value: String,
    expires_at: Instant,
}

/// In-memory marker store.
///
/// Expiry follows `tokio::time`, so tests with a paused clock can step past it.
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyStore {
    markers: Mutex<HashMap<String, Marker>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn markers(&self) -> Result<MutexGuard<'_, HashMap<String, Marker>>, StoreError> {
        self.markers.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Current value under `key`, if present and not expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let markers = self.markers().ok()?;
        markers
            .get(key)
            .filter(|m| m.expires_at > now)
            .map(|m| m.value.clone())
    }

    /// Remaining lifetime of `key`.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let markers = self.markers().ok()?;
        markers
            .get(key)
            .filter(|m| m.expires_at > now)
            .map(|m| m.expires_at - now)
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut markers = self.markers()?;
        match markers.get(key) {
            Some(m) if m.expires_at > now => Ok(true),
            Some(_) => {
                markers.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let marker = Marker {
            value: value.to_string(),
            expires_at: now + ttl,
        };
        let mut markers = self.markers()?;
        markers.retain(|_, m| m.expires_at > now);
        markers.insert(key.to_string(), marker);
        Ok(())
    }
}
