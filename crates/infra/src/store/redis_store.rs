//! Redis-backed store.
//!
//! Key layout:
//!
//! - `refresh_lock:summary:{label}`: refresh markers, `SET .. EX`
//! - `summary_jobs`: job list, `LPUSH` / `BLPOP`
//! - `latest_summary`: last generated summary, plain `SET`

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::instrument;

use appointly_core::{SUMMARY_QUEUE_KEY, SUMMARY_RESULT_KEY};

use super::{IdempotencyStore, StoreError, SummaryQueue};

/// Store backed by one multiplexed Redis connection.
///
/// `BLPOP` holds the connection for the whole wait, so the summary worker
/// should own a separate `RedisStore` from request-path callers.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    queue_key: String,
    result_key: String,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| StoreError::Connection(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            conn,
            queue_key: SUMMARY_QUEUE_KEY.to_string(),
            result_key: SUMMARY_RESULT_KEY.to_string(),
        })
    }

    /// Use different queue/result keys (e.g. to isolate test runs).
    pub fn with_keys(mut self, queue_key: impl Into<String>, result_key: impl Into<String>) -> Self {
        self.queue_key = queue_key.into();
        self.result_key = result_key.into();
        self
    }
}

#[async_trait]
impl IdempotencyStore for RedisStore {
    #[instrument(skip(self))]
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(exists)
    }

    #[instrument(skip(self, value))]
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(seconds)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SummaryQueue for RedisStore {
    async fn push(&self, payload: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("LPUSH")
            .arg(&self.queue_key)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        // BLPOP treats 0 as "block forever".
        let seconds = timeout.as_secs().max(1);
        let popped: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(&self.queue_key)
            .arg(seconds)
            .query_async(&mut conn)
            .await?;
        Ok(popped.map(|(_, payload)| payload))
    }

    async fn store_result(&self, summary: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(&self.result_key)
            .arg(summary)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn latest_result(&self) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(&self.result_key)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    #[tokio::test]
    #[ignore = "requires a running redis"]
    async fn marker_round_trip_against_live_redis() {
        let store = RedisStore::connect(&redis_url()).await.unwrap();
        let key = format!("refresh_lock:summary:test-{}", appointly_core::RunId::new());

        assert!(!store.exists(&key).await.unwrap());
        store
            .set_with_expiry(&key, "done", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(store.exists(&key).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires a running redis"]
    async fn queue_round_trip_against_live_redis() {
        let suffix = appointly_core::RunId::new();
        let store = RedisStore::connect(&redis_url())
            .await
            .unwrap()
            .with_keys(format!("summary_jobs:test-{suffix}"), format!("latest_summary:test-{suffix}"));

        store.push(r#"{"appointments":[]}"#).await.unwrap();
        let popped = store.pop(Duration::from_secs(1)).await.unwrap();
        assert_eq!(popped.as_deref(), Some(r#"{"appointments":[]}"#));

        store.store_result("hello").await.unwrap();
        assert_eq!(store.latest_result().await.unwrap().as_deref(), Some("hello"));
    }
}
