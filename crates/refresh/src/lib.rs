//! One-shot summary refresh: read config, dispatch every label, report.

pub mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use appointly_infra::jobs::{DispatchReport, refresh_summaries};
use appointly_infra::store::{IdempotencyStore, RedisStore};

pub use config::{ConfigError, RefreshConfig};

/// Connect to Redis and run the refresh.
pub async fn run(config: &RefreshConfig) -> anyhow::Result<DispatchReport> {
    let store = RedisStore::connect(&config.redis_url)
        .await
        .with_context(|| format!("connecting to {}", config.redis_url))?;
    run_with_store(config, Arc::new(store)).await
}

/// Run the refresh against an already constructed marker store.
pub async fn run_with_store(
    config: &RefreshConfig,
    store: Arc<dyn IdempotencyStore>,
) -> anyhow::Result<DispatchReport> {
    if config.token.is_none() {
        warn!("JWT_TOKEN not set; any label that needs a refresh will abort the run");
    }

    let report = refresh_summaries(
        store,
        config.labels.iter().cloned(),
        config.concurrency,
        &config.api_url,
        config.token.as_ref(),
        config.request_timeout,
    )
    .await
    .context("summary refresh aborted")?;

    for (label, outcome) in report.iter() {
        info!(run_id = %report.run_id, label = %label, outcome = %outcome, "label finished");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;

    use appointly_core::{BearerToken, Label};
    use appointly_infra::jobs::DispatchOutcome;
    use appointly_infra::store::InMemoryIdempotencyStore;

    use super::*;

    fn config_for(api_url: String, token: Option<&str>) -> RefreshConfig {
        RefreshConfig {
            api_url,
            redis_url: "redis://unused".into(),
            token: token.and_then(BearerToken::new),
            labels: vec![Label::new("daily")],
            concurrency: 3,
            request_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn refreshes_once_then_skips() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/summary/")
                    .header("authorization", "Bearer abc");
                then.status(200);
            })
            .await;
        let store = Arc::new(InMemoryIdempotencyStore::new());
        let config = config_for(server.base_url(), Some("abc"));

        let first = run_with_store(&config, store.clone()).await.unwrap();
        let second = run_with_store(&config, store.clone()).await.unwrap();

        assert_eq!(first.get(&Label::new("daily")), Some(DispatchOutcome::Done));
        assert_eq!(second.get(&Label::new("daily")), Some(DispatchOutcome::Skipped));
        mock.assert_hits_async(1).await;
        assert_eq!(store.get("refresh_lock:summary:daily").as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn missing_token_aborts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/summary/");
                then.status(200);
            })
            .await;
        let config = config_for(server.base_url(), None);

        let err = run_with_store(&config, Arc::new(InMemoryIdempotencyStore::new()))
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("JWT_TOKEN"));
        mock.assert_hits_async(0).await;
    }
}
