use tracing::info;

use appointly_refresh::{RefreshConfig, run};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    appointly_observability::init();

    let config = RefreshConfig::from_env()?;
    info!(
        api_url = %config.api_url,
        labels = config.labels.len(),
        concurrency = config.concurrency,
        "starting summary refresh"
    );

    let report = run(&config).await?;
    info!(
        run_id = %report.run_id,
        done = report.done(),
        skipped = report.skipped(),
        failed = report.failed(),
        "summary refresh complete"
    );
    Ok(())
}
