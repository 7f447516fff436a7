use anyhow::Result;
use tracing::info;

use feedhook_core::{
    feed::FeedFetcher,
    notify::WebhookNotifier,
    scheduler::{check_once, CycleOutcome},
    store::StateStore,
    AppConfig, ErrorPolicy,
};

/// Single-shot run: any configuration, fetch, transport or store error ends the process
pub async fn run(config: &AppConfig) -> Result<()> {
    config.validate()?;

    let store = StateStore::from_config(config)?;
    info!(source = %store.describe(), "Using state store");

    let fetcher = FeedFetcher::new(config)?;
    let notifier = WebhookNotifier::from_config(&config.webhook);
    let policy = config.error_policy_or(ErrorPolicy::FailFast);

    let result = check_once(&fetcher, &notifier, &store, policy).await;
    store.report_usage();

    match result? {
        CycleOutcome::Updated { link } => info!(link = %link, "New item announced"),
        CycleOutcome::Unchanged => info!("No new item"),
        CycleOutcome::Empty => info!("Feed has no items"),
        CycleOutcome::FetchFailed => info!("Feed could not be fetched, nothing sent"),
    }

    Ok(())
}
