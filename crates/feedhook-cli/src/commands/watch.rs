use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use feedhook_core::{
    feed::FeedFetcher,
    health::HealthServer,
    notify::WebhookNotifier,
    scheduler::WatchService,
    store::{read_seed, LinkStore, StateStore},
    AppConfig, ErrorPolicy,
};

/// Continuous run: poll loop plus health endpoint until Ctrl+C
pub async fn run(config: Arc<AppConfig>) -> Result<()> {
    config.validate()?;

    let store = StateStore::from_config(&config)?;

    let (initial_link, seed_source) = match config.state.seed_path {
        Some(ref path) => (read_seed(path).await?, format!("Seed file {}", path.display())),
        None => (store.get().await?, store.describe()),
    };
    info!(link = %initial_link, source = %seed_source, "Previous");

    let fetcher = FeedFetcher::new(&config)?;
    let notifier = WebhookNotifier::from_config(&config.webhook);
    let policy = config.error_policy_or(ErrorPolicy::Recover);

    let service = WatchService::new(fetcher, notifier, store, config.poll.interval(), initial_link)
        .with_error_policy(policy);
    let health = HealthServer::new(config.health.addr.clone(), service.subscribe());
    let listener = health.bind().await?;

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Setup signal handler for graceful shutdown
    let shutdown_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_signal.send(true);
    });

    println!(
        "Watching {} every {} seconds. Press Ctrl+C to stop.",
        config.feed.url, config.poll.interval_secs
    );

    // Whichever side stops first takes the other one down with it
    let poll = async {
        let result = service.run(shutdown_rx.clone()).await;
        let _ = shutdown_tx.send(true);
        result
    };
    let serve = async {
        let result = health.serve(listener, shutdown_rx.clone()).await;
        let _ = shutdown_tx.send(true);
        result
    };
    let (poll_result, serve_result) = tokio::join!(poll, serve);

    service.store().report_usage();

    poll_result?;
    serve_result?;

    println!("Stopped.");
    Ok(())
}
