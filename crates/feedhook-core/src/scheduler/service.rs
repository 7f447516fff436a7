use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::ErrorPolicy;
use crate::feed::LinkSource;
use crate::notify::Notifier;
use crate::store::LinkStore;
use crate::Result;

use super::tasks::{run_cycle, CycleOutcome};

/// Continuous poller: one cycle per interval until shutdown
///
/// The service is the only writer of the last link. Readers such as the
/// health endpoint get a [`watch::Receiver`] from [`WatchService::subscribe`].
pub struct WatchService<S, N, L> {
    source: S,
    notifier: N,
    store: L,
    interval: Duration,
    policy: ErrorPolicy,
    last_link: watch::Sender<String>,
}

impl<S, N, L> WatchService<S, N, L>
where
    S: LinkSource,
    N: Notifier,
    L: LinkStore,
{
    /// Create a new watch service seeded with `initial_link`
    pub fn new(source: S, notifier: N, store: L, interval: Duration, initial_link: String) -> Self {
        let (last_link, _) = watch::channel(initial_link);
        Self {
            source,
            notifier,
            store,
            interval,
            policy: ErrorPolicy::Recover,
            last_link,
        }
    }

    /// Set how cycle failures are handled
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Read handle on the in-memory last link
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.last_link.subscribe()
    }

    pub fn last_link(&self) -> String {
        self.last_link.borrow().clone()
    }

    pub fn store(&self) -> &L {
        &self.store
    }

    /// Run cycles until the shutdown signal
    ///
    /// Only returns an error under [`ErrorPolicy::FailFast`].
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            policy = %self.policy,
            last_link = %self.last_link(),
            "Watch service started"
        );

        loop {
            let started = Instant::now();
            let mut last = self.last_link();

            match run_cycle(&self.source, &self.notifier, &self.store, &mut last, self.policy).await {
                Ok(CycleOutcome::Updated { link }) => {
                    info!(link = %link, "New item announced");
                    self.last_link.send_replace(last);
                }
                Ok(outcome) => {
                    debug!(?outcome, "Cycle finished");
                }
                Err(e) => {
                    error!(error = %e, "Cycle failed");
                    return Err(e);
                }
            }

            let delay = next_delay(self.interval, started.elapsed());
            if delay.is_zero() {
                debug!("Cycle overran the interval, starting next one immediately");
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Watch service received shutdown signal");
                        break;
                    }
                }
            }
        }

        info!("Watch service stopped");
        Ok(())
    }
}

/// Time left in the interval after a cycle took `elapsed`, never negative
pub fn next_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}
