use crate::config::ErrorPolicy;
use crate::feed::LinkSource;
use crate::notify::Notifier;
use crate::store::LinkStore;
use crate::Result;

/// What a single poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The feed could not be fetched or parsed (recover policy only)
    FetchFailed,
    /// The feed has no items
    Empty,
    /// Newest link equals the last one
    Unchanged,
    /// A new link was announced and recorded
    Updated { link: String },
}

/// Fetch, compare, notify, persist
///
/// `last_link` is replaced by the fetched link whenever it changed, even when
/// notification or persistence failed under the recover policy, so one change
/// leads to at most one notification attempt.
pub async fn run_cycle<S, N, L>(
    source: &S,
    notifier: &N,
    store: &L,
    last_link: &mut String,
    policy: ErrorPolicy,
) -> Result<CycleOutcome>
where
    S: LinkSource + ?Sized,
    N: Notifier + ?Sized,
    L: LinkStore + ?Sized,
{
    let current = match source.latest_link().await {
        Ok(link) => link,
        Err(e) => match policy {
            ErrorPolicy::Recover => {
                tracing::error!(error = %e, "Feed fetch failed, skipping cycle");
                return Ok(CycleOutcome::FetchFailed);
            }
            ErrorPolicy::FailFast => return Err(e),
        },
    };

    tracing::info!(link = %current, source = "RSS", "Current");

    if current.is_empty() {
        return Ok(CycleOutcome::Empty);
    }
    if current == *last_link {
        tracing::debug!(link = %current, "No new item");
        return Ok(CycleOutcome::Unchanged);
    }

    match notifier.notify(&current).await {
        Ok(delivery) => {
            if !delivery.is_delivered() {
                tracing::warn!(link = %current, "Webhook did not accept the notification");
            }
        }
        Err(e) => match policy {
            ErrorPolicy::Recover => {
                tracing::error!(link = %current, error = %e, "Failed to send notification");
            }
            ErrorPolicy::FailFast => return Err(e),
        },
    }

    if let Err(e) = store.set(&current).await {
        match policy {
            ErrorPolicy::Recover => {
                tracing::error!(link = %current, error = %e, "Failed to persist last link");
            }
            ErrorPolicy::FailFast => return Err(e),
        }
    }

    *last_link = current.clone();
    Ok(CycleOutcome::Updated { link: current })
}

/// Single-shot check: previous link from the store, one cycle, done
///
/// Reading the store is always fatal on error; the rest follows `policy`.
pub async fn check_once<S, N, L>(
    source: &S,
    notifier: &N,
    store: &L,
    policy: ErrorPolicy,
) -> Result<CycleOutcome>
where
    S: LinkSource + ?Sized,
    N: Notifier + ?Sized,
    L: LinkStore + ?Sized,
{
    let mut previous = store.get().await?;
    tracing::info!(link = %previous, "Previous");

    run_cycle(source, notifier, store, &mut previous, policy).await
}
