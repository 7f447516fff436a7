mod webhook;

pub use webhook::{render_message, NotificationPayload, WebhookNotifier};

use crate::Result;

/// Outcome of a send that reached the webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The endpoint answered 204 No Content
    Delivered,
    /// Any other status; logged by the notifier, never retried
    Rejected { status: u16, body: String },
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

/// Announces a new link
///
/// Transport failures are returned as errors, a rejected delivery is not.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, link: &str) -> Result<Delivery>;
}
