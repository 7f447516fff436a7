use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use super::{Delivery, Notifier};
use crate::config::WebhookConfig;
use crate::Result;

/// JSON body posted to the webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub username: String,
    pub avatar_url: String,
    pub content: String,
}

/// Posts new links to a webhook (Discord-compatible payload)
pub struct WebhookNotifier {
    client: Client,
    endpoint: String,
    username: String,
    avatar_url: String,
    template: String,
}

impl WebhookNotifier {
    /// Create a notifier with its own HTTP client
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self::new(Client::new(), config)
    }

    pub fn new(client: Client, config: &WebhookConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            username: config.username.clone(),
            avatar_url: config.avatar_url.clone(),
            template: config.message.clone(),
        }
    }

    /// Build the payload announcing `link`
    pub fn payload(&self, link: &str) -> NotificationPayload {
        NotificationPayload {
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
            content: render_message(&self.template, link),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, link: &str) -> Result<Delivery> {
        let body = serde_json::to_string(&self.payload(link))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body.clone())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status_code = status.as_u16(),
                body = %text,
                "Return code is not 204"
            );
            return Ok(Delivery::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::info!(json = %body, "Payload sent");
        Ok(Delivery::Delivered)
    }
}

/// Substitute `link` into a printf-style template
///
/// The first `%s` takes the link and `%%` is a literal percent sign. A template
/// without `%s` gets the link appended after a space.
pub fn render_message(template: &str, link: &str) -> String {
    let mut out = String::with_capacity(template.len() + link.len());
    let mut substituted = false;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some('s') if !substituted => {
                chars.next();
                out.push_str(link);
                substituted = true;
            }
            _ => out.push('%'),
        }
    }

    if !substituted {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(link);
    }

    out
}
