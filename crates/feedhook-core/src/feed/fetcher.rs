use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Proxy};
use url::Url;

use super::parser::{parse_feed, ParsedFeed};
use super::LinkSource;
use crate::config::AppConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const FEEDHOOK_USER_AGENT: &str = concat!("feedhook/", env!("CARGO_PKG_VERSION"));

/// Fetches the configured feed, one attempt per call
pub struct FeedFetcher {
    client: Client,
    url: String,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Self::build_client(config.feed.request_timeout_secs, &config.feed.proxy_url)?;
        let url = Self::resolve_url(&config.feed.url)?;

        Ok(Self { client, url })
    }

    /// Build HTTP client with optional timeout and proxy
    fn build_client(timeout_secs: Option<u64>, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        // Configure proxy if provided
        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        builder.build().map_err(Error::Http)
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.8,*/*;q=0.5"
            )
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(FEEDHOOK_USER_AGENT));
        headers
    }

    /// Validate the feed URL
    pub fn resolve_url(url: &str) -> Result<String> {
        Url::parse(url)?;
        Ok(url.to_string())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the feed
    pub async fn fetch(&self) -> Result<ParsedFeed> {
        tracing::debug!("Fetching feed from: {}", self.url);

        let response = self.client
            .get(&self.url)
            .headers(Self::build_headers())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FeedParse(format!(
                "HTTP {} for URL: {}",
                status,
                self.url
            )));
        }

        let content = response.bytes().await?;
        self.ensure_content_size(content.len())?;

        let parsed = parse_feed(&content)?;
        tracing::info!(
            title = parsed.title.as_deref().unwrap_or_default(),
            entries = parsed.entry_count,
            "Feed fetched"
        );

        Ok(parsed)
    }

    fn ensure_content_size(&self, size: usize) -> Result<()> {
        if size > MAX_FEED_BYTES {
            return Err(Error::FeedParse(format!(
                "Feed too large ({} bytes) for URL: {}",
                size,
                self.url
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LinkSource for FeedFetcher {
    async fn latest_link(&self) -> Result<String> {
        match self.fetch().await {
            Ok(parsed) => Ok(parsed.latest_link),
            Err(e) => {
                tracing::warn!(feed_url = %self.url, error = %e, "Failed parsing feed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Blog</title>
    <link>https://blog.example.com/</link>
    <description>Posts</description>
    <item><title>Newest</title><link>https://blog.example.com/posts/7</link></item>
  </channel>
</rss>"#;

    async fn spawn_feed_server() -> (String, tokio::task::JoinHandle<()>) {
        let app = Router::new()
            .route("/feed.xml", get(|| async { SAMPLE_RSS }))
            .route("/gone.xml", get(|| async { (StatusCode::NOT_FOUND, "gone") }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{address}"), handle)
    }

    fn fetcher_for(url: String) -> FeedFetcher {
        let mut config = AppConfig::default();
        config.feed.url = url;
        FeedFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_latest_link_from_server() {
        let (base, server) = spawn_feed_server().await;
        let fetcher = fetcher_for(format!("{base}/feed.xml"));

        let link = fetcher.latest_link().await.unwrap();
        assert_eq!(link, "https://blog.example.com/posts/7");

        server.abort();
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let (base, server) = spawn_feed_server().await;
        let fetcher = fetcher_for(format!("{base}/gone.xml"));

        let result = fetcher.latest_link().await;
        assert!(matches!(result, Err(Error::FeedParse(msg)) if msg.contains("404")));

        server.abort();
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = AppConfig::default();
        config.feed.url = "not a url".to_string();
        assert!(matches!(FeedFetcher::new(&config), Err(Error::UrlParse(_))));
    }

    #[test]
    fn test_regular_url_passthrough() {
        let result = FeedFetcher::resolve_url("https://example.com/feed.xml").unwrap();
        assert_eq!(result, "https://example.com/feed.xml");
    }
}
