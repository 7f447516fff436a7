mod fetcher;
mod parser;

pub use fetcher::FeedFetcher;
pub use parser::{parse_feed, ParsedFeed};

use crate::Result;

/// Source of the newest item link
#[async_trait::async_trait]
pub trait LinkSource: Send + Sync {
    /// Link of the newest item, or an empty string when there is none
    async fn latest_link(&self) -> Result<String>;
}
