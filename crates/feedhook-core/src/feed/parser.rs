use feed_rs::parser;

use crate::{Error, Result};

/// What the poller needs from an RSS/Atom document
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: Option<String>,
    /// Link of the first (newest) entry, empty when the feed has no entries
    pub latest_link: String,
    pub entry_count: usize,
}

/// Parse RSS/Atom feed content
pub fn parse_feed(content: &[u8]) -> Result<ParsedFeed> {
    let feed = parser::parse(content)
        .map_err(|e| Error::FeedParse(e.to_string()))?;

    let title = feed.title.map(|t| t.content);

    let latest_link = feed.entries.first()
        .and_then(|entry| entry.links.first())
        .map(|link| link.href.clone())
        .unwrap_or_default();

    Ok(ParsedFeed {
        title,
        latest_link,
        entry_count: feed.entries.len(),
    })
}
