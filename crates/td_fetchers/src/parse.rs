use chrono::{DateTime, Utc};
use feed_rs::parser;
use scraper::Html;
use td_core::{Error, Result};

/// One feed entry, reduced to what the fetcher needs.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: Option<String>,
    /// Entry summary or inline content, HTML stripped.
    pub summary: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Parse RSS 0.9x/1.0/2.0, Atom or JSON Feed bytes. Entries keep document order.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedItem>> {
    let feed = parser::parse(bytes)
        .map_err(|e| Error::Feed(format!("failed to parse feed: {}", e)))?;

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| {
            let summary = entry
                .summary
                .map(|t| t.content)
                .or(entry.content.and_then(|c| c.body))
                .map(|s| strip_html(&s))
                .unwrap_or_default();

            FeedItem {
                title: entry
                    .title
                    .map(|t| strip_html(&t.content))
                    .unwrap_or_default(),
                link: entry.links.first().map(|l| l.href.clone()),
                summary,
                author: entry.authors.first().map(|a| a.name.clone()),
                published_at: entry.published.or(entry.updated),
            }
        })
        .collect())
}

pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    collapse_whitespace(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
