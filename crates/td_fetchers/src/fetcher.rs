use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use td_core::{Article, CategoryConfig, Error, Language, Result};
use tracing::{debug, info, warn};

use crate::content::extract_body;
use crate::enrich::TagEnricher;
use crate::language::detect_language;
use crate::parse::{parse_feed, FeedItem};
use crate::trust::trust_score;

const FEED_TIMEOUT_SECS: u64 = 30;
const PAGE_TIMEOUT_SECS: u64 = 10;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_REDIRECTS: usize = 5;
const MAX_FEED_SIZE: usize = 5 * 1024 * 1024;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; NewsBot/1.0; +https://example.com/bot)";

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub feeds: Vec<String>,
    /// Entries published earlier than this many hours ago are skipped.
    pub hours_back: i64,
    pub fetch_full_content: bool,
    /// Pause between two feeds.
    pub feed_delay: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            feeds: crate::feeds::default_feeds(),
            hours_back: 24,
            fetch_full_content: true,
            feed_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedProbe {
    pub url: String,
    pub reachable: bool,
    pub detail: String,
}

pub struct FetcherAgent {
    client: Client,
    config: FetcherConfig,
    categories: CategoryConfig,
    enricher: TagEnricher,
}

impl FetcherAgent {
    pub fn new(config: FetcherConfig, categories: CategoryConfig, enricher: TagEnricher) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Feed(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            categories,
            enricher,
        })
    }

    /// Fetch, filter and deduplicate articles from every configured feed.
    ///
    /// Feed failures are logged and skipped; when nothing is reachable the
    /// result is simply empty.
    pub async fn fetch_articles(&self) -> Vec<Article> {
        info!(
            tags = self.enricher.is_enabled(),
            "🦗 Fetching articles from {} feeds (last {}h)",
            self.config.feeds.len(),
            self.config.hours_back
        );
        let cutoff = recency_cutoff(Utc::now(), self.config.hours_back);
        if cutoff.is_none() {
            warn!(hours_back = self.config.hours_back, "Recency window out of range, keeping every entry");
        }
        let mut seen = HashSet::new();
        let mut articles = Vec::new();
        let mut reachable = 0usize;

        for (i, feed_url) in self.config.feeds.iter().enumerate() {
            if i > 0 && !self.config.feed_delay.is_zero() {
                tokio::time::sleep(self.config.feed_delay).await;
            }

            let items = match self.fetch_feed(feed_url).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(feed = %feed_url, error = %e, "Skipping feed");
                    continue;
                }
            };
            reachable += 1;

            let before = articles.len();
            for item in items {
                if let Some(article) = self.process_item(feed_url, item, cutoff, &seen).await {
                    seen.insert(article.url.clone());
                    articles.push(article);
                }
            }
            info!(feed = %feed_url, count = articles.len() - before, "📰 Collected articles");
        }

        if reachable == 0 && !self.config.feeds.is_empty() {
            warn!("No feeds were reachable, continuing with zero articles");
        }
        info!(count = articles.len(), "✨ Fetch finished");
        articles
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<FeedItem>> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Feed(format!("HTTP error: {}", response.status())));
        }

        let bytes = response.bytes().await?;
        if bytes.len() > MAX_FEED_SIZE {
            return Err(Error::Feed(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                MAX_FEED_SIZE
            )));
        }

        parse_feed(&bytes)
    }

    async fn process_item(
        &self,
        feed_url: &str,
        item: FeedItem,
        cutoff: Option<DateTime<Utc>>,
        seen: &HashSet<String>,
    ) -> Option<Article> {
        let Some(url) = item.link.clone() else {
            debug!(title = %item.title, "Entry without link");
            return None;
        };
        if seen.contains(&url) {
            debug!(url = %url, "Duplicate entry");
            return None;
        }
        if item
            .published_at
            .zip(cutoff)
            .is_some_and(|(published, cutoff)| published < cutoff)
        {
            return None;
        }
        if !self.categories.matches_any(&format!("{} {}", item.title, item.summary)) {
            return None;
        }

        let body = if self.config.fetch_full_content {
            self.fetch_body(&url).await
        } else {
            None
        };
        let content = body.unwrap_or(item.summary);

        let language = detect_language(&format!("{} {}", item.title, content));
        if language != Language::Japanese {
            debug!(url = %url, "Dropping non-Japanese entry");
            return None;
        }

        let trust_score = trust_score(&url, &item.title, &content);
        let tags = self.enricher.tags_for(&content).await;

        Some(Article {
            url,
            title: item.title,
            source: feed_url.to_string(),
            published_at: item.published_at,
            content,
            language,
            author: item.author.filter(|a| !a.trim().is_empty()),
            tags,
            trust_score,
        })
    }

    async fn fetch_body(&self, url: &str) -> Option<String> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(PAGE_TIMEOUT_SECS))
            .send()
            .await
            .and_then(|r| r.error_for_status());

        match response {
            Ok(response) => match response.text().await {
                Ok(html) => extract_body(&html),
                Err(e) => {
                    debug!(url = %url, error = %e, "Failed to read article page");
                    None
                }
            },
            Err(e) => {
                debug!(url = %url, error = %e, "Failed to fetch article page");
                None
            }
        }
    }

    /// GET every feed once and report which ones answer with a success status.
    pub async fn probe_feeds(&self) -> Vec<FeedProbe> {
        let mut probes = Vec::with_capacity(self.config.feeds.len());
        for url in &self.config.feeds {
            let probe = match self.client.get(url).send().await {
                Ok(response) => FeedProbe {
                    url: url.clone(),
                    reachable: response.status().is_success(),
                    detail: response.status().to_string(),
                },
                Err(e) => FeedProbe {
                    url: url.clone(),
                    reachable: false,
                    detail: e.to_string(),
                },
            };
            probes.push(probe);
        }
        probes
    }
}

/// Start of the recency window, or `None` when `hours_back` does not fit
/// a timestamp.
fn recency_cutoff(now: DateTime<Utc>, hours_back: i64) -> Option<DateTime<Utc>> {
    ChronoDuration::try_hours(hours_back).and_then(|window| now.checked_sub_signed(window))
}
