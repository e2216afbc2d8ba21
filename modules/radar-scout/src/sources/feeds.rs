// RSS/Atom feed fetchers: Hacker News, Google News and arXiv share one
// implementation. The Reddit RSS fetcher reuses `parse_feed`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use radar_common::{NewsItem, NewsSource};

use super::{absorb, NewsFetcher};

const HACKER_NEWS_URL: &str = "https://hnrss.org/newest?q=AI";
const GOOGLE_NEWS_URL: &str = "https://news.google.com/rss/search?q=artificial+intelligence";
const ARXIV_URL: &str = "https://export.arxiv.org/rss/cs.AI";

pub struct FeedFetcher {
    client: reqwest::Client,
    source: NewsSource,
    feed_url: String,
}

impl FeedFetcher {
    pub fn new(client: reqwest::Client, source: NewsSource, feed_url: impl Into<String>) -> Self {
        Self {
            client,
            source,
            feed_url: feed_url.into(),
        }
    }

    pub fn hacker_news(client: reqwest::Client) -> Self {
        Self::new(client, NewsSource::HackerNews, HACKER_NEWS_URL)
    }

    pub fn google_news(client: reqwest::Client) -> Self {
        Self::new(client, NewsSource::GoogleNews, GOOGLE_NEWS_URL)
    }

    pub fn arxiv(client: reqwest::Client) -> Self {
        Self::new(client, NewsSource::Arxiv, ARXIV_URL)
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }
}

#[async_trait]
impl NewsFetcher for FeedFetcher {
    fn source(&self) -> NewsSource {
        self.source
    }

    async fn fetch(&self) -> Result<Vec<NewsItem>> {
        let result = fetch_feed(&self.client, &self.feed_url, self.source).await;
        Ok(absorb(self.source, result))
    }
}

/// Download and parse one feed.
pub(crate) async fn fetch_feed(
    client: &reqwest::Client,
    feed_url: &str,
    source: NewsSource,
) -> Result<Vec<NewsItem>> {
    let bytes = client
        .get(feed_url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("Feed fetch failed: {feed_url}"))?
        .bytes()
        .await
        .context("Failed to read feed body")?;

    let items = parse_feed(&bytes, source, Utc::now())?;
    info!(source = %source, feed_url, items = items.len(), "Parsed feed");
    Ok(items)
}

/// Map feed entries to items. Entries without a title or a link are dropped;
/// entries without a date get `now`.
pub fn parse_feed(bytes: &[u8], source: NewsSource, now: DateTime<Utc>) -> Result<Vec<NewsItem>> {
    let feed = feed_rs::parser::parse(bytes).context("Failed to parse RSS/Atom feed")?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())?;
            let url = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .filter(|u| !u.is_empty())?;
            let created_at = entry.published.or(entry.updated).unwrap_or(now);

            Some(NewsItem {
                title,
                url,
                source,
                created_at,
            })
        })
        .collect();

    Ok(items)
}
