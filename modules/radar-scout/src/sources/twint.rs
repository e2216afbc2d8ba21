// Static X/Twitter snapshot: a JSON array exported by twint, read from disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::info;

use radar_common::{NewsItem, NewsSource};

use super::{absorb, NewsFetcher};

#[derive(Debug, Deserialize)]
struct Tweet {
    #[serde(default)]
    tweet: String,
    #[serde(default)]
    id_str: String,
    created_at: Option<String>,
}

pub struct TwintFetcher {
    path: PathBuf,
}

impl TwintFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn try_fetch(&self) -> Result<Vec<NewsItem>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let items = parse_snapshot(&raw, Utc::now())?;
        info!(path = %self.path.display(), items = items.len(), "Loaded tweet snapshot");
        Ok(items)
    }
}

#[async_trait]
impl NewsFetcher for TwintFetcher {
    fn source(&self) -> NewsSource {
        NewsSource::Twint
    }

    async fn fetch(&self) -> Result<Vec<NewsItem>> {
        Ok(absorb(NewsSource::Twint, self.try_fetch().await))
    }
}

pub fn parse_snapshot(raw: &str, now: DateTime<Utc>) -> Result<Vec<NewsItem>> {
    let tweets: Vec<Tweet> = serde_json::from_str(raw).context("Malformed tweet snapshot")?;

    Ok(tweets
        .into_iter()
        .filter(|t| !t.tweet.trim().is_empty() && !t.id_str.trim().is_empty())
        .map(|t| NewsItem {
            url: format!("https://twitter.com/user/status/{}", t.id_str.trim()),
            created_at: t.created_at.as_deref().and_then(parse_timestamp).unwrap_or(now),
            title: t.tweet,
            source: NewsSource::Twint,
        })
        .collect())
}

/// twint writes either RFC 3339 or `YYYY-MM-DD HH:MM:SS` with an optional
/// zone suffix.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = raw
        .trim_end_matches(" UTC")
        .trim_end_matches(" +0000");
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|n| n.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn tweets_become_status_links() {
        let raw = r#"[
            {"tweet": "New open weights model", "id_str": "1790", "created_at": "2024-05-14 18:00:00 UTC"},
            {"tweet": "Agents agents agents", "id_str": "1791", "created_at": "2024-05-15T08:00:00Z"},
            {"tweet": "No timestamp", "id_str": "1792"}
        ]"#;

        let items = parse_snapshot(raw, now()).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].url, "https://twitter.com/user/status/1790");
        assert_eq!(items[0].title, "New open weights model");
        assert_eq!(
            items[0].created_at,
            Utc.with_ymd_and_hms(2024, 5, 14, 18, 0, 0).unwrap()
        );
        assert_eq!(
            items[1].created_at,
            Utc.with_ymd_and_hms(2024, 5, 15, 8, 0, 0).unwrap()
        );
        assert_eq!(items[2].created_at, now());
        assert!(items.iter().all(|i| i.source == NewsSource::Twint));
    }

    #[test]
    fn tweets_without_id_are_skipped() {
        let raw = r#"[{"tweet": "orphan", "id_str": ""}]"#;
        assert!(parse_snapshot(raw, now()).unwrap().is_empty());
    }

    #[test]
    fn malformed_snapshot_is_an_error() {
        assert!(parse_snapshot("{not json", now()).is_err());
    }

    #[tokio::test]
    async fn missing_file_yields_no_items() {
        let fetcher = TwintFetcher::new("/nonexistent/twint.json");
        assert!(fetcher.fetch().await.unwrap().is_empty());
    }
}
