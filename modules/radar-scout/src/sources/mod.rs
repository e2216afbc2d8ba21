// Source fetchers. One adapter per external source, all behind `NewsFetcher`.
//
// Built-in fetchers absorb their own network and parse errors: they log a
// warning and return an empty list. The aggregator still treats an `Err` or a
// panic from any fetcher as an isolated source failure, so a third-party
// fetcher that does propagate cannot take the run down.

pub mod feeds;
pub mod html;
pub mod reddit;
pub mod twint;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::warn;

use radar_common::{Config, NewsItem, NewsSource};

pub use feeds::FeedFetcher;
pub use html::{HtmlFetcher, HtmlSite};
pub use reddit::{RedditApiFetcher, RedditCredentials, RedditRssFetcher};
pub use twint::TwintFetcher;

const USER_AGENT: &str = "AI-Trend-Radar/1.0";
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Attempts and delay for the fetchers that retry (Reddit API, Reddit RSS).
pub const RETRY_ATTEMPTS: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

#[async_trait]
pub trait NewsFetcher: Send + Sync {
    /// Fixed tag stamped on every item this fetcher returns.
    fn source(&self) -> NewsSource;

    async fn fetch(&self) -> Result<Vec<NewsItem>>;
}

/// Shared HTTP client for every built-in fetcher.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build fetcher HTTP client")
}

/// The nine built-in fetchers, in aggregation order.
pub fn default_fetchers(config: &Config) -> Result<Vec<Arc<dyn NewsFetcher>>> {
    let client = http_client()?;

    let credentials = RedditCredentials::from_config(config);

    let fetchers: Vec<Arc<dyn NewsFetcher>> = vec![
        Arc::new(RedditApiFetcher::new(client.clone(), credentials)),
        Arc::new(RedditRssFetcher::new(client.clone())),
        Arc::new(TwintFetcher::new(config.twint_snapshot_path.clone())),
        Arc::new(HtmlFetcher::new(client.clone(), HtmlSite::marktechpost())),
        Arc::new(FeedFetcher::hacker_news(client.clone())),
        Arc::new(FeedFetcher::google_news(client.clone())),
        Arc::new(FeedFetcher::arxiv(client.clone())),
        Arc::new(HtmlFetcher::new(client.clone(), HtmlSite::the_decoder())),
        Arc::new(HtmlFetcher::new(client, HtmlSite::venture_beat())),
    ];
    Ok(fetchers)
}

/// Run `op` up to `attempts` times, sleeping `delay` between attempts.
pub(crate) async fn with_retries<T, F, Fut>(
    source: NewsSource,
    attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(source = %source, attempt, error = %e, "Fetch attempt failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e.context(format!("{source}: gave up after {attempt} attempts"))),
        }
    }
}

/// Turn a failed fetch into an empty result, logging why.
pub(crate) fn absorb(source: NewsSource, result: Result<Vec<NewsItem>>) -> Vec<NewsItem> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(source = %source, error = %format!("{e:#}"), "Fetcher failed, returning no items");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let start = tokio::time::Instant::now();

        let result = with_retries(NewsSource::RedditRss, 3, RETRY_DELAY, || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                anyhow::bail!("attempt {n} failed");
            }
            Ok(n)
        })
        .await
        .unwrap();

        assert_eq!(result, 3);
        assert!(start.elapsed() >= Duration::from_secs(4));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_last_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<()> = with_retries(NewsSource::RedditApi, 3, RETRY_DELAY, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("still down")
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(format!("{err:#}").contains("still down"));
    }

    #[test]
    fn absorb_turns_errors_into_empty() {
        let items = absorb(NewsSource::Arxiv, Err(anyhow::anyhow!("parse error")));
        assert!(items.is_empty());
    }
}
