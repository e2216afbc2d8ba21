// Test mocks for the news pipeline.
//
// - MockFetcher (NewsFetcher): fixed items, a fixed error, or a panic
// - MockCompletion (TextCompletion): fixed text or a fixed error, counts calls

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ai_client::TextCompletion;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use radar_common::{NewsItem, NewsSource};

use crate::sources::NewsFetcher;

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

enum FetchBehavior {
    Items(Vec<NewsItem>),
    Fail(String),
    Panic(String),
}

pub struct MockFetcher {
    source: NewsSource,
    behavior: FetchBehavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockFetcher {
    fn with_behavior(source: NewsSource, behavior: FetchBehavior) -> Self {
        Self {
            source,
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn items(source: NewsSource, items: Vec<NewsItem>) -> Self {
        Self::with_behavior(source, FetchBehavior::Items(items))
    }

    /// Items built from `(title, url)` pairs, stamped with `source`.
    pub fn titles(source: NewsSource, pairs: &[(&str, &str)]) -> Self {
        let items = pairs
            .iter()
            .map(|(title, url)| news_item(source, title, url))
            .collect();
        Self::items(source, items)
    }

    pub fn failing(source: NewsSource, message: &str) -> Self {
        Self::with_behavior(source, FetchBehavior::Fail(message.to_string()))
    }

    pub fn panicking(source: NewsSource, message: &str) -> Self {
        Self::with_behavior(source, FetchBehavior::Panic(message.to_string()))
    }

    /// Sleep before answering (tokio time, so paused clocks apply).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsFetcher for MockFetcher {
    fn source(&self) -> NewsSource {
        self.source
    }

    async fn fetch(&self) -> Result<Vec<NewsItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.behavior {
            FetchBehavior::Items(items) => Ok(items.clone()),
            FetchBehavior::Fail(message) => Err(anyhow!("MockFetcher: {message}")),
            FetchBehavior::Panic(message) => panic!("MockFetcher: {message}"),
        }
    }
}

pub fn news_item(source: NewsSource, title: &str, url: &str) -> NewsItem {
    NewsItem {
        title: title.to_string(),
        url: url.to_string(),
        source,
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// MockCompletion
// ---------------------------------------------------------------------------

pub struct MockCompletion {
    model: String,
    reply: std::result::Result<String, String>,
    calls: AtomicUsize,
}

impl MockCompletion {
    pub fn replying(model: &str, text: &str) -> Self {
        Self {
            model: model.to_string(),
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(model: &str, message: &str) -> Self {
        Self {
            model: model.to_string(),
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextCompletion for MockCompletion {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map_err(|message| anyhow!("MockCompletion({}): {message}", self.model))
    }
}
