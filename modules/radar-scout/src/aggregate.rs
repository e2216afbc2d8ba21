// Aggregation run: fan out to every fetcher, merge what succeeded, dedup,
// map to stories, upsert on url. Nothing here returns an error to the
// caller; failures go to the scrape log and the tracing output.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use radar_common::{NewStory, NewsItem};
use radar_store::{ScrapeLog, StoryStore};

use crate::dedup::dedup_by_title;
use crate::fanout::{settle, settle_all, settle_each, Settled};
use crate::scorer::{self, Signals};
use crate::sources::NewsFetcher;

pub const FINAL_PROCESSING_SOURCE: &str = "final-processing";
pub const DATABASE_SOURCE: &str = "database";

/// Counts from one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationResult {
    /// Stories offered to the store after dedup and mapping.
    pub count: usize,
    /// Fetchers invoked.
    pub sources: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// Rows that were new to the store. Zero when the upsert failed.
    pub inserted: u64,
}

impl std::fmt::Display for AggregationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Aggregation Complete ===")?;
        writeln!(f, "Sources:          {}", self.sources)?;
        writeln!(f, "  succeeded:      {}", self.success_count)?;
        writeln!(f, "  failed:         {}", self.failure_count)?;
        writeln!(f, "Stories mapped:   {}", self.count)?;
        writeln!(f, "Stories inserted: {}", self.inserted)
    }
}

pub struct Aggregator {
    fetchers: Vec<Arc<dyn NewsFetcher>>,
    stories: Arc<dyn StoryStore>,
    scrape_log: Arc<dyn ScrapeLog>,
}

impl Aggregator {
    pub fn new(
        fetchers: Vec<Arc<dyn NewsFetcher>>,
        stories: Arc<dyn StoryStore>,
        scrape_log: Arc<dyn ScrapeLog>,
    ) -> Self {
        Self {
            fetchers,
            stories,
            scrape_log,
        }
    }

    /// All fetchers at once; waits for every one to settle.
    pub async fn run(&self) -> AggregationResult {
        info!(sources = self.fetchers.len(), "Starting aggregation");
        let settled = settle_all(self.fetchers.iter().map(fetch_one)).await;
        self.finish(settled).await
    }

    /// One fetcher after another, with the same isolation.
    pub async fn run_sequential(&self) -> AggregationResult {
        info!(sources = self.fetchers.len(), "Starting sequential aggregation");
        let settled = settle_each(self.fetchers.iter().map(fetch_one)).await;
        self.finish(settled).await
    }

    async fn finish(&self, settled: Vec<Settled<Vec<NewsItem>>>) -> AggregationResult {
        let mut result = AggregationResult {
            sources: self.fetchers.len(),
            ..Default::default()
        };

        let mut all_items = Vec::new();
        for (fetcher, outcome) in self.fetchers.iter().zip(settled) {
            let source = fetcher.source();
            match outcome {
                Settled::Fulfilled(items) => {
                    info!(source = %source, items = items.len(), "Source fetched");
                    result.success_count += 1;
                    all_items.extend(items);
                }
                Settled::Rejected(message) => {
                    warn!(source = %source, error = %message, "Source failed");
                    result.failure_count += 1;
                    self.log_failure(source.as_str(), &message).await;
                }
            }
        }

        let stories = match settle(async { Ok::<_, anyhow::Error>(prepare(all_items)) }).await {
            Settled::Fulfilled(stories) => stories,
            Settled::Rejected(message) => {
                error!(error = %message, "Final processing failed");
                self.log_failure(FINAL_PROCESSING_SOURCE, &message).await;
                return result;
            }
        };
        result.count = stories.len();

        if !stories.is_empty() {
            match self.stories.upsert_stories(&stories).await {
                Ok(inserted) => {
                    result.inserted = inserted;
                    info!(mapped = stories.len(), inserted, "Stored stories");
                }
                Err(e) => {
                    let message = format!("{e:#}");
                    error!(error = %message, "Story upsert failed");
                    self.log_failure(DATABASE_SOURCE, &message).await;
                }
            }
        }

        info!("{result}");
        result
    }

    async fn log_failure(&self, source: &str, message: &str) {
        if let Err(e) = self.scrape_log.record(source, message).await {
            warn!(source, error = %e, "Failed to write scrape log entry");
        }
    }
}

// Named fn (not a closure) so the future is general over the borrow lifetime.
fn fetch_one<'a, 'b>(
    fetcher: &'a Arc<dyn NewsFetcher + 'b>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<Vec<NewsItem>>> + Send + 'a>> {
    fetcher.fetch()
}

/// Dedup then map to storage rows. Items without a title or url are dropped.
pub fn prepare(items: Vec<NewsItem>) -> Vec<NewStory> {
    dedup_by_title(items)
        .into_iter()
        .filter(|item| !item.title.trim().is_empty() && !item.url.trim().is_empty())
        .map(to_new_story)
        .collect()
}

/// Map one fetched item. Content is the title; the score is the heuristic
/// score with no engagement figure.
pub fn to_new_story(item: NewsItem) -> NewStory {
    let mut story = NewStory {
        platform: item.source.platform(),
        content: item.title.clone(),
        title: item.title,
        url: item.url,
        date: item.created_at,
        category: None,
        score: 0,
        created_at: item.created_at,
    };
    story.score = scorer::score(Signals::from(&story));
    story
}
