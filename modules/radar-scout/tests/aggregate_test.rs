//! Aggregation runs against mock fetchers and the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use radar_common::{NewsSource, Platform};
use radar_scout::sources::NewsFetcher;
use radar_scout::testing::MockFetcher;
use radar_scout::Aggregator;
use radar_store::testing::MemoryStore;

fn aggregator(fetchers: Vec<Arc<dyn NewsFetcher>>, store: &Arc<MemoryStore>) -> Aggregator {
    Aggregator::new(fetchers, store.clone(), store.clone())
}

#[tokio::test]
async fn failing_sources_are_isolated_and_logged() {
    let store = Arc::new(MemoryStore::new());
    let fetchers: Vec<Arc<dyn NewsFetcher>> = vec![
        Arc::new(MockFetcher::titles(
            NewsSource::RedditRss,
            &[("Reddit story", "https://reddit.test/1")],
        )),
        Arc::new(MockFetcher::failing(NewsSource::HackerNews, "timeout")),
        Arc::new(MockFetcher::titles(
            NewsSource::GoogleNews,
            &[
                ("Google story", "https://google.test/1"),
                ("Another", "https://google.test/2"),
            ],
        )),
        Arc::new(MockFetcher::panicking(NewsSource::Arxiv, "bad xml")),
        Arc::new(MockFetcher::titles(
            NewsSource::VentureBeat,
            &[("VB story", "https://vb.test/1")],
        )),
    ];

    let result = aggregator(fetchers, &store).run().await;

    assert_eq!(result.sources, 5);
    assert_eq!(result.success_count, 3);
    assert_eq!(result.failure_count, 2);
    assert_eq!(result.count, 4);
    assert_eq!(result.inserted, 4);

    let mut logged = store.log_sources();
    logged.sort();
    assert_eq!(logged, vec!["arxiv", "hackernews"]);
    assert!(store.logs().iter().any(|l| l.message.contains("timeout")));

    let platforms: Vec<Platform> = store.stories().iter().map(|s| s.platform).collect();
    assert!(platforms.contains(&Platform::Reddit));
    assert!(platforms.contains(&Platform::VentureBeat));
    assert!(!platforms.contains(&Platform::HackerNews));
}

#[tokio::test]
async fn duplicate_titles_across_sources_keep_first() {
    let store = Arc::new(MemoryStore::new());
    let fetchers: Vec<Arc<dyn NewsFetcher>> = vec![
        Arc::new(MockFetcher::titles(
            NewsSource::HackerNews,
            &[("Llama 4 released", "https://hn.test/llama")],
        )),
        Arc::new(MockFetcher::titles(
            NewsSource::GoogleNews,
            &[(" llama 4 RELEASED ", "https://gn.test/llama")],
        )),
    ];

    let result = aggregator(fetchers, &store).run().await;

    assert_eq!(result.count, 1);
    let stories = store.stories();
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].url, "https://hn.test/llama");
    assert_eq!(stories[0].content, stories[0].title);
}

#[tokio::test]
async fn same_url_keeps_the_first_stored_row() {
    let store = Arc::new(MemoryStore::new());
    let first: Vec<Arc<dyn NewsFetcher>> = vec![Arc::new(MockFetcher::titles(
        NewsSource::TheDecoder,
        &[("Original headline", "https://decoder.test/a")],
    ))];
    let second: Vec<Arc<dyn NewsFetcher>> = vec![Arc::new(MockFetcher::titles(
        NewsSource::TheDecoder,
        &[("Edited headline", "https://decoder.test/a")],
    ))];

    let run1 = aggregator(first, &store).run().await;
    let run2 = aggregator(second, &store).run().await;

    assert_eq!(run1.inserted, 1);
    assert_eq!(run2.inserted, 0);
    let stories = store.stories();
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].title, "Original headline");
}

#[tokio::test]
async fn upsert_failure_is_logged_not_raised() {
    let store = Arc::new(MemoryStore::new());
    store.fail_story_writes(true);
    let fetchers: Vec<Arc<dyn NewsFetcher>> = vec![Arc::new(MockFetcher::titles(
        NewsSource::Marktechpost,
        &[("A story", "https://mtp.test/a")],
    ))];

    let result = aggregator(fetchers, &store).run().await;

    assert_eq!(result.success_count, 1);
    assert_eq!(result.count, 1);
    assert_eq!(result.inserted, 0);
    assert_eq!(store.log_sources(), vec!["database"]);
}

#[tokio::test]
async fn nothing_fetched_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    store.fail_story_writes(true);
    let fetchers: Vec<Arc<dyn NewsFetcher>> =
        vec![Arc::new(MockFetcher::items(NewsSource::Twint, Vec::new()))];

    let result = aggregator(fetchers, &store).run().await;

    assert_eq!(result.count, 0);
    assert!(store.logs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn concurrent_run_overlaps_fetchers_sequential_does_not() {
    let make = || -> Vec<Arc<dyn NewsFetcher>> {
        vec![
            Arc::new(
                MockFetcher::titles(NewsSource::HackerNews, &[("a", "https://t/a")])
                    .with_delay(Duration::from_secs(2)),
            ),
            Arc::new(
                MockFetcher::titles(NewsSource::GoogleNews, &[("b", "https://t/b")])
                    .with_delay(Duration::from_secs(2)),
            ),
            Arc::new(
                MockFetcher::failing(NewsSource::Arxiv, "down").with_delay(Duration::from_secs(2)),
            ),
        ]
    };

    let store = Arc::new(MemoryStore::new());
    let start = tokio::time::Instant::now();
    let concurrent = aggregator(make(), &store).run().await;
    let concurrent_elapsed = start.elapsed();

    let store = Arc::new(MemoryStore::new());
    let start = tokio::time::Instant::now();
    let sequential = aggregator(make(), &store).run_sequential().await;
    let sequential_elapsed = start.elapsed();

    assert!(concurrent_elapsed < Duration::from_secs(3));
    assert!(sequential_elapsed >= Duration::from_secs(6));
    assert_eq!(concurrent.count, sequential.count);
    assert_eq!(concurrent.failure_count, 1);
    assert_eq!(sequential.failure_count, 1);
}
