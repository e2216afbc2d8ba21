// Reddit: the OAuth API client (hot posts of r/technology) and the public
// RSS feed. Both retry; the API client falls back to RSS for the same
// subreddit when it gives up or has no credentials.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use radar_common::{Config, NewsItem, NewsSource};

use super::feeds::fetch_feed;
use super::{absorb, with_retries, NewsFetcher, RETRY_ATTEMPTS, RETRY_DELAY};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const API_SUBREDDIT: &str = "technology";
const API_LIMIT: u32 = 25;
const DEFAULT_RSS_SUBREDDIT: &str = "ArtificialIntelligence";

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl RedditCredentials {
    /// All four values or nothing.
    pub fn from_config(config: &Config) -> Option<Self> {
        Some(Self {
            client_id: config.reddit_client_id.clone()?,
            client_secret: config.reddit_client_secret.clone()?,
            username: config.reddit_username.clone()?,
            password: config.reddit_password.clone()?,
        })
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    created_utc: Option<f64>,
}

// ---------------------------------------------------------------------------
// RedditApiFetcher
// ---------------------------------------------------------------------------

pub struct RedditApiFetcher {
    client: reqwest::Client,
    credentials: Option<RedditCredentials>,
    fallback: RedditRssFetcher,
}

impl RedditApiFetcher {
    pub fn new(client: reqwest::Client, credentials: Option<RedditCredentials>) -> Self {
        let fallback = RedditRssFetcher::new(client.clone()).with_subreddit(API_SUBREDDIT);
        Self {
            client,
            credentials,
            fallback,
        }
    }

    async fn access_token(&self, credentials: &RedditCredentials) -> Result<String> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "password")
            .append_pair("username", &credentials.username)
            .append_pair("password", &credentials.password)
            .finish();

        let token: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .context("Reddit token request failed")?
            .json()
            .await
            .context("Failed to parse Reddit token response")?;

        Ok(token.access_token)
    }

    async fn hot_posts(&self, credentials: &RedditCredentials) -> Result<Vec<NewsItem>> {
        let token = self.access_token(credentials).await?;
        let url = format!("{API_BASE}/r/{API_SUBREDDIT}/hot?limit={API_LIMIT}");

        let listing: Listing = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .context("Reddit listing request failed")?
            .json()
            .await
            .context("Failed to parse Reddit listing")?;

        Ok(listing_items(listing, Utc::now()))
    }

    async fn try_fetch(&self) -> Result<Vec<NewsItem>> {
        let Some(credentials) = &self.credentials else {
            anyhow::bail!("Reddit API credentials are not configured");
        };
        with_retries(NewsSource::RedditApi, RETRY_ATTEMPTS, RETRY_DELAY, || {
            self.hot_posts(credentials)
        })
        .await
    }
}

#[async_trait]
impl NewsFetcher for RedditApiFetcher {
    fn source(&self) -> NewsSource {
        NewsSource::RedditApi
    }

    async fn fetch(&self) -> Result<Vec<NewsItem>> {
        match self.try_fetch().await {
            Ok(items) => {
                info!(items = items.len(), "Fetched Reddit hot posts");
                Ok(items)
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Reddit API failed, falling back to RSS");
                self.fallback.fetch().await
            }
        }
    }
}

fn listing_items(listing: Listing, now: DateTime<Utc>) -> Vec<NewsItem> {
    listing
        .data
        .children
        .into_iter()
        .filter_map(|child| {
            let post = child.data;
            if post.title.trim().is_empty() || post.url.trim().is_empty() {
                return None;
            }
            let created_at = post
                .created_utc
                .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
                .unwrap_or(now);
            Some(NewsItem {
                title: post.title,
                url: post.url,
                source: NewsSource::RedditApi,
                created_at,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// RedditRssFetcher
// ---------------------------------------------------------------------------

pub struct RedditRssFetcher {
    client: reqwest::Client,
    subreddit: String,
}

impl RedditRssFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            subreddit: DEFAULT_RSS_SUBREDDIT.to_string(),
        }
    }

    pub fn with_subreddit(mut self, subreddit: impl Into<String>) -> Self {
        self.subreddit = subreddit.into();
        self
    }

    pub fn feed_url(&self) -> String {
        format!("https://www.reddit.com/r/{}/.rss", self.subreddit)
    }
}

#[async_trait]
impl NewsFetcher for RedditRssFetcher {
    fn source(&self) -> NewsSource {
        NewsSource::RedditRss
    }

    async fn fetch(&self) -> Result<Vec<NewsItem>> {
        let feed_url = self.feed_url();
        let result = with_retries(NewsSource::RedditRss, RETRY_ATTEMPTS, RETRY_DELAY, || {
            fetch_feed(&self.client, &feed_url, NewsSource::RedditRss)
        })
        .await;
        Ok(absorb(NewsSource::RedditRss, result))
    }
}
