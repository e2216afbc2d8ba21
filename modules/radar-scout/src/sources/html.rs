// HTML article-list scraping for blogs without a usable feed.
// Each `<article>` yields one item: title from its `h2`, URL from its first
// link, date from `time[datetime]`.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::info;
use url::Url;

use radar_common::{NewsItem, NewsSource};

use super::{absorb, NewsFetcher};

static ARTICLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article").expect("valid article selector"));
static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2").expect("valid h2 selector"));
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid link selector"));
static TIME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("time[datetime]").expect("valid time selector"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// One scraped site.
#[derive(Debug, Clone)]
pub struct HtmlSite {
    pub source: NewsSource,
    pub page_url: &'static str,
    /// Origin relative links are resolved against. `None` keeps them as-is.
    pub origin: Option<&'static str>,
}

impl HtmlSite {
    pub fn marktechpost() -> Self {
        Self {
            source: NewsSource::Marktechpost,
            page_url: "https://www.marktechpost.com/",
            origin: None,
        }
    }

    pub fn the_decoder() -> Self {
        Self {
            source: NewsSource::TheDecoder,
            page_url: "https://the-decoder.com/",
            origin: Some("https://the-decoder.com"),
        }
    }

    pub fn venture_beat() -> Self {
        Self {
            source: NewsSource::VentureBeat,
            page_url: "https://venturebeat.com/category/ai/",
            origin: Some("https://venturebeat.com"),
        }
    }

    fn resolve(&self, href: &str) -> String {
        if href.starts_with("http") {
            return href.to_string();
        }
        match self.origin.map(Url::parse) {
            Some(Ok(base)) => base
                .join(href)
                .map(String::from)
                .unwrap_or_else(|_| href.to_string()),
            _ => href.to_string(),
        }
    }
}

pub struct HtmlFetcher {
    client: reqwest::Client,
    site: HtmlSite,
}

impl HtmlFetcher {
    pub fn new(client: reqwest::Client, site: HtmlSite) -> Self {
        Self { client, site }
    }

    async fn try_fetch(&self) -> Result<Vec<NewsItem>> {
        let html = self
            .client
            .get(self.site.page_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Request to {} failed", self.site.page_url))?
            .text()
            .await
            .context("Failed to read page body")?;

        let items = parse_articles(&html, &self.site, Utc::now());
        info!(source = %self.site.source, items = items.len(), "Scraped article list");
        Ok(items)
    }
}

#[async_trait]
impl NewsFetcher for HtmlFetcher {
    fn source(&self) -> NewsSource {
        self.site.source
    }

    async fn fetch(&self) -> Result<Vec<NewsItem>> {
        Ok(absorb(self.site.source, self.try_fetch().await))
    }
}

/// Pull items out of an article-list page. Articles missing a title or a
/// link are skipped.
pub fn parse_articles(html: &str, site: &HtmlSite, now: DateTime<Utc>) -> Vec<NewsItem> {
    let document = Html::parse_document(html);

    document
        .select(&ARTICLE)
        .filter_map(|article| {
            let title = heading_text(&article)?;
            let href = article
                .select(&LINK)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::trim)
                .filter(|h| !h.is_empty())?;

            let created_at = article
                .select(&TIME)
                .next()
                .and_then(|t| t.value().attr("datetime"))
                .and_then(|d| DateTime::parse_from_rfc3339(d.trim()).ok())
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or(now);

            Some(NewsItem {
                title,
                url: site.resolve(href),
                source: site.source,
                created_at,
            })
        })
        .collect()
}

fn heading_text(article: &ElementRef<'_>) -> Option<String> {
    let raw: String = article.select(&HEADING).flat_map(|h| h.text()).collect();
    let title = WHITESPACE.replace_all(raw.trim(), " ").into_owned();
    (!title.is_empty()).then_some(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE: &str = r#"
        <html><body>
          <article>
            <h2><a href="/2025/05/agents-everywhere/">Agents
                everywhere</a></h2>
            <time datetime="2025-05-01T09:30:00+00:00">May 1</time>
          </article>
          <article>
            <h2>   </h2>
            <a href="/no-title/">untitled</a>
          </article>
          <article>
            <h2>No link here</h2>
          </article>
          <article>
            <a href="https://elsewhere.example/story">Read</a>
            <h2>Absolute link</h2>
          </article>
        </body></html>
    "#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn extracts_title_link_and_date() {
        let items = parse_articles(PAGE, &HtmlSite::the_decoder(), now());

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Agents everywhere");
        assert_eq!(
            items[0].url,
            "https://the-decoder.com/2025/05/agents-everywhere/"
        );
        assert_eq!(
            items[0].created_at,
            Utc.with_ymd_and_hms(2025, 5, 1, 9, 30, 0).unwrap()
        );
        assert_eq!(items[0].source, NewsSource::TheDecoder);
    }

    #[test]
    fn missing_time_falls_back_to_now() {
        let items = parse_articles(PAGE, &HtmlSite::venture_beat(), now());
        assert_eq!(items[1].title, "Absolute link");
        assert_eq!(items[1].url, "https://elsewhere.example/story");
        assert_eq!(items[1].created_at, now());
    }

    #[test]
    fn marktechpost_keeps_relative_links() {
        let items = parse_articles(PAGE, &HtmlSite::marktechpost(), now());
        assert_eq!(items[0].url, "/2025/05/agents-everywhere/");
        assert_eq!(items[0].source, NewsSource::Marktechpost);
    }

    #[test]
    fn page_without_articles_is_empty() {
        let items = parse_articles("<html><body><p>hi</p></body></html>", &HtmlSite::marktechpost(), now());
        assert!(items.is_empty());
    }
}
