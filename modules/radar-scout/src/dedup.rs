use std::collections::HashSet;

use radar_common::NewsItem;

/// Key two items collapse on: the title trimmed and lowercased.
/// Internal whitespace and punctuation are left alone.
pub fn dedup_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Drop items whose title key was already seen. The first occurrence wins
/// and input order is preserved.
pub fn dedup_by_title(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(dedup_key(&item.title)))
        .collect()
}
