//! Read-path filtering and ordering for stored stories.

use serde::Deserialize;

use crate::error::RadarError;
use crate::types::{Platform, Story, StoryCategory};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsSort {
    #[default]
    Date,
    Score,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsQuery {
    pub platform: Option<Platform>,
    pub category: Option<StoryCategory>,
    pub search: Option<String>,
    pub sort: NewsSort,
}

impl NewsQuery {
    /// Build a query from raw request parameters. `"all"` and empty strings
    /// mean "no filter".
    pub fn from_params(
        platform: Option<&str>,
        category: Option<&str>,
        search: Option<&str>,
        sort: Option<NewsSort>,
    ) -> Result<Self, RadarError> {
        let platform = match platform.map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(label) => match Platform::from_label(label) {
                Platform::Unknown if label != "Unknown" => {
                    return Err(RadarError::Validation(format!("Unknown platform: {label}")))
                }
                p => Some(p),
            },
        };
        let category = match category.map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(StoryCategory::from_label(label).ok_or_else(|| {
                RadarError::Validation(format!("Unknown category: {label}"))
            })?),
        };
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            platform,
            category,
            search,
            sort: sort.unwrap_or_default(),
        })
    }

    pub fn matches(&self, story: &Story) -> bool {
        if let Some(platform) = self.platform {
            if story.platform != platform {
                return false;
            }
        }
        if let Some(category) = self.category {
            if story.category != Some(category) {
                return false;
            }
        }
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            return story.title.to_lowercase().contains(&needle)
                || story.content.to_lowercase().contains(&needle);
        }
        true
    }

    /// Filter then order. Date sort is newest first; score sort is highest first.
    pub fn apply(&self, stories: Vec<Story>) -> Vec<Story> {
        let mut out: Vec<Story> = stories.into_iter().filter(|s| self.matches(s)).collect();
        match self.sort {
            NewsSort::Date => out.sort_by(|a, b| b.date.cmp(&a.date)),
            NewsSort::Score => out.sort_by(|a, b| b.score.cmp(&a.score)),
        }
        out
    }
}
