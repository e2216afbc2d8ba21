use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RadarError;

// --- News Sources ---

/// The nine external sources the aggregator pulls from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewsSource {
    #[serde(rename = "reddit-api")]
    RedditApi,
    #[serde(rename = "reddit-rss")]
    RedditRss,
    #[serde(rename = "twint")]
    Twint,
    #[serde(rename = "marktechpost")]
    Marktechpost,
    #[serde(rename = "hackernews")]
    HackerNews,
    #[serde(rename = "googlenews")]
    GoogleNews,
    #[serde(rename = "arxiv")]
    Arxiv,
    #[serde(rename = "the-decoder")]
    TheDecoder,
    #[serde(rename = "venturebeat")]
    VentureBeat,
}

impl NewsSource {
    pub const ALL: [NewsSource; 9] = [
        NewsSource::RedditApi,
        NewsSource::RedditRss,
        NewsSource::Twint,
        NewsSource::Marktechpost,
        NewsSource::HackerNews,
        NewsSource::GoogleNews,
        NewsSource::Arxiv,
        NewsSource::TheDecoder,
        NewsSource::VentureBeat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NewsSource::RedditApi => "reddit-api",
            NewsSource::RedditRss => "reddit-rss",
            NewsSource::Twint => "twint",
            NewsSource::Marktechpost => "marktechpost",
            NewsSource::HackerNews => "hackernews",
            NewsSource::GoogleNews => "googlenews",
            NewsSource::Arxiv => "arxiv",
            NewsSource::TheDecoder => "the-decoder",
            NewsSource::VentureBeat => "venturebeat",
        }
    }

    /// Storage platform this source's items are filed under.
    pub fn platform(self) -> Platform {
        match self {
            NewsSource::RedditApi | NewsSource::RedditRss => Platform::Reddit,
            NewsSource::Twint => Platform::X,
            NewsSource::Marktechpost => Platform::Marktechpost,
            NewsSource::HackerNews => Platform::HackerNews,
            NewsSource::GoogleNews => Platform::GoogleNews,
            NewsSource::Arxiv => Platform::Arxiv,
            NewsSource::TheDecoder => Platform::TheDecoder,
            NewsSource::VentureBeat => Platform::VentureBeat,
        }
    }
}

impl std::fmt::Display for NewsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fetched item before it is mapped into a [`Story`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub source: NewsSource,
    pub created_at: DateTime<Utc>,
}

// --- Stories ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Reddit,
    X,
    Marktechpost,
    HackerNews,
    GoogleNews,
    #[serde(rename = "arXiv")]
    Arxiv,
    TheDecoder,
    VentureBeat,
    Unknown,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Reddit => "Reddit",
            Platform::X => "X",
            Platform::Marktechpost => "Marktechpost",
            Platform::HackerNews => "HackerNews",
            Platform::GoogleNews => "GoogleNews",
            Platform::Arxiv => "arXiv",
            Platform::TheDecoder => "TheDecoder",
            Platform::VentureBeat => "VentureBeat",
            Platform::Unknown => "Unknown",
        }
    }

    /// Parse a stored platform label. Anything unrecognised is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Reddit" => Platform::Reddit,
            "X" => Platform::X,
            "Marktechpost" => Platform::Marktechpost,
            "HackerNews" => Platform::HackerNews,
            "GoogleNews" => Platform::GoogleNews,
            "arXiv" => Platform::Arxiv,
            "TheDecoder" => Platform::TheDecoder,
            "VentureBeat" => Platform::VentureBeat,
            _ => Platform::Unknown,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryCategory {
    Tool,
    News,
    Research,
    Startup,
}

impl StoryCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            StoryCategory::Tool => "tool",
            StoryCategory::News => "news",
            StoryCategory::Research => "research",
            StoryCategory::Startup => "startup",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "tool" => Some(StoryCategory::Tool),
            "news" => Some(StoryCategory::News),
            "research" => Some(StoryCategory::Research),
            "startup" => Some(StoryCategory::Startup),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored story. `url` is globally unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,
    pub platform: Platform,
    pub title: String,
    pub content: String,
    pub url: String,
    pub date: DateTime<Utc>,
    pub category: Option<StoryCategory>,
    pub score: i32,
    pub created_at: DateTime<Utc>,
}

/// A story ready to be upserted. The store assigns `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStory {
    pub platform: Platform,
    pub title: String,
    pub content: String,
    pub url: String,
    pub date: DateTime<Utc>,
    pub category: Option<StoryCategory>,
    pub score: i32,
    pub created_at: DateTime<Utc>,
}

impl NewStory {
    pub fn into_story(self, id: Uuid) -> Story {
        Story {
            id,
            platform: self.platform,
            title: self.title,
            content: self.content,
            url: self.url,
            date: self.date,
            category: self.category,
            score: self.score,
            created_at: self.created_at,
        }
    }
}

/// Compact story snapshot recorded alongside a generated script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySummary {
    pub title: String,
    pub content: String,
    pub url: String,
    pub platform: Platform,
    pub score: i32,
}

impl From<&Story> for StorySummary {
    fn from(story: &Story) -> Self {
        Self {
            title: story.title.clone(),
            content: story.content.clone(),
            url: story.url.clone(),
            platform: story.platform,
            score: story.score,
        }
    }
}

// --- Scrape log ---

/// One row of the failure side channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeLogEntry {
    pub source: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// --- Quiz Types ---

/// Chosen answer index per question id.
pub type Answers = BTreeMap<Uuid, usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub question_text: String,
    pub choices: Vec<String>,
    pub correct_choice: usize,
}

/// Remote autosave row, one per `(quiz_id, admission_number)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizProgress {
    pub quiz_id: Uuid,
    pub admission_number: String,
    pub student_name: String,
    pub answers: Answers,
    pub current_question: usize,
    pub last_saved: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub name: String,
    pub admission_number: String,
    pub answers: Answers,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubmission {
    pub quiz_id: Uuid,
    pub name: String,
    pub admission_number: String,
    pub answers: Answers,
}

impl NewSubmission {
    /// Required-field check run before any write.
    pub fn validate(&self, question_count: usize) -> Result<(), RadarError> {
        if self.name.trim().is_empty() {
            return Err(RadarError::Validation("name is required".to_string()));
        }
        if self.admission_number.trim().is_empty() {
            return Err(RadarError::Validation(
                "admission number is required".to_string(),
            ));
        }
        if question_count == 0 || self.answers.len() != question_count {
            return Err(RadarError::Validation(format!(
                "expected {question_count} answers, got {}",
                self.answers.len()
            )));
        }
        Ok(())
    }
}

// --- Weekly scripts ---

/// Text-generation backends a weekly script can be requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Llm {
    #[serde(rename = "openai")]
    OpenAi,
    Mistral,
    Llama3,
    Zephyr,
}

impl Llm {
    pub const ALL: [Llm; 4] = [Llm::OpenAi, Llm::Mistral, Llm::Llama3, Llm::Zephyr];

    pub fn as_str(self) -> &'static str {
        match self {
            Llm::OpenAi => "openai",
            Llm::Mistral => "mistral",
            Llm::Llama3 => "llama3",
            Llm::Zephyr => "zephyr",
        }
    }
}

impl std::fmt::Display for Llm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Llm {
    type Err = RadarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Llm::ALL
            .into_iter()
            .find(|llm| llm.as_str() == s)
            .ok_or_else(|| RadarError::Validation(format!("Unknown LLM: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStatus {
    Success,
    Error,
}

impl ScriptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScriptStatus::Success => "success",
            ScriptStatus::Error => "error",
        }
    }
}

/// One backend attempt, persisted whether it succeeded or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyScript {
    pub llm: Llm,
    pub status: ScriptStatus,
    pub script_text: Option<String>,
    pub error: Option<String>,
    pub stories_used: Vec<StorySummary>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_source_maps_to_a_known_platform() {
        for source in NewsSource::ALL {
            assert_ne!(source.platform(), Platform::Unknown, "{source}");
        }
        assert_eq!(NewsSource::RedditRss.platform(), Platform::Reddit);
        assert_eq!(NewsSource::Twint.platform(), Platform::X);
        assert_eq!(NewsSource::Arxiv.platform(), Platform::Arxiv);
    }

    #[test]
    fn source_serializes_as_wire_label() {
        let json = serde_json::to_string(&NewsSource::TheDecoder).unwrap();
        assert_eq!(json, "\"the-decoder\"");
        for source in NewsSource::ALL {
            let json = serde_json::to_string(&source).unwrap();
            assert_eq!(json, format!("\"{}\"", source.as_str()));
        }
    }

    #[test]
    fn unrecognised_platform_label_is_unknown() {
        assert_eq!(Platform::from_label("arXiv"), Platform::Arxiv);
        assert_eq!(Platform::from_label("Mastodon"), Platform::Unknown);
        assert_eq!(Platform::from_label("reddit"), Platform::Unknown);
    }

    #[test]
    fn llm_parses_known_identifiers_only() {
        assert_eq!("llama3".parse::<Llm>().unwrap(), Llm::Llama3);
        assert_eq!("openai".parse::<Llm>().unwrap(), Llm::OpenAi);
        let err = "gpt-9".parse::<Llm>().unwrap_err();
        assert!(err.to_string().contains("Unknown LLM: gpt-9"));
    }

    #[test]
    fn answers_round_trip_through_json_object() {
        let q = Uuid::new_v4();
        let mut answers = Answers::new();
        answers.insert(q, 2);
        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(json[q.to_string()], 2);
        let back: Answers = serde_json::from_value(json).unwrap();
        assert_eq!(back, answers);
    }

    #[test]
    fn submission_requires_name_and_every_answer() {
        let mut submission = NewSubmission {
            quiz_id: Uuid::new_v4(),
            name: "  ".to_string(),
            admission_number: "A-17".to_string(),
            answers: Answers::new(),
        };
        assert!(submission.validate(1).is_err());

        submission.name = "Wanjiru".to_string();
        assert!(submission.validate(1).is_err());

        submission.answers.insert(Uuid::new_v4(), 0);
        assert!(submission.validate(1).is_ok());
        assert!(submission.validate(0).is_err());
    }
}
