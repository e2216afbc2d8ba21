// Heuristic virality score. Pure; every rule stacks.

use radar_common::{NewStory, Platform, Story, StoryCategory};

/// Company names matched case-sensitively against the title.
const MAJOR_COMPANIES: &[&str] = &["OpenAI", "Google", "Meta", "GPT"];

/// Keywords matched against the lowercased title and content.
const CONTROVERSY_KEYWORDS: &[&str] = &["bias", "lawsuit", "ban", "replace", "job loss"];

const REDDIT_ENGAGEMENT_WEIGHT: f64 = 0.5;
const X_ENGAGEMENT_WEIGHT: f64 = 0.3;
const TOOL_BONUS: f64 = 30.0;
const COMPANY_BONUS: f64 = 10.0;
const CONTROVERSY_BONUS: f64 = 20.0;

/// What the scorer looks at.
#[derive(Debug, Clone, Copy)]
pub struct Signals<'a> {
    pub platform: Platform,
    /// Raw engagement (upvotes, likes). Zero when the platform has none.
    pub engagement: i32,
    pub category: Option<StoryCategory>,
    pub title: &'a str,
    pub content: &'a str,
}

impl<'a> From<&'a Story> for Signals<'a> {
    fn from(story: &'a Story) -> Self {
        Self {
            platform: story.platform,
            engagement: story.score,
            category: story.category,
            title: &story.title,
            content: &story.content,
        }
    }
}

impl<'a> From<&'a NewStory> for Signals<'a> {
    fn from(story: &'a NewStory) -> Self {
        Self {
            platform: story.platform,
            engagement: story.score,
            category: story.category,
            title: &story.title,
            content: &story.content,
        }
    }
}

pub fn score(signals: Signals<'_>) -> i32 {
    let mut total = 0.0;

    total += match signals.platform {
        Platform::Reddit => f64::from(signals.engagement) * REDDIT_ENGAGEMENT_WEIGHT,
        Platform::X => f64::from(signals.engagement) * X_ENGAGEMENT_WEIGHT,
        _ => 0.0,
    };

    if signals.category == Some(StoryCategory::Tool) {
        total += TOOL_BONUS;
    }

    if MAJOR_COMPANIES.iter().any(|c| signals.title.contains(c)) {
        total += COMPANY_BONUS;
    }

    let text = format!("{} {}", signals.title, signals.content).to_lowercase();
    if CONTROVERSY_KEYWORDS.iter().any(|k| text.contains(k)) {
        total += CONTROVERSY_BONUS;
    }

    total.round() as i32
}
