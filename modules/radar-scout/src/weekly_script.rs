// Weekly short-video script generation.
//
// Picks the top three stories of the trailing week, sends one prompt to every
// selected backend at once, and persists one `weekly_scripts` row per backend
// whatever the outcome. When no backend succeeds the caller gets the same
// prompt back to paste into an external tool.

use std::sync::Arc;

use ai_client::{Ollama, OpenAi, TextCompletion};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use radar_common::{Config, Llm, ScriptStatus, Story, StorySummary, WeeklyScript};
use radar_store::{ScriptStore, StoryStore};

use crate::fanout::{settle_all, Settled};

pub const WINDOW_DAYS: i64 = 7;
pub const STORIES_PER_SCRIPT: usize = 3;

const OPENAI_TEMPERATURE: f32 = 0.7;
const OPENAI_MAX_TOKENS: u32 = 500;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("No news found in the last 7 days")]
    NoRecentStories,

    #[error("Not enough stories to generate a script")]
    NotEnoughStories { found: usize },

    #[error("Failed to load stories: {0}")]
    Storage(String),
}

/// Outcome of one generation request.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptRun {
    pub scripts: Vec<WeeklyScript>,
    pub stories: Vec<StorySummary>,
    /// Present only when every backend failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_prompt: Option<String>,
}

impl ScriptRun {
    pub fn first_success(&self) -> Option<&WeeklyScript> {
        self.scripts
            .iter()
            .find(|s| s.status == ScriptStatus::Success)
    }
}

pub struct ScriptGenerator {
    stories: Arc<dyn StoryStore>,
    scripts: Arc<dyn ScriptStore>,
    backends: Vec<(Llm, Arc<dyn TextCompletion>)>,
}

impl ScriptGenerator {
    pub fn new(stories: Arc<dyn StoryStore>, scripts: Arc<dyn ScriptStore>) -> Self {
        Self {
            stories,
            scripts,
            backends: Vec::new(),
        }
    }

    pub fn with_backend(mut self, llm: Llm, backend: Arc<dyn TextCompletion>) -> Self {
        self.backends.retain(|(l, _)| *l != llm);
        self.backends.push((llm, backend));
        self
    }

    /// OpenAI plus the three Ollama models, configured from the environment.
    pub fn from_config(
        config: &Config,
        stories: Arc<dyn StoryStore>,
        scripts: Arc<dyn ScriptStore>,
    ) -> Self {
        let openai = OpenAi::new(&config.openai_api_key, &config.openai_model)
            .with_temperature(OPENAI_TEMPERATURE)
            .with_max_tokens(OPENAI_MAX_TOKENS);

        let mut generator = Self::new(stories, scripts).with_backend(Llm::OpenAi, Arc::new(openai));
        for llm in [Llm::Mistral, Llm::Llama3, Llm::Zephyr] {
            let ollama = Ollama::new(llm.as_str()).with_base_url(&config.ollama_url);
            generator = generator.with_backend(llm, Arc::new(ollama));
        }
        generator
    }

    pub fn backends(&self) -> Vec<Llm> {
        self.backends.iter().map(|(llm, _)| *llm).collect()
    }

    /// Generate with one backend, or all of them when `selection` is `None`.
    pub async fn generate(&self, selection: Option<Llm>) -> Result<ScriptRun, ScriptError> {
        let since = Utc::now() - Duration::days(WINDOW_DAYS);
        let recent = self
            .stories
            .stories_since(since)
            .await
            .map_err(|e| ScriptError::Storage(format!("{e:#}")))?;

        if recent.is_empty() {
            return Err(ScriptError::NoRecentStories);
        }
        let top = select_top_stories(recent);
        if top.len() < STORIES_PER_SCRIPT {
            return Err(ScriptError::NotEnoughStories { found: top.len() });
        }

        let stories: Vec<StorySummary> = top.iter().map(StorySummary::from).collect();
        let prompt = build_prompt(&stories);

        let llms: Vec<Llm> = match selection {
            Some(llm) => vec![llm],
            None => self.backends(),
        };
        info!(backends = ?llms, "Generating weekly script");

        let settled = settle_all(llms.iter().map(|llm| self.complete_with(*llm, &prompt))).await;

        let created_at = Utc::now();
        let mut scripts = Vec::with_capacity(llms.len());
        for (llm, outcome) in llms.into_iter().zip(settled) {
            let script = to_weekly_script(llm, outcome, &stories, created_at);
            if let Err(e) = self.scripts.insert_weekly_script(&script).await {
                warn!(llm = %llm, error = %e, "Failed to persist weekly script");
            }
            scripts.push(script);
        }

        let fallback_prompt = scripts
            .iter()
            .all(|s| s.status == ScriptStatus::Error)
            .then(|| prompt.clone());
        if fallback_prompt.is_some() {
            warn!("Every backend failed, returning fallback prompt");
        }

        Ok(ScriptRun {
            scripts,
            stories,
            fallback_prompt,
        })
    }

    async fn complete_with(&self, llm: Llm, prompt: &str) -> anyhow::Result<String> {
        let backend = self
            .backends
            .iter()
            .find(|(l, _)| *l == llm)
            .map(|(_, b)| b.clone())
            .ok_or_else(|| anyhow::anyhow!("Backend {llm} is not configured"))?;
        backend.complete(prompt).await
    }
}

fn to_weekly_script(
    llm: Llm,
    outcome: Settled<String>,
    stories: &[StorySummary],
    created_at: DateTime<Utc>,
) -> WeeklyScript {
    let (status, script_text, error) = match outcome {
        Settled::Fulfilled(text) => (ScriptStatus::Success, Some(text), None),
        Settled::Rejected(message) => (ScriptStatus::Error, None, Some(message)),
    };
    WeeklyScript {
        llm,
        status,
        script_text,
        error,
        stories_used: stories.to_vec(),
        created_at,
    }
}

/// Highest stored score first, newer first on ties, at most three.
pub fn select_top_stories(mut stories: Vec<Story>) -> Vec<Story> {
    stories.sort_by(|a, b| b.score.cmp(&a.score).then(b.date.cmp(&a.date)));
    stories.truncate(STORIES_PER_SCRIPT);
    stories
}

pub fn build_prompt(stories: &[StorySummary]) -> String {
    let mut prompt = String::from(
        "You're a viral tech content creator. Based on these 3 stories, write a 1-minute \
         Instagram Reel script. Make it casual, catchy, and informative. Include:\n\
         - An engaging hook at the start\n\
         - A punchy summary of each story\n\
         - A CTA at the end (e.g. \"Follow for weekly AI news before it trends\")\n\
         \n\
         Here are the stories:",
    );
    for (i, story) in stories.iter().enumerate() {
        prompt.push_str(&format!("\n{}. {} - {}", i + 1, story.title, story.content));
    }
    prompt
}
