use std::env;
use std::path::PathBuf;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Text generation
    pub openai_api_key: String,
    pub openai_model: String,
    pub ollama_url: String,

    // Reddit API (optional; the fetcher falls back to RSS without them)
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_username: Option<String>,
    pub reddit_password: Option<String>,

    // Static X/Twitter snapshot
    pub twint_snapshot_path: PathBuf,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            reddit_client_id: optional_env("REDDIT_CLIENT_ID"),
            reddit_client_secret: optional_env("REDDIT_CLIENT_SECRET"),
            reddit_username: optional_env("REDDIT_USERNAME"),
            reddit_password: optional_env("REDDIT_PASSWORD"),
            twint_snapshot_path: env::var("TWINT_SNAPSHOT_PATH")
                .unwrap_or_else(|_| "public/data/twint.json".to_string())
                .into(),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }

    /// Log which secrets are configured, never their values.
    pub fn log_redacted(&self) {
        info!(
            has_openai_key = !self.openai_api_key.is_empty(),
            openai_model = self.openai_model.as_str(),
            ollama_url = self.ollama_url.as_str(),
            reddit_values_set = [
                &self.reddit_client_id,
                &self.reddit_client_secret,
                &self.reddit_username,
                &self.reddit_password,
            ]
            .iter()
            .filter(|v| v.is_some())
            .count(),
            twint_snapshot = %self.twint_snapshot_path.display(),
            web_host = self.web_host.as_str(),
            web_port = self.web_port,
            "Loaded configuration"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
