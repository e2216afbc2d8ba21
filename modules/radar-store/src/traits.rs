// Storage boundaries. Every consumer (aggregator, script generator, quiz
// session, HTTP handlers) takes one of these as `Arc<dyn ...>` so tests can
// swap in `MemoryStore`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use radar_common::{
    NewStory, NewSubmission, Question, Quiz, QuizProgress, Story, Submission, WeeklyScript,
};

// ---------------------------------------------------------------------------
// StoryStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Insert stories keyed by `url`. Rows whose url already exists are left
    /// untouched. Returns how many new rows were written.
    async fn upsert_stories(&self, stories: &[NewStory]) -> Result<u64>;

    /// Stories whose `date` is at or after `since`, newest first.
    async fn stories_since(&self, since: DateTime<Utc>) -> Result<Vec<Story>>;

    /// All stories, newest first.
    async fn list_stories(&self) -> Result<Vec<Story>>;
}

// ---------------------------------------------------------------------------
// ScrapeLog
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ScrapeLog: Send + Sync {
    /// Append one failure entry tagged with its source.
    async fn record(&self, source: &str, message: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// QuizStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn quiz(&self, quiz_id: Uuid) -> Result<Option<Quiz>>;

    /// Questions of a quiz in display order.
    async fn questions(&self, quiz_id: Uuid) -> Result<Vec<Question>>;

    async fn load_progress(
        &self,
        quiz_id: Uuid,
        admission_number: &str,
    ) -> Result<Option<QuizProgress>>;

    /// Upsert on `(quiz_id, admission_number)`; last write wins.
    async fn save_progress(&self, progress: &QuizProgress) -> Result<()>;

    async fn submission_exists(&self, quiz_id: Uuid, admission_number: &str) -> Result<bool>;

    async fn find_submission(
        &self,
        quiz_id: Uuid,
        admission_number: &str,
    ) -> Result<Option<Submission>>;

    /// Create the submission unless one already exists for the key.
    /// Returns `None` when the key was taken.
    async fn insert_submission(&self, submission: &NewSubmission) -> Result<Option<Submission>>;

    async fn submissions_for_quiz(&self, quiz_id: Uuid) -> Result<Vec<Submission>>;
}

// ---------------------------------------------------------------------------
// ScriptStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ScriptStore: Send + Sync {
    async fn insert_weekly_script(&self, script: &WeeklyScript) -> Result<()>;
}
