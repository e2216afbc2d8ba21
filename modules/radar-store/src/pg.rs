// Postgres implementation of every store trait.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use radar_common::{
    Answers, NewStory, NewSubmission, Platform, Question, Quiz, QuizProgress, Story,
    StoryCategory, StorySummary, Submission, WeeklyScript,
};

use crate::traits::{QuizStore, ScrapeLog, ScriptStore, StoryStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

// --- Row types ---

#[derive(Debug, sqlx::FromRow)]
struct StoryRow {
    id: Uuid,
    platform: String,
    title: String,
    content: String,
    url: String,
    date: DateTime<Utc>,
    category: Option<String>,
    score: i32,
    created_at: DateTime<Utc>,
}

impl From<StoryRow> for Story {
    fn from(row: StoryRow) -> Self {
        Story {
            id: row.id,
            platform: Platform::from_label(&row.platform),
            title: row.title,
            content: row.content,
            url: row.url,
            date: row.date,
            category: row.category.as_deref().and_then(StoryCategory::from_label),
            score: row.score,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QuestionRow {
    id: Uuid,
    quiz_id: Uuid,
    question_text: String,
    choices: Vec<String>,
    correct_choice: i32,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id,
            quiz_id: row.quiz_id,
            question_text: row.question_text,
            choices: row.choices,
            correct_choice: row.correct_choice.max(0) as usize,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProgressRow {
    quiz_id: Uuid,
    admission_number: String,
    student_name: String,
    answers: Json<Answers>,
    current_question: i32,
    last_saved: DateTime<Utc>,
}

impl From<ProgressRow> for QuizProgress {
    fn from(row: ProgressRow) -> Self {
        QuizProgress {
            quiz_id: row.quiz_id,
            admission_number: row.admission_number,
            student_name: row.student_name,
            answers: row.answers.0,
            current_question: row.current_question.max(0) as usize,
            last_saved: row.last_saved,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    quiz_id: Uuid,
    name: String,
    admission_number: String,
    answers: Json<Answers>,
    submitted_at: DateTime<Utc>,
}

impl From<SubmissionRow> for Submission {
    fn from(row: SubmissionRow) -> Self {
        Submission {
            id: row.id,
            quiz_id: row.quiz_id,
            name: row.name,
            admission_number: row.admission_number,
            answers: row.answers.0,
            submitted_at: row.submitted_at,
        }
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a small pool and run the embedded migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to Postgres")?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        info!("Database migrations applied");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StoryStore
// ---------------------------------------------------------------------------

#[async_trait]
impl StoryStore for PgStore {
    async fn upsert_stories(&self, stories: &[NewStory]) -> Result<u64> {
        if stories.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for story in stories {
            let result = sqlx::query(
                r#"
                INSERT INTO ai_news (platform, title, content, url, date, category, score, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (url) DO NOTHING
                "#,
            )
            .bind(story.platform.as_str())
            .bind(&story.title)
            .bind(&story.content)
            .bind(&story.url)
            .bind(story.date)
            .bind(story.category.map(|c| c.as_str()))
            .bind(story.score)
            .bind(story.created_at)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to upsert story {}", story.url))?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!(offered = stories.len(), inserted, "Upserted stories");
        Ok(inserted)
    }

    async fn stories_since(&self, since: DateTime<Utc>) -> Result<Vec<Story>> {
        let rows = sqlx::query_as::<_, StoryRow>(
            r#"
            SELECT id, platform, title, content, url, date, category, score, created_at
            FROM ai_news
            WHERE date >= $1
            ORDER BY date DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Story::from).collect())
    }

    async fn list_stories(&self) -> Result<Vec<Story>> {
        let rows = sqlx::query_as::<_, StoryRow>(
            r#"
            SELECT id, platform, title, content, url, date, category, score, created_at
            FROM ai_news
            ORDER BY date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Story::from).collect())
    }
}

// ---------------------------------------------------------------------------
// ScrapeLog
// ---------------------------------------------------------------------------

#[async_trait]
impl ScrapeLog for PgStore {
    async fn record(&self, source: &str, message: &str) -> Result<()> {
        sqlx::query("INSERT INTO scrape_logs (source, message) VALUES ($1, $2)")
            .bind(source)
            .bind(message)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// QuizStore
// ---------------------------------------------------------------------------

#[async_trait]
impl QuizStore for PgStore {
    async fn quiz(&self, quiz_id: Uuid) -> Result<Option<Quiz>> {
        let row = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            "SELECT id, title, created_at FROM quizzes WHERE id = $1",
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, title, created_at)| Quiz {
            id,
            title,
            created_at,
        }))
    }

    async fn questions(&self, quiz_id: Uuid) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, quiz_id, question_text, choices, correct_choice
            FROM questions
            WHERE quiz_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn load_progress(
        &self,
        quiz_id: Uuid,
        admission_number: &str,
    ) -> Result<Option<QuizProgress>> {
        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT quiz_id, admission_number, student_name, answers, current_question, last_saved
            FROM quiz_progress
            WHERE quiz_id = $1 AND admission_number = $2
            "#,
        )
        .bind(quiz_id)
        .bind(admission_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(QuizProgress::from))
    }

    async fn save_progress(&self, progress: &QuizProgress) -> Result<()> {
        let current = i32::try_from(progress.current_question)
            .context("current_question out of range")?;

        sqlx::query(
            r#"
            INSERT INTO quiz_progress
                (quiz_id, admission_number, student_name, answers, current_question, last_saved)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (quiz_id, admission_number) DO UPDATE SET
                student_name = EXCLUDED.student_name,
                answers = EXCLUDED.answers,
                current_question = EXCLUDED.current_question,
                last_saved = EXCLUDED.last_saved
            "#,
        )
        .bind(progress.quiz_id)
        .bind(&progress.admission_number)
        .bind(&progress.student_name)
        .bind(Json(&progress.answers))
        .bind(current)
        .bind(progress.last_saved)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn submission_exists(&self, quiz_id: Uuid, admission_number: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM submissions WHERE quiz_id = $1 AND admission_number = $2)",
        )
        .bind(quiz_id)
        .bind(admission_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_submission(
        &self,
        quiz_id: Uuid,
        admission_number: &str,
    ) -> Result<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, quiz_id, name, admission_number, answers, submitted_at
            FROM submissions
            WHERE quiz_id = $1 AND admission_number = $2
            "#,
        )
        .bind(quiz_id)
        .bind(admission_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Submission::from))
    }

    async fn insert_submission(&self, submission: &NewSubmission) -> Result<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO submissions (quiz_id, name, admission_number, answers)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (quiz_id, admission_number) DO NOTHING
            RETURNING id, quiz_id, name, admission_number, answers, submitted_at
            "#,
        )
        .bind(submission.quiz_id)
        .bind(&submission.name)
        .bind(&submission.admission_number)
        .bind(Json(&submission.answers))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Submission::from))
    }

    async fn submissions_for_quiz(&self, quiz_id: Uuid) -> Result<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, quiz_id, name, admission_number, answers, submitted_at
            FROM submissions
            WHERE quiz_id = $1
            ORDER BY submitted_at ASC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Submission::from).collect())
    }
}

// ---------------------------------------------------------------------------
// ScriptStore
// ---------------------------------------------------------------------------

#[async_trait]
impl ScriptStore for PgStore {
    async fn insert_weekly_script(&self, script: &WeeklyScript) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO weekly_scripts (llm, status, script_text, error, stories_used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(script.llm.as_str())
        .bind(script.status.as_str())
        .bind(&script.script_text)
        .bind(&script.error)
        .bind(Json::<&Vec<StorySummary>>(&script.stories_used))
        .bind(script.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
