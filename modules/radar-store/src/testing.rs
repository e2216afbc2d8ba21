// In-memory store for tests.
//
// MemoryStore implements every store trait behind std Mutexes. Failure
// switches (`fail_story_writes`, `fail_progress_reads`, ...) let tests drive
// the error paths without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use radar_common::{
    NewStory, NewSubmission, Question, Quiz, QuizProgress, ScrapeLogEntry, Story, Submission,
    WeeklyScript,
};

use crate::traits::{QuizStore, ScrapeLog, ScriptStore, StoryStore};

#[derive(Default)]
pub struct MemoryStore {
    stories: Mutex<Vec<Story>>,
    logs: Mutex<Vec<ScrapeLogEntry>>,
    quizzes: Mutex<HashMap<Uuid, Quiz>>,
    questions: Mutex<Vec<Question>>,
    progress: Mutex<HashMap<(Uuid, String), QuizProgress>>,
    progress_writes: Mutex<Vec<QuizProgress>>,
    submissions: Mutex<Vec<Submission>>,
    scripts: Mutex<Vec<WeeklyScript>>,

    fail_story_writes: AtomicBool,
    fail_story_reads: AtomicBool,
    fail_progress_reads: AtomicBool,
    fail_progress_writes: AtomicBool,
    fail_submission_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Seeding ---

    pub fn with_stories(self, stories: Vec<Story>) -> Self {
        self.stories.lock().unwrap().extend(stories);
        self
    }

    /// Register a quiz and its questions (kept in the given order).
    pub fn with_quiz(self, quiz: Quiz, questions: Vec<Question>) -> Self {
        self.quizzes.lock().unwrap().insert(quiz.id, quiz);
        self.questions.lock().unwrap().extend(questions);
        self
    }

    pub fn with_progress(self, progress: QuizProgress) -> Self {
        let key = (progress.quiz_id, progress.admission_number.clone());
        self.progress.lock().unwrap().insert(key, progress);
        self
    }

    pub fn with_submission(self, submission: Submission) -> Self {
        self.submissions.lock().unwrap().push(submission);
        self
    }

    // --- Failure switches ---

    pub fn fail_story_writes(&self, fail: bool) {
        self.fail_story_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_story_reads(&self, fail: bool) {
        self.fail_story_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_progress_reads(&self, fail: bool) {
        self.fail_progress_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_progress_writes(&self, fail: bool) {
        self.fail_progress_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_submission_writes(&self, fail: bool) {
        self.fail_submission_writes.store(fail, Ordering::SeqCst);
    }

    // --- Inspection ---

    pub fn stories(&self) -> Vec<Story> {
        self.stories.lock().unwrap().clone()
    }

    pub fn story_count(&self) -> usize {
        self.stories.lock().unwrap().len()
    }

    pub fn logs(&self) -> Vec<ScrapeLogEntry> {
        self.logs.lock().unwrap().clone()
    }

    pub fn log_sources(&self) -> Vec<String> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.source.clone())
            .collect()
    }

    pub fn progress(&self, quiz_id: Uuid, admission_number: &str) -> Option<QuizProgress> {
        self.progress
            .lock()
            .unwrap()
            .get(&(quiz_id, admission_number.to_string()))
            .cloned()
    }

    /// Every successful `save_progress` call, in order.
    pub fn progress_writes(&self) -> Vec<QuizProgress> {
        self.progress_writes.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn scripts(&self) -> Vec<WeeklyScript> {
        self.scripts.lock().unwrap().clone()
    }
}

fn newest_first(mut stories: Vec<Story>) -> Vec<Story> {
    stories.sort_by(|a, b| b.date.cmp(&a.date));
    stories
}

// ---------------------------------------------------------------------------
// StoryStore
// ---------------------------------------------------------------------------

#[async_trait]
impl StoryStore for MemoryStore {
    async fn upsert_stories(&self, stories: &[NewStory]) -> Result<u64> {
        if self.fail_story_writes.load(Ordering::SeqCst) {
            bail!("MemoryStore: story writes disabled");
        }
        let mut stored = self.stories.lock().unwrap();
        let mut inserted = 0;
        for story in stories {
            if stored.iter().any(|s| s.url == story.url) {
                continue;
            }
            stored.push(story.clone().into_story(Uuid::new_v4()));
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn stories_since(&self, since: DateTime<Utc>) -> Result<Vec<Story>> {
        if self.fail_story_reads.load(Ordering::SeqCst) {
            bail!("MemoryStore: story reads disabled");
        }
        let stories = self
            .stories
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.date >= since)
            .cloned()
            .collect();
        Ok(newest_first(stories))
    }

    async fn list_stories(&self) -> Result<Vec<Story>> {
        if self.fail_story_reads.load(Ordering::SeqCst) {
            bail!("MemoryStore: story reads disabled");
        }
        Ok(newest_first(self.stories.lock().unwrap().clone()))
    }
}

// ---------------------------------------------------------------------------
// ScrapeLog
// ---------------------------------------------------------------------------

#[async_trait]
impl ScrapeLog for MemoryStore {
    async fn record(&self, source: &str, message: &str) -> Result<()> {
        self.logs.lock().unwrap().push(ScrapeLogEntry {
            source: source.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// QuizStore
// ---------------------------------------------------------------------------

#[async_trait]
impl QuizStore for MemoryStore {
    async fn quiz(&self, quiz_id: Uuid) -> Result<Option<Quiz>> {
        Ok(self.quizzes.lock().unwrap().get(&quiz_id).cloned())
    }

    async fn questions(&self, quiz_id: Uuid) -> Result<Vec<Question>> {
        Ok(self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn load_progress(
        &self,
        quiz_id: Uuid,
        admission_number: &str,
    ) -> Result<Option<QuizProgress>> {
        if self.fail_progress_reads.load(Ordering::SeqCst) {
            bail!("MemoryStore: progress reads disabled");
        }
        Ok(self.progress(quiz_id, admission_number))
    }

    async fn save_progress(&self, progress: &QuizProgress) -> Result<()> {
        if self.fail_progress_writes.load(Ordering::SeqCst) {
            bail!("MemoryStore: progress writes disabled");
        }
        let key = (progress.quiz_id, progress.admission_number.clone());
        self.progress.lock().unwrap().insert(key, progress.clone());
        self.progress_writes.lock().unwrap().push(progress.clone());
        Ok(())
    }

    async fn submission_exists(&self, quiz_id: Uuid, admission_number: &str) -> Result<bool> {
        Ok(self.find_submission(quiz_id, admission_number).await?.is_some())
    }

    async fn find_submission(
        &self,
        quiz_id: Uuid,
        admission_number: &str,
    ) -> Result<Option<Submission>> {
        Ok(self
            .submissions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.quiz_id == quiz_id && s.admission_number == admission_number)
            .cloned())
    }

    async fn insert_submission(&self, submission: &NewSubmission) -> Result<Option<Submission>> {
        if self.fail_submission_writes.load(Ordering::SeqCst) {
            bail!("MemoryStore: submission writes disabled");
        }
        let mut submissions = self.submissions.lock().unwrap();
        let taken = submissions.iter().any(|s| {
            s.quiz_id == submission.quiz_id && s.admission_number == submission.admission_number
        });
        if taken {
            return Ok(None);
        }
        let row = Submission {
            id: Uuid::new_v4(),
            quiz_id: submission.quiz_id,
            name: submission.name.clone(),
            admission_number: submission.admission_number.clone(),
            answers: submission.answers.clone(),
            submitted_at: Utc::now(),
        };
        submissions.push(row.clone());
        Ok(Some(row))
    }

    async fn submissions_for_quiz(&self, quiz_id: Uuid) -> Result<Vec<Submission>> {
        let mut rows: Vec<Submission> = self
            .submissions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.quiz_id == quiz_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// ScriptStore
// ---------------------------------------------------------------------------

#[async_trait]
impl ScriptStore for MemoryStore {
    async fn insert_weekly_script(&self, script: &WeeklyScript) -> Result<()> {
        self.scripts.lock().unwrap().push(script.clone());
        Ok(())
    }
}
