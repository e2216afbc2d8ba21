// One student's attempt at one quiz, wired to storage.
//
// The session owns the attempt state and runs every change through
// `machine::transition`. Accepted changes go to the local cache at once and
// to the remote store through the debounced writer.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use radar_common::{NewSubmission, Question, Submission};
use radar_store::QuizStore;

use crate::cache::LocalCache;
use crate::error::QuizError;
use crate::machine::{transition, AttemptState, Phase, QuizEvent, SavedProgress};
use crate::sinks::{DebouncedRemoteSink, LocalCacheSink, ProgressSink};

#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Started,
    /// A submission exists; show the submitted view.
    AlreadySubmitted,
    /// Progress exists and the student has not chosen to discard it.
    SavedProgressFound(SavedProgress),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResumeOutcome {
    Resumed { current: usize },
    AlreadySubmitted,
    NothingSaved,
}

pub struct QuizSession {
    store: Arc<dyn QuizStore>,
    local: LocalCacheSink,
    remote: DebouncedRemoteSink,
    questions: Vec<Question>,
    state: AttemptState,
    submission: Option<Submission>,
}

fn store_error(e: anyhow::Error) -> QuizError {
    QuizError::Store(format!("{e:#}"))
}

impl QuizSession {
    /// Load the quiz's questions and prepare an attempt for the student.
    pub async fn open(
        store: Arc<dyn QuizStore>,
        cache: Arc<dyn LocalCache>,
        quiz_id: Uuid,
        admission_number: &str,
    ) -> Result<Self, QuizError> {
        let admission_number = admission_number.trim();
        if admission_number.is_empty() {
            return Err(QuizError::MissingAdmissionNumber);
        }
        if store.quiz(quiz_id).await.map_err(store_error)?.is_none() {
            return Err(QuizError::QuizNotFound);
        }
        let questions = store.questions(quiz_id).await.map_err(store_error)?;
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        Ok(Self {
            remote: DebouncedRemoteSink::spawn(store.clone()),
            local: LocalCacheSink::new(cache),
            store,
            questions,
            state: AttemptState::new(quiz_id, admission_number),
            submission: None,
        })
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.state.phase {
            Phase::InProgress => self.questions.get(self.state.current),
            _ => None,
        }
    }

    pub fn is_last_question(&self) -> bool {
        self.state.current + 1 == self.questions.len()
    }

    /// The stored submission, once known.
    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    /// Remote progress first; the local cache when the remote has no row or
    /// cannot be reached.
    pub async fn saved_progress(&self) -> Option<SavedProgress> {
        let quiz_id = self.state.quiz_id;
        let admission_number = self.state.admission_number.as_str();
        match self.store.load_progress(quiz_id, admission_number).await {
            Ok(Some(progress)) => return Some(progress.into()),
            Ok(None) => debug!(%quiz_id, "No remote progress, checking local cache"),
            Err(e) => warn!(%quiz_id, error = %e, "Remote progress unavailable, using local cache"),
        }
        self.local.load(quiz_id, admission_number)
    }

    /// Start a fresh attempt. Without `discard_saved`, existing progress is
    /// reported back instead so the student can pick resume or start over.
    pub async fn start(
        &mut self,
        student_name: &str,
        discard_saved: bool,
    ) -> Result<StartOutcome, QuizError> {
        if student_name.trim().is_empty() {
            return Err(QuizError::MissingName);
        }
        if self.check_submitted().await? {
            return Ok(StartOutcome::AlreadySubmitted);
        }

        // Refused starts must leave the saved entry alone.
        let begin = QuizEvent::Begin {
            student_name: student_name.to_string(),
        };
        let next = transition(&self.state, &begin, &self.questions)?;

        if discard_saved {
            self.local
                .clear(self.state.quiz_id, &self.state.admission_number);
        } else if let Some(saved) = self.saved_progress().await {
            return Ok(StartOutcome::SavedProgressFound(saved));
        }

        self.commit(next);
        info!(
            quiz_id = %self.state.quiz_id,
            admission_number = self.state.admission_number.as_str(),
            "Quiz started"
        );
        Ok(StartOutcome::Started)
    }

    pub async fn resume(&mut self) -> Result<ResumeOutcome, QuizError> {
        if self.check_submitted().await? {
            return Ok(ResumeOutcome::AlreadySubmitted);
        }
        let Some(saved) = self.saved_progress().await else {
            return Ok(ResumeOutcome::NothingSaved);
        };

        let origin = saved.origin;
        self.apply(QuizEvent::Resume(saved))?;
        info!(
            quiz_id = %self.state.quiz_id,
            current = self.state.current,
            ?origin,
            "Quiz resumed"
        );
        Ok(ResumeOutcome::Resumed {
            current: self.state.current,
        })
    }

    /// Answer and lock the current question.
    pub fn answer(&mut self, question_id: Uuid, choice: usize) -> Result<(), QuizError> {
        self.apply(QuizEvent::Answer {
            question_id,
            choice,
        })
    }

    /// Move to the next question. Returns the new index.
    pub fn advance(&mut self) -> Result<usize, QuizError> {
        self.apply(QuizEvent::Advance)?;
        Ok(self.state.current)
    }

    /// Create the submission. Validation happens before any write; a storage
    /// failure leaves the attempt in progress so it can be sent again.
    pub async fn submit(&mut self) -> Result<Submission, QuizError> {
        let submitted = transition(&self.state, &QuizEvent::Submitted, &self.questions)?;
        let new = NewSubmission {
            quiz_id: self.state.quiz_id,
            name: self.state.student_name.clone(),
            admission_number: self.state.admission_number.clone(),
            answers: self.state.answers.clone(),
        };

        match self.store.insert_submission(&new).await {
            Ok(Some(row)) => {
                self.state = submitted;
                self.finish();
                info!(quiz_id = %row.quiz_id, submission_id = %row.id, "Quiz submitted");
                self.submission = Some(row.clone());
                Ok(row)
            }
            Ok(None) => {
                self.state = transition(&self.state, &QuizEvent::AlreadySubmitted, &self.questions)?;
                self.finish();
                warn!(quiz_id = %new.quiz_id, "Submission already exists for this student");
                Err(QuizError::AlreadySubmitted)
            }
            Err(e) => {
                warn!(quiz_id = %new.quiz_id, error = %e, "Submission failed");
                Err(store_error(e))
            }
        }
    }

    /// Stop the remote writer, sending any pending change first.
    pub async fn close(self) {
        self.remote.shutdown().await;
    }

    fn apply(&mut self, event: QuizEvent) -> Result<(), QuizError> {
        let next = transition(&self.state, &event, &self.questions)?;
        self.commit(next);
        Ok(())
    }

    fn commit(&mut self, next: AttemptState) {
        self.state = next;
        self.local.record(&self.state);
        self.remote.record(&self.state);
    }

    fn finish(&self) {
        self.remote.discard();
        self.local
            .clear(self.state.quiz_id, &self.state.admission_number);
    }

    /// Move to `Submitted` when a submission exists. A failed lookup is
    /// logged and treated as none; the store refuses a second submission anyway.
    async fn check_submitted(&mut self) -> Result<bool, QuizError> {
        if self.state.phase == Phase::Submitted {
            return Ok(true);
        }
        let existing = self
            .store
            .find_submission(self.state.quiz_id, &self.state.admission_number)
            .await;
        match existing {
            Ok(Some(submission)) => {
                self.state =
                    transition(&self.state, &QuizEvent::AlreadySubmitted, &self.questions)?;
                self.finish();
                self.submission = Some(submission);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                warn!(quiz_id = %self.state.quiz_id, error = %e, "Submission check failed");
                Ok(false)
            }
        }
    }
}
