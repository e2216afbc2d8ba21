// Quiz attempt state machine.
//
// `transition` is pure: it takes the current attempt, one event and the quiz's
// questions, and returns the next attempt or the reason the event was refused.
// Persistence and remote checks live in `session`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use radar_common::{Answers, Question, QuizProgress};

use crate::error::QuizError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    NotStarted,
    InProgress,
    Submitted,
}

/// Everything known about one student's attempt at one quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptState {
    pub quiz_id: Uuid,
    pub admission_number: String,
    pub student_name: String,
    pub answers: Answers,
    /// Questions whose answer can no longer change.
    pub locked: BTreeSet<Uuid>,
    /// Index of the question on screen.
    pub current: usize,
    pub phase: Phase,
}

impl AttemptState {
    pub fn new(quiz_id: Uuid, admission_number: impl Into<String>) -> Self {
        Self {
            quiz_id,
            admission_number: admission_number.into(),
            student_name: String::new(),
            answers: Answers::new(),
            locked: BTreeSet::new(),
            current: 0,
            phase: Phase::NotStarted,
        }
    }

    pub fn is_locked(&self, question_id: Uuid) -> bool {
        self.locked.contains(&question_id)
    }

    /// The remote autosave row for this attempt.
    pub fn to_progress(&self, now: DateTime<Utc>) -> QuizProgress {
        QuizProgress {
            quiz_id: self.quiz_id,
            admission_number: self.admission_number.clone(),
            student_name: self.student_name.clone(),
            answers: self.answers.clone(),
            current_question: self.current,
            last_saved: now,
        }
    }
}

/// Where a saved attempt was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavedFrom {
    Remote,
    Local,
}

/// Progress found for an attempt that has not been submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedProgress {
    pub student_name: String,
    pub answers: Answers,
    pub current: usize,
    pub last_saved: Option<DateTime<Utc>>,
    pub origin: SavedFrom,
}

impl From<QuizProgress> for SavedProgress {
    fn from(progress: QuizProgress) -> Self {
        Self {
            student_name: progress.student_name,
            answers: progress.answers,
            current: progress.current_question,
            last_saved: Some(progress.last_saved),
            origin: SavedFrom::Remote,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizEvent {
    /// Fresh start with the given name.
    Begin { student_name: String },
    /// Continue from saved progress.
    Resume(SavedProgress),
    /// A submission already exists for this key.
    AlreadySubmitted,
    Answer { question_id: Uuid, choice: usize },
    Advance,
    Submitted,
}

pub fn transition(
    state: &AttemptState,
    event: &QuizEvent,
    questions: &[Question],
) -> Result<AttemptState, QuizError> {
    if state.phase == Phase::Submitted {
        return Err(QuizError::AlreadySubmitted);
    }

    match event {
        QuizEvent::Begin { student_name } => {
            expect_not_started(state)?;
            let student_name = student_name.trim();
            if student_name.is_empty() {
                return Err(QuizError::MissingName);
            }
            check_startable(state, questions)?;
            Ok(AttemptState {
                student_name: student_name.to_string(),
                answers: Answers::new(),
                locked: BTreeSet::new(),
                current: 0,
                phase: Phase::InProgress,
                ..state.clone()
            })
        }

        QuizEvent::Resume(saved) => {
            expect_not_started(state)?;
            check_startable(state, questions)?;
            let student_name = match saved.student_name.trim() {
                "" => state.student_name.trim(),
                name => name,
            };
            if student_name.is_empty() {
                return Err(QuizError::MissingName);
            }

            let answers: Answers = saved
                .answers
                .iter()
                .filter(|(id, choice)| {
                    questions
                        .iter()
                        .any(|q| q.id == **id && **choice < q.choices.len())
                })
                .map(|(id, choice)| (*id, *choice))
                .collect();
            let locked = answers.keys().copied().collect();
            // Never land past a question that still needs an answer.
            let first_open = questions
                .iter()
                .position(|q| !answers.contains_key(&q.id))
                .unwrap_or(questions.len() - 1);

            Ok(AttemptState {
                student_name: student_name.to_string(),
                answers,
                locked,
                current: saved.current.min(first_open),
                phase: Phase::InProgress,
                ..state.clone()
            })
        }

        QuizEvent::AlreadySubmitted => Ok(AttemptState {
            phase: Phase::Submitted,
            ..state.clone()
        }),

        QuizEvent::Answer {
            question_id,
            choice,
        } => {
            expect_in_progress(state)?;
            let index = questions
                .iter()
                .position(|q| q.id == *question_id)
                .ok_or(QuizError::UnknownQuestion(*question_id))?;
            if state.is_locked(*question_id) {
                return Err(QuizError::AnswerLocked(*question_id));
            }
            if index != state.current {
                return Err(QuizError::NotCurrentQuestion(*question_id));
            }
            let choices = questions[index].choices.len();
            if *choice >= choices {
                return Err(QuizError::ChoiceOutOfRange {
                    choice: *choice,
                    choices,
                });
            }

            let mut next = state.clone();
            next.answers.insert(*question_id, *choice);
            next.locked.insert(*question_id);
            Ok(next)
        }

        QuizEvent::Advance => {
            expect_in_progress(state)?;
            let current = questions
                .get(state.current)
                .ok_or(QuizError::NoQuestions)?;
            if !state.answers.contains_key(&current.id) {
                return Err(QuizError::Unanswered);
            }
            if state.current + 1 >= questions.len() {
                return Err(QuizError::LastQuestion);
            }
            Ok(AttemptState {
                current: state.current + 1,
                ..state.clone()
            })
        }

        QuizEvent::Submitted => {
            expect_in_progress(state)?;
            let answered = questions
                .iter()
                .filter(|q| state.answers.contains_key(&q.id))
                .count();
            if questions.is_empty() || answered != questions.len() {
                return Err(QuizError::Incomplete {
                    answered,
                    total: questions.len(),
                });
            }
            if state.student_name.trim().is_empty() {
                return Err(QuizError::MissingName);
            }
            Ok(AttemptState {
                phase: Phase::Submitted,
                ..state.clone()
            })
        }
    }
}

fn expect_not_started(state: &AttemptState) -> Result<(), QuizError> {
    match state.phase {
        Phase::NotStarted => Ok(()),
        _ => Err(QuizError::AlreadyStarted),
    }
}

fn expect_in_progress(state: &AttemptState) -> Result<(), QuizError> {
    match state.phase {
        Phase::InProgress => Ok(()),
        _ => Err(QuizError::NotStarted),
    }
}

fn check_startable(state: &AttemptState, questions: &[Question]) -> Result<(), QuizError> {
    if state.admission_number.trim().is_empty() {
        return Err(QuizError::MissingAdmissionNumber);
    }
    if questions.is_empty() {
        return Err(QuizError::NoQuestions);
    }
    Ok(())
}
