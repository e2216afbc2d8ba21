// Quiz endpoints: questions, remote progress, create-once submissions and
// the leaderboard.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use radar_common::{Answers, NewSubmission, Question, QuizProgress};
use radar_quiz::{grade, leaderboard, revision};

use super::error_response;
use crate::AppState;

/// A question as shown to students; the answer key stays on the server.
#[derive(Serialize)]
pub struct QuestionView {
    id: Uuid,
    question_text: String,
    choices: Vec<String>,
}

impl From<Question> for QuestionView {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            choices: q.choices,
        }
    }
}

#[derive(Deserialize)]
pub struct ProgressRequest {
    student_name: String,
    #[serde(default)]
    answers: Answers,
    #[serde(default)]
    current_question: usize,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    name: String,
    admission_number: String,
    answers: Answers,
}

fn storage_error(e: anyhow::Error, what: &str) -> Response {
    warn!(error = %e, "{what}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, what)
}

/// Questions for an existing quiz, or the response to send instead.
async fn load_questions(state: &AppState, quiz_id: Uuid) -> Result<Vec<Question>, Response> {
    match state.quizzes.quiz(quiz_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(error_response(StatusCode::NOT_FOUND, "Quiz not found")),
        Err(e) => return Err(storage_error(e, "Failed to load quiz")),
    }
    state
        .quizzes
        .questions(quiz_id)
        .await
        .map_err(|e| storage_error(e, "Failed to load questions"))
}

pub async fn api_questions(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
) -> Response {
    match load_questions(&state, quiz_id).await {
        Ok(questions) => {
            let views: Vec<QuestionView> = questions.into_iter().map(QuestionView::from).collect();
            Json(views).into_response()
        }
        Err(response) => response,
    }
}

pub async fn api_load_progress(
    State(state): State<Arc<AppState>>,
    Path((quiz_id, admission_number)): Path<(Uuid, String)>,
) -> Response {
    match state.quizzes.load_progress(quiz_id, &admission_number).await {
        Ok(Some(progress)) => Json(progress).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No saved progress"),
        Err(e) => storage_error(e, "Failed to load progress"),
    }
}

pub async fn api_save_progress(
    State(state): State<Arc<AppState>>,
    Path((quiz_id, admission_number)): Path<(Uuid, String)>,
    Json(body): Json<ProgressRequest>,
) -> Response {
    if body.student_name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Student name is required");
    }
    let questions = match load_questions(&state, quiz_id).await {
        Ok(questions) => questions,
        Err(response) => return response,
    };
    if body.current_question >= questions.len() {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "current_question {} is out of range for {} questions",
                body.current_question,
                questions.len()
            ),
        );
    }
    if let Some(problem) = answer_problem(&questions, &body.answers) {
        return error_response(StatusCode::BAD_REQUEST, problem);
    }
    match state.quizzes.submission_exists(quiz_id, &admission_number).await {
        Ok(true) => {
            return error_response(StatusCode::CONFLICT, "Quiz already submitted");
        }
        Ok(false) => {}
        Err(e) => return storage_error(e, "Failed to check submission"),
    }

    let progress = QuizProgress {
        quiz_id,
        admission_number,
        student_name: body.student_name.trim().to_string(),
        answers: body.answers,
        current_question: body.current_question,
        last_saved: Utc::now(),
    };
    match state.quizzes.save_progress(&progress).await {
        Ok(()) => Json(progress).into_response(),
        Err(e) => storage_error(e, "Failed to save progress"),
    }
}

pub async fn api_submission(
    State(state): State<Arc<AppState>>,
    Path((quiz_id, admission_number)): Path<(Uuid, String)>,
) -> Response {
    let questions = match load_questions(&state, quiz_id).await {
        Ok(questions) => questions,
        Err(response) => return response,
    };
    match state.quizzes.find_submission(quiz_id, &admission_number).await {
        Ok(Some(submission)) => Json(serde_json::json!({
            "submitted": true,
            "score": grade(&questions, &submission.answers),
            "revision": revision(&questions, &submission.answers),
            "submission": submission,
        }))
        .into_response(),
        Ok(None) => Json(serde_json::json!({ "submitted": false })).into_response(),
        Err(e) => storage_error(e, "Failed to load submission"),
    }
}

pub async fn api_submit(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
    Json(body): Json<SubmitRequest>,
) -> Response {
    let questions = match load_questions(&state, quiz_id).await {
        Ok(questions) => questions,
        Err(response) => return response,
    };

    let submission = NewSubmission {
        quiz_id,
        name: body.name.trim().to_string(),
        admission_number: body.admission_number.trim().to_string(),
        answers: body.answers,
    };
    if let Err(e) = submission.validate(questions.len()) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }
    if let Some(problem) = answer_problem(&questions, &submission.answers) {
        return error_response(StatusCode::BAD_REQUEST, problem);
    }

    match state
        .quizzes
        .submission_exists(quiz_id, &submission.admission_number)
        .await
    {
        Ok(true) => return error_response(StatusCode::CONFLICT, "Quiz already submitted"),
        Ok(false) => {}
        Err(e) => return storage_error(e, "Failed to check submission"),
    }

    match state.quizzes.insert_submission(&submission).await {
        Ok(Some(row)) => {
            info!(%quiz_id, submission_id = %row.id, "Submission stored");
            let score = grade(&questions, &row.answers);
            (
                StatusCode::CREATED,
                Json(serde_json::json!({ "submission": row, "score": score })),
            )
                .into_response()
        }
        Ok(None) => error_response(StatusCode::CONFLICT, "Quiz already submitted"),
        Err(e) => storage_error(e, "Failed to store submission"),
    }
}

pub async fn api_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
) -> Response {
    let questions = match load_questions(&state, quiz_id).await {
        Ok(questions) => questions,
        Err(response) => return response,
    };
    match state.quizzes.submissions_for_quiz(quiz_id).await {
        Ok(submissions) => Json(leaderboard(&questions, &submissions)).into_response(),
        Err(e) => storage_error(e, "Failed to load submissions"),
    }
}

/// Every answer must name a question of this quiz and a valid choice.
fn answer_problem(questions: &[Question], answers: &Answers) -> Option<String> {
    answers.iter().find_map(|(id, choice)| {
        match questions.iter().find(|q| q.id == *id) {
            None => Some(format!("Unknown question {id}")),
            Some(q) if *choice >= q.choices.len() => {
                Some(format!("Choice {choice} is out of range for question {id}"))
            }
            Some(_) => None,
        }
    })
}
