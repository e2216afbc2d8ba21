use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuizError {
    #[error("This attempt has already been submitted")]
    AlreadySubmitted,

    #[error("The attempt has not started")]
    NotStarted,

    #[error("The attempt is already in progress")]
    AlreadyStarted,

    #[error("Student name is required")]
    MissingName,

    #[error("Admission number is required")]
    MissingAdmissionNumber,

    #[error("The quiz has no questions")]
    NoQuestions,

    #[error("Unknown question {0}")]
    UnknownQuestion(Uuid),

    #[error("Question {0} is not the current question")]
    NotCurrentQuestion(Uuid),

    #[error("Question {0} is already answered")]
    AnswerLocked(Uuid),

    #[error("Choice {choice} is out of range ({choices} choices)")]
    ChoiceOutOfRange { choice: usize, choices: usize },

    #[error("Answer the current question before moving on")]
    Unanswered,

    #[error("Already on the last question")]
    LastQuestion,

    #[error("{answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },

    #[error("Quiz not found")]
    QuizNotFound,

    /// Remote storage failed; the action can be retried.
    #[error("Storage error: {0}")]
    Store(String),
}
