use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use radar_common::{Answers, Question, Submission};

/// Percentage of questions answered correctly, rounded. 0 for an empty quiz.
pub fn grade(questions: &[Question], answers: &Answers) -> u32 {
    if questions.is_empty() {
        return 0;
    }
    let correct = questions
        .iter()
        .filter(|q| answers.get(&q.id) == Some(&q.correct_choice))
        .count();
    (correct as f64 / questions.len() as f64 * 100.0).round() as u32
}

/// One row of the post-submission review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionItem {
    pub question_id: Uuid,
    pub question_text: String,
    pub choices: Vec<String>,
    pub chosen: Option<usize>,
    pub correct_choice: usize,
    pub is_correct: bool,
}

pub fn revision(questions: &[Question], answers: &Answers) -> Vec<RevisionItem> {
    questions
        .iter()
        .map(|q| {
            let chosen = answers.get(&q.id).copied();
            RevisionItem {
                question_id: q.id,
                question_text: q.question_text.clone(),
                choices: q.choices.clone(),
                chosen,
                correct_choice: q.correct_choice,
                is_correct: chosen == Some(q.correct_choice),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub admission_number: String,
    pub score: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Highest score first; earlier submissions win ties.
pub fn leaderboard(questions: &[Question], submissions: &[Submission]) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = submissions
        .iter()
        .map(|s| LeaderboardEntry {
            name: s.name.clone(),
            admission_number: s.admission_number.clone(),
            score: grade(questions, &s.answers),
            submitted_at: s.submitted_at,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.submitted_at.cmp(&b.submitted_at))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn quiz(correct: &[usize]) -> Vec<Question> {
        correct
            .iter()
            .enumerate()
            .map(|(i, c)| Question {
                id: Uuid::from_u128(i as u128 + 1),
                quiz_id: Uuid::nil(),
                question_text: format!("Q{i}"),
                choices: vec!["a".into(), "b".into(), "c".into()],
                correct_choice: *c,
            })
            .collect()
    }

    fn answers(choices: &[usize]) -> Answers {
        choices
            .iter()
            .enumerate()
            .map(|(i, c)| (Uuid::from_u128(i as u128 + 1), *c))
            .collect()
    }

    fn submission(name: &str, choices: &[usize], minutes: i64) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            quiz_id: Uuid::nil(),
            name: name.into(),
            admission_number: format!("adm-{name}"),
            answers: answers(choices),
            submitted_at: Utc::now() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn grade_rounds_the_percentage() {
        let qs = quiz(&[0, 1, 2]);
        assert_eq!(grade(&qs, &answers(&[0, 1, 2])), 100);
        assert_eq!(grade(&qs, &answers(&[0, 0, 0])), 33);
        assert_eq!(grade(&qs, &answers(&[0, 1, 0])), 67);
        assert_eq!(grade(&qs, &Answers::new()), 0);
        assert_eq!(grade(&[], &Answers::new()), 0);
    }

    #[test]
    fn revision_marks_each_question() {
        let qs = quiz(&[0, 1]);
        let items = revision(&qs, &answers(&[0, 2]));

        assert!(items[0].is_correct);
        assert!(!items[1].is_correct);
        assert_eq!(items[1].chosen, Some(2));
        assert_eq!(items[1].correct_choice, 1);
    }

    #[test]
    fn leaderboard_orders_by_score_then_time() {
        let qs = quiz(&[0, 0]);
        let board = leaderboard(
            &qs,
            &[
                submission("late-perfect", &[0, 0], 10),
                submission("half", &[0, 1], 0),
                submission("early-perfect", &[0, 0], 5),
            ],
        );

        let names: Vec<_> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["early-perfect", "late-perfect", "half"]);
        assert_eq!(board[2].score, 50);
    }
}
