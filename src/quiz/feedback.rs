// src/quiz/feedback.rs

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::models::{answer::UserAnswer, question::Question};

/// Final tally of a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub correct: usize,
    /// Every question of the quiz, answered or not.
    pub total: usize,
}

impl Score {
    /// Counts correct answers against the full question list.
    pub fn tally(questions: &[Question], answers: &HashMap<i64, UserAnswer>) -> Self {
        let correct = questions
            .iter()
            .filter(|q| answers.get(&q.id).is_some_and(|a| a.is_correct))
            .count();
        Self {
            correct,
            total: questions.len(),
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }

    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.correct == self.total
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({:.2}%)", self.correct, self.total, self.percentage())
    }
}

/// One row of the result screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackItem {
    pub question_id: i64,
    pub prompt: String,
    pub answered: bool,
    pub correct: bool,
    pub user_answer: Option<String>,
    /// `None` when the backend withheld the reference answer.
    pub correct_answer: Option<String>,
}

/// Per-question result summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub headline: String,
    pub score: Score,
    pub items: Vec<FeedbackItem>,
}

impl Feedback {
    pub fn build(questions: &[Question], answers: &HashMap<i64, UserAnswer>, score: Score) -> Self {
        let headline = if score.is_perfect() {
            "Excellent work!"
        } else {
            "Keep practicing to improve your score!"
        };

        let items = questions
            .iter()
            .map(|q| {
                let answer = answers.get(&q.id);
                FeedbackItem {
                    question_id: q.id,
                    prompt: q.prompt.clone(),
                    answered: answer.is_some(),
                    correct: answer.is_some_and(|a| a.is_correct),
                    user_answer: answer.map(|a| a.selected.to_string()),
                    correct_answer: q.answer.as_ref().map(ToString::to_string),
                }
            })
            .collect();

        Self {
            headline: headline.to_string(),
            score,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::AnswerValue;

    fn q(id: i64, answer: &str) -> Question {
        Question {
            id,
            subject: String::new(),
            prompt: format!("Question {}", id),
            options: vec!["A".into(), "B".into()],
            answer: Some(AnswerValue::single(answer)),
            question_type: None,
        }
    }

    fn a(id: i64, selected: &str, is_correct: bool) -> (i64, UserAnswer) {
        (
            id,
            UserAnswer {
                question_id: id,
                selected: AnswerValue::single(selected),
                is_correct,
                elapsed_seconds: 1,
            },
        )
    }

    #[test]
    fn unanswered_questions_stay_in_the_denominator() {
        let questions = vec![q(1, "A"), q(2, "A"), q(3, "B")];
        let answers = HashMap::from([a(1, "A", true)]);
        let score = Score::tally(&questions, &answers);
        assert_eq!(score, Score { correct: 1, total: 3 });
        assert_eq!(score.to_string(), "1/3 (33.33%)");
    }

    #[test]
    fn feedback_rows_follow_question_order() {
        let questions = vec![q(1, "A"), q(2, "B")];
        let answers = HashMap::from([a(2, "A", false)]);
        let score = Score::tally(&questions, &answers);
        let feedback = Feedback::build(&questions, &answers, score);

        assert_eq!(feedback.headline, "Keep practicing to improve your score!");
        assert_eq!(feedback.items[0].question_id, 1);
        assert!(!feedback.items[0].answered);
        assert_eq!(feedback.items[1].user_answer.as_deref(), Some("A"));
        assert_eq!(feedback.items[1].correct_answer.as_deref(), Some("B"));
    }

    #[test]
    fn perfect_score_headline() {
        let questions = vec![q(1, "A")];
        let answers = HashMap::from([a(1, "A", true)]);
        let feedback = Feedback::build(&questions, &answers, Score::tally(&questions, &answers));
        assert_eq!(feedback.headline, "Excellent work!");
    }
}
