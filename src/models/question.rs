// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::answer::AnswerValue;

/// Question type as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Single,
    Multiple,
}

/// A quiz question as returned by `GET /api/quizzes/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_reference"))]
pub struct Question {
    pub id: i64,

    #[serde(default)]
    pub subject: String,

    /// The text content of the question.
    #[serde(rename = "question")]
    pub prompt: String,

    /// Options in display order.
    #[validate(custom(function = "validate_options"))]
    pub options: Vec<String>,

    /// Reference answer. The backend may withhold it and check answers
    /// itself on submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerValue>,

    /// Explicit type, when the backend sends one.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
}

impl Question {
    /// Whether the user should be offered checkboxes instead of radio buttons.
    pub fn is_multi_select(&self) -> bool {
        match (&self.question_type, &self.answer) {
            (Some(QuestionType::Multiple), _) => true,
            (Some(QuestionType::Single), _) => false,
            (None, Some(AnswerValue::Multiple(_))) => true,
            (None, _) => false,
        }
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }
}

/// Response body of `GET /api/quizzes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    pub questions: Vec<Question>,
}

fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    if options.is_empty() {
        return Err(ValidationError::new("options_cannot_be_empty"));
    }
    Ok(())
}

fn validate_reference(question: &Question) -> Result<(), ValidationError> {
    let Some(reference) = &question.answer else {
        return Ok(());
    };
    if reference.is_empty() {
        return Err(ValidationError::new("answer_cannot_be_empty"));
    }
    if reference.values().iter().any(|v| !question.has_option(v)) {
        return Err(ValidationError::new("answer_not_in_options"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: Option<AnswerValue>) -> Question {
        Question {
            id: 1,
            subject: "Geography".to_string(),
            prompt: "Pick the capitals".to_string(),
            options: vec!["Rome".into(), "Milan".into(), "Paris".into()],
            answer,
            question_type: None,
        }
    }

    #[test]
    fn reference_answer_must_be_an_option() {
        assert!(question(Some(AnswerValue::single("Rome"))).validate().is_ok());
        assert!(question(Some(AnswerValue::multiple(["Rome", "Paris"]))).validate().is_ok());
        assert!(question(Some(AnswerValue::single("Lyon"))).validate().is_err());
        assert!(question(Some(AnswerValue::multiple(["Rome", "Lyon"]))).validate().is_err());
    }

    #[test]
    fn withheld_reference_is_allowed() {
        assert!(question(None).validate().is_ok());
    }

    #[test]
    fn empty_options_are_rejected() {
        let mut q = question(None);
        q.options.clear();
        assert!(q.validate().is_err());
    }

    #[test]
    fn deserializes_backend_shape() {
        let q: Question = serde_json::from_value(serde_json::json!({
            "id": 7,
            "subject": "Math",
            "question": "2 + 2?",
            "options": ["3", "4"],
            "answer": "4"
        }))
        .unwrap();
        assert_eq!(q.prompt, "2 + 2?");
        assert_eq!(q.answer, Some(AnswerValue::single("4")));
        assert!(!q.is_multi_select());
    }

    #[test]
    fn multi_select_follows_type_then_reference() {
        assert!(question(Some(AnswerValue::multiple(["Rome"]))).is_multi_select());
        let mut q = question(None);
        q.question_type = Some(QuestionType::Multiple);
        assert!(q.is_multi_select());
    }
}
