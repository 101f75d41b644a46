// src/models/answer.rs

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single choice or a set of choices.
///
/// Serialized untagged, so the wire format is either `"B"` or `["B", "C"]`.
/// The set is ordered, which makes two selections compare equal regardless
/// of the order the options were clicked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    Multiple(BTreeSet<String>),
}

impl AnswerValue {
    pub fn single(value: impl Into<String>) -> Self {
        AnswerValue::Single(value.into())
    }

    pub fn multiple<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnswerValue::Multiple(values.into_iter().map(Into::into).collect())
    }

    /// Every option named by this value.
    pub fn values(&self) -> Vec<&str> {
        match self {
            AnswerValue::Single(v) => vec![v.as_str()],
            AnswerValue::Multiple(set) => set.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Single(v) => v.is_empty(),
            AnswerValue::Multiple(set) => set.is_empty(),
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.values().join(", "))
    }
}

/// The user's latest answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: i64,
    #[serde(rename = "selectedOption")]
    pub selected: AnswerValue,
    /// Derived from the reference answer when the answer was recorded.
    pub is_correct: bool,
    #[serde(rename = "timeTakenSeconds")]
    pub elapsed_seconds: u64,
}
