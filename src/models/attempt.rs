// src/models/attempt.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::answer::AnswerValue;

/// DTO for `POST /api/attempts/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptRequest {
    pub quiz_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptResponse {
    pub attempt_id: i64,
}

/// One answered question inside a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub selected_option: AnswerValue,
    pub time_taken_seconds: u64,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    pub quiz_id: i64,
    /// The identifier received from `start`.
    pub attempt_id: i64,
    pub total_time_taken: u64,
    /// True when the same quiz is taken again right after finishing it.
    pub retry: bool,
    pub questions: Vec<SubmittedAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptResponse {
    #[serde(default)]
    pub message: String,
    pub points_earned: i64,
    /// Server-side verdict per question id, when the backend reports it.
    #[serde(default)]
    pub correctness: HashMap<i64, bool>,
}

/// Row of `GET /api/users/high-scores`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub high_score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_uses_camel_case_keys() {
        let req = SubmitAttemptRequest {
            quiz_id: 3,
            attempt_id: 11,
            total_time_taken: 42,
            retry: false,
            questions: vec![SubmittedAnswer {
                question_id: 1,
                selected_option: AnswerValue::multiple(["B", "C"]),
                time_taken_seconds: 12,
            }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["attemptId"], 11);
        assert_eq!(json["totalTimeTaken"], 42);
        assert_eq!(json["questions"][0]["selectedOption"], serde_json::json!(["B", "C"]));
    }

    #[test]
    fn correctness_map_is_optional() {
        let resp: SubmitAttemptResponse =
            serde_json::from_str(r#"{"message":"ok","pointsEarned":20}"#).unwrap();
        assert_eq!(resp.points_earned, 20);
        assert!(resp.correctness.is_empty());

        let resp: SubmitAttemptResponse =
            serde_json::from_str(r#"{"pointsEarned":10,"correctness":{"4":true}}"#).unwrap();
        assert_eq!(resp.correctness.get(&4), Some(&true));
    }
}
