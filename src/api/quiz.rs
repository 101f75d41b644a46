// src/api/quiz.rs

use async_trait::async_trait;
use reqwest::Method;

use crate::{
    api::client::ApiClient,
    error::AppError,
    models::{
        attempt::{
            LeaderboardEntry, StartAttemptRequest, StartAttemptResponse, SubmitAttemptRequest,
            SubmitAttemptResponse,
        },
        question::{Question, QuizResponse},
    },
    quiz::flow::QuizBackend,
};

/// Quiz and attempt endpoints. All of them are authorized calls.
impl ApiClient {
    pub async fn start_attempt(&self, quiz_id: i64) -> Result<StartAttemptResponse, AppError> {
        self.send(
            Method::POST,
            "api/attempts/start",
            Some(&StartAttemptRequest { quiz_id }),
        )
        .await
    }

    pub async fn fetch_quiz(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let resp: QuizResponse = self
            .send::<(), _>(Method::GET, &format!("api/quizzes/{}", quiz_id), None)
            .await?;
        Ok(resp.questions)
    }

    pub async fn submit_attempt(
        &self,
        submission: &SubmitAttemptRequest,
    ) -> Result<SubmitAttemptResponse, AppError> {
        self.send(Method::POST, "api/attempts/submit", Some(submission))
            .await
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        self.send::<(), _>(Method::GET, "api/users/high-scores", None)
            .await
    }
}

#[async_trait]
impl QuizBackend for ApiClient {
    async fn start_attempt(&self, quiz_id: i64) -> Result<i64, AppError> {
        Ok(ApiClient::start_attempt(self, quiz_id).await?.attempt_id)
    }

    async fn fetch_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        self.fetch_quiz(quiz_id).await
    }

    async fn submit_attempt(
        &self,
        submission: &SubmitAttemptRequest,
    ) -> Result<SubmitAttemptResponse, AppError> {
        ApiClient::submit_attempt(self, submission).await
    }
}
