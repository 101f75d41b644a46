// src/quiz/flow.rs

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        attempt::{SubmitAttemptRequest, SubmitAttemptResponse},
        question::Question,
    },
    quiz::{
        feedback::{Feedback, Score},
        session::{LoadOutcome, LoadedQuiz, Phase, QuizSession, SessionOptions},
    },
};

/// The backend calls a quiz run needs.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Registers a new attempt and returns its identifier.
    async fn start_attempt(&self, quiz_id: i64) -> Result<i64, AppError>;

    async fn fetch_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError>;

    async fn submit_attempt(
        &self,
        submission: &SubmitAttemptRequest,
    ) -> Result<SubmitAttemptResponse, AppError>;
}

/// Result shown after a successful submission.
#[derive(Debug, Clone)]
pub struct QuizResult {
    /// Local tally, with the backend's verdicts for withheld references.
    pub score: Score,
    /// Points awarded by the backend.
    pub points_earned: i64,
    pub message: String,
    pub feedback: Feedback,
}

/// Drives a `QuizSession` against a backend.
///
/// The session lock is never held across an await, so the front-end can
/// read snapshots (or reset) while a fetch is in flight.
pub struct QuizFlow<B> {
    backend: Arc<B>,
    session: Arc<Mutex<QuizSession>>,
}

impl<B> Clone for QuizFlow<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            session: self.session.clone(),
        }
    }
}

impl<B: QuizBackend> QuizFlow<B> {
    pub fn new(backend: Arc<B>, options: SessionOptions) -> Self {
        Self {
            backend,
            session: Arc::new(Mutex::new(QuizSession::new(options))),
        }
    }

    /// Locks the session for synchronous operations (answering, navigation,
    /// snapshots).
    pub fn session(&self) -> MutexGuard<'_, QuizSession> {
        self.session.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Selects a quiz: starts an attempt, fetches its questions and hands
    /// them to the session, unless the session moved on meanwhile.
    ///
    /// Backend failures end up in the session as an error message
    /// (`LoadOutcome::Failed`); only a call in the wrong phase is an `Err`.
    pub async fn select_quiz(&self, quiz_id: i64) -> Result<LoadOutcome, AppError> {
        let ticket = self.session().select_quiz(quiz_id)?;

        let loaded = self.load(quiz_id).await;

        Ok(self.session().complete_load(ticket, loaded))
    }

    async fn load(&self, quiz_id: i64) -> Result<LoadedQuiz, AppError> {
        let attempt_id = self.backend.start_attempt(quiz_id).await?;
        tracing::debug!("Started attempt {} for quiz {}", attempt_id, quiz_id);
        let questions = self.backend.fetch_questions(quiz_id).await?;
        Ok(LoadedQuiz {
            attempt_id: Some(attempt_id),
            questions,
        })
    }

    /// Finalizes (if still in progress) and submits the attempt.
    ///
    /// A failed submission leaves the session completed, so calling this
    /// again re-sends the same answers.
    pub async fn submit(&self) -> Result<QuizResult, AppError> {
        let (submission, score, feedback) = {
            let mut session = self.session();
            if session.phase() == Phase::InProgress {
                session.finalize()?;
            }
            let submission = session.submission()?;
            let feedback = session.feedback()?;
            (submission, feedback.score, feedback)
        };

        let resp = self.backend.submit_attempt(&submission).await?;
        tracing::info!(
            "Attempt {} submitted, {} points earned",
            submission.attempt_id,
            resp.points_earned
        );

        let (score, feedback) = {
            let mut session = self.session();
            match session.apply_verdicts(submission.attempt_id, &resp.correctness) {
                Some(score) => (score, session.feedback()?),
                None => (score, feedback),
            }
        };

        Ok(QuizResult {
            score,
            points_earned: resp.points_earned,
            message: resp.message,
            feedback,
        })
    }

    /// Back to `Idle`; an in-flight load is discarded when it lands.
    pub fn reset(&self) {
        self.session().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::AnswerValue;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct FakeBackend {
        questions: Vec<Question>,
        fail_fetch: bool,
        submissions: Mutex<Vec<SubmitAttemptRequest>>,
        fetch_gate: Option<Arc<Notify>>,
        attempts: AtomicUsize,
        verdicts: HashMap<i64, bool>,
    }

    impl FakeBackend {
        fn new(questions: Vec<Question>) -> Self {
            Self {
                questions,
                fail_fetch: false,
                submissions: Mutex::new(Vec::new()),
                fetch_gate: None,
                attempts: AtomicUsize::new(0),
                verdicts: HashMap::new(),
            }
        }
    }

    #[async_trait]
    impl QuizBackend for FakeBackend {
        async fn start_attempt(&self, _quiz_id: i64) -> Result<i64, AppError> {
            Ok(100 + self.attempts.fetch_add(1, Ordering::SeqCst) as i64)
        }

        async fn fetch_questions(&self, _quiz_id: i64) -> Result<Vec<Question>, AppError> {
            if let Some(gate) = &self.fetch_gate {
                gate.notified().await;
            }
            if self.fail_fetch {
                return Err(AppError::NetworkError("connection refused".into()));
            }
            Ok(self.questions.clone())
        }

        async fn submit_attempt(
            &self,
            submission: &SubmitAttemptRequest,
        ) -> Result<SubmitAttemptResponse, AppError> {
            self.submissions.lock().unwrap().push(submission.clone());
            Ok(SubmitAttemptResponse {
                message: "Quiz submitted".into(),
                points_earned: 10,
                correctness: self.verdicts.clone(),
            })
        }
    }

    fn questions() -> Vec<Question> {
        vec![
            Question {
                id: 1,
                subject: "Math".into(),
                prompt: "1 + 1?".into(),
                options: vec!["1".into(), "2".into()],
                answer: Some(AnswerValue::single("2")),
                question_type: None,
            },
            Question {
                id: 2,
                subject: "Math".into(),
                prompt: "Even numbers?".into(),
                options: vec!["2".into(), "3".into(), "4".into()],
                answer: Some(AnswerValue::multiple(["2", "4"])),
                question_type: None,
            },
        ]
    }

    #[tokio::test]
    async fn full_run_submits_answers_in_question_order() {
        let backend = Arc::new(FakeBackend::new(questions()));
        let flow = QuizFlow::new(backend.clone(), SessionOptions::default());

        assert_eq!(flow.select_quiz(9).await.unwrap(), LoadOutcome::Ready);
        {
            let mut session = flow.session();
            session.record_answer(2, AnswerValue::multiple(["4", "2"]), 6).unwrap();
            session.record_answer(1, AnswerValue::single("1"), 4).unwrap();
        }

        let result = flow.submit().await.unwrap();
        assert_eq!(result.score, Score { correct: 1, total: 2 });
        assert_eq!(result.points_earned, 10);

        let sent = backend.submissions.lock().unwrap();
        assert_eq!(sent[0].quiz_id, 9);
        assert_eq!(sent[0].attempt_id, 100);
        assert_eq!(sent[0].total_time_taken, 10);
        assert_eq!(sent[0].questions[0].question_id, 1);
        assert!(!sent[0].retry);
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_as_idle_error() {
        let mut backend = FakeBackend::new(questions());
        backend.fail_fetch = true;
        let flow = QuizFlow::new(Arc::new(backend), SessionOptions::default());

        let outcome = flow.select_quiz(1).await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        let snap = flow.session().snapshot();
        assert_eq!(snap.phase, Phase::Idle);
        assert!(snap.error.is_some());
    }

    #[tokio::test]
    async fn reset_during_fetch_discards_the_response() {
        let gate = Arc::new(Notify::new());
        let mut backend = FakeBackend::new(questions());
        backend.fetch_gate = Some(gate.clone());
        let flow = QuizFlow::new(Arc::new(backend), SessionOptions::default());

        let pending = tokio::spawn({
            let flow = flow.clone();
            async move { flow.select_quiz(1).await }
        });

        while flow.session().phase() != Phase::Loading {
            tokio::task::yield_now().await;
        }
        flow.reset();
        gate.notify_one();

        assert_eq!(pending.await.unwrap().unwrap(), LoadOutcome::Stale);
        assert_eq!(flow.session().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn retaking_the_same_quiz_marks_retry() {
        let backend = Arc::new(FakeBackend::new(questions()));
        let flow = QuizFlow::new(backend.clone(), SessionOptions::default());

        flow.select_quiz(3).await.unwrap();
        flow.submit().await.unwrap();
        flow.select_quiz(3).await.unwrap();
        flow.submit().await.unwrap();

        let sent = backend.submissions.lock().unwrap();
        assert!(!sent[0].retry);
        assert!(sent[1].retry);
        assert_eq!(sent[1].attempt_id, 101);
        assert!(sent[1].questions.is_empty());
    }

    #[tokio::test]
    async fn backend_verdicts_score_withheld_questions() {
        let mut withheld = questions();
        withheld[0].answer = None;
        let mut backend = FakeBackend::new(withheld);
        backend.verdicts = HashMap::from([(1, true), (2, true)]);
        let flow = QuizFlow::new(Arc::new(backend), SessionOptions::default());

        flow.select_quiz(4).await.unwrap();
        {
            let mut session = flow.session();
            session.record_answer(1, AnswerValue::single("2"), 3).unwrap();
            session.record_answer(2, AnswerValue::multiple(["2", "4"]), 3).unwrap();
        }

        let result = flow.submit().await.unwrap();
        assert_eq!(result.score, Score { correct: 2, total: 2 });
        assert_eq!(result.feedback.score, result.score);
        assert!(result.feedback.items[0].correct);
        assert_eq!(result.feedback.headline, "Excellent work!");
        assert_eq!(flow.session().snapshot().score, Some(result.score));
    }
}
