// src/quiz/session.rs

use std::collections::{HashMap, HashSet};
use std::mem;

use serde::Serialize;
use tokio::sync::watch;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        answer::{AnswerValue, UserAnswer},
        attempt::{SubmitAttemptRequest, SubmittedAnswer},
        question::Question,
    },
    quiz::{
        evaluator::evaluate,
        feedback::{Feedback, Score},
        timer::{Countdown, TickTimer},
    },
};

/// Coarse phase, as seen by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Loading,
    InProgress,
    Completed,
}

/// Identifies one `select_quiz` call. A fetch result is applied only while
/// its ticket is still the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub quiz_id: i64,
    generation: u64,
}

/// What the backend returned for a selected quiz.
#[derive(Debug, Clone)]
pub struct LoadedQuiz {
    pub attempt_id: Option<i64>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Questions loaded, session is in progress.
    Ready,
    /// Load failed, session is idle with this error message.
    Failed(String),
    /// The session moved on while the fetch was in flight; nothing changed.
    Stale,
}

/// Timer settings. Timers run as tokio tasks; outside a runtime they are
/// skipped and the session behaves as if both were off.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Run the per-question elapsed counter.
    pub track_time: bool,
    /// Whole-quiz countdown in seconds.
    pub time_limit: Option<u64>,
}

#[derive(Debug)]
struct ActiveQuiz {
    quiz_id: i64,
    attempt_id: Option<i64>,
    retry: bool,
    questions: Vec<Question>,
    position: usize,
    answers: HashMap<i64, UserAnswer>,
}

impl ActiveQuiz {
    fn current(&self) -> &Question {
        &self.questions[self.position]
    }
}

#[derive(Debug)]
enum State {
    Idle { error: Option<String> },
    Loading { ticket: LoadTicket, retry: bool },
    InProgress(ActiveQuiz),
    Completed { quiz: ActiveQuiz, score: Score },
}

impl State {
    fn phase(&self) -> Phase {
        match self {
            State::Idle { .. } => Phase::Idle,
            State::Loading { .. } => Phase::Loading,
            State::InProgress(_) => Phase::InProgress,
            State::Completed { .. } => Phase::Completed,
        }
    }
}

/// Answered/correct status of one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStatus {
    pub question_id: i64,
    pub answered: bool,
    pub correct: bool,
}

/// Read-only projection rendered by the front-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub quiz_id: Option<i64>,
    pub error: Option<String>,
    pub position: usize,
    pub total: usize,
    pub current_question: Option<Question>,
    pub current_answer: Option<UserAnswer>,
    pub statuses: Vec<QuestionStatus>,
    pub elapsed_seconds: u64,
    pub remaining_seconds: Option<u64>,
    pub time_expired: bool,
    pub score: Option<Score>,
}

/// Quiz progression state machine.
///
/// `Idle -> Loading -> InProgress -> Completed`, with `reset` returning to
/// `Idle` from anywhere and `select_quiz` also allowed from `Completed`.
/// Timers belong to the session and are dropped (and thereby aborted) on
/// every transition that ends their validity.
pub struct QuizSession {
    state: State,
    generation: u64,
    options: SessionOptions,
    question_clock: Option<TickTimer>,
    countdown: Option<Countdown>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl QuizSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            state: State::Idle { error: None },
            generation: 0,
            options,
            question_clock: None,
            countdown: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    fn violation(&self, operation: &str) -> AppError {
        let msg = format!("{} is not allowed while {:?}", operation, self.phase());
        tracing::error!("{}", msg);
        AppError::StateViolation(msg)
    }

    fn stop_timers(&mut self) {
        self.question_clock = None;
        self.countdown = None;
    }

    fn restart_question_clock(&mut self) {
        self.question_clock = self.options.track_time.then(TickTimer::count_up).flatten();
    }

    /// Starts loading a quiz. Valid from `Idle` and `Completed`.
    ///
    /// The caller fetches the questions and hands them to `complete_load`
    /// together with the returned ticket.
    pub fn select_quiz(&mut self, quiz_id: i64) -> Result<LoadTicket, AppError> {
        let retry = match &self.state {
            State::Idle { .. } => false,
            State::Completed { quiz, .. } => quiz.quiz_id == quiz_id,
            _ => return Err(self.violation("select_quiz")),
        };

        self.stop_timers();
        self.generation += 1;
        let ticket = LoadTicket {
            quiz_id,
            generation: self.generation,
        };
        self.state = State::Loading { ticket, retry };
        tracing::info!("Loading quiz {}", quiz_id);
        Ok(ticket)
    }

    /// Applies the result of the fetch started by `select_quiz`.
    ///
    /// Results for a ticket that is no longer current are dropped.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        outcome: Result<LoadedQuiz, AppError>,
    ) -> LoadOutcome {
        let retry = match &self.state {
            State::Loading { ticket: current, retry } if *current == ticket => *retry,
            _ => {
                tracing::debug!("Discarding stale response for quiz {}", ticket.quiz_id);
                return LoadOutcome::Stale;
            }
        };

        let loaded = outcome.and_then(|loaded| {
            check_questions(&loaded.questions)?;
            Ok(loaded)
        });

        match loaded {
            Ok(loaded) => {
                tracing::info!(
                    "Quiz {} ready with {} questions",
                    ticket.quiz_id,
                    loaded.questions.len()
                );
                self.state = State::InProgress(ActiveQuiz {
                    quiz_id: ticket.quiz_id,
                    attempt_id: loaded.attempt_id,
                    retry,
                    questions: loaded.questions,
                    position: 0,
                    answers: HashMap::new(),
                });
                self.restart_question_clock();
                self.countdown = self.options.time_limit.and_then(Countdown::start);
                LoadOutcome::Ready
            }
            Err(e) => {
                tracing::warn!("Failed to load quiz {}: {}", ticket.quiz_id, e);
                let message = e.user_message();
                self.state = State::Idle {
                    error: Some(message.clone()),
                };
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Records (or replaces) the answer to one question. Does not move.
    pub fn record_answer(
        &mut self,
        question_id: i64,
        selected: AnswerValue,
        elapsed_seconds: u64,
    ) -> Result<UserAnswer, AppError> {
        let State::InProgress(quiz) = &mut self.state else {
            return Err(self.violation("record_answer"));
        };

        let question = quiz
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| {
                AppError::ValidationError(format!("Question {} is not part of this quiz", question_id))
            })?;

        if selected.is_empty() {
            return Err(AppError::ValidationError("Select at least one option".to_string()));
        }
        if let Some(unknown) = selected.values().into_iter().find(|v| !question.has_option(v)) {
            return Err(AppError::ValidationError(format!("'{}' is not an option", unknown)));
        }

        let is_correct = question
            .answer
            .as_ref()
            .is_some_and(|reference| evaluate(&selected, reference));

        let answer = UserAnswer {
            question_id,
            selected,
            is_correct,
            elapsed_seconds,
        };
        quiz.answers.insert(question_id, answer.clone());
        tracing::debug!("Recorded answer for question {} (correct: {})", question_id, is_correct);
        Ok(answer)
    }

    /// Records an answer for the current question using the running clock.
    pub fn answer_current(&mut self, selected: AnswerValue) -> Result<UserAnswer, AppError> {
        let elapsed = self.elapsed_seconds();
        let question_id = match &self.state {
            State::InProgress(quiz) => quiz.current().id,
            _ => return Err(self.violation("answer_current")),
        };
        self.record_answer(question_id, selected, elapsed)
    }

    /// Moves to `index`. Out-of-range indices are rejected.
    pub fn go_to(&mut self, index: usize) -> Result<(), AppError> {
        let State::InProgress(quiz) = &mut self.state else {
            return Err(self.violation("go_to"));
        };
        if index >= quiz.questions.len() {
            return Err(AppError::ValidationError(format!(
                "Question {} is out of range (1..={})",
                index + 1,
                quiz.questions.len()
            )));
        }
        if quiz.position != index {
            quiz.position = index;
            self.restart_question_clock();
        }
        Ok(())
    }

    /// Advances one question. Returns `false` on the last question.
    pub fn next(&mut self) -> Result<bool, AppError> {
        let State::InProgress(quiz) = &self.state else {
            return Err(self.violation("next"));
        };
        let target = quiz.position + 1;
        if target >= quiz.questions.len() {
            return Ok(false);
        }
        self.go_to(target)?;
        Ok(true)
    }

    /// Steps back one question. Returns `false` on the first question.
    pub fn previous(&mut self) -> Result<bool, AppError> {
        let State::InProgress(quiz) = &self.state else {
            return Err(self.violation("previous"));
        };
        let Some(target) = quiz.position.checked_sub(1) else {
            return Ok(false);
        };
        self.go_to(target)?;
        Ok(true)
    }

    /// Jumps to the question with the given id.
    pub fn go_to_question(&mut self, question_id: i64) -> Result<(), AppError> {
        let State::InProgress(quiz) = &self.state else {
            return Err(self.violation("go_to_question"));
        };
        let index = quiz
            .questions
            .iter()
            .position(|q| q.id == question_id)
            .ok_or_else(|| {
                AppError::ValidationError(format!("Question {} is not part of this quiz", question_id))
            })?;
        self.go_to(index)
    }

    /// Ends the quiz and freezes the answers.
    pub fn finalize(&mut self) -> Result<Score, AppError> {
        if !matches!(self.state, State::InProgress(_)) {
            return Err(self.violation("finalize"));
        }
        let State::InProgress(quiz) = mem::replace(&mut self.state, State::Idle { error: None })
        else {
            unreachable!("phase checked above");
        };

        self.stop_timers();
        let score = Score::tally(&quiz.questions, &quiz.answers);
        tracing::info!("Quiz {} finished: {}", quiz.quiz_id, score);
        self.state = State::Completed { quiz, score };
        Ok(score)
    }

    /// Takes the backend's per-question verdicts for questions that arrived
    /// without a reference answer and re-tallies the frozen score.
    ///
    /// Returns `None` when the session no longer holds that finished attempt.
    pub fn apply_verdicts(&mut self, attempt_id: i64, verdicts: &HashMap<i64, bool>) -> Option<Score> {
        let State::Completed { quiz, score } = &mut self.state else {
            return None;
        };
        if quiz.attempt_id != Some(attempt_id) {
            return None;
        }

        for q in quiz.questions.iter().filter(|q| q.answer.is_none()) {
            if let (Some(answer), Some(&correct)) = (quiz.answers.get_mut(&q.id), verdicts.get(&q.id)) {
                answer.is_correct = correct;
            }
        }
        *score = Score::tally(&quiz.questions, &quiz.answers);
        Some(*score)
    }

    /// Drops everything and returns to `Idle`. Any in-flight load becomes stale.
    pub fn reset(&mut self) {
        self.stop_timers();
        self.generation += 1;
        self.state = State::Idle { error: None };
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.question_clock.as_ref().map_or(0, TickTimer::value)
    }

    pub fn time_expired(&self) -> bool {
        self.countdown.as_ref().is_some_and(Countdown::is_expired)
    }

    /// Receiver that flips to `true` when the quiz countdown runs out.
    pub fn expiry(&self) -> Option<watch::Receiver<bool>> {
        self.countdown.as_ref().map(Countdown::subscribe)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot {
            phase: self.phase(),
            quiz_id: None,
            error: None,
            position: 0,
            total: 0,
            current_question: None,
            current_answer: None,
            statuses: Vec::new(),
            elapsed_seconds: self.elapsed_seconds(),
            remaining_seconds: self.countdown.as_ref().map(Countdown::remaining),
            time_expired: self.time_expired(),
            score: None,
        };

        let quiz = match &self.state {
            State::Idle { error } => {
                snapshot.error = error.clone();
                return snapshot;
            }
            State::Loading { ticket, .. } => {
                snapshot.quiz_id = Some(ticket.quiz_id);
                return snapshot;
            }
            State::InProgress(quiz) => quiz,
            State::Completed { quiz, score } => {
                snapshot.score = Some(*score);
                quiz
            }
        };

        let current = quiz.current();
        snapshot.quiz_id = Some(quiz.quiz_id);
        snapshot.position = quiz.position;
        snapshot.total = quiz.questions.len();
        snapshot.current_question = Some(current.clone());
        snapshot.current_answer = quiz.answers.get(&current.id).cloned();
        snapshot.statuses = quiz
            .questions
            .iter()
            .map(|q| {
                let answer = quiz.answers.get(&q.id);
                QuestionStatus {
                    question_id: q.id,
                    answered: answer.is_some(),
                    correct: answer.is_some_and(|a| a.is_correct),
                }
            })
            .collect();
        snapshot
    }

    /// Per-question result rows. Only available once the quiz is finished.
    pub fn feedback(&self) -> Result<Feedback, AppError> {
        match &self.state {
            State::Completed { quiz, score } => {
                Ok(Feedback::build(&quiz.questions, &quiz.answers, *score))
            }
            _ => Err(self.violation("feedback")),
        }
    }

    /// Builds the attempt submission for a finished quiz, in question order.
    pub fn submission(&self) -> Result<SubmitAttemptRequest, AppError> {
        let State::Completed { quiz, .. } = &self.state else {
            return Err(self.violation("submission"));
        };
        let attempt_id = quiz.attempt_id.ok_or_else(|| {
            AppError::StateViolation(format!("Quiz {} was loaded without an attempt", quiz.quiz_id))
        })?;

        let questions: Vec<SubmittedAnswer> = quiz
            .questions
            .iter()
            .filter_map(|q| quiz.answers.get(&q.id))
            .map(|a| SubmittedAnswer {
                question_id: a.question_id,
                selected_option: a.selected.clone(),
                time_taken_seconds: a.elapsed_seconds,
            })
            .collect();

        Ok(SubmitAttemptRequest {
            quiz_id: quiz.quiz_id,
            attempt_id,
            total_time_taken: questions.iter().map(|q| q.time_taken_seconds).sum(),
            retry: quiz.retry,
            questions,
        })
    }
}

fn check_questions(questions: &[Question]) -> Result<(), AppError> {
    if questions.is_empty() {
        return Err(AppError::ValidationError("This quiz has no questions".to_string()));
    }
    let mut seen = HashSet::new();
    for q in questions {
        if !seen.insert(q.id) {
            return Err(AppError::ValidationError(format!("Duplicate question id {}", q.id)));
        }
        q.validate()?;
    }
    Ok(())
}
