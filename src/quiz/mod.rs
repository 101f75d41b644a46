// src/quiz/mod.rs

pub mod evaluator;
pub mod feedback;
pub mod flow;
pub mod session;
pub mod timer;

pub use evaluator::evaluate;
pub use flow::{QuizBackend, QuizFlow, QuizResult};
pub use session::{LoadOutcome, Phase, QuizSession, SessionOptions, SessionSnapshot};
