//! Quizduel Core Library
//!
//! Question model, question sources, the per-question session clock and the
//! match state machine shared by solo and networked play.

pub mod clock;
pub mod error;
pub mod events;
pub mod game;
pub mod invariants;
pub mod models;
pub mod source;

pub use clock::{ClockEvent, Countdown, SessionClock, QUESTION_SECONDS};
pub use error::{Error, Result};
pub use events::{MatchEvent, PresentationSink};
pub use game::{AnswerOutcome, MatchMachine, MatchMode, MatchPhase, MatchState};
pub use models::*;
pub use source::{BankCategory, QuestionBank, QuestionSource, TriviaDocument};
