//! Question sources
//!
//! Collaborators that produce a [`QuestionSet`] for a match: the local
//! file-backed question bank and the trivia-API document decoder.

mod bank;
mod trivia;

pub use bank::{BankCategory, QuestionBank};
pub use trivia::TriviaDocument;

use crate::error::Result;
use crate::models::QuestionSet;

/// Anything that can supply the questions for one match
pub trait QuestionSource {
    /// Produce a non-empty question set
    fn load(&self) -> Result<QuestionSet>;
}
