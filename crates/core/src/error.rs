//! Error types for Quizduel Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Question set is empty")]
    EmptyQuestionSet,

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Question bank error: {0}")]
    QuestionBank(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
