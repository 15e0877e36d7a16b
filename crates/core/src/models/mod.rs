//! Data models for Quizduel

mod question;
mod question_set;

pub use question::*;
pub use question_set::*;
