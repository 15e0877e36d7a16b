//! Trivia-API document decoder
//!
//! Decodes the JSON body returned by an Open Trivia DB style endpoint
//! (`api.php?amount=10&type=multiple`). Fetching the body is left to the
//! caller.

use serde::Deserialize;
use tracing::warn;

use super::QuestionSource;
use crate::error::Result;
use crate::models::{Question, QuestionSet};

#[derive(Debug, Deserialize)]
struct TriviaResponse {
    #[serde(default)]
    results: Vec<TriviaResult>,
}

#[derive(Debug, Deserialize)]
struct TriviaResult {
    question: String,
    correct_answer: String,
    #[serde(default)]
    incorrect_answers: Vec<String>,
}

/// A trivia-API response body awaiting decoding
#[derive(Debug, Clone)]
pub struct TriviaDocument {
    body: String,
}

impl TriviaDocument {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Read a saved response body from disk
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    /// Decode every usable question; entries with the wrong answer count are skipped
    pub fn decode(&self) -> Result<Vec<Question>> {
        let response: TriviaResponse = serde_json::from_str(&self.body)?;

        let questions = response
            .results
            .into_iter()
            .filter_map(|r| {
                let correct = unescape_html(&r.correct_answer);
                let options = std::iter::once(correct.clone())
                    .chain(r.incorrect_answers.iter().map(|a| unescape_html(a)));
                match Question::new(unescape_html(&r.question), options, correct) {
                    Ok(q) => Some(q),
                    Err(e) => {
                        warn!(error = %e, "Skipping trivia entry");
                        None
                    }
                }
            })
            .collect();

        Ok(questions)
    }
}

impl QuestionSource for TriviaDocument {
    fn load(&self) -> Result<QuestionSet> {
        QuestionSet::new(self.decode()?)
    }
}

/// Decode the HTML entities the trivia service emits, named or numeric
fn unescape_html(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}
