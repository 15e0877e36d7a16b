//! File-backed question bank
//!
//! Record format, one field per line:
//!
//! ```text
//! Category: Science
//! Question: What is H2O?
//! Options: Water|Salt|Gold|Air
//! Answer: Water
//! ```
//!
//! Lines with any other prefix are ignored.

use std::path::Path;

use tracing::{debug, warn};

use super::QuestionSource;
use crate::error::{Error, Result};
use crate::models::{Question, QuestionSet};

const CATEGORY_PREFIX: &str = "Category:";
const QUESTION_PREFIX: &str = "Question:";
const OPTIONS_PREFIX: &str = "Options:";
const ANSWER_PREFIX: &str = "Answer:";

#[derive(Debug, Clone)]
struct BankEntry {
    category: String,
    question: Question,
}

/// Questions loaded from a bank file, grouped by category
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    entries: Vec<BankEntry>,
}

impl QuestionBank {
    /// Read and parse a bank file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::QuestionBank(format!("cannot read {}: {}", path.display(), e))
        })?;
        let bank = Self::parse(&text);
        debug!(path = %path.display(), count = bank.entries.len(), "Loaded question bank");
        Ok(bank)
    }

    /// Parse bank text; invalid records are skipped with a warning
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();
        let mut category = String::new();
        let mut prompt: Option<String> = None;
        let mut options: Option<Vec<String>> = None;

        for (line_no, line) in text.lines().enumerate() {
            if let Some(rest) = line.strip_prefix(CATEGORY_PREFIX) {
                category = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix(QUESTION_PREFIX) {
                prompt = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix(OPTIONS_PREFIX) {
                options = Some(rest.trim().split('|').map(|o| o.trim().to_string()).collect());
            } else if let Some(rest) = line.strip_prefix(ANSWER_PREFIX) {
                let answer = rest.trim();
                let (Some(p), Some(o)) = (prompt.take(), options.take()) else {
                    warn!(line = line_no + 1, "Answer without question or options, skipping");
                    continue;
                };
                match Question::new(p, o, answer) {
                    Ok(question) => entries.push(BankEntry {
                        category: category.clone(),
                        question,
                    }),
                    Err(e) => warn!(line = line_no + 1, error = %e, "Skipping bank record"),
                }
            }
        }

        Self { entries }
    }

    /// Distinct category names, in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.category.as_str()) {
                seen.push(&entry.category);
            }
        }
        seen
    }

    /// Questions of one category, in file order
    pub fn questions_for(&self, category: &str) -> Result<QuestionSet> {
        let questions = self
            .entries
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.question.clone())
            .collect();
        QuestionSet::new(questions)
    }

    /// A question source bound to one category
    pub fn category<'a>(&'a self, name: &'a str) -> BankCategory<'a> {
        BankCategory { bank: self, name }
    }
}

/// One category of a [`QuestionBank`]
#[derive(Debug, Clone, Copy)]
pub struct BankCategory<'a> {
    bank: &'a QuestionBank,
    name: &'a str,
}

impl QuestionSource for BankCategory<'_> {
    fn load(&self) -> Result<QuestionSet> {
        self.bank.questions_for(self.name)
    }
}
