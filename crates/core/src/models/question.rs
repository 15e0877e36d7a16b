//! Question model - a single multiple-choice prompt

use crate::error::{Error, Result};

/// Number of options every question carries
pub const OPTION_COUNT: usize = 4;

/// Characters the transfer line format reserves
const RESERVED: &[char] = &['|', ',', '\n', '\r'];

/// An immutable multiple-choice question.
///
/// Option order carries no meaning; the answer is checked by string equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    options: [String; OPTION_COUNT],
    correct_answer: String,
}

impl Question {
    /// Build a question, checking the option count and that the answer is one of the options
    pub fn new(
        prompt: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_answer: impl Into<String>,
    ) -> Result<Self> {
        let prompt = prompt.into();
        let correct_answer = correct_answer.into();
        let options: Vec<String> = options.into_iter().map(Into::into).collect();

        let options: [String; OPTION_COUNT] = options.try_into().map_err(|v: Vec<String>| {
            Error::InvalidQuestion(format!(
                "expected {} options, got {}",
                OPTION_COUNT,
                v.len()
            ))
        })?;

        if !options.contains(&correct_answer) {
            return Err(Error::InvalidQuestion(format!(
                "answer '{}' is not one of the options",
                correct_answer
            )));
        }

        Ok(Self {
            prompt,
            options,
            correct_answer,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Check a submitted answer; `None` (no answer) is never correct
    pub fn is_correct(&self, answer: Option<&str>) -> bool {
        answer == Some(self.correct_answer.as_str())
    }

    /// True if no field contains a character reserved by the transfer line format
    pub fn is_wire_safe(&self) -> bool {
        std::iter::once(&self.prompt)
            .chain(self.options.iter())
            .chain(std::iter::once(&self.correct_answer))
            .all(|field| !field.contains(RESERVED))
    }

    /// Same option strings, regardless of order
    pub fn same_options(&self, other: &Question) -> bool {
        let mut mine: Vec<&str> = self.options.iter().map(String::as_str).collect();
        let mut theirs: Vec<&str> = other.options.iter().map(String::as_str).collect();
        mine.sort_unstable();
        theirs.sort_unstable();
        mine == theirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Question {
        Question::new("2 + 2?", ["2", "3", "4", "5"], "4").unwrap()
    }

    #[test]
    fn test_answer_must_be_an_option() {
        let result = Question::new("2 + 2?", ["2", "3", "5", "6"], "4");
        assert!(matches!(result, Err(Error::InvalidQuestion(_))));
    }

    #[test]
    fn test_option_count_enforced() {
        assert!(Question::new("2 + 2?", ["4", "5", "6"], "4").is_err());
        assert!(Question::new("2 + 2?", ["1", "2", "3", "4", "5"], "4").is_err());
    }

    #[test]
    fn test_is_correct() {
        let q = sample();
        assert!(q.is_correct(Some("4")));
        assert!(!q.is_correct(Some("5")));
        assert!(!q.is_correct(Some(" 4")));
        assert!(!q.is_correct(None));
    }

    #[test]
    fn test_wire_safety() {
        assert!(sample().is_wire_safe());

        let piped = Question::new("a|b?", ["1", "2", "3", "4"], "1").unwrap();
        assert!(!piped.is_wire_safe());

        let comma = Question::new("pick", ["1,000", "2", "3", "4"], "2").unwrap();
        assert!(!comma.is_wire_safe());
    }

    #[test]
    fn test_same_options_ignores_order() {
        let a = sample();
        let b = Question::new("2 + 2?", ["5", "4", "3", "2"], "4").unwrap();
        let c = Question::new("2 + 2?", ["5", "4", "3", "1"], "4").unwrap();
        assert!(a.same_options(&b));
        assert!(!a.same_options(&c));
    }
}
