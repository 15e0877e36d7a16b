//! Wire grammar
//!
//! | Phase     | Direction    | Line                                  |
//! |-----------|--------------|---------------------------------------|
//! | Handshake | both         | `<displayName>`                       |
//! | Transfer  | host → guest | `QUESTIONS_START`                     |
//! | Transfer  | host → guest | `<prompt>\|<o1>,<o2>,<o3>,<o4>\|<answer>` |
//! | Transfer  | host → guest | `QUESTIONS_END`                       |
//! | Result    | both         | `GAME_OVER\|<score>`                  |
//!
//! Fields are not escaped: a question whose text contains `|` or `,` cannot
//! be carried, and [`encode_question`] refuses it.

use quizduel_core::Question;

use crate::error::{Error, Result};

pub const QUESTIONS_START: &str = "QUESTIONS_START";
pub const QUESTIONS_END: &str = "QUESTIONS_END";
pub const GAME_OVER: &str = "GAME_OVER";

const FIELD_SEP: char = '|';
const OPTION_SEP: &str = ",";

/// A single protocol line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    Name(String),
    QuestionsStart,
    Question(Question),
    QuestionsEnd,
    GameOver(u32),
}

impl WireMessage {
    /// Render the line, without terminator
    pub fn encode(&self) -> Result<String> {
        match self {
            WireMessage::Name(name) => {
                if name.contains(['\n', '\r']) {
                    return Err(Error::MalformedLine("name contains a line break".into()));
                }
                Ok(name.clone())
            }
            WireMessage::QuestionsStart => Ok(QUESTIONS_START.to_string()),
            WireMessage::Question(q) => encode_question(q),
            WireMessage::QuestionsEnd => Ok(QUESTIONS_END.to_string()),
            WireMessage::GameOver(score) => Ok(format!("{}{}{}", GAME_OVER, FIELD_SEP, score)),
        }
    }

    /// Interpret a line received during question transfer
    pub fn decode_transfer(line: &str) -> Result<Self> {
        match line {
            QUESTIONS_START => Ok(WireMessage::QuestionsStart),
            QUESTIONS_END => Ok(WireMessage::QuestionsEnd),
            body => decode_question(body).map(WireMessage::Question),
        }
    }

    /// Interpret a line received during result exchange
    pub fn decode_result(line: &str) -> Result<Self> {
        let (tag, score) = line
            .split_once(FIELD_SEP)
            .ok_or_else(|| Error::MalformedLine(format!("expected result, got '{}'", line)))?;

        if tag != GAME_OVER {
            return Err(Error::MalformedLine(format!("expected result, got '{}'", line)));
        }

        score
            .trim()
            .parse::<u32>()
            .map(WireMessage::GameOver)
            .map_err(|_| Error::MalformedLine(format!("bad score '{}'", score)))
    }
}

/// `prompt|o1,o2,o3,o4|answer`
pub fn encode_question(question: &Question) -> Result<String> {
    if !question.is_wire_safe() {
        return Err(Error::MalformedLine(format!(
            "question '{}' contains a reserved character",
            question.prompt()
        )));
    }

    Ok(format!(
        "{}{sep}{}{sep}{}",
        question.prompt(),
        question.options().join(OPTION_SEP),
        question.correct_answer(),
        sep = FIELD_SEP
    ))
}

/// Parse a transfer body line.
///
/// Fields past the third are ignored. Fewer than three fields, an option
/// count other than four, or an answer missing from the options is malformed.
pub fn decode_question(line: &str) -> Result<Question> {
    let mut fields = line.split(FIELD_SEP);
    let (Some(prompt), Some(options), Some(answer)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(Error::MalformedLine(format!(
            "expected 3 fields in '{}'",
            line
        )));
    };

    Question::new(prompt, options.split(OPTION_SEP), answer)
        .map_err(|e| Error::MalformedLine(format!("{} in '{}'", e, line)))
}
