//! Presentation events
//!
//! The match machine reports what happened; a presentation layer decides how
//! to show it. Nothing in the core formats user-facing text.

use crate::models::OPTION_COUNT;

/// A state transition worth rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// A new question is on screen
    QuestionChanged {
        /// Zero-based position in the question set
        index: usize,
        total: usize,
        prompt: String,
        /// Options in presentation order (freshly shuffled)
        options: [String; OPTION_COUNT],
    },
    /// Seconds left to answer the current question
    Tick { remaining: u32 },
    /// The current question was answered or timed out
    AnswerResult {
        correct: bool,
        correct_answer: String,
        timed_out: bool,
    },
    /// Local play is over but the opponent's score is still outstanding
    AwaitingOpponent { local_score: u32 },
    /// The match is over
    MatchComplete {
        local_score: u32,
        /// `None` in solo play, or when the opponent's score could not be obtained
        opponent_score: Option<u32>,
        total: usize,
    },
}

/// Receiver of match events
pub trait PresentationSink {
    fn present(&mut self, event: MatchEvent);
}

impl PresentationSink for Vec<MatchEvent> {
    fn present(&mut self, event: MatchEvent) {
        self.push(event);
    }
}
