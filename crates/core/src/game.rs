//! Match state machine
//!
//! Drives one traversal of a [`QuestionSet`]:
//!
//! ```text
//! AwaitingStart --begin--> InQuestion --answer/expiry--> InQuestion ... --> Complete
//! ```
//!
//! Each question gets a fresh countdown; an expired countdown counts as a
//! submission with no answer. Networked play runs the same machine on both
//! peers with no per-question traffic; only the final score leaves the
//! process, so a finished networked match reports
//! [`MatchEvent::AwaitingOpponent`] instead of [`MatchEvent::MatchComplete`].

use std::collections::VecDeque;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::clock::{ClockEvent, Countdown, SessionClock, QUESTION_SECONDS};
use crate::events::{MatchEvent, PresentationSink};
use crate::invariants::assert_match_invariants;
use crate::models::{Question, QuestionSet, OPTION_COUNT};

/// Who this process is playing as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Solo,
    Host,
    Guest,
}

impl MatchMode {
    pub fn is_networked(self) -> bool {
        !matches!(self, MatchMode::Solo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    AwaitingStart,
    InQuestion,
    Complete,
}

/// Mutable state of a running or finished match
#[derive(Debug, Clone)]
pub struct MatchState {
    questions: QuestionSet,
    current_index: usize,
    score: u32,
    mode: MatchMode,
    presented: [String; OPTION_COUNT],
}

impl MatchState {
    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn is_complete(&self) -> bool {
        self.current_index == self.questions.len()
    }

    fn current(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }
}

/// Result of scoring one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_answer: String,
    pub timed_out: bool,
}

/// The match state machine
pub struct MatchMachine<C: Countdown = SessionClock> {
    clock: C,
    question_seconds: u32,
    phase: MatchPhase,
    state: Option<MatchState>,
    pending: VecDeque<MatchEvent>,
}

impl MatchMachine<SessionClock> {
    /// Machine driven by a real tokio countdown
    pub fn with_session_clock() -> Self {
        Self::new(SessionClock::new())
    }
}

impl<C: Countdown> MatchMachine<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            question_seconds: QUESTION_SECONDS,
            phase: MatchPhase::AwaitingStart,
            state: None,
            pending: VecDeque::new(),
        }
    }

    /// Override the per-question time limit
    pub fn with_question_seconds(mut self, seconds: u32) -> Self {
        self.question_seconds = seconds;
        self
    }

    /// Start (or restart) a match from the first question
    pub fn begin(&mut self, questions: QuestionSet, mode: MatchMode) {
        self.clock.cancel();
        self.pending.clear();

        debug!(count = questions.len(), mode = ?mode, "Match started");

        self.state = Some(MatchState {
            questions,
            current_index: 0,
            score: 0,
            mode,
            presented: Default::default(),
        });
        self.phase = MatchPhase::InQuestion;
        self.show_current();
    }

    /// Score the current question and advance.
    ///
    /// `None` means no answer (timeout). Ignored unless a question is on
    /// screen, so a late timer event after a click does nothing.
    pub fn submit_answer(&mut self, selected: Option<&str>) -> Option<AnswerOutcome> {
        if self.phase != MatchPhase::InQuestion {
            debug!(phase = ?self.phase, "Ignoring answer outside of a question");
            return None;
        }
        self.clock.cancel();

        let state = self.state.as_mut()?;
        let question = state.current()?;
        let outcome = AnswerOutcome {
            correct: question.is_correct(selected),
            correct_answer: question.correct_answer().to_string(),
            timed_out: selected.is_none(),
        };

        if outcome.correct {
            state.score += 1;
        }
        state.current_index += 1;

        self.pending.push_back(MatchEvent::AnswerResult {
            correct: outcome.correct,
            correct_answer: outcome.correct_answer.clone(),
            timed_out: outcome.timed_out,
        });

        if state.is_complete() {
            self.phase = MatchPhase::Complete;

            let local_score = state.score;
            let total = state.questions.len();
            debug!(score = local_score, total, "Match complete");

            self.pending.push_back(if state.mode.is_networked() {
                MatchEvent::AwaitingOpponent { local_score }
            } else {
                MatchEvent::MatchComplete {
                    local_score,
                    opponent_score: None,
                    total,
                }
            });
        } else {
            self.show_current();
        }

        self.check_invariants();
        Some(outcome)
    }

    /// Submit the option at `position` in presentation order
    pub fn submit_choice(&mut self, position: usize) -> Option<AnswerOutcome> {
        if self.phase != MatchPhase::InQuestion {
            return None;
        }
        let selected = self.state.as_ref()?.presented.get(position)?.clone();
        self.submit_answer(Some(&selected))
    }

    /// Treat the current question as unanswered
    pub fn expire(&mut self) -> Option<AnswerOutcome> {
        self.submit_answer(None)
    }

    /// Feed a countdown event; expiry scores the question as unanswered
    pub fn on_clock_event(&mut self, event: ClockEvent) -> Option<AnswerOutcome> {
        match event {
            ClockEvent::Tick { remaining } => {
                if self.phase == MatchPhase::InQuestion {
                    self.pending.push_back(MatchEvent::Tick { remaining });
                }
                None
            }
            ClockEvent::Expired => self.expire(),
        }
    }

    /// Stop the match without completing it
    pub fn abandon(&mut self) {
        self.clock.cancel();
        self.state = None;
        self.phase = MatchPhase::AwaitingStart;
        self.pending.clear();
    }

    pub fn is_complete(&self) -> bool {
        self.phase == MatchPhase::Complete
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn state(&self) -> Option<&MatchState> {
        self.state.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.score)
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            MatchPhase::InQuestion => self.state.as_ref()?.current(),
            _ => None,
        }
    }

    /// Options of the current question in the order they were shown
    pub fn presented_options(&self) -> Option<&[String; OPTION_COUNT]> {
        match self.phase {
            MatchPhase::InQuestion => self.state.as_ref().map(|s| &s.presented),
            _ => None,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> impl Iterator<Item = MatchEvent> + '_ {
        self.pending.drain(..)
    }

    /// Hand all pending events to a sink
    pub fn flush_to(&mut self, sink: &mut impl PresentationSink) {
        for event in self.pending.drain(..) {
            sink.present(event);
        }
    }

    /// Shuffle and announce the current question, then restart the countdown
    fn show_current(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let Some(question) = state.questions.get(state.current_index) else {
            return;
        };

        let mut presented = question.options().clone();
        presented.shuffle(&mut rand::thread_rng());

        self.pending.push_back(MatchEvent::QuestionChanged {
            index: state.current_index,
            total: state.questions.len(),
            prompt: question.prompt().to_string(),
            options: presented.clone(),
        });
        state.presented = presented;

        self.clock.start(self.question_seconds);
        self.check_invariants();
    }

    fn check_invariants(&self) {
        if let Some(state) = &self.state {
            assert_match_invariants(state, self.phase, self.clock.is_running());
        }
    }
}
