//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible match states during
//! development. These checks are compiled out in release builds.

use crate::game::{MatchPhase, MatchState};

/// Validate that a match state agrees with the machine's phase and clock
pub fn assert_match_invariants(state: &MatchState, phase: MatchPhase, clock_running: bool) {
    let len = state.questions().len();

    debug_assert!(
        state.current_index() <= len,
        "current index {} past end of {} questions",
        state.current_index(),
        len
    );

    // At most one point per answered question
    debug_assert!(
        state.score() as usize <= state.current_index(),
        "score {} exceeds {} answered questions",
        state.score(),
        state.current_index()
    );

    debug_assert_eq!(
        phase == MatchPhase::Complete,
        state.is_complete(),
        "phase {:?} disagrees with index {}/{}",
        phase,
        state.current_index(),
        len
    );

    debug_assert!(
        phase != MatchPhase::AwaitingStart,
        "match state present while awaiting start"
    );

    if phase == MatchPhase::Complete {
        debug_assert!(!clock_running, "completed match still has a countdown running");
    }
}
