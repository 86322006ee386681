//! Session state shared between the voice loop and the HTTP surface.

use std::sync::{Arc, Mutex};

/// The word that ends a voice session, matched case-insensitively as a
/// substring anywhere in a transcript or answer.
pub const STOP_TOKEN: &str = "stop";

/// True if `text` contains the stop token in any casing.
///
/// Deliberately loose: "Stop.", "please stop now" and even "stopwatch" all
/// match.  Farmers speak the word mid-sentence; a strict word-boundary match
/// would leave sessions running.
pub fn contains_stop_token(text: &str) -> bool {
    text.to_lowercase().contains(STOP_TOKEN)
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where a voice session currently is in its turn cycle.
///
/// Published through a [`SharedPhase`] so the HTTP surface can report
/// progress without touching the loop itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for (or capturing) the next utterance.
    Listening,
    /// Translating the question to the pivot language.
    Translating,
    /// Waiting for the answer generator.
    Generating,
    /// Translating the answer back to the session language.
    TranslatingBack,
    /// Playing the spoken answer.
    Speaking,
    /// The session has ended and will make no further transitions.
    Stopped,
}

impl SessionPhase {
    pub fn label(self) -> &'static str {
        match self {
            SessionPhase::Listening => "listening",
            SessionPhase::Translating => "translating",
            SessionPhase::Generating => "generating",
            SessionPhase::TranslatingBack => "translating_back",
            SessionPhase::Speaking => "speaking",
            SessionPhase::Stopped => "stopped",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Stopped)
    }
}

/// Phase cell shared between a running session and its handle.
pub type SharedPhase = Arc<Mutex<SessionPhase>>;

/// Create a phase cell starting in [`SessionPhase::Listening`].
pub fn new_shared_phase() -> SharedPhase {
    Arc::new(Mutex::new(SessionPhase::Listening))
}

/// Store `phase` into the cell, ignoring a poisoned lock.
pub(crate) fn set_phase(cell: &SharedPhase, phase: SessionPhase) {
    if let Ok(mut guard) = cell.lock() {
        *guard = phase;
    }
}

/// Read the current phase, treating a poisoned lock as stopped.
pub fn read_phase(cell: &SharedPhase) -> SessionPhase {
    cell.lock().map(|g| *g).unwrap_or(SessionPhase::Stopped)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
