//! Conversation pipeline — the orchestrator and its session state.
//!
//! A turn flows `translate → generate → translate back → speak`; the voice
//! loop repeats turns until the translated answer carries the stop token or
//! the session's [`SessionHandle`] is cancelled.

pub mod runner;
pub mod state;

pub use runner::{start_session, Assistant, SessionHandle};
pub use state::{
    contains_stop_token, new_shared_phase, read_phase, SessionPhase, SharedPhase, STOP_TOKEN,
};
