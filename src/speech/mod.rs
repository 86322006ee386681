//! Speech subsystem — recognition in, synthesis out.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────┐   ┌──────────────────────────────────┐
//! │ SpeechRecognizer (trait)       │   │ SpeechSynthesizer (trait)         │
//! │   GoogleRecognizer             │   │   GoogleSynthesizer               │
//! │   mic → WAV → HTTP → outcome   │   │   text → HTTP → MP3 bytes         │
//! └───────────────┬───────────────┘   └────────────────┬─────────────────┘
//!                 │                                    │
//!         CaptureOutcome                        SpeechOutput
//!   Utterance | Silence | ServiceError    (stop-token gate → AudioSink)
//! ```
//!
//! The recognizer reports its two failure shapes separately so the
//! orchestrator can log transient silence and backend outages differently;
//! both mean "no usable utterance this cycle" and neither ends the session.

pub mod output;
pub mod recognizer;
pub mod synthesizer;

pub use output::SpeechOutput;
pub use recognizer::{CaptureOutcome, GoogleRecognizer, SpeechRecognizer};

// test-only re-export so pipeline tests can script capture sequences without
// reaching into the recognizer module.
#[cfg(test)]
pub use recognizer::ScriptedRecognizer;
pub use synthesizer::{GoogleSynthesizer, SpeechSynthesizer, SynthesisError};
