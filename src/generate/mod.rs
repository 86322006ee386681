//! Answer generation subsystem.
//!
//! * [`TextGenerator`] — async trait implemented by generative backends.
//! * [`GeminiGenerator`] — Gemini `generateContent` REST implementation.
//! * [`AnswerGenerator`] — the wrapper the pipeline uses: successful output
//!   is normalised, and a backend failure becomes a user-visible error-marker
//!   string that continues through translation and speech like any other
//!   answer.  A broken generation call degrades the turn; it never crashes it.

pub mod gemini;
pub mod generator;

pub use gemini::GeminiGenerator;
pub use generator::{AnswerGenerator, GenerateError, TextGenerator};
