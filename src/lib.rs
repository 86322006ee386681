//! Agrivoice — multilingual voice/text assistant for farmers.
//!
//! The crate answers a farmer's question in their own language by routing it
//! through a pivot-language pipeline:
//!
//! ```text
//! question ──▶ translate (→ en) ──▶ generate ──▶ normalize
//!          ◀── speak (voice mode) ◀── translate (en →)
//! ```
//!
//! # Subsystems
//!
//! * [`lang`]      — the fixed set of supported language tags.
//! * [`text`]      — answer-text normalisation.
//! * [`translate`] — best-effort translation gateway (never fails the turn).
//! * [`generate`]  — answer generation with an in-band error marker on failure.
//! * [`audio`]     — microphone capture, resampling and MP3 playback.
//! * [`speech`]    — speech recognition and speech output wrappers.
//! * [`pipeline`]  — the conversation orchestrator and voice-session loop.
//! * [`weather`]   — localized weather lookups.
//! * [`vision`]    — remote crop-image diagnosis.
//! * [`api`]       — the HTTP boundary (axum router).
//! * [`config`]    — TOML settings with environment credential overrides.
//!
//! Remote capabilities (recognition, translation, generation, synthesis,
//! classification) all sit behind object-safe `Send + Sync` traits so the
//! pipeline can be exercised end-to-end with in-process test doubles.

pub mod api;
pub mod audio;
pub mod config;
pub mod generate;
pub mod lang;
pub mod pipeline;
pub mod speech;
pub mod text;
pub mod translate;
pub mod vision;
pub mod weather;

pub use config::AppConfig;
pub use lang::{LanguageTag, PIVOT_LANGUAGE};
pub use pipeline::{Assistant, SessionHandle, SessionPhase};
