//! Audio subsystem — one-shot microphone capture and MP3 playback.
//!
//! # Capture
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → Endpointer
//!     Calibrating (ambient noise) → Waiting (speech start) → Recording → Done
//! → stereo_to_mono → resample_to_16k → Vec<f32> (16 kHz mono)
//! ```
//!
//! [`listen_once`] drives a single utterance through this pipeline with all
//! duration bounds taken from configuration.  The microphone is acquired for
//! the duration of the call only; the cpal stream is dropped on every exit
//! path.
//!
//! # Playback
//!
//! [`CpalSink`] decodes an in-memory MP3 buffer and plays it through the
//! default output device, blocking until the clip finishes.

pub mod capture;
pub mod playback;
pub mod resample;

pub use capture::{listen_once, Endpointer, EndpointPhase, ListenError, ListenParams};
pub use playback::{CpalSink, PlaybackError};
pub use resample::{resample_to_16k, stereo_to_mono};
