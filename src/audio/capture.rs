//! One-shot microphone capture via `cpal`.
//!
//! [`listen_once`] acquires the default input device, waits for the speaker
//! to start talking and returns a single utterance as 16 kHz mono `f32`
//! samples.  The call is blocking and is expected to run on the blocking
//! thread pool; the cpal stream is scoped to the call and dropped on every
//! exit path, success or failure.
//!
//! Endpointing is a simple energy gate ([`Endpointer`]): the first phase
//! measures ambient noise to pick a threshold, the second waits for a chunk
//! above it, the third records until a run of trailing silence.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use crate::audio::resample::{resample_to_16k, stereo_to_mono};
use crate::config::SpeechConfig;

/// Trailing silence that ends an utterance.
const TRAILING_SILENCE: Duration = Duration::from_millis(800);

/// Ambient RMS is scaled by this margin to form the speech threshold.
const CALIBRATION_MARGIN: f32 = 1.8;

/// Threshold floor so a dead-silent room still needs audible speech.
const MIN_THRESHOLD: f32 = 0.01;

// ---------------------------------------------------------------------------
// ListenParams / ListenError
// ---------------------------------------------------------------------------

/// Duration bounds for a single capture, taken from [`SpeechConfig`].
#[derive(Debug, Clone)]
pub struct ListenParams {
    /// Ambient-noise calibration window.
    pub ambient_adjust: Duration,
    /// Maximum wait for speech to begin.
    pub total_timeout: Duration,
    /// Maximum utterance length once speech has begun.
    pub max_phrase: Duration,
}

impl ListenParams {
    /// Build from configuration.
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self {
            ambient_adjust: Duration::from_secs_f32(config.ambient_adjust_secs.max(0.1)),
            total_timeout: Duration::from_secs(config.total_timeout_secs),
            max_phrase: Duration::from_secs(config.max_phrase_secs),
        }
    }
}

/// Errors that can occur while acquiring audio for one utterance.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// No speech began within the total wait bound.
    #[error("no speech detected within the wait window")]
    NoSpeech,

    /// The stream went away mid-capture.
    #[error("audio stream closed unexpectedly: {0}")]
    Stream(String),
}

// ---------------------------------------------------------------------------
// Endpointer
// ---------------------------------------------------------------------------

/// Phase of the utterance endpointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointPhase {
    /// Measuring ambient noise; nothing is kept yet.
    Calibrating,
    /// Threshold fixed; waiting for a chunk above it.
    Waiting,
    /// Speech in progress; watching for trailing silence.
    Recording,
    /// Trailing silence reached — the utterance is complete.
    Done,
}

/// Pure energy-gate state machine, fed one `(rms, duration)` pair per audio
/// chunk.  Has no device dependency so it can be unit-tested directly.
#[derive(Debug)]
pub struct Endpointer {
    phase: EndpointPhase,
    calibrate_for: Duration,
    calibrated: Duration,
    ambient_sum: f32,
    ambient_chunks: u32,
    threshold: f32,
    silence_run: Duration,
}

impl Endpointer {
    /// Create an endpointer that calibrates for `ambient_adjust`.
    pub fn new(ambient_adjust: Duration) -> Self {
        Self {
            phase: EndpointPhase::Calibrating,
            calibrate_for: ambient_adjust,
            calibrated: Duration::ZERO,
            ambient_sum: 0.0,
            ambient_chunks: 0,
            threshold: MIN_THRESHOLD,
            silence_run: Duration::ZERO,
        }
    }

    /// The speech/silence RMS threshold (meaningful after calibration).
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Feed one chunk's RMS and duration; returns the phase after the chunk.
    pub fn advance(&mut self, rms: f32, chunk: Duration) -> EndpointPhase {
        match self.phase {
            EndpointPhase::Calibrating => {
                self.ambient_sum += rms;
                self.ambient_chunks += 1;
                self.calibrated += chunk;
                if self.calibrated >= self.calibrate_for {
                    let ambient = self.ambient_sum / self.ambient_chunks.max(1) as f32;
                    self.threshold = (ambient * CALIBRATION_MARGIN).max(MIN_THRESHOLD);
                    self.phase = EndpointPhase::Waiting;
                }
            }
            EndpointPhase::Waiting => {
                if rms > self.threshold {
                    self.phase = EndpointPhase::Recording;
                    self.silence_run = Duration::ZERO;
                }
            }
            EndpointPhase::Recording => {
                if rms > self.threshold {
                    self.silence_run = Duration::ZERO;
                } else {
                    self.silence_run += chunk;
                    if self.silence_run >= TRAILING_SILENCE {
                        self.phase = EndpointPhase::Done;
                    }
                }
            }
            EndpointPhase::Done => {}
        }
        self.phase
    }
}

/// RMS amplitude of a chunk of samples.
pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean_sq = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    mean_sq.sqrt()
}

// ---------------------------------------------------------------------------
// listen_once
// ---------------------------------------------------------------------------

/// Record one utterance from the default input device.
///
/// Blocks for up to `ambient_adjust + total_timeout + max_phrase`.  Returns
/// 16 kHz mono samples covering the utterance plus a short pre-roll.
///
/// # Errors
///
/// * [`ListenError::NoSpeech`] — nothing above the ambient threshold began
///   within `total_timeout`.
/// * device/stream variants — the microphone could not be acquired.
pub fn listen_once(params: &ListenParams) -> Result<Vec<f32>, ListenError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(ListenError::NoDevice)?;
    let supported = device.default_input_config()?;

    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;
    let config: cpal::StreamConfig = supported.into();

    let (tx, rx) = mpsc::channel::<Vec<f32>>();
    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let _ = tx.send(data.to_vec());
        },
        |err| log::warn!("audio input stream error: {err}"),
        None,
    )?;
    stream.play()?;

    log::debug!("listening ({sample_rate} Hz, {channels} ch)");

    let mut endpointer = Endpointer::new(params.ambient_adjust);
    let mut captured: Vec<f32> = Vec::new();
    let mut pre_roll: Vec<f32> = Vec::new();
    let wait_started = Instant::now();
    let mut speech_started: Option<Instant> = None;

    loop {
        let chunk = match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(chunk) => chunk,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if speech_started.is_none() && wait_started.elapsed() >= params.total_timeout {
                    return Err(ListenError::NoSpeech);
                }
                continue;
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(ListenError::Stream("input channel closed".into()));
            }
        };

        let mono = stereo_to_mono(&chunk, channels);
        let chunk_dur = Duration::from_secs_f64(mono.len() as f64 / f64::from(sample_rate));

        match endpointer.advance(rms(&mono), chunk_dur) {
            EndpointPhase::Calibrating => {}
            EndpointPhase::Waiting => {
                // Keep the newest pre-speech chunk so the utterance onset is
                // not clipped.
                pre_roll = mono;
                if wait_started.elapsed() >= params.total_timeout {
                    return Err(ListenError::NoSpeech);
                }
            }
            EndpointPhase::Recording => {
                if speech_started.is_none() {
                    speech_started = Some(Instant::now());
                    captured.append(&mut pre_roll);
                }
                captured.extend_from_slice(&mono);
                if speech_started.is_some_and(|t| t.elapsed() >= params.max_phrase) {
                    log::debug!("max phrase length reached, cutting utterance");
                    break;
                }
            }
            EndpointPhase::Done => break,
        }
    }

    drop(stream);
    Ok(resample_to_16k(&captured, sample_rate))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK: Duration = Duration::from_millis(100);

    fn calibrated_endpointer() -> Endpointer {
        let mut ep = Endpointer::new(Duration::from_millis(200));
        // Two quiet chunks complete calibration.
        ep.advance(0.002, CHUNK);
        let phase = ep.advance(0.002, CHUNK);
        assert_eq!(phase, EndpointPhase::Waiting);
        ep
    }

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(rms(&[0.0; 160]), 0.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_constant_signal() {
        assert!((rms(&[0.5; 160]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn threshold_has_a_floor_in_quiet_rooms() {
        let ep = calibrated_endpointer();
        assert!((ep.threshold() - MIN_THRESHOLD).abs() < 1e-6);
    }

    #[test]
    fn threshold_scales_with_ambient_noise() {
        let mut ep = Endpointer::new(Duration::from_millis(200));
        ep.advance(0.1, CHUNK);
        ep.advance(0.1, CHUNK);
        assert!((ep.threshold() - 0.1 * CALIBRATION_MARGIN).abs() < 1e-6);
    }

    #[test]
    fn waits_until_speech_exceeds_threshold() {
        let mut ep = calibrated_endpointer();
        assert_eq!(ep.advance(0.005, CHUNK), EndpointPhase::Waiting);
        assert_eq!(ep.advance(0.2, CHUNK), EndpointPhase::Recording);
    }

    #[test]
    fn trailing_silence_ends_the_utterance() {
        let mut ep = calibrated_endpointer();
        ep.advance(0.2, CHUNK); // speech starts
        // 800 ms of silence in 100 ms chunks.
        for _ in 0..7 {
            assert_eq!(ep.advance(0.0, CHUNK), EndpointPhase::Recording);
        }
        assert_eq!(ep.advance(0.0, CHUNK), EndpointPhase::Done);
    }

    #[test]
    fn speech_resets_the_silence_run() {
        let mut ep = calibrated_endpointer();
        ep.advance(0.2, CHUNK);
        for _ in 0..7 {
            ep.advance(0.0, CHUNK);
        }
        // A voiced chunk just before the cutoff keeps recording alive.
        assert_eq!(ep.advance(0.2, CHUNK), EndpointPhase::Recording);
        assert_eq!(ep.advance(0.0, CHUNK), EndpointPhase::Recording);
    }

    #[test]
    fn done_is_sticky() {
        let mut ep = calibrated_endpointer();
        ep.advance(0.2, CHUNK);
        for _ in 0..8 {
            ep.advance(0.0, CHUNK);
        }
        assert_eq!(ep.advance(0.5, CHUNK), EndpointPhase::Done);
    }

    #[test]
    fn listen_params_from_config() {
        let cfg = SpeechConfig::default();
        let params = ListenParams::from_config(&cfg);
        assert_eq!(params.total_timeout, Duration::from_secs(60));
        assert_eq!(params.max_phrase, Duration::from_secs(45));
        assert!(params.ambient_adjust >= Duration::from_millis(100));
    }
}
