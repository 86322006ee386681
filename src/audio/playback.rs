//! Blocking MP3 playback through the default output device.
//!
//! [`AudioSink`] is the seam the speech-output wrapper talks to; [`CpalSink`]
//! is the production implementation.  Synthesized audio arrives as an
//! in-memory MP3 buffer owned by the calling turn, so concurrent sessions
//! never share a playback artifact.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that can occur while decoding or playing a clip.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("MP3 decode failed: {0}")]
    Decode(String),

    #[error("output stream error: {0}")]
    Stream(String),
}

// ---------------------------------------------------------------------------
// AudioSink
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for audio playback.
///
/// `play` blocks for the duration of the clip and is expected to be called
/// from the blocking thread pool.
pub trait AudioSink: Send + Sync {
    /// Decode and play an MP3 clip, returning when playback finishes.
    fn play(&self, mp3: &[u8]) -> Result<(), PlaybackError>;
}

// ---------------------------------------------------------------------------
// CpalSink
// ---------------------------------------------------------------------------

/// Plays MP3 clips through the system default output device.
///
/// Each call opens a fresh output stream, feeds the decoded samples through
/// it and waits for the clip length to elapse.  No state is retained between
/// calls, so one sink can be shared by any number of sessions.
#[derive(Debug, Default, Clone)]
pub struct CpalSink;

impl CpalSink {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSink for CpalSink {
    fn play(&self, mp3: &[u8]) -> Result<(), PlaybackError> {
        let (samples, sample_rate) = decode_mp3(mp3)?;
        if samples.is_empty() {
            return Ok(());
        }
        play_samples_blocking(&samples, sample_rate)
    }
}

/// Decode MP3 bytes to mono f32 samples, returning the clip's sample rate.
fn decode_mp3(mp3: &[u8]) -> Result<(Vec<f32>, u32), PlaybackError> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3));
    let mut samples = Vec::new();
    let mut sample_rate = 0u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                sample_rate = frame.sample_rate as u32;
                if frame.channels == 2 {
                    samples.extend(frame.data.chunks(2).map(|lr| {
                        let left = f32::from(lr[0]) / 32768.0;
                        let right = f32::from(lr.get(1).copied().unwrap_or(lr[0])) / 32768.0;
                        (left + right) / 2.0
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        }
    }

    if sample_rate == 0 {
        return Err(PlaybackError::Decode("no decodable frames".into()));
    }
    Ok((samples, sample_rate))
}

/// Feed `samples` (mono, `sample_rate` Hz) through a fresh output stream and
/// block until the clip has played out.
fn play_samples_blocking(samples: &[f32], sample_rate: u32) -> Result<(), PlaybackError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(PlaybackError::NoDevice)?;

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let buffer = Arc::new(Mutex::new((samples.to_vec(), 0usize)));
    let buffer_cb = Arc::clone(&buffer);

    let stream = device
        .build_output_stream(
            &config,
            move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut guard = buffer_cb.lock().unwrap();
                let (clip, pos) = &mut *guard;
                for slot in out.iter_mut() {
                    *slot = if *pos < clip.len() {
                        let s = clip[*pos];
                        *pos += 1;
                        s
                    } else {
                        0.0
                    };
                }
            },
            |err| log::warn!("audio output stream error: {err}"),
            None,
        )
        .map_err(|e| PlaybackError::Stream(e.to_string()))?;

    stream
        .play()
        .map_err(|e| PlaybackError::Stream(e.to_string()))?;

    // Wait for the callback to drain the clip, bounded by the clip length
    // plus a small grace period.
    let clip_ms = samples.len() as u64 * 1000 / u64::from(sample_rate);
    let deadline = std::time::Instant::now() + Duration::from_millis(clip_ms + 500);

    loop {
        {
            let guard = buffer.lock().unwrap();
            if guard.1 >= guard.0.len() {
                break;
            }
        }
        if std::time::Instant::now() >= deadline {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    // Let the device flush the tail of the buffer.
    std::thread::sleep(Duration::from_millis(100));
    drop(stream);

    log::debug!("playback complete ({} samples)", samples.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
