//! Speech recognition — microphone to text.
//!
//! [`SpeechRecognizer`] is the seam the pipeline talks to.  The production
//! [`GoogleRecognizer`] records one utterance with [`crate::audio::listen_once`]
//! on the blocking pool, WAV-encodes it and posts it to the recognition HTTP
//! API in the language's regional locale.

use std::io::Cursor;

use async_trait::async_trait;

use crate::audio::{listen_once, ListenError, ListenParams};
use crate::config::SpeechConfig;
use crate::lang::LanguageTag;

// ---------------------------------------------------------------------------
// CaptureOutcome
// ---------------------------------------------------------------------------

/// Result of one capture attempt.
///
/// `Silence` and `ServiceError` both cause a no-op loop iteration; keeping
/// them separate lets the orchestrator tell transient quiet apart from a
/// backend outage in the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Speech was recognised.
    Utterance(String),
    /// Audio was captured (or nothing was said) but no transcript came back.
    Silence,
    /// The device or the recognition service itself failed.
    ServiceError(String),
}

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// Async trait for speech capture backends.
///
/// Duration bounds (ambient calibration, total wait, max phrase) are
/// configuration constants of the implementation, not per-call parameters.
/// Implementations never return an error type: every failure shape is a
/// [`CaptureOutcome`] variant.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn capture(&self, language: LanguageTag) -> CaptureOutcome;
}

// ---------------------------------------------------------------------------
// GoogleRecognizer
// ---------------------------------------------------------------------------

/// Records from the default microphone and posts WAV audio to the speech
/// recognition endpoint.
pub struct GoogleRecognizer {
    client: reqwest::Client,
    config: SpeechConfig,
}

impl GoogleRecognizer {
    /// Build a `GoogleRecognizer` from application config.
    pub fn from_config(config: &SpeechConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    async fn recognize_wav(
        &self,
        wav: Vec<u8>,
        language: LanguageTag,
    ) -> Result<Option<String>, String> {
        let url = format!("{}/recognize", self.config.base_url);

        let mut query: Vec<(&str, &str)> = vec![
            ("output", "json"),
            ("lang", language.speech_locale()),
        ];
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            query.push(("key", key));
        }

        let response = self
            .client
            .post(&url)
            .query(&query)
            .header("Content-Type", "audio/wav; rate=16000")
            .body(wav)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let body = response.text().await.map_err(|e| e.to_string())?;

        // The endpoint streams one JSON object per line; the transcript is in
        // the first line whose `result` array is non-empty.
        for line in body.lines() {
            let Ok(json) = serde_json::from_str::<serde_json::Value>(line) else {
                continue;
            };
            let transcript = json["result"][0]["alternative"][0]["transcript"].as_str();
            if let Some(text) = transcript {
                if !text.is_empty() {
                    return Ok(Some(text.to_string()));
                }
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleRecognizer {
    async fn capture(&self, language: LanguageTag) -> CaptureOutcome {
        let params = ListenParams::from_config(&self.config);

        let listened = tokio::task::spawn_blocking(move || listen_once(&params)).await;

        let samples = match listened {
            Ok(Ok(samples)) => samples,
            Ok(Err(ListenError::NoSpeech)) => {
                return CaptureOutcome::Silence;
            }
            Ok(Err(e)) => {
                return CaptureOutcome::ServiceError(format!("audio capture failed: {e}"));
            }
            Err(e) => {
                return CaptureOutcome::ServiceError(format!("capture task failed: {e}"));
            }
        };

        if samples.is_empty() {
            return CaptureOutcome::Silence;
        }

        let wav = match encode_wav(&samples) {
            Ok(wav) => wav,
            Err(e) => return CaptureOutcome::ServiceError(format!("WAV encoding failed: {e}")),
        };

        match self.recognize_wav(wav, language).await {
            Ok(Some(text)) => {
                log::info!("recognised ({}): {text}", language.speech_locale());
                CaptureOutcome::Utterance(text)
            }
            Ok(None) => CaptureOutcome::Silence,
            Err(reason) => CaptureOutcome::ServiceError(reason),
        }
    }
}

/// Encode 16 kHz mono f32 samples as a 16-bit PCM WAV buffer.
fn encode_wav(samples: &[f32]) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(clamped)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

// ---------------------------------------------------------------------------
// ScriptedRecognizer  (test-only)
// ---------------------------------------------------------------------------

/// A test double that replays a scripted sequence of outcomes.
///
/// Once the script is exhausted it keeps returning `Silence`, sleeping a
/// little first so a session loop stuck in silence yields to the test body
/// instead of monopolizing a current-thread runtime.
#[cfg(test)]
pub struct ScriptedRecognizer {
    script: std::sync::Mutex<std::collections::VecDeque<CaptureOutcome>>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ScriptedRecognizer {
    pub fn new(outcomes: impl IntoIterator<Item = CaptureOutcome>) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            script: std::sync::Mutex::new(outcomes.into_iter().collect()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        })
    }
}

#[cfg(test)]
#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn capture(&self, _language: LanguageTag) -> CaptureOutcome {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                CaptureOutcome::Silence
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wav_produces_riff_header() {
        let wav = encode_wav(&vec![0.0f32; 1600]).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte header + 2 bytes per sample.
        assert_eq!(wav.len(), 44 + 1600 * 2);
    }

    #[test]
    fn encode_wav_clamps_out_of_range_samples() {
        // Must not panic on clipped input.
        let wav = encode_wav(&[2.0, -2.0, 0.5]).unwrap();
        assert!(wav.len() > 44);
    }

    #[test]
    fn recognizer_is_object_safe() {
        let recognizer: Box<dyn SpeechRecognizer> =
            Box::new(GoogleRecognizer::from_config(&SpeechConfig::default()));
        drop(recognizer);
    }

    #[tokio::test]
    async fn scripted_recognizer_replays_then_goes_silent() {
        let recognizer = ScriptedRecognizer::new([
            CaptureOutcome::Utterance("hello".into()),
            CaptureOutcome::Silence,
        ]);
        assert_eq!(
            recognizer.capture(LanguageTag::English).await,
            CaptureOutcome::Utterance("hello".into())
        );
        assert_eq!(
            recognizer.capture(LanguageTag::English).await,
            CaptureOutcome::Silence
        );
        assert_eq!(
            recognizer.capture(LanguageTag::English).await,
            CaptureOutcome::Silence
        );
    }
}
