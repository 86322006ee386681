//! Speech synthesis — text to MP3 bytes.
//!
//! [`SpeechSynthesizer`] returns the clip as an in-memory buffer; playback is
//! the caller's concern.  One buffer per call means concurrent sessions never
//! overwrite each other's audio.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::TtsConfig;
use crate::lang::LanguageTag;

// ---------------------------------------------------------------------------
// SynthesisError
// ---------------------------------------------------------------------------

/// Errors that can occur during speech synthesis.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("synthesis request timed out")]
    Timeout,

    /// The service returned no audio data.
    #[error("synthesis returned no audio")]
    EmptyAudio,
}

impl From<reqwest::Error> for SynthesisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SynthesisError::Timeout
        } else {
            SynthesisError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Async trait for text-to-speech backends.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn SpeechSynthesizer>`.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in `language`, returning MP3 bytes.
    async fn synthesize(
        &self,
        text: &str,
        language: LanguageTag,
    ) -> Result<Vec<u8>, SynthesisError>;
}

// ---------------------------------------------------------------------------
// GoogleSynthesizer
// ---------------------------------------------------------------------------

/// Calls the `translate_tts` endpoint, which returns a ready-to-play MP3.
pub struct GoogleSynthesizer {
    client: reqwest::Client,
    config: TtsConfig,
}

impl GoogleSynthesizer {
    /// Build a `GoogleSynthesizer` from application config.
    pub fn from_config(config: &TtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        language: LanguageTag,
    ) -> Result<Vec<u8>, SynthesisError> {
        let url = format!("{}/translate_tts", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language.as_str()),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        Ok(audio.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_builds_without_panic() {
        let _synth = GoogleSynthesizer::from_config(&TtsConfig::default());
    }

    #[test]
    fn is_object_safe() {
        let synth: Box<dyn SpeechSynthesizer> =
            Box::new(GoogleSynthesizer::from_config(&TtsConfig::default()));
        drop(synth);
    }
}
