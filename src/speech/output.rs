//! Speech output — the spoken half of a voice turn.
//!
//! [`SpeechOutput`] wraps a synthesizer and an audio sink behind a contract
//! the orchestrator can rely on: the call never fails and never panics a
//! turn.  Empty text is a no-op, a stop phrase suppresses audio entirely, and
//! every synthesis or playback failure is logged and absorbed.

use std::sync::Arc;

use crate::audio::playback::AudioSink;
use crate::lang::LanguageTag;
use crate::pipeline::contains_stop_token;
use crate::speech::synthesizer::SpeechSynthesizer;

/// Synthesize-and-play front with the stop-token gate.
///
/// Cheap to clone; clones share the synthesizer and sink.
#[derive(Clone)]
pub struct SpeechOutput {
    synth: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
}

impl SpeechOutput {
    pub fn new(synth: Arc<dyn SpeechSynthesizer>, sink: Arc<dyn AudioSink>) -> Self {
        Self { synth, sink }
    }

    /// Speak `text` in `language`, blocking until playback finishes.
    ///
    /// * empty text → no-op,
    /// * text containing the stop token → a stop notice is logged and no
    ///   audio is produced (this is how a spoken answer silences the
    ///   assistant mid-response),
    /// * synthesis/playback failure → logged, absorbed.
    pub async fn speak(&self, text: &str, language: LanguageTag) {
        if text.is_empty() {
            return;
        }

        if contains_stop_token(text) {
            log::info!("stop phrase present in answer; suppressing audio");
            return;
        }

        log::info!("speaking in {language}: {text}");

        let mp3 = match self.synth.synthesize(text, language).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("speech synthesis failed: {e}");
                return;
            }
        };

        let sink = Arc::clone(&self.sink);
        match tokio::task::spawn_blocking(move || sink.play(&mp3)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("audio playback failed: {e}"),
            Err(e) => log::warn!("playback task failed: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::playback::PlaybackError;
    use crate::speech::synthesizer::SynthesisError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Records every synthesized text; returns a fixed MP3-ish payload.
    struct RecordingSynth {
        spoken: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingSynth {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                spoken: Mutex::new(Vec::new()),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                spoken: Mutex::new(Vec::new()),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for RecordingSynth {
        async fn synthesize(
            &self,
            text: &str,
            _language: LanguageTag,
        ) -> Result<Vec<u8>, SynthesisError> {
            self.spoken.lock().unwrap().push(text.to_string());
            if self.fail {
                Err(SynthesisError::Request("unreachable".into()))
            } else {
                Ok(vec![0xFF, 0xFB, 0x90, 0x00])
            }
        }
    }

    /// Counts plays; optionally fails.
    struct CountingSink {
        plays: AtomicUsize,
        fail: bool,
    }

    impl CountingSink {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                plays: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                plays: AtomicUsize::new(0),
                fail: true,
            })
        }
    }

    impl AudioSink for CountingSink {
        fn play(&self, _mp3: &[u8]) -> Result<(), PlaybackError> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PlaybackError::NoDevice)
            } else {
                Ok(())
            }
        }
    }

    fn output(synth: &Arc<RecordingSynth>, sink: &Arc<CountingSink>) -> SpeechOutput {
        SpeechOutput::new(
            Arc::clone(synth) as Arc<dyn SpeechSynthesizer>,
            Arc::clone(sink) as Arc<dyn AudioSink>,
        )
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_text_is_a_noop() {
        let synth = RecordingSynth::ok();
        let sink = CountingSink::ok();
        output(&synth, &sink).speak("", LanguageTag::English).await;
        assert!(synth.spoken.lock().unwrap().is_empty());
        assert_eq!(sink.plays.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stop_phrase_is_suppressed_case_insensitively() {
        let synth = RecordingSynth::ok();
        let sink = CountingSink::ok();
        output(&synth, &sink)
            .speak("Please STOP now", LanguageTag::English)
            .await;
        assert!(synth.spoken.lock().unwrap().is_empty());
        assert_eq!(sink.plays.load(Ordering::SeqCst), 0);
    }

    /// The substring match is intentionally loose: "stopwatch" also silences
    /// output.  Accepted false positive.
    #[tokio::test]
    async fn stopwatch_is_also_suppressed() {
        let synth = RecordingSynth::ok();
        let sink = CountingSink::ok();
        output(&synth, &sink)
            .speak("A stopwatch helps time irrigation", LanguageTag::English)
            .await;
        assert!(synth.spoken.lock().unwrap().is_empty());
        assert_eq!(sink.plays.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn normal_text_is_synthesized_and_played() {
        let synth = RecordingSynth::ok();
        let sink = CountingSink::ok();
        output(&synth, &sink)
            .speak("ಗೊಬ್ಬರ ಹಾಕಿ", LanguageTag::Kannada)
            .await;
        assert_eq!(synth.spoken.lock().unwrap().as_slice(), ["ಗೊಬ್ಬರ ಹಾಕಿ"]);
        assert_eq!(sink.plays.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn synthesis_failure_is_absorbed_and_skips_playback() {
        let synth = RecordingSynth::failing();
        let sink = CountingSink::ok();
        output(&synth, &sink)
            .speak("some answer", LanguageTag::Hindi)
            .await;
        assert_eq!(sink.plays.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn playback_failure_is_absorbed() {
        let synth = RecordingSynth::ok();
        let sink = CountingSink::failing();
        // Must return normally despite the sink error.
        output(&synth, &sink)
            .speak("some answer", LanguageTag::Tamil)
            .await;
        assert_eq!(sink.plays.load(Ordering::SeqCst), 1);
    }
}
