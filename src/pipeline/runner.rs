//! Conversation orchestrator.
//!
//! [`Assistant`] composes the capability seams into a single-turn question
//! pipeline and into the continuous voice loop.  Every stage is fail-soft:
//! translation passes the text through, generation degrades to an in-band
//! error marker and speech output absorbs its own failures, so one bad remote
//! call costs a degraded answer, never the session.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::lang::{LanguageTag, PIVOT_LANGUAGE};
use crate::pipeline::state::{
    contains_stop_token, new_shared_phase, read_phase, set_phase, SessionPhase, SharedPhase,
};
use crate::speech::{CaptureOutcome, SpeechOutput, SpeechRecognizer};
use crate::translate::TranslationGateway;
use crate::generate::AnswerGenerator;

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

/// The question-answering core, shared by the text endpoint and every voice
/// session.
pub struct Assistant {
    recognizer: Arc<dyn SpeechRecognizer>,
    translator: TranslationGateway,
    generator: AnswerGenerator,
    output: SpeechOutput,
}

impl Assistant {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        translator: TranslationGateway,
        generator: AnswerGenerator,
        output: SpeechOutput,
    ) -> Self {
        Self {
            recognizer,
            translator,
            generator,
            output,
        }
    }

    /// Answer a typed question in `language`.
    ///
    /// Text mode always returns a single response; the stop token has no
    /// meaning here.
    pub async fn answer(&self, question: &str, language: LanguageTag) -> String {
        self.answer_inner(question, language, None).await
    }

    /// Shared turn body: translate to the pivot language, generate, translate
    /// back.  Publishes phase transitions when a session cell is supplied.
    async fn answer_inner(
        &self,
        question: &str,
        language: LanguageTag,
        phase: Option<&SharedPhase>,
    ) -> String {
        if let Some(cell) = phase {
            set_phase(cell, SessionPhase::Translating);
        }
        let pivot_question = self.translator.translate(question, PIVOT_LANGUAGE).await;

        if let Some(cell) = phase {
            set_phase(cell, SessionPhase::Generating);
        }
        let answer = self.generator.generate(&pivot_question).await;

        if let Some(cell) = phase {
            set_phase(cell, SessionPhase::TranslatingBack);
        }
        self.translator.translate(&answer, language).await
    }

    /// Run the continuous voice loop until the stop token appears in a
    /// translated answer or `cancel` fires.
    ///
    /// Capture failures never end the loop: silence and service errors are
    /// logged and the next cycle begins.
    pub async fn run(&self, language: LanguageTag, cancel: CancellationToken, phase: SharedPhase) {
        log::info!("voice session started ({language})");

        loop {
            set_phase(&phase, SessionPhase::Listening);

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("voice session cancelled ({language})");
                    break;
                }
                outcome = self.recognizer.capture(language) => outcome,
            };

            let question = match outcome {
                CaptureOutcome::Utterance(text) => text,
                CaptureOutcome::Silence => {
                    log::debug!("no speech this cycle ({language})");
                    continue;
                }
                CaptureOutcome::ServiceError(reason) => {
                    log::warn!("capture failed ({language}): {reason}");
                    continue;
                }
            };

            log::info!("heard ({language}): {question}");

            let answer = self.answer_inner(&question, language, Some(&phase)).await;

            set_phase(&phase, SessionPhase::Speaking);
            self.output.speak(&answer, language).await;

            if contains_stop_token(&answer) {
                log::info!("stop token in answer; ending voice session ({language})");
                break;
            }
        }

        set_phase(&phase, SessionPhase::Stopped);
        log::info!("voice session ended ({language})");
    }
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Handle to a background voice session.
///
/// Holds the cancellation token and phase cell of one spawned loop, giving
/// the caller an out-of-band termination path alongside the in-band stop
/// token.
pub struct SessionHandle {
    language: LanguageTag,
    phase: SharedPhase,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl SessionHandle {
    pub fn language(&self) -> LanguageTag {
        self.language
    }

    /// Request termination.  Idempotent; the loop notices at its next
    /// listening cycle.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// The phase the session last published.
    pub fn phase(&self) -> SessionPhase {
        read_phase(&self.phase)
    }

    /// True once the loop task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        // A session must not outlive its only handle.
        self.cancel.cancel();
    }
}

/// Spawn a voice session for `language` as a background task and return its
/// handle immediately.
pub fn start_session(assistant: Arc<Assistant>, language: LanguageTag) -> SessionHandle {
    let cancel = CancellationToken::new();
    let phase = new_shared_phase();

    let join = tokio::spawn({
        let cancel = cancel.clone();
        let phase = Arc::clone(&phase);
        async move {
            assistant.run(language, cancel, phase).await;
        }
    });

    SessionHandle {
        language,
        phase,
        cancel,
        join,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::playback::{AudioSink, PlaybackError};
    use crate::generate::{GenerateError, TextGenerator};
    use crate::speech::synthesizer::{SpeechSynthesizer, SynthesisError};
    use crate::speech::ScriptedRecognizer;
    use crate::translate::{TranslateError, Translator};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Returns the input unchanged, so text flows through the pipeline intact.
    struct EchoTranslator;

    #[async_trait]
    impl Translator for EchoTranslator {
        async fn translate(
            &self,
            text: &str,
            _target: LanguageTag,
        ) -> Result<String, TranslateError> {
            Ok(text.to_string())
        }
    }

    /// Echoes the prompt back as the answer.
    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
            Ok(prompt.to_string())
        }
    }

    struct FailGenerator;

    #[async_trait]
    impl TextGenerator for FailGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            Err(GenerateError::Request("connection refused".into()))
        }
    }

    /// Records every synthesized text.
    struct RecordingSynth {
        spoken: Mutex<Vec<String>>,
    }

    impl RecordingSynth {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                spoken: Mutex::new(Vec::new()),
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
            Ok(vec![0u8; 4])
        }
    }

    struct CountingSink {
        plays: AtomicUsize,
    }

    impl CountingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                plays: AtomicUsize::new(0),
            })
        }
    }

    impl AudioSink for CountingSink {
        fn play(&self, _mp3: &[u8]) -> Result<(), PlaybackError> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn assistant_with(
        recognizer: Arc<ScriptedRecognizer>,
        generator: Arc<dyn TextGenerator>,
        synth: Arc<RecordingSynth>,
        sink: Arc<CountingSink>,
    ) -> Assistant {
        Assistant::new(
            recognizer,
            TranslationGateway::new(Arc::new(EchoTranslator)),
            AnswerGenerator::new(generator),
            SpeechOutput::new(synth, sink),
        )
    }

    async fn wait_until_finished(handle: &SessionHandle) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !handle.is_finished() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn text_mode_answers_through_the_pivot() {
        let assistant = assistant_with(
            ScriptedRecognizer::new([]),
            Arc::new(EchoGenerator),
            RecordingSynth::new(),
            CountingSink::new(),
        );
        let out = assistant
            .answer("how much urea per acre", LanguageTag::Kannada)
            .await;
        assert_eq!(out, "how much urea per acre");
    }

    #[tokio::test]
    async fn text_mode_failure_degrades_to_marker() {
        let assistant = assistant_with(
            ScriptedRecognizer::new([]),
            Arc::new(FailGenerator),
            RecordingSynth::new(),
            CountingSink::new(),
        );
        let out = assistant.answer("anything", LanguageTag::Hindi).await;
        assert!(out.starts_with("AI error:"));
        assert!(out.contains("connection refused"));
    }

    #[tokio::test]
    async fn voice_loop_skips_silence_and_ends_on_stop_answer() {
        let recognizer = ScriptedRecognizer::new([
            CaptureOutcome::Utterance("hello".into()),
            CaptureOutcome::Silence,
            CaptureOutcome::Utterance("stop".into()),
        ]);
        let synth = RecordingSynth::new();
        let sink = CountingSink::new();
        let assistant = assistant_with(
            recognizer.clone(),
            Arc::new(EchoGenerator),
            synth.clone(),
            sink.clone(),
        );

        let cancel = CancellationToken::new();
        let phase = new_shared_phase();
        assistant
            .run(LanguageTag::Kannada, cancel, Arc::clone(&phase))
            .await;

        // Three capture cycles: answer, skip, stop.
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 3);
        // "hello" is spoken; the stop answer is suppressed by the output gate.
        assert_eq!(synth.spoken.lock().unwrap().as_slice(), ["hello"]);
        assert_eq!(sink.plays.load(Ordering::SeqCst), 1);
        assert_eq!(read_phase(&phase), SessionPhase::Stopped);
    }

    #[tokio::test]
    async fn voice_loop_survives_service_errors() {
        let recognizer = ScriptedRecognizer::new([
            CaptureOutcome::ServiceError("recognition backend down".into()),
            CaptureOutcome::Utterance("stop".into()),
        ]);
        let assistant = assistant_with(
            recognizer.clone(),
            Arc::new(EchoGenerator),
            RecordingSynth::new(),
            CountingSink::new(),
        );

        let phase = new_shared_phase();
        assistant
            .run(LanguageTag::Tamil, CancellationToken::new(), phase)
            .await;

        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stop_request_ends_a_session_stuck_in_silence() {
        // Script exhausted immediately: the recognizer returns Silence forever,
        // so only cancellation can end this loop.
        let assistant = Arc::new(assistant_with(
            ScriptedRecognizer::new([]),
            Arc::new(EchoGenerator),
            RecordingSynth::new(),
            CountingSink::new(),
        ));

        let handle = start_session(assistant, LanguageTag::English);
        assert_eq!(handle.language(), LanguageTag::English);

        handle.stop();
        wait_until_finished(&handle).await;
        assert_eq!(handle.phase(), SessionPhase::Stopped);
    }

    #[tokio::test]
    async fn start_session_returns_before_the_loop_ends() {
        let assistant = Arc::new(assistant_with(
            ScriptedRecognizer::new([CaptureOutcome::Utterance("stop".into())]),
            Arc::new(EchoGenerator),
            RecordingSynth::new(),
            CountingSink::new(),
        ));

        let handle = start_session(assistant, LanguageTag::Marathi);
        // The loop finishes on its own via the in-band stop token.
        wait_until_finished(&handle).await;
        assert!(handle.is_finished());
    }
}
