//! Application entry point — Agrivoice.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run) and apply
//!    environment credential overrides.
//! 3. Fail fast if no generation API key is configured.
//! 4. Build the reqwest-backed capability implementations and compose the
//!    [`Assistant`].
//! 5. Serve the axum router until the process is stopped.

use std::sync::Arc;

use anyhow::Context;

use agrivoice::{
    api::{self, ApiState},
    audio::playback::CpalSink,
    config::AppConfig,
    generate::{AnswerGenerator, GeminiGenerator},
    lang::LanguageTag,
    pipeline::Assistant,
    speech::{GoogleRecognizer, GoogleSynthesizer, SpeechOutput},
    translate::{GoogleTranslator, TranslationGateway},
    vision::{CropClassifier, RemoteCropClassifier},
    weather::WeatherClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()
        .context("failed to load settings")?
        .with_env_overrides();

    if config
        .generate
        .api_key
        .as_deref()
        .map_or(true, str::is_empty)
    {
        anyhow::bail!("no generation API key configured; set GEMINI_API_KEY");
    }

    let default_language: LanguageTag = config
        .default_language
        .0
        .parse()
        .with_context(|| format!("unsupported default language {:?}", config.default_language.0))?;

    let translator = TranslationGateway::new(Arc::new(GoogleTranslator::from_config(
        &config.translate,
    )));
    let generator = AnswerGenerator::new(Arc::new(GeminiGenerator::from_config(&config.generate)));
    let recognizer = Arc::new(GoogleRecognizer::from_config(&config.speech));
    let output = SpeechOutput::new(
        Arc::new(GoogleSynthesizer::from_config(&config.tts)),
        Arc::new(CpalSink::default()),
    );

    let assistant = Arc::new(Assistant::new(
        recognizer,
        translator.clone(),
        generator,
        output,
    ));

    let weather = {
        let client = WeatherClient::from_config(&config.weather);
        if client.is_configured() {
            Some(client)
        } else {
            log::warn!("no weather API key configured; /weather is disabled");
            None
        }
    };

    let crops: Option<Arc<dyn CropClassifier>> = {
        let classifier = RemoteCropClassifier::from_config(&config.vision);
        if classifier.is_configured() {
            Some(Arc::new(classifier))
        } else {
            log::warn!("no crop classifier endpoint configured; /detect_crop degrades in-band");
            None
        }
    };

    let state = Arc::new(ApiState::new(
        assistant,
        translator,
        weather,
        crops,
        default_language,
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("listening on {addr}");

    axum::serve(listener, api::router(state))
        .await
        .context("server error")?;

    Ok(())
}
