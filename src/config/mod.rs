//! Configuration module for Agrivoice.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform data directories, TOML persistence via
//! `AppConfig::load` / `AppConfig::save`, and environment-variable overrides
//! for service credentials.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, GenerateConfig, ServerConfig, SpeechConfig, TranslateConfig, TtsConfig,
    VisionConfig, WeatherConfig,
};
