//! Application settings structs, defaults, TOML persistence and environment
//! credential overrides.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Credentials are never required to be present in the file — they can be
//! supplied through `GEMINI_API_KEY`, `OPENWEATHER_API_KEY` and
//! `SPEECH_API_KEY`, which take precedence over file values.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
        }
    }
}

// ---------------------------------------------------------------------------
// TranslateConfig
// ---------------------------------------------------------------------------

/// Settings for the translation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Base URL of the translation endpoint.
    pub base_url: String,
    /// Maximum seconds to wait for a translation response.
    pub timeout_secs: u64,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.googleapis.com".into(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// GenerateConfig
// ---------------------------------------------------------------------------

/// Settings for the answer-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Base URL of the generative API.
    pub base_url: String,
    /// Model identifier sent to the API.
    pub model: String,
    /// API key — required; startup fails loudly when absent.
    pub api_key: Option<String>,
    /// Maximum seconds to wait for a generated answer.
    pub timeout_secs: u64,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            model: "gemini-1.5-pro".into(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for microphone capture and speech recognition.
///
/// The three duration bounds are configuration constants, not per-call
/// parameters: every capture uses the same ambient-calibration window, the
/// same total wait for speech to start, and the same phrase ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Base URL of the recognition endpoint.
    pub base_url: String,
    /// API key for the recognition service — `None` uses the public key-less
    /// endpoint where available.
    pub api_key: Option<String>,
    /// Seconds spent measuring ambient noise before listening.
    pub ambient_adjust_secs: f32,
    /// Maximum seconds to wait for speech to begin.
    pub total_timeout_secs: u64,
    /// Maximum length of a single utterance in seconds.
    pub max_phrase_secs: u64,
    /// Maximum seconds to wait for the recognition HTTP response.
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.google.com/speech-api/v2".into(),
            api_key: None,
            ambient_adjust_secs: 1.0,
            total_timeout_secs: 60,
            max_phrase_secs: 45,
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-synthesis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Base URL of the synthesis endpoint.
    pub base_url: String,
    /// Maximum seconds to wait for synthesized audio.
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.google.com".into(),
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// WeatherConfig
// ---------------------------------------------------------------------------

/// Settings for the weather lookup service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL of the weather API.
    pub base_url: String,
    /// API key — weather endpoints return a configuration error without it.
    pub api_key: Option<String>,
    /// Maximum seconds to wait for a weather response.
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org".into(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// VisionConfig
// ---------------------------------------------------------------------------

/// Settings for the remote crop-image classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Inference endpoint URL — `None` disables crop diagnosis.
    pub endpoint: Option<String>,
    /// Maximum seconds to wait for a classification.
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use agrivoice::config::AppConfig;
///
/// // Load (returns Default when file is missing), then apply env overrides.
/// let config = AppConfig::load().unwrap().with_env_overrides();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default answer language for requests that do not specify one.
    #[serde(default)]
    pub default_language: DefaultLanguage,
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Translation service settings.
    #[serde(default)]
    pub translate: TranslateConfig,
    /// Answer-generation settings.
    #[serde(default)]
    pub generate: GenerateConfig,
    /// Microphone and recognition settings.
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Speech-synthesis settings.
    #[serde(default)]
    pub tts: TtsConfig,
    /// Weather lookup settings.
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Crop-image classifier settings.
    #[serde(default)]
    pub vision: VisionConfig,
}

/// Newtype so the default language has a serde default of `"kn"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultLanguage(pub String);

impl Default for DefaultLanguage {
    fn default() -> Self {
        Self("kn".into())
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay credential environment variables onto the file values.
    ///
    /// `GEMINI_API_KEY`, `OPENWEATHER_API_KEY` and `SPEECH_API_KEY` win over
    /// whatever `settings.toml` contains; unset or empty variables leave the
    /// file values untouched.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = non_empty_env("GEMINI_API_KEY") {
            self.generate.api_key = Some(key);
        }
        if let Some(key) = non_empty_env("OPENWEATHER_API_KEY") {
            self.weather.api_key = Some(key);
        }
        if let Some(key) = non_empty_env("SPEECH_API_KEY") {
            self.speech.api_key = Some(key);
        }
        self
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
