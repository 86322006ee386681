//! HTTP translation backend against the public `translate_a/single` endpoint.
//!
//! The endpoint takes `sl=auto` (detect source) and `tl=<target>` and returns
//! a JSON array whose first element lists translated segments.  All
//! connection details come from [`TranslateConfig`]; nothing is hardcoded.

use async_trait::async_trait;

use crate::config::TranslateConfig;
use crate::lang::LanguageTag;
use crate::translate::gateway::{TranslateError, Translator};

/// Calls the free Google translation endpoint with auto source detection.
pub struct GoogleTranslator {
    client: reqwest::Client,
    config: TranslateConfig,
}

impl GoogleTranslator {
    /// Build a `GoogleTranslator` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`; a default client is the last-resort fallback if
    /// the builder fails (should never happen in practice).
    pub fn from_config(config: &TranslateConfig) -> Self {
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
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target: LanguageTag) -> Result<String, TranslateError> {
        let url = format!("{}/translate_a/single", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranslateError::Request(e.to_string()))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;

        // Shape: [[["translated", "original", …], …], …] — concatenate the
        // first field of every segment.
        let segments = json
            .get(0)
            .and_then(|v| v.as_array())
            .ok_or_else(|| TranslateError::Parse("missing segment array".into()))?;

        let mut translated = String::new();
        for segment in segments {
            if let Some(part) = segment.get(0).and_then(|v| v.as_str()) {
                translated.push_str(part);
            }
        }

        if translated.is_empty() {
            return Err(TranslateError::Parse("no translated segments".into()));
        }

        Ok(translated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
