//! Gemini `generateContent` REST backend.
//!
//! All connection details (`base_url`, `model`, `api_key`) come exclusively
//! from [`GenerateConfig`].  The key is validated at startup, so by the time
//! a request is made it is always present.

use async_trait::async_trait;

use crate::config::GenerateConfig;
use crate::generate::generator::{GenerateError, TextGenerator};

/// Calls the Gemini `models/{model}:generateContent` endpoint.
pub struct GeminiGenerator {
    client: reqwest::Client,
    config: GenerateConfig,
}

impl GeminiGenerator {
    /// Build a `GeminiGenerator` from application config.
    pub fn from_config(config: &GenerateConfig) -> Self {
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
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        let body = serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let key = self.config.api_key.as_deref().unwrap_or("");

        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| GenerateError::Request(e.to_string()))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerateError::Parse(e.to_string()))?;

        let answer = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or(GenerateError::EmptyResponse)?
            .trim()
            .to_string();

        if answer.is_empty() {
            return Err(GenerateError::EmptyResponse);
        }

        Ok(answer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
