//! Localized weather lookups.
//!
//! Thin client over the OpenWeather `data/2.5/weather` endpoint.  Only the
//! condition description is translated; numeric fields stay as the service
//! returned them (metric units).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::WeatherConfig;
use crate::lang::LanguageTag;
use crate::translate::TranslationGateway;

// ---------------------------------------------------------------------------
// WeatherError
// ---------------------------------------------------------------------------

/// Errors that can occur during a weather lookup.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// No API key was configured; lookups cannot be attempted at all.
    #[error("no weather API key configured")]
    MissingApiKey,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("weather request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse weather response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            WeatherError::Timeout
        } else {
            WeatherError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// One weather condition entry; `description` is rewritten into the caller's
/// language before the report is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub main: String,
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// Temperature and humidity block, metric units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherMain {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherWind {
    pub speed: f64,
    #[serde(default)]
    pub deg: i64,
}

/// Weather report for one city.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub name: String,
    pub weather: Vec<WeatherCondition>,
    pub main: WeatherMain,
    #[serde(default)]
    pub wind: Option<WeatherWind>,
}

// ---------------------------------------------------------------------------
// WeatherClient
// ---------------------------------------------------------------------------

/// OpenWeather lookup client.
#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    config: WeatherConfig,
}

impl WeatherClient {
    /// Build a `WeatherClient` from application config.
    pub fn from_config(config: &WeatherConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// True when a lookup can be attempted at all.
    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.is_empty())
    }

    /// Fetch the current weather for `city`, translating the condition
    /// description into `language`.
    pub async fn current(
        &self,
        city: &str,
        language: LanguageTag,
        translator: &TranslationGateway,
    ) -> Result<WeatherReport, WeatherError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(WeatherError::MissingApiKey)?;

        let url = format!("{}/data/2.5/weather", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", city), ("appid", key), ("units", "metric")])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| WeatherError::Request(e.to_string()))?;

        let mut report: WeatherReport = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        for condition in &mut report.weather {
            condition.description = translator.translate(&condition.description, language).await;
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
