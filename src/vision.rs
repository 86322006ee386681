//! Crop-image diagnosis.
//!
//! The classifier model runs as a remote service invoked as a black box;
//! [`CropClassifier`] is the seam, [`RemoteCropClassifier`] the HTTP-backed
//! implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::VisionConfig;

// ---------------------------------------------------------------------------
// VisionError
// ---------------------------------------------------------------------------

/// Errors that can occur during crop classification.
#[derive(Debug, Error)]
pub enum VisionError {
    /// No classifier endpoint was configured.
    #[error("no crop classifier endpoint configured")]
    NotConfigured,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("classification request timed out")]
    Timeout,

    /// The service response carried no usable label.
    #[error("classification returned no label")]
    NoLabel,
}

impl From<reqwest::Error> for VisionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            VisionError::Timeout
        } else {
            VisionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// CropClassifier trait
// ---------------------------------------------------------------------------

/// Async trait for crop-image classification backends.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn CropClassifier>`.
#[async_trait]
pub trait CropClassifier: Send + Sync {
    /// Classify an uploaded image, returning the crop label.
    async fn classify(&self, image: &[u8]) -> Result<String, VisionError>;
}

// ---------------------------------------------------------------------------
// RemoteCropClassifier
// ---------------------------------------------------------------------------

/// Posts the raw image as a multipart upload to the configured model service
/// and reads the label out of its JSON reply.
pub struct RemoteCropClassifier {
    client: reqwest::Client,
    config: VisionConfig,
}

impl RemoteCropClassifier {
    /// Build a `RemoteCropClassifier` from application config.
    pub fn from_config(config: &VisionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// True when an endpoint is configured.
    pub fn is_configured(&self) -> bool {
        self.config
            .endpoint
            .as_deref()
            .is_some_and(|e| !e.is_empty())
    }
}

#[async_trait]
impl CropClassifier for RemoteCropClassifier {
    async fn classify(&self, image: &[u8]) -> Result<String, VisionError> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or(VisionError::NotConfigured)?;

        let part = reqwest::multipart::Part::bytes(image.to_vec()).file_name("crop.jpg");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| VisionError::Request(e.to_string()))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VisionError::Request(e.to_string()))?;

        let label = json["crop"]
            .as_str()
            .or_else(|| json["label"].as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        if label.is_empty() {
            return Err(VisionError::NoLabel);
        }

        Ok(label)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
