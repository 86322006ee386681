//! Core `TextGenerator` trait and the fail-soft `AnswerGenerator`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::text::normalize;

// ---------------------------------------------------------------------------
// GenerateError
// ---------------------------------------------------------------------------

/// Errors that can occur during answer generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("generation request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse generation response: {0}")]
    Parse(String),

    /// The backend returned a response with no usable text content.
    #[error("generation returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerateError::Timeout
        } else {
            GenerateError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// TextGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for generative-text backends.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

// ---------------------------------------------------------------------------
// AnswerGenerator
// ---------------------------------------------------------------------------

/// Fail-soft generation front the pipeline calls.
///
/// * success → the answer with emphasis markers and comma spacing cleaned up,
/// * failure → a marker string naming the failure, so the user hears an
///   apology in their own language instead of getting silence or a crash.
///
/// This method never fails.  Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct AnswerGenerator {
    inner: Arc<dyn TextGenerator>,
}

impl AnswerGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>) -> Self {
        Self { inner }
    }

    /// Generate an answer for `prompt`, degrading to an in-band error marker.
    pub async fn generate(&self, prompt: &str) -> String {
        match self.inner.generate(prompt).await {
            Ok(answer) => normalize(&answer),
            Err(e) => {
                log::error!("answer generation failed: {e}");
                format!("AI error: {e}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    struct OkGenerator(String);

    #[async_trait]
    impl TextGenerator for OkGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            Ok(self.0.clone())
        }
    }

    struct FailGenerator(fn() -> GenerateError);

    #[async_trait]
    impl TextGenerator for FailGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            Err((self.0)())
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn success_is_normalised() {
        let gen = AnswerGenerator::new(Arc::new(OkGenerator("**Urea** ,then potash".into())));
        assert_eq!(gen.generate("q").await, "Urea, then potash");
    }

    #[tokio::test]
    async fn failure_yields_error_marker_not_panic() {
        let gen = AnswerGenerator::new(Arc::new(FailGenerator(|| {
            GenerateError::Request("connection refused".into())
        })));
        let out = gen.generate("q").await;
        assert!(out.starts_with("AI error:"));
        assert!(out.contains("connection refused"));
    }

    #[tokio::test]
    async fn timeout_yields_error_marker() {
        let gen = AnswerGenerator::new(Arc::new(FailGenerator(|| GenerateError::Timeout)));
        let out = gen.generate("q").await;
        assert!(out.starts_with("AI error:"));
    }

    #[tokio::test]
    async fn empty_response_yields_error_marker() {
        let gen = AnswerGenerator::new(Arc::new(FailGenerator(|| GenerateError::EmptyResponse)));
        assert!(gen.generate("q").await.contains("empty response"));
    }

    #[tokio::test]
    async fn always_returns_a_string() {
        let gen = AnswerGenerator::new(Arc::new(FailGenerator(|| {
            GenerateError::Parse("bad json".into())
        })));
        // Degraded, but never absent.
        assert!(!gen.generate("").await.is_empty());
    }

    #[test]
    fn generator_is_object_safe() {
        let _: Box<dyn TextGenerator> = Box::new(OkGenerator("ok".into()));
    }
}
