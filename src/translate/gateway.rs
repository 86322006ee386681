//! Core `Translator` trait and the best-effort `TranslationGateway`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::lang::LanguageTag;

// ---------------------------------------------------------------------------
// TranslateError
// ---------------------------------------------------------------------------

/// Errors that can occur during translation.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("translation request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse translation response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslateError::Timeout
        } else {
            TranslateError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Translator trait
// ---------------------------------------------------------------------------

/// Async trait for translation backends.
///
/// The source language is auto-detected by the backend; only the target is
/// specified.  Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn Translator>`.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: LanguageTag) -> Result<String, TranslateError>;
}

// ---------------------------------------------------------------------------
// TranslationGateway
// ---------------------------------------------------------------------------

/// Best-effort translation front the pipeline calls.
///
/// Guarantees, regardless of what the backend does:
///
/// * empty input returns the empty string with no remote call,
/// * a backend failure is logged and the original text is returned unchanged,
/// * the return value is always present — this method cannot fail.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct TranslationGateway {
    inner: Arc<dyn Translator>,
}

impl TranslationGateway {
    pub fn new(inner: Arc<dyn Translator>) -> Self {
        Self { inner }
    }

    /// Translate `text` into `target`, falling back to `text` on any failure.
    pub async fn translate(&self, text: &str, target: LanguageTag) -> String {
        if text.is_empty() {
            return String::new();
        }
        match self.inner.translate(text, target).await {
            Ok(translated) => translated,
            Err(e) => {
                log::warn!("translation to {target} failed ({e}); passing text through");
                text.to_string()
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
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Succeeds with a fixed string and counts invocations.
    struct CountingTranslator {
        reply: String,
        calls: AtomicUsize,
    }

    impl CountingTranslator {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.into(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Translator for CountingTranslator {
        async fn translate(
            &self,
            _text: &str,
            _target: LanguageTag,
        ) -> Result<String, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    /// Always returns the given error kind.
    struct FailingTranslator(fn() -> TranslateError);

    #[async_trait]
    impl Translator for FailingTranslator {
        async fn translate(
            &self,
            _text: &str,
            _target: LanguageTag,
        ) -> Result<String, TranslateError> {
            Err((self.0)())
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn passes_through_success() {
        let backend = CountingTranslator::new("ಅನುವಾದ");
        let gateway = TranslationGateway::new(backend.clone());
        let out = gateway.translate("hello", LanguageTag::Kannada).await;
        assert_eq!(out, "ಅನುವಾದ");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_input_makes_no_remote_call() {
        let backend = CountingTranslator::new("should not appear");
        let gateway = TranslationGateway::new(backend.clone());
        let out = gateway.translate("", LanguageTag::Hindi).await;
        assert_eq!(out, "");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn request_failure_returns_original_text() {
        let gateway = TranslationGateway::new(Arc::new(FailingTranslator(|| {
            TranslateError::Request("connection refused".into())
        })));
        let out = gateway.translate("original", LanguageTag::Tamil).await;
        assert_eq!(out, "original");
    }

    #[tokio::test]
    async fn timeout_returns_original_text() {
        let gateway =
            TranslationGateway::new(Arc::new(FailingTranslator(|| TranslateError::Timeout)));
        let out = gateway.translate("ಪ್ರಶ್ನೆ", LanguageTag::English).await;
        assert_eq!(out, "ಪ್ರಶ್ನೆ");
    }

    #[tokio::test]
    async fn parse_failure_returns_original_text() {
        let gateway = TranslationGateway::new(Arc::new(FailingTranslator(|| {
            TranslateError::Parse("bad json".into())
        })));
        let out = gateway.translate("text", LanguageTag::Telugu).await;
        assert_eq!(out, "text");
    }

    /// The gateway must be usable behind a trait object chain.
    #[test]
    fn translator_is_object_safe() {
        let backend = CountingTranslator::new("x");
        let _: Box<dyn Translator> = Box::new(FailingTranslator(|| TranslateError::Timeout));
        drop(TranslationGateway::new(backend));
    }
}
