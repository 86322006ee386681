//! Supported language tags.
//!
//! Every locale the assistant can recognise, translate into and speak is a
//! variant of [`LanguageTag`].  Anything else is rejected with
//! [`LanguageError::Unsupported`] at the boundary, before any pipeline work
//! starts — there is deliberately no "unknown" variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The common intermediate language all translations are routed through.
pub const PIVOT_LANGUAGE: LanguageTag = LanguageTag::English;

// ---------------------------------------------------------------------------
// LanguageError
// ---------------------------------------------------------------------------

/// Rejection of a language code outside the supported set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LanguageError {
    /// The given code is not one of the supported ISO-639-1 tags.
    #[error("language not supported: {0:?} (supported: en, hi, ta, kn, te, mr)")]
    Unsupported(String),
}

// ---------------------------------------------------------------------------
// LanguageTag
// ---------------------------------------------------------------------------

/// A supported locale for recognition, translation and speech output.
///
/// Serialises as the bare ISO-639-1 code (`"kn"`, `"hi"`, …) so it can be
/// used directly in form fields, query strings and config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageTag {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "ta")]
    Tamil,
    #[serde(rename = "kn")]
    Kannada,
    #[serde(rename = "te")]
    Telugu,
    #[serde(rename = "mr")]
    Marathi,
}

impl LanguageTag {
    /// All supported tags, in a stable order.
    pub const ALL: [LanguageTag; 6] = [
        LanguageTag::English,
        LanguageTag::Hindi,
        LanguageTag::Tamil,
        LanguageTag::Kannada,
        LanguageTag::Telugu,
        LanguageTag::Marathi,
    ];

    /// The ISO-639-1 code used by the translation and synthesis services.
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageTag::English => "en",
            LanguageTag::Hindi => "hi",
            LanguageTag::Tamil => "ta",
            LanguageTag::Kannada => "kn",
            LanguageTag::Telugu => "te",
            LanguageTag::Marathi => "mr",
        }
    }

    /// The regional locale passed to the speech recognition service.
    ///
    /// Recognition accuracy for Indic languages is markedly better with the
    /// `-IN` regional variants than with the bare language code.
    pub fn speech_locale(self) -> &'static str {
        match self {
            LanguageTag::English => "en-IN",
            LanguageTag::Hindi => "hi-IN",
            LanguageTag::Tamil => "ta-IN",
            LanguageTag::Kannada => "kn-IN",
            LanguageTag::Telugu => "te-IN",
            LanguageTag::Marathi => "mr-IN",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageTag {
    type Err = LanguageError;

    /// Parse a bare ISO code.  Case-sensitive on purpose — the supported set
    /// is published in lowercase and the HTTP layer forwards codes verbatim.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(LanguageTag::English),
            "hi" => Ok(LanguageTag::Hindi),
            "ta" => Ok(LanguageTag::Tamil),
            "kn" => Ok(LanguageTag::Kannada),
            "te" => Ok(LanguageTag::Telugu),
            "mr" => Ok(LanguageTag::Marathi),
            other => Err(LanguageError::Unsupported(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_supported_code() {
        for tag in LanguageTag::ALL {
            assert_eq!(tag.as_str().parse::<LanguageTag>().unwrap(), tag);
        }
    }

    #[test]
    fn rejects_unsupported_code() {
        let err = "fr".parse::<LanguageTag>().unwrap_err();
        assert_eq!(err, LanguageError::Unsupported("fr".into()));
    }

    #[test]
    fn rejects_empty_code() {
        assert!("".parse::<LanguageTag>().is_err());
    }

    #[test]
    fn rejects_uppercase_code() {
        assert!("KN".parse::<LanguageTag>().is_err());
    }

    #[test]
    fn speech_locales_are_regional() {
        for tag in LanguageTag::ALL {
            assert!(tag.speech_locale().ends_with("-IN"));
            assert!(tag.speech_locale().starts_with(tag.as_str()));
        }
    }

    #[test]
    fn pivot_is_english() {
        assert_eq!(PIVOT_LANGUAGE, LanguageTag::English);
        assert_eq!(PIVOT_LANGUAGE.as_str(), "en");
    }

    #[test]
    fn serde_round_trip_uses_bare_code() {
        let json = serde_json::to_string(&LanguageTag::Kannada).unwrap();
        assert_eq!(json, "\"kn\"");
        let back: LanguageTag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, LanguageTag::Kannada);
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(LanguageTag::Marathi.to_string(), "mr");
    }
}
