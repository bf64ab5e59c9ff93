//! Language detector trait.
//!
//! The chat service only cares whether a message is Russian, but detectors
//! report whatever code they find so logs stay informative.

use serde::{Deserialize, Serialize};
use crate::error::DetectionError;

/// A language code, ISO 639-1 where the detector knows one (`"ru"`, `"en"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageCode(pub String);

impl LanguageCode {
    pub const RUSSIAN: &'static str = "ru";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_russian(&self) -> bool {
        self.0 == Self::RUSSIAN
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classifies the language of a piece of text.
///
/// Implementations may fail on degenerate input (empty, too short, only
/// punctuation). Callers treat any failure as "not Russian".
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Result<LanguageCode, DetectionError>;
}

/// A detector that always answers with the same code. Useful in tests.
#[derive(Debug, Clone)]
pub struct FixedLanguage(pub Result<LanguageCode, DetectionError>);

impl LanguageDetector for FixedLanguage {
    fn detect(&self, _text: &str) -> Result<LanguageCode, DetectionError> {
        self.0.clone()
    }
}
