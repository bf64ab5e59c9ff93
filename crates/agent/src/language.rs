//! Statistical language detection backed by `whatlang`.
//!
//! Detection is restricted to the languages the persona actually speaks.
//! Short chat turns carry too few trigrams to tell close relatives apart
//! ("Спасибо" scores as Ukrainian with every language enabled), so each
//! script resolves to the one allowed language written in it. Text in a
//! script with no allowed language is undetermined.

use aisha_core::error::DetectionError;
use aisha_core::language::{LanguageCode, LanguageDetector};
use whatlang::{Detector, Lang};

/// Languages recognised by default.
pub const DEFAULT_LANGUAGES: &[Lang] = &[Lang::Rus, Lang::Eng];

/// Trigram-based detector. Works offline and needs no model files.
#[derive(Debug, Clone)]
pub struct WhatlangDetector {
    languages: Vec<Lang>,
}

impl WhatlangDetector {
    pub fn new() -> Self {
        Self::with_languages(DEFAULT_LANGUAGES.to_vec())
    }

    /// Restrict detection to `languages`.
    pub fn with_languages(languages: Vec<Lang>) -> Self {
        Self { languages }
    }

    /// ISO 639-1 code for the languages we are likely to meet, the
    /// detector's ISO 639-3 code otherwise.
    fn code(lang: Lang) -> &'static str {
        match lang {
            Lang::Rus => "ru",
            Lang::Eng => "en",
            Lang::Ukr => "uk",
            Lang::Bel => "be",
            Lang::Bul => "bg",
            Lang::Deu => "de",
            Lang::Fra => "fr",
            Lang::Spa => "es",
            Lang::Ita => "it",
            Lang::Por => "pt",
            other => other.code(),
        }
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<LanguageCode, DetectionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DetectionError::EmptyInput);
        }

        Detector::with_allowlist(self.languages.clone())
            .detect(text)
            .map(|info| LanguageCode::new(Self::code(info.lang())))
            .ok_or(DetectionError::Undetermined {
                chars: text.chars().count(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Result<LanguageCode, DetectionError> {
        WhatlangDetector::new().detect(text)
    }

    #[test]
    fn detects_russian_sentence() {
        let code = detect("Привет! Как у тебя сегодня дела? Расскажи мне что-нибудь интересное о себе.")
            .unwrap();
        assert!(code.is_russian(), "got {code}");
    }

    #[test]
    fn detects_english_sentence() {
        let code = detect("Hello there! How are you doing today? Tell me something interesting about yourself.")
            .unwrap();
        assert_eq!(code.as_str(), "en");
    }

    #[test]
    fn short_russian_turns_are_russian() {
        for text in ["Спасибо", "Расскажи анекдот", "Привет", "Да", "Как дела?"] {
            let code = detect(text).unwrap();
            assert!(code.is_russian(), "{text:?} -> {code}");
        }
    }

    #[test]
    fn short_english_turns_are_english() {
        for text in ["Hello", "Hi", "Thanks!", "Tell me a joke"] {
            assert_eq!(detect(text).unwrap().as_str(), "en", "{text:?}");
        }
    }

    #[test]
    fn unsupported_script_is_undetermined() {
        assert!(matches!(
            detect("こんにちは"),
            Err(DetectionError::Undetermined { .. })
        ));
    }

    #[test]
    fn wider_allowlist_reports_other_languages() {
        let detector = WhatlangDetector::with_languages(vec![Lang::Rus, Lang::Eng, Lang::Deu]);
        let code = detector
            .detect("Guten Morgen! Wie geht es dir heute? Ich habe eine Frage zu deinem Buch.")
            .unwrap();
        assert_eq!(code.as_str(), "de");
    }

    #[test]
    fn empty_input_fails() {
        assert_eq!(detect(""), Err(DetectionError::EmptyInput));
        assert_eq!(detect("   \n"), Err(DetectionError::EmptyInput));
    }

    #[test]
    fn symbols_only_fail() {
        assert!(detect("12345 !!! ???").is_err());
    }
}
