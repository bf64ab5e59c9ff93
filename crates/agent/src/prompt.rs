//! Prompt composition.
//!
//! The model sees one flat text document:
//!
//! ```text
//! <persona prompt>
//! <rendered history, possibly empty>
//! <human_label>: <user message>
//! <response prefix>
//! ```
//!
//! The prompt ends exactly at the response prefix so the model's
//! continuation is the reply.

use aisha_core::language::{LanguageCode, LanguageDetector};
use aisha_core::persona::Persona;
use tracing::debug;

/// Detect the message language, treating any failure as "unknown".
pub fn detect_language(detector: &dyn LanguageDetector, text: &str) -> Option<LanguageCode> {
    match detector.detect(text) {
        Ok(code) => Some(code),
        Err(e) => {
            debug!(error = %e, "Language detection failed, using default prefix");
            None
        }
    }
}

/// Render the full prompt for one turn.
pub fn compose(
    persona: &Persona,
    history_text: &str,
    user_message: &str,
    response_prefix: &str,
) -> String {
    let mut prompt = String::with_capacity(
        persona.prompt.len()
            + history_text.len()
            + persona.human_label.len()
            + user_message.len()
            + response_prefix.len()
            + 8,
    );
    prompt.push_str(&persona.prompt);
    prompt.push('\n');
    prompt.push_str(history_text);
    prompt.push('\n');
    prompt.push_str(&persona.human_label);
    prompt.push_str(": ");
    prompt.push_str(user_message);
    prompt.push('\n');
    prompt.push_str(response_prefix);
    prompt
}
