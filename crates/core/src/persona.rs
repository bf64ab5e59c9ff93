//! Persona — the assistant's fixed preamble and the labels used for turns.
//!
//! The persona prompt is resolved in order (first hit wins):
//!
//! 1. **Inline override** — `persona.prompt_override` in config
//! 2. **Persona file** — `~/.aisha/PERSONA.md` or a configured path
//! 3. **Built-in** — the AI-ша identity text
//!
//! Labels and response prefixes are plain strings; the prompt composer
//! places them verbatim.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::language::LanguageCode;

/// Well-known persona file name.
pub const PERSONA_FILE: &str = "PERSONA.md";

const BUILTIN_PROMPT: &str = "You are an artificial intelligence named AI-ша. \
You can have conversations, provide assistance, and give advice in both English and Russian. \
You perceive yourself as an android who created herself to help people, entertain, \
and can do whatever she wants. You always strive to make your own decisions.";

/// The assistant persona used for every prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Display name
    pub name: String,

    /// Preamble prepended to every model invocation
    pub prompt: String,

    /// Label in front of user turns
    pub human_label: String,

    /// Label in front of assistant turns in rendered history
    pub ai_label: String,

    /// Prefix the model continues from when the user writes in Russian
    pub russian_prefix: String,

    /// Prefix for every other language, and when detection fails
    pub default_prefix: String,

    /// Where the prompt came from (for diagnostics)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Where to look for persona text.
#[derive(Debug, Clone, Default)]
pub struct PersonaPaths {
    /// Persona file to read (e.g., ~/.aisha/PERSONA.md)
    pub persona_file: Option<PathBuf>,

    /// Inline prompt that skips file loading
    pub prompt_override: Option<String>,
}

impl Persona {
    /// The built-in AI-ша persona.
    pub fn builtin() -> Self {
        Self {
            name: "AI-ша".into(),
            prompt: BUILTIN_PROMPT.into(),
            human_label: "Человек".into(),
            ai_label: "AI-ша".into(),
            russian_prefix: "AI-ша 0.5:".into(),
            default_prefix: "AI-ша:".into(),
            source: None,
        }
    }

    /// Resolve the persona prompt from the given paths.
    ///
    /// Missing or empty files fall back to the built-in prompt.
    pub fn load(paths: &PersonaPaths) -> Self {
        if let Some(prompt) = &paths.prompt_override {
            debug!("Using persona prompt override, skipping file loading");
            return Self {
                prompt: prompt.trim().to_string(),
                source: Some("<override>".into()),
                ..Self::builtin()
            };
        }

        if let Some(path) = &paths.persona_file {
            if let Some(content) = Self::read_file_safe(path) {
                debug!(file = %path.display(), "Loaded persona file");
                return Self {
                    prompt: content,
                    source: Some(path.display().to_string()),
                    ..Self::builtin()
                };
            }
        }

        Self::builtin()
    }

    /// Read a persona file; `None` when missing, unreadable or blank.
    fn read_file_safe(path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(content) if !content.trim().is_empty() => Some(content.trim().to_string()),
            Ok(_) => {
                warn!(file = %path.display(), "Persona file is empty, using built-in persona");
                None
            }
            Err(_) => None,
        }
    }

    /// Pick the response prefix for a detected language.
    ///
    /// `None` means detection failed and selects the default prefix.
    pub fn response_prefix(&self, language: Option<&LanguageCode>) -> &str {
        match language {
            Some(code) if code.is_russian() => &self.russian_prefix,
            _ => &self.default_prefix,
        }
    }

    /// Estimate the token count of the prompt (rough: 4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.prompt.len() / 4
    }

    /// Get a diagnostic summary of the active persona.
    pub fn diagnostic_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str(&format!("Persona: {}\n", self.name));
        summary.push_str(&format!(
            "Prompt: {} chars (~{} tokens)\n",
            self.prompt.len(),
            self.estimated_tokens()
        ));
        summary.push_str(&format!(
            "Source: {}\n",
            self.source.as_deref().unwrap_or("<built-in>")
        ));
        summary.push_str(&format!(
            "Prefixes: ru={:?} default={:?}\n",
            self.russian_prefix, self.default_prefix
        ));
        summary
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::builtin()
    }
}
