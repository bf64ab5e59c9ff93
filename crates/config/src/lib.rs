//! Configuration loading, validation, and management for Aisha.
//!
//! Loads configuration from `~/.aisha/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use aisha_core::persona::{PERSONA_FILE, Persona, PersonaPaths};
use aisha_core::provider::GenerationParams;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.aisha/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling parameters for every generation call
    #[serde(default)]
    pub generation: GenerationParams,

    /// Conversation history cache
    #[serde(default)]
    pub history: HistoryConfig,

    /// Chat request handling
    #[serde(default)]
    pub chat: ChatConfig,

    /// Persona text and labels
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-1.5-flash".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("generation", &self.generation)
            .field("history", &self.history)
            .field("chat", &self.chat)
            .field("persona", &self.persona)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Seconds after which a history entry is evicted on the next insert
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    600
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Reject empty or whitespace-only messages before calling the model
    #[serde(default = "default_true")]
    pub reject_blank_messages: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reject_blank_messages: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Override the persona prompt entirely (skips file loading)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_override: Option<String>,

    /// Persona file to load (default: ~/.aisha/PERSONA.md)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_file: Option<String>,

    #[serde(default = "default_human_label")]
    pub human_label: String,

    #[serde(default = "default_ai_label")]
    pub ai_label: String,

    #[serde(default = "default_russian_prefix")]
    pub russian_prefix: String,

    #[serde(default = "default_response_prefix")]
    pub default_prefix: String,
}

fn default_human_label() -> String {
    Persona::builtin().human_label
}
fn default_ai_label() -> String {
    Persona::builtin().ai_label
}
fn default_russian_prefix() -> String {
    Persona::builtin().russian_prefix
}
fn default_response_prefix() -> String {
    Persona::builtin().default_prefix
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            prompt_override: None,
            persona_file: None,
            human_label: default_human_label(),
            ai_label: default_ai_label(),
            russian_prefix: default_russian_prefix(),
            default_prefix: default_response_prefix(),
        }
    }
}

impl PersonaConfig {
    /// Resolve the configured persona: prompt from override/file/built-in,
    /// labels from this section.
    pub fn resolve(&self) -> Persona {
        let persona_file = self
            .persona_file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| AppConfig::config_dir().join(PERSONA_FILE));

        let base = Persona::load(&PersonaPaths {
            persona_file: Some(persona_file),
            prompt_override: self.prompt_override.clone(),
        });

        Persona {
            human_label: self.human_label.clone(),
            ai_label: self.ai_label.clone(),
            russian_prefix: self.russian_prefix.clone(),
            default_prefix: self.default_prefix.clone(),
            ..base
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// CORS origins. `["*"]` allows any origin.
    #[serde(default = "default_allow_origins")]
    pub allow_origins: Vec<String>,

    /// Maximum accepted request body size
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_allow_origins() -> Vec<String> {
    vec!["*".into()]
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allow_origins: default_allow_origins(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Provider names with a built-in endpoint. Any other name needs an
/// explicit `api_url`.
pub const KNOWN_PROVIDERS: &[&str] = &[
    "gemini",
    "google",
    "openai",
    "ollama",
    "together",
    "fireworks",
    "vllm",
    "llamacpp",
    "llama.cpp",
];

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.aisha/config.toml).
    ///
    /// Environment variables override file values:
    /// - `AISHA_API_KEY` (highest priority), `GEMINI_API_KEY`, `OPENAI_API_KEY`
    /// - `AISHA_PROVIDER`, `AISHA_MODEL`
    /// - `AISHA_HOST`, `AISHA_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given variable lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("AISHA_API_KEY")
            .or_else(|| self.api_key.clone())
            .or_else(|| lookup("GEMINI_API_KEY"))
            .or_else(|| lookup("OPENAI_API_KEY"));
        self.api_key = api_key;

        if let Some(provider) = lookup("AISHA_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("AISHA_MODEL") {
            self.default_model = model;
        }

        if let Some(host) = lookup("AISHA_HOST") {
            self.gateway.host = host;
        }

        if let Some(port) = lookup("AISHA_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("AISHA_PORT is not a valid port: {port}"))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aisha")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.generation;
        if !(0.0..=2.0).contains(&g.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if g.top_p <= 0.0 || g.top_p > 1.0 {
            return Err(ConfigError::ValidationError(
                "generation.top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if g.top_k == 0 || g.max_output_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "generation.top_k and generation.max_output_tokens must be > 0".into(),
            ));
        }

        if self.history.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "history.ttl_secs must be > 0".into(),
            ));
        }

        let p = &self.persona;
        if [&p.human_label, &p.ai_label, &p.russian_prefix, &p.default_prefix]
            .iter()
            .any(|s| s.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "persona labels and prefixes must not be empty".into(),
            ));
        }

        let has_url = |name: &str| {
            self.providers
                .get(name)
                .is_some_and(|p| p.api_url.as_deref().is_some_and(|u| !u.trim().is_empty()))
        };
        let names = std::iter::once(self.default_provider.as_str())
            .chain(self.providers.keys().map(String::as_str));
        for name in names {
            if !KNOWN_PROVIDERS.contains(&name) && !has_url(name) {
                return Err(ConfigError::ValidationError(format!(
                    "provider '{name}' is not built in; set providers.{name}.api_url"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// The model to request: the default provider's own `default_model`
    /// if set, otherwise the top-level `default_model`.
    pub fn active_model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.as_deref())
            .unwrap_or(&self.default_model)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            generation: GenerationParams::default(),
            history: HistoryConfig::default(),
            chat: ChatConfig::default(),
            persona: PersonaConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
