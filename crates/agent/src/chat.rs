//! The chat service: one user message in, one model reply out.

use std::sync::Arc;
use aisha_core::error::ProviderError;
use aisha_core::language::LanguageDetector;
use aisha_core::persona::Persona;
use aisha_core::provider::{GenerationParams, GenerationRequest, Provider};
use aisha_memory::HistoryCache;
use tracing::{debug, error, info};

use crate::language::WhatlangDetector;
use crate::prompt::{compose, detect_language};

/// Message returned to callers for any failed chat turn.
pub const GENERIC_FAILURE_DETAIL: &str = "Ошибка обработки сообщения.";

/// Message returned to callers when a blank message is rejected.
pub const EMPTY_MESSAGE_DETAIL: &str = "Сообщение не может быть пустым.";

/// Why a chat turn produced no reply.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Model invocation failed: {0}")]
    Provider(#[from] ProviderError),
}

impl ChatError {
    /// The localized text safe to show to the caller. Never contains
    /// internal details.
    pub fn public_detail(&self) -> &'static str {
        match self {
            ChatError::EmptyMessage => EMPTY_MESSAGE_DETAIL,
            ChatError::Provider(_) => GENERIC_FAILURE_DETAIL,
        }
    }
}

/// Orchestrates a single chat turn.
pub struct ChatService {
    /// The text-generation provider
    provider: Arc<dyn Provider>,

    /// The model to request
    model: String,

    /// Sampling parameters
    params: GenerationParams,

    /// Language classifier for response-prefix selection
    detector: Arc<dyn LanguageDetector>,

    /// Persona text and labels
    persona: Persona,

    /// Shared short-term history
    history: Arc<HistoryCache>,

    /// Reject empty or whitespace-only messages before calling the provider
    reject_blank: bool,
}

impl ChatService {
    /// Create a chat service with the built-in persona, default sampling
    /// parameters and the `whatlang` detector.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        history: Arc<HistoryCache>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            params: GenerationParams::default(),
            detector: Arc::new(WhatlangDetector::new()),
            persona: Persona::default(),
            history,
            reject_blank: true,
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Whether blank messages are rejected (`true`) or sent to the model as-is.
    pub fn with_blank_rejection(mut self, reject: bool) -> Self {
        self.reject_blank = reject;
        self
    }

    pub fn history(&self) -> &Arc<HistoryCache> {
        &self.history
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Build the prompt for `message` from the current history.
    pub fn build_prompt(&self, message: &str) -> String {
        let language = detect_language(self.detector.as_ref(), message);
        let prefix = self.persona.response_prefix(language.as_ref());
        let history = self.history.render(&self.persona);

        debug!(
            language = language.as_ref().map(|l| l.as_str()).unwrap_or("unknown"),
            history_len = history.len(),
            "Composing prompt"
        );

        compose(&self.persona, &history, message, prefix)
    }

    /// Produce a reply for `message` and record the turn.
    ///
    /// Provider failures are logged here with full detail; the returned
    /// error's [`ChatError::public_detail`] is what callers should show.
    pub async fn reply(&self, message: &str) -> Result<String, ChatError> {
        info!(message_len = message.len(), "Chat message received");

        if self.reject_blank && message.trim().is_empty() {
            debug!("Rejecting blank message");
            return Err(ChatError::EmptyMessage);
        }

        let request = GenerationRequest {
            model: self.model.clone(),
            prompt: self.build_prompt(message),
            params: self.params,
        };

        let response = match self.provider.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(provider = %self.provider.name(), model = %self.model, error = %e, "Error processing message");
                return Err(e.into());
            }
        };

        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Model replied"
            );
        }

        self.history.insert(message, response.text.as_str());
        Ok(response.text)
    }
}
