//! Shared test helpers for chat pipeline tests.

use aisha_core::error::ProviderError;
use aisha_core::provider::{GenerationRequest, GenerationResponse, Provider, Usage};
use std::sync::Mutex;

/// A mock provider that returns a fixed reply and records every prompt.
pub struct RecordingProvider {
    reply: Result<String, ProviderError>,
    prompts: Mutex<Vec<GenerationRequest>>,
}

impl RecordingProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().map(|r| r.prompt.clone())
    }
}

#[async_trait::async_trait]
impl Provider for RecordingProvider {
    fn name(&self) -> &str {
        "recording_mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let model = request.model.clone();
        self.prompts.lock().unwrap().push(request);
        let text = self.reply.clone()?;
        Ok(GenerationResponse {
            text,
            model,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }
}
