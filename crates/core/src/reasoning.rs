//! The language-reasoning capability.
//!
//! Each reasoning stage (planner, analyzer) is the same capability
//! parameterized by different instructions: `complete(instructions, prompt)`
//! returns free text that the caller must treat as untrusted.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ProviderError;
use crate::message::Message;
use crate::provider::{Provider, ProviderRequest};

/// Anything that can turn (instructions, prompt) into free text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// A human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Run one completion. No schema is enforced on the returned text.
    async fn complete(&self, instructions: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Adapts a chat [`Provider`] to the [`LanguageModel`] capability.
///
/// Instructions become the system message, the prompt becomes the user
/// message, and the assistant's content is returned verbatim.
pub struct ProviderModel {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ProviderModel {
    /// Create a new adapter over `provider` using `model`.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.3,
            max_tokens: None,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// The model identifier requests are sent with.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for ProviderModel {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn complete(&self, instructions: &str, prompt: &str) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(instructions), Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stop: vec![],
        };

        let response = self.provider.complete(request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                provider = %self.provider.name(),
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion finished"
            );
        }

        Ok(response.message.content)
    }
}
