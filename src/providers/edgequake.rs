//! Backend over any [`edgequake_llm::LLMProvider`] (OpenAI, Anthropic,
//! Ollama, Azure, …).
//!
//! Text parts become one user message; media parts ride along as base64
//! [`ImageData`]. Images work with every vision-capable provider. Audio is
//! forwarded the same way, so transcription only succeeds on providers that
//! accept inline audio.

use crate::error::{AidLensError, ModelError};
use crate::pipeline::llm::{GenerationRequest, GenerativeModel, Part};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// Default output budget for one answer.
const MAX_TOKENS: usize = 4096;

/// [`GenerativeModel`] wrapping an edgequake provider.
///
/// The provider is bound to its model when created, so the request's
/// `model` field is only logged.
pub struct EdgequakeModel {
    provider: Arc<dyn LLMProvider>,
    name: String,
}

impl EdgequakeModel {
    /// Wrap a pre-built provider.
    pub fn new(provider: Arc<dyn LLMProvider>, name: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
        }
    }

    /// Create the named provider for `model`.
    ///
    /// The provider reads its own credential (`OPENAI_API_KEY`, …) from the
    /// environment. A `models/` prefix on `model` is stripped.
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, AidLensError> {
        let model = model.trim();
        let model = model.strip_prefix(crate::pipeline::llm::MODEL_PREFIX).unwrap_or(model);
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            AidLensError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider, provider_name))
    }
}

#[async_trait]
impl GenerativeModel for EdgequakeModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
        let messages = build_messages(request);
        let options = CompletionOptions {
            temperature: request.temperature,
            max_tokens: Some(MAX_TOKENS),
            ..Default::default()
        };

        debug!(
            "Sending request via {}: model={}, media={}",
            self.name,
            request.model,
            request.media_count()
        );

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ModelError::Transport(format!("{}", e)))?;

        if response.content.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(response.content)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// System message (if any), then one user message carrying every part.
fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(ref system) = request.system_instruction {
        messages.push(ChatMessage::system(system.as_str()));
    }

    let mut texts: Vec<&str> = Vec::new();
    let mut media: Vec<ImageData> = Vec::new();
    for part in &request.parts {
        match part {
            Part::Text(t) => texts.push(t),
            Part::Media { mime_type, data } => {
                media.push(ImageData::new(STANDARD.encode(data), mime_type.as_str()))
            }
        }
    }

    let text = texts.join("\n\n");
    if media.is_empty() {
        messages.push(ChatMessage::user(text.as_str()));
    } else {
        messages.push(ChatMessage::user_with_images(text.as_str(), media));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_only_when_present() {
        let req = GenerationRequest::new("m", vec![Part::text("hi")]);
        assert_eq!(build_messages(&req).len(), 1);

        let req = req.with_system_instruction("sys");
        assert_eq!(build_messages(&req).len(), 2);
    }
}
