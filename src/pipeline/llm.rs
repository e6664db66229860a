//! The generative-model port.
//!
//! Transcription and generation both go through [`GenerativeModel`]: a single
//! request of text and media parts in, text out. Backends live in
//! [`crate::providers`]; tests plug in an in-memory implementation.

use crate::error::ModelError;
use async_trait::async_trait;

/// Namespace prefix every model identifier carries on the wire.
pub const MODEL_PREFIX: &str = "models/";

/// One part of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// Inline binary payload (image or audio).
    Media { mime_type: String, data: Vec<u8> },
}

impl Part {
    pub fn text(s: impl Into<String>) -> Self {
        Part::Text(s.into())
    }

    pub fn media(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Part::Media {
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// A single call to a generative model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Normalised model identifier (see [`normalize_model_id`]).
    pub model: String,
    pub system_instruction: Option<String>,
    pub parts: Vec<Part>,
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(model: impl AsRef<str>, parts: Vec<Part>) -> Self {
        Self {
            model: normalize_model_id(model.as_ref()),
            system_instruction: None,
            parts,
            temperature: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, t: Option<f32>) -> Self {
        self.temperature = t;
        self
    }

    /// Number of media parts attached.
    pub fn media_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, Part::Media { .. }))
            .count()
    }
}

/// A hosted model that turns a [`GenerationRequest`] into text.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Run the request and return the model's text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError>;

    /// Short backend name for logs ("gemini", "openai", …).
    fn name(&self) -> &str;
}

/// Prepend [`MODEL_PREFIX`] unless it is already there.
///
/// Surrounding whitespace is trimmed first. Idempotent:
/// `normalize_model_id(&normalize_model_id(x)) == normalize_model_id(x)`.
pub fn normalize_model_id(model: &str) -> String {
    let trimmed = model.trim();
    if trimmed.starts_with(MODEL_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{MODEL_PREFIX}{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_added_once() {
        assert_eq!(normalize_model_id("gemini-2.5-flash"), "models/gemini-2.5-flash");
        assert_eq!(
            normalize_model_id("models/gemini-2.5-flash"),
            "models/gemini-2.5-flash"
        );
        assert_eq!(normalize_model_id("  gemini-3 \n"), "models/gemini-3");
    }

    #[test]
    fn normalisation_is_idempotent() {
        let samples = [
            "",
            " ",
            "models/",
            "models/ x",
            "gemini-2.5-pro",
            "  models/gemini-2.5-pro  ",
            "tunedModels/my-model",
            "Models/upper",
            "models/models/x",
            "\tकुछ भी",
        ];
        for x in samples {
            let once = normalize_model_id(x);
            assert_eq!(normalize_model_id(&once), once, "input: {x:?}");
        }
    }

    #[test]
    fn request_normalises_model_and_counts_media() {
        let req = GenerationRequest::new(
            "gemini-2.5-flash",
            vec![Part::text("hi"), Part::media("image/png", vec![1, 2])],
        )
        .with_system_instruction("be brief");
        assert_eq!(req.model, "models/gemini-2.5-flash");
        assert_eq!(req.media_count(), 1);
        assert_eq!(req.system_instruction.as_deref(), Some("be brief"));
    }
}
