//! Google Gemini REST backend.
//!
//! Talks to `generateContent` directly so that images *and* audio can travel
//! as `inlineData` parts in the same request shape. The model identifier in
//! the URL is already normalised (`models/...`).

use crate::error::ModelError;
use crate::pipeline::llm::{GenerationRequest, GenerativeModel, Part};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client whose requests time out after `timeout_secs`.
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ModelError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Point the client at another endpoint (proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
        let body = to_gemini_request(request);
        let url = self.endpoint(&request.model);

        debug!(
            "Sending request to Gemini: model={}, parts={}, media={}",
            request.model,
            request.parts.len(),
            request.media_count()
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Transport("request timed out".to_string())
                } else {
                    // without_url keeps the API key out of the message
                    ModelError::Transport(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let parsed: GeminiResponse =
            serde_json::from_str(&text).map_err(|e| ModelError::Malformed(e.to_string()))?;
        from_gemini_response(parsed)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

fn to_gemini_request(request: &GenerationRequest) -> GeminiRequest {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => GeminiPart {
                text: Some(text.clone()),
                inline_data: None,
            },
            Part::Media { mime_type, data } => GeminiPart {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: mime_type.clone(),
                    data: STANDARD.encode(data),
                }),
            },
        })
        .collect();

    GeminiRequest {
        system_instruction: request.system_instruction.as_ref().map(|s| SystemInstruction {
            parts: vec![GeminiPart {
                text: Some(s.clone()),
                inline_data: None,
            }],
        }),
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: request.temperature.map(|t| GenerationConfig {
            temperature: Some(t),
        }),
    }
}

fn from_gemini_response(response: GeminiResponse) -> Result<String, ModelError> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|f| f.block_reason)
    {
        return Err(ModelError::Blocked { reason });
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ModelError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some(reason) if reason != "STOP" => Err(ModelError::Blocked {
                reason: reason.to_string(),
            }),
            _ => Err(ModelError::EmptyResponse),
        };
    }

    Ok(text)
}

/// Pull `error.message` out of a Gemini error body, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<GeminiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// Gemini API types

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
struct SystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}
