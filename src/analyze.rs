//! Analysis entry points.
//!
//! One request runs as a straight line of stages:
//!
//! ```text
//! validate ─▶ PDF text ─▶ transcript ─▶ combine ─▶ prompt ─▶ generate
//! ```
//!
//! Every stage returns its value or a typed error; the first error ends the
//! request and no later stage runs. Nothing is retried and nothing is kept
//! between requests: [`UserInput`] is borrowed, so a caller can resubmit the
//! same input after fixing whatever failed.

use crate::config::Settings;
use crate::error::AidLensError;
use crate::input::UserInput;
use crate::output::{AnalysisOutput, AnalysisStats};
use crate::pipeline::combine::{combine_inputs, resolve_content};
use crate::pipeline::document::{extract_pdf_text, DocumentLoader, PdfiumLoader};
use crate::pipeline::llm::{normalize_model_id, GenerationRequest, GenerativeModel, Part};
use crate::pipeline::transcribe::transcribe;
use crate::progress::{ProgressCallback, Stage};
use crate::prompts::build_prompt;
use crate::providers::{EdgequakeModel, GeminiClient};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs analysis requests.
///
/// The default analyzer builds its model backend from each request's
/// [`Settings`] and reads PDFs with pdfium. Both can be replaced, which is
/// how tests run the pipeline without network or pdfium.
///
/// # Example
/// ```rust,no_run
/// use aidlens::{Analyzer, Settings, UserInput};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = Settings::from_env()?;
/// let input = UserInput::new().with_text("Notice: ration cards must be renewed by Friday.");
/// let output = Analyzer::new().analyze(&settings, &input).await?;
/// println!("{}", output.text);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Analyzer {
    model: Option<Arc<dyn GenerativeModel>>,
    loader: Arc<dyn DocumentLoader>,
    progress: Option<ProgressCallback>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            model: None,
            loader: Arc::new(PdfiumLoader),
            progress: None,
        }
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this backend instead of building one from the settings.
    pub fn with_model(mut self, model: Arc<dyn GenerativeModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_document_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_progress(mut self, cb: ProgressCallback) -> Self {
        self.progress = Some(cb);
        self
    }

    /// Analyse `input` under `settings`.
    ///
    /// # Errors
    /// - [`AidLensError::MissingModel`] / [`AidLensError::MissingApiKey`] /
    ///   [`AidLensError::NoInput`] before any external call
    /// - [`AidLensError::DocumentRead`] when the PDF cannot be opened
    /// - [`AidLensError::Transcription`] when the voice clip fails
    /// - [`AidLensError::Generation`] when the final call fails
    pub async fn analyze(
        &self,
        settings: &Settings,
        input: &UserInput,
    ) -> Result<AnalysisOutput, AidLensError> {
        let total_start = Instant::now();

        // ── Step 0: Validate before doing any work ───────────────────────
        if settings.model.trim().is_empty() {
            return Err(AidLensError::MissingModel);
        }
        if input.is_empty() {
            return Err(AidLensError::NoInput);
        }
        let model = self.resolve_model(settings)?;
        let model_id = normalize_model_id(&settings.model);
        info!(
            "Starting analysis: role={}, language={}, model={}, backend={}",
            settings.role,
            settings.language,
            model_id,
            model.name()
        );

        let mut stats = AnalysisStats {
            model: model_id.clone(),
            image_attached: input.image.is_some(),
            ..Default::default()
        };

        // ── Step 1: PDF text ─────────────────────────────────────────────
        let pdf_text = match input.pdf_document {
            Some(ref bytes) => {
                let (extracted, ms) = self
                    .run_stage(
                        Stage::ExtractDocument,
                        extract_pdf_text(Arc::clone(&self.loader), bytes.clone(), settings.limits),
                    )
                    .await?;
                info!(
                    "Extracted {} chars from {} pages{}",
                    extracted.text.chars().count(),
                    extracted.pages_read,
                    if extracted.truncated { " (truncated)" } else { "" }
                );
                stats.pdf_pages_read = extracted.pages_read;
                stats.pdf_chars = extracted.text.chars().count();
                stats.pdf_truncated = extracted.truncated;
                stats.extract_duration_ms = ms;
                extracted.text
            }
            None => String::new(),
        };

        // ── Step 2: Voice transcript (microphone wins) ───────────────────
        let voice_text = match input.voice_clip() {
            Some((source, clip)) => {
                if source == crate::input::VoiceSource::Microphone && input.audio_upload.is_some() {
                    debug!("Both microphone and uploaded audio present; using microphone");
                }
                let (text, ms) = self
                    .run_stage(Stage::Transcribe, transcribe(model.as_ref(), &model_id, clip))
                    .await?;
                info!("Transcribed {:?} audio: {} chars", source, text.chars().count());
                stats.voice_source = Some(source);
                stats.transcribe_duration_ms = ms;
                Some(text)
            }
            None => None,
        };

        // ── Step 3–4: Combine and validate ───────────────────────────────
        let combined = combine_inputs(
            input.free_text.as_deref().unwrap_or(""),
            voice_text.as_deref().unwrap_or(""),
            &pdf_text,
        );
        let content = resolve_content(combined, input.image.is_some())?;

        // ── Step 5: Prompt ───────────────────────────────────────────────
        let prompt = build_prompt(settings.role, settings.language, &content);

        // ── Step 6: Generate ─────────────────────────────────────────────
        let mut parts = vec![Part::text(prompt.user_message.clone())];
        if let Some(ref image) = input.image {
            parts.push(Part::media(image.mime_type.clone(), image.bytes.clone()));
        }
        let request = GenerationRequest::new(&model_id, parts)
            .with_system_instruction(prompt.system_instruction.clone())
            .with_temperature(settings.temperature);

        let generate = async {
            model
                .generate(&request)
                .await
                .map_err(|source| AidLensError::Generation {
                    model: model_id.clone(),
                    source,
                })
        };
        let (text, ms) = self.run_stage(Stage::Generate, generate).await?;
        stats.generate_duration_ms = ms;
        stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

        info!(
            "Analysis complete: {} chars in {}ms",
            text.chars().count(),
            stats.total_duration_ms
        );

        Ok(AnalysisOutput {
            text,
            prompt,
            content,
            voice_transcript: voice_text,
            stats,
        })
    }

    /// Synchronous wrapper around [`Analyzer::analyze`].
    ///
    /// Creates a temporary tokio runtime internally.
    pub fn analyze_sync(
        &self,
        settings: &Settings,
        input: &UserInput,
    ) -> Result<AnalysisOutput, AidLensError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| AidLensError::Runtime(e.to_string()))?
            .block_on(self.analyze(settings, input))
    }

    /// Resolve the backend, from most-specific to least-specific:
    ///
    /// 1. the model injected with [`Analyzer::with_model`];
    /// 2. a named edgequake provider (`settings.provider`);
    /// 3. Gemini with `settings.api_key`, which must be non-empty.
    fn resolve_model(&self, settings: &Settings) -> Result<Arc<dyn GenerativeModel>, AidLensError> {
        if let Some(ref model) = self.model {
            return Ok(Arc::clone(model));
        }

        if !settings.uses_gemini() {
            if let Some(ref name) = settings.provider {
                let model = EdgequakeModel::from_name(name, &settings.model)?;
                return Ok(Arc::new(model));
            }
        }

        if settings.api_key.trim().is_empty() {
            return Err(AidLensError::MissingApiKey);
        }
        let client = GeminiClient::new(settings.api_key.trim(), settings.api_timeout_secs)
            .map_err(|e| AidLensError::InvalidConfig(e.to_string()))?;
        Ok(Arc::new(client))
    }

    /// Run one stage, timing it and reporting to the progress callback.
    async fn run_stage<T, F>(&self, stage: Stage, fut: F) -> Result<(T, u64), AidLensError>
    where
        F: Future<Output = Result<T, AidLensError>>,
    {
        if let Some(ref cb) = self.progress {
            cb.on_stage_start(stage);
        }
        let start = Instant::now();
        let result = fut.await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(value) => {
                debug!("Stage '{}' finished in {}ms", stage, elapsed_ms);
                if let Some(ref cb) = self.progress {
                    cb.on_stage_complete(stage, elapsed_ms);
                }
                Ok((value, elapsed_ms))
            }
            Err(e) => {
                warn!("Stage '{}' failed: {}", stage, e);
                if let Some(ref cb) = self.progress {
                    cb.on_stage_error(stage, &e.to_string());
                }
                Err(e)
            }
        }
    }
}

/// Analyse with a default [`Analyzer`].
pub async fn analyze(
    settings: &Settings,
    input: &UserInput,
) -> Result<AnalysisOutput, AidLensError> {
    Analyzer::new().analyze(settings, input).await
}

/// Synchronous wrapper around [`analyze`].
pub fn analyze_sync(settings: &Settings, input: &UserInput) -> Result<AnalysisOutput, AidLensError> {
    Analyzer::new().analyze_sync(settings, input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_model_fails_first() {
        let settings = Settings::builder().model("  ").api_key("k").build().unwrap();
        let input = UserInput::new().with_text("hi");
        let err = Analyzer::new().analyze(&settings, &input).await.unwrap_err();
        assert!(matches!(err, AidLensError::MissingModel));
    }

    #[tokio::test]
    async fn missing_api_key_for_gemini() {
        let settings = Settings::builder().api_key("").build().unwrap();
        let input = UserInput::new().with_text("hi");
        let err = Analyzer::new().analyze(&settings, &input).await.unwrap_err();
        assert!(matches!(err, AidLensError::MissingApiKey));
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_backend_resolution() {
        let settings = Settings::builder().api_key("").build().unwrap();
        let err = Analyzer::new()
            .analyze(&settings, &UserInput::new().with_text("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AidLensError::NoInput));
    }
}
