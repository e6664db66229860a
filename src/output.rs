//! Result types returned by [`crate::analyze::Analyzer::analyze`].

use crate::input::VoiceSource;
use crate::prompts::PromptPair;
use serde::{Deserialize, Serialize};

/// A successful analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// The model's formatted answer.
    pub text: String,
    /// Exactly what was sent to the model.
    pub prompt: PromptPair,
    /// The content interpolated into the prompt (combined text or sentinel).
    pub content: String,
    /// Transcript of the voice clip, when one was transcribed.
    pub voice_transcript: Option<String>,
    pub stats: AnalysisStats,
}

/// What each stage did and how long it took.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Normalised model identifier used for the calls.
    pub model: String,
    /// Pages read from the PDF (0 when none was supplied).
    pub pdf_pages_read: usize,
    /// Characters of PDF text that reached the prompt, marker included.
    pub pdf_chars: usize,
    pub pdf_truncated: bool,
    pub voice_source: Option<VoiceSource>,
    pub image_attached: bool,
    pub extract_duration_ms: u64,
    pub transcribe_duration_ms: u64,
    pub generate_duration_ms: u64,
    pub total_duration_ms: u64,
}
