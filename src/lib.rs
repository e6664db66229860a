//! # aidlens
//!
//! Turn whatever a field worker has in hand (a typed question, a photo of a
//! notice, a PDF circular, a voice note in Hindi) into one structured,
//! plain-language answer: summary, key points, next steps, risks.
//!
//! ## Pipeline Overview
//!
//! ```text
//! UserInput + Settings
//!  │
//!  ├─ 0. Validate   model id, API key, at least one input (no external call yet)
//!  ├─ 1. PDF        text of the first N pages via pdfium, capped at M chars
//!  ├─ 2. Voice      one transcription call (microphone wins over upload)
//!  ├─ 3. Combine    free text + voice section + PDF section
//!  ├─ 4. Resolve    combined text, or the image-only sentinel, or NoInput
//!  ├─ 5. Prompt     system instruction + role/language/content/output format
//!  └─ 6. Generate   one call with the prompt and the image, if any
//! ```
//!
//! Any stage failure ends the request with a typed [`AidLensError`]; later
//! stages never run and nothing is retried.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aidlens::{analyze, Role, Settings, UserInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // GEMINI_API_KEY and GEMINI_MODEL are read from the environment
//!     let settings = Settings::from_env()?;
//!     let settings = Settings { role: Role::Volunteer, ..settings };
//!     let input = UserInput::new().with_text("Flood relief camp asks for Aadhaar copies. What do I do?");
//!     let output = analyze(&settings, &input).await?;
//!     println!("{}", output.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `aidlens` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! aidlens = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod providers;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_sync, Analyzer};
pub use config::{ExtractionLimits, OutputLanguage, Role, Settings, SettingsBuilder};
pub use error::{AidLensError, ErrorKind, ModelError};
pub use input::{AudioClip, ImageUpload, UserInput, VoiceSource};
pub use output::{AnalysisOutput, AnalysisStats};
pub use pipeline::combine::combine_inputs;
pub use pipeline::document::{DocumentLoader, ExtractedText, PdfiumLoader};
pub use pipeline::llm::{normalize_model_id, GenerationRequest, GenerativeModel, Part};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use prompts::{build_prompt, PromptPair};
pub use providers::{EdgequakeModel, GeminiClient};
