//! Error types for the aidlens library.
//!
//! Two layers reflect the two sides of every external call:
//!
//! * [`ModelError`]: what a [`crate::pipeline::llm::GenerativeModel`]
//!   backend reports (transport failure, non-2xx status, blocked prompt).
//!   It knows nothing about which pipeline stage made the call.
//!
//! * [`AidLensError`]: what [`crate::analyze::Analyzer::analyze`] returns.
//!   Each variant belongs to exactly one [`ErrorKind`], so a caller can
//!   branch on the failing stage without matching every variant.
//!
//! All errors are terminal for the current request. Nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// The four failure classes a request can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No usable input, missing credential/model, or a rejected upload.
    Validation,
    /// The document could not be opened or paginated.
    DocumentRead,
    /// The voice-to-text call failed.
    Transcription,
    /// The final generation call failed.
    Generation,
}

/// All fatal errors returned by the aidlens library.
#[derive(Debug, Error)]
pub enum AidLensError {
    // ── Validation ────────────────────────────────────────────────────────
    /// Nothing to analyse: no text, image, document text or voice text.
    #[error("Provide text, an image, a PDF or a voice note.")]
    NoInput,

    /// The API credential is empty.
    #[error("No API key configured.\nSet GEMINI_API_KEY or pass --api-key.")]
    MissingApiKey,

    /// The model identifier is empty.
    #[error("No model identifier configured.\nSet GEMINI_MODEL or pass --model.")]
    MissingModel,

    /// An upload was refused at the acceptance boundary.
    #[error("Unsupported {what} upload '{name}': {reason}")]
    UnsupportedUpload {
        what: &'static str,
        name: String,
        reason: String,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A named provider could not be created (unknown name, missing key, …).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Document ──────────────────────────────────────────────────────────
    /// The document could not be opened, was not a PDF, or a page failed to load.
    #[error("Could not read PDF: {detail}")]
    DocumentRead { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    // ── Model calls ───────────────────────────────────────────────────────
    /// The voice-to-text call failed.
    #[error("Transcription failed: {source}")]
    Transcription {
        #[source]
        source: ModelError,
    },

    /// The final generation call failed.
    #[error(
        "Generation failed: {source}\n\
Check that model '{model}' exists and supports generateContent."
    )]
    Generation {
        model: String,
        #[source]
        source: ModelError,
    },

    // ── I/O ───────────────────────────────────────────────────────────────
    /// A local input file could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `analyze_sync` could not start its tokio runtime.
    #[error("Failed to create tokio runtime: {0}")]
    Runtime(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error during extraction (blocking task, temp file).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AidLensError {
    /// The pipeline failure class this error belongs to.
    ///
    /// `ReadFailed` and `Runtime` happen before any stage runs and count as
    /// `Validation`. `Internal` counts as `DocumentRead`: temp-file staging
    /// and the blocking extraction task are the only stages that raise it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AidLensError::NoInput
            | AidLensError::MissingApiKey
            | AidLensError::MissingModel
            | AidLensError::UnsupportedUpload { .. }
            | AidLensError::InvalidConfig(_)
            | AidLensError::ProviderNotConfigured { .. }
            | AidLensError::ReadFailed { .. }
            | AidLensError::Runtime(_) => ErrorKind::Validation,
            AidLensError::DocumentRead { .. }
            | AidLensError::PdfiumBindingFailed(_)
            | AidLensError::Internal(_) => ErrorKind::DocumentRead,
            AidLensError::Transcription { .. } => ErrorKind::Transcription,
            AidLensError::Generation { .. } => ErrorKind::Generation,
        }
    }
}

/// An error reported by a [`crate::pipeline::llm::GenerativeModel`] backend.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The request never got a response (DNS, TLS, timeout, …).
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The service refused the prompt.
    #[error("prompt blocked: {reason}")]
    Blocked { reason: String },

    /// The service answered but produced no text.
    #[error("empty response from model")]
    EmptyResponse,

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_error_suggests_checking_model() {
        let e = AidLensError::Generation {
            model: "models/gemini-2.5-flash".into(),
            source: ModelError::Api {
                status: 404,
                message: "not found".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("models/gemini-2.5-flash"), "got: {msg}");
        assert!(msg.contains("generateContent"), "got: {msg}");
        assert!(msg.contains("404"), "got: {msg}");
    }

    #[test]
    fn kinds_cover_every_stage() {
        assert_eq!(AidLensError::NoInput.kind(), ErrorKind::Validation);
        assert_eq!(AidLensError::MissingApiKey.kind(), ErrorKind::Validation);
        assert_eq!(
            AidLensError::DocumentRead {
                detail: "bad xref".into()
            }
            .kind(),
            ErrorKind::DocumentRead
        );
        assert_eq!(
            AidLensError::Transcription {
                source: ModelError::EmptyResponse
            }
            .kind(),
            ErrorKind::Transcription
        );
        assert_eq!(
            AidLensError::Generation {
                model: "m".into(),
                source: ModelError::Transport("timeout".into())
            }
            .kind(),
            ErrorKind::Generation
        );
    }

    #[test]
    fn pre_stage_failures_are_validation() {
        assert_eq!(
            AidLensError::Runtime("no threads".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            AidLensError::Internal("tempfile".into()).kind(),
            ErrorKind::DocumentRead
        );
    }

    #[test]
    fn unsupported_upload_display() {
        let e = AidLensError::UnsupportedUpload {
            what: "audio",
            name: "note.flac".into(),
            reason: "expected WAV, MP3, M4A or OGG".into(),
        };
        assert!(e.to_string().contains("note.flac"));
        assert!(e.to_string().contains("audio"));
    }
}
