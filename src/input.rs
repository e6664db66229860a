//! User input and the upload acceptance boundary.
//!
//! Uploads arrive as raw bytes plus whatever the client declared about them
//! (a filename, maybe a content type). Acceptance happens here, before any
//! pipeline stage runs, so a rejected upload never costs a model call:
//!
//! * images: PNG or JPEG, sniffed from the bytes
//! * documents: PDF, checked by the `%PDF` magic
//! * audio: WAV / MP3 / M4A / OGG; a declared type must name one of these,
//!   and the suffix decides only when no specific type was declared

use crate::error::AidLensError;
use std::path::Path;
use tracing::debug;

/// An accepted image upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    /// `image/png` or `image/jpeg`.
    pub mime_type: String,
}

impl ImageUpload {
    /// Accept `bytes` if they decode as PNG or JPEG.
    pub fn accept(name: &str, bytes: Vec<u8>) -> Result<Self, AidLensError> {
        let mime_type = match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Png) => "image/png",
            Ok(image::ImageFormat::Jpeg) => "image/jpeg",
            Ok(other) => {
                return Err(AidLensError::UnsupportedUpload {
                    what: "image",
                    name: name.to_string(),
                    reason: format!("{other:?} is not accepted; use PNG or JPEG"),
                })
            }
            Err(e) => {
                return Err(AidLensError::UnsupportedUpload {
                    what: "image",
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        debug!("Accepted image '{}' ({}, {} bytes)", name, mime_type, bytes.len());
        Ok(Self {
            bytes,
            mime_type: mime_type.to_string(),
        })
    }
}

/// Whether `bytes` start with the `%PDF` magic.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

/// Accept `bytes` as a PDF document.
pub fn accept_document(name: &str, bytes: Vec<u8>) -> Result<Vec<u8>, AidLensError> {
    if !is_pdf(&bytes) {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(AidLensError::UnsupportedUpload {
            what: "document",
            name: name.to_string(),
            reason: format!("not a PDF (first bytes: {magic:?})"),
        });
    }
    Ok(bytes)
}

/// Where a voice clip came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VoiceSource {
    Microphone,
    Upload,
}

/// Raw audio plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioClip {
    /// Accept an audio upload, resolving its MIME type.
    ///
    /// A declared type must name a supported container. The filename suffix
    /// decides only when the type is absent or generic
    /// (`application/octet-stream`, empty).
    pub fn accept(
        name: &str,
        declared_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self, AidLensError> {
        let unsupported = |reason: String| AidLensError::UnsupportedUpload {
            what: "audio",
            name: name.to_string(),
            reason,
        };

        let mime_type = match declared_type.filter(|t| !is_generic_type(t)) {
            Some(declared) => canonical_audio_mime(declared).ok_or_else(|| {
                unsupported(format!(
                    "declared type '{declared}' is not WAV, MP3, M4A or OGG"
                ))
            })?,
            None => audio_mime_from_name(name)
                .ok_or_else(|| unsupported("expected WAV, MP3, M4A or OGG".to_string()))?,
        };

        if bytes.is_empty() {
            return Err(unsupported("file is empty".to_string()));
        }

        debug!("Accepted audio '{}' ({}, {} bytes)", name, mime_type, bytes.len());
        Ok(Self {
            bytes,
            mime_type: mime_type.to_string(),
        })
    }
}

/// Map a declared content type onto the MIME type sent to the model.
pub fn canonical_audio_mime(declared: &str) -> Option<&'static str> {
    let essence = declared
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => Some("audio/wav"),
        "audio/mpeg" | "audio/mp3" | "audio/mpeg3" | "audio/x-mp3" => Some("audio/mpeg"),
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" | "audio/aac" => Some("audio/mp4"),
        "audio/ogg" | "application/ogg" | "audio/vorbis" | "audio/opus" => Some("audio/ogg"),
        _ => None,
    }
}

/// Content types that say nothing about the payload.
fn is_generic_type(declared: &str) -> bool {
    let essence = declared.split(';').next().unwrap_or("").trim();
    essence.is_empty() || essence.eq_ignore_ascii_case("application/octet-stream")
}

/// Infer the audio MIME type from a filename suffix.
pub fn audio_mime_from_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    match ext.as_str() {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "m4a" => Some("audio/mp4"),
        "ogg" => Some("audio/ogg"),
        _ => None,
    }
}

/// Everything a user supplied for one request. All fields are optional.
///
/// [`crate::analyze::Analyzer::analyze`] borrows the input, so the caller
/// keeps it and can resubmit unchanged after a failure.
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub free_text: Option<String>,
    pub image: Option<ImageUpload>,
    /// Raw PDF bytes.
    pub pdf_document: Option<Vec<u8>>,
    /// Audio captured from the microphone.
    pub microphone: Option<AudioClip>,
    /// Audio file uploaded by the user.
    pub audio_upload: Option<AudioClip>,
}

impl UserInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = Some(text.into());
        self
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_pdf(mut self, bytes: Vec<u8>) -> Self {
        self.pdf_document = Some(bytes);
        self
    }

    pub fn with_microphone(mut self, clip: AudioClip) -> Self {
        self.microphone = Some(clip);
        self
    }

    pub fn with_audio_upload(mut self, clip: AudioClip) -> Self {
        self.audio_upload = Some(clip);
        self
    }

    /// The single clip to transcribe: microphone audio wins over an upload.
    pub fn voice_clip(&self) -> Option<(VoiceSource, &AudioClip)> {
        self.microphone
            .as_ref()
            .map(|c| (VoiceSource::Microphone, c))
            .or_else(|| self.audio_upload.as_ref().map(|c| (VoiceSource::Upload, c)))
    }

    /// True when no field carries anything at all.
    pub fn is_empty(&self) -> bool {
        self.free_text
            .as_deref()
            .map_or(true, |t| t.trim().is_empty())
            && self.image.is_none()
            && self.pdf_document.is_none()
            && self.microphone.is_none()
            && self.audio_upload.is_none()
    }
}
