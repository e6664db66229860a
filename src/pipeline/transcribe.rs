//! Voice-to-text through the same hosted model used for generation.
//!
//! The clip is sent inline with a fixed instruction. The model may word the
//! same clip slightly differently across calls; that is accepted.

use crate::error::AidLensError;
use crate::input::AudioClip;
use crate::pipeline::llm::{GenerationRequest, GenerativeModel, Part};
use crate::prompts::TRANSCRIPTION_INSTRUCTION;
use tracing::debug;

/// Transcribe `clip` and return the trimmed transcript.
///
/// Any backend failure becomes [`AidLensError::Transcription`]; an empty
/// answer is returned as an empty string, never replaced with made-up text.
pub async fn transcribe(
    model: &dyn GenerativeModel,
    model_id: &str,
    clip: &AudioClip,
) -> Result<String, AidLensError> {
    let request = GenerationRequest::new(
        model_id,
        vec![
            Part::text(TRANSCRIPTION_INSTRUCTION),
            Part::media(clip.mime_type.clone(), clip.bytes.clone()),
        ],
    );

    debug!(
        "Transcribing {} bytes of {} via {}",
        clip.bytes.len(),
        clip.mime_type,
        model.name()
    );

    let text = model
        .generate(&request)
        .await
        .map_err(|source| AidLensError::Transcription { source })?;

    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned {
        reply: Result<String, ModelError>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    #[async_trait]
    impl GenerativeModel for Canned {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone()
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn clip() -> AudioClip {
        AudioClip {
            bytes: vec![0x52, 0x49, 0x46, 0x46],
            mime_type: "audio/wav".into(),
        }
    }

    #[test]
    fn sends_instruction_then_audio_and_trims() {
        let model = Canned {
            reply: Ok("  mujhe madad chahiye \n".into()),
            seen: Mutex::new(Vec::new()),
        };
        let text = tokio_test::block_on(transcribe(&model, "gemini-2.5-flash", &clip())).unwrap();
        assert_eq!(text, "mujhe madad chahiye");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "models/gemini-2.5-flash");
        assert_eq!(seen[0].system_instruction, None);
        assert_eq!(seen[0].parts[0], Part::text(TRANSCRIPTION_INSTRUCTION));
        assert_eq!(seen[0].parts[1], Part::media("audio/wav", clip().bytes));
    }

    #[test]
    fn backend_failure_is_a_transcription_error() {
        let model = Canned {
            reply: Err(ModelError::Transport("connection reset".into())),
            seen: Mutex::new(Vec::new()),
        };
        let err = tokio_test::block_on(transcribe(&model, "m", &clip())).unwrap_err();
        assert!(matches!(err, AidLensError::Transcription { .. }));
        assert!(err.to_string().contains("connection reset"));
    }
}
