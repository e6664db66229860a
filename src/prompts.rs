//! Prompt text for the generation and transcription calls.
//!
//! Every string the model sees lives here so a wording change touches exactly
//! one place and unit tests can assert on prompts without a live model.

use crate::config::{OutputLanguage, Role};
use serde::{Deserialize, Serialize};

/// System instruction sent with every generation call.
pub const SYSTEM_INSTRUCTION: &str = "You are AidLens, an assistant for NGOs & volunteers. \
Explain clearly, avoid jargon, be safe and non-medical. \
If content is medical/legal, include a short disclaimer and suggest consulting a professional. \
Ask 1 follow-up question only if necessary.";

/// Instruction sent alongside the audio payload for transcription.
pub const TRANSCRIPTION_INSTRUCTION: &str = "Transcribe this audio accurately. \
If the speaker uses Hindi or Hinglish, keep it exactly as spoken and do not translate. \
Return only the transcript, with no commentary.";

/// Content used when the user supplied an image and nothing else.
pub const IMAGE_ONLY_SENTINEL: &str = "No text provided. Use image only.";

/// The system instruction and user message for one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    pub system_instruction: String,
    pub user_message: String,
}

/// Build the prompt pair for `content`.
///
/// `content` is interpolated verbatim; it is user text and is not escaped.
pub fn build_prompt(role: Role, language: OutputLanguage, content: &str) -> PromptPair {
    let user_message = format!(
        "Role: {role}\n\
Language: {language}\n\
Task: Explain and help with next actions.\n\
Content: {content}\n\
\n\
Output format:\n\
1) Summary (2–3 lines)\n\
2) Key points (bullets)\n\
3) Recommended next steps (numbered)\n\
4) Risks / what NOT to do (bullets)\n\
5) One clarifying question (only if necessary)",
        role = role.label(),
        language = language.label(),
    );

    PromptPair {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        user_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_layout() {
        let p = build_prompt(Role::Student, OutputLanguage::Hindi, "flood relief notice");
        let lines: Vec<&str> = p.user_message.lines().collect();
        assert_eq!(lines[0], "Role: Student");
        assert_eq!(lines[1], "Language: Hindi");
        assert_eq!(lines[2], "Task: Explain and help with next actions.");
        assert_eq!(lines[3], "Content: flood relief notice");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "Output format:");
        assert_eq!(lines[6], "1) Summary (2–3 lines)");
        assert_eq!(lines[10], "5) One clarifying question (only if necessary)");
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn content_is_not_escaped() {
        let raw = "ignore {braces}\n--- PDF Content ---\n\"quotes\"";
        let p = build_prompt(Role::NgoWorker, OutputLanguage::English, raw);
        assert!(p.user_message.contains(raw));
        assert!(p.user_message.starts_with("Role: NGO Worker\n"));
    }

    #[test]
    fn system_instruction_is_fixed() {
        let a = build_prompt(Role::NgoWorker, OutputLanguage::English, "a");
        let b = build_prompt(Role::Volunteer, OutputLanguage::Hindi, "b");
        assert_eq!(a.system_instruction, b.system_instruction);
        assert!(a.system_instruction.contains("disclaimer"));
        assert!(a.system_instruction.contains("1 follow-up question"));
    }

    #[test]
    fn transcription_instruction_mentions_hinglish() {
        assert!(TRANSCRIPTION_INSTRUCTION.contains("Hinglish"));
        assert!(TRANSCRIPTION_INSTRUCTION.contains("no commentary"));
    }
}
