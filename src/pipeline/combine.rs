//! Merge free text, voice transcript and PDF text into one content block.

use crate::error::AidLensError;
use crate::prompts::IMAGE_ONLY_SENTINEL;

pub const VOICE_HEADER: &str = "\n\n--- Voice Transcript ---\n";
pub const PDF_HEADER: &str = "\n\n--- PDF Content ---\n";

/// Concatenate inputs in fixed order: free text, voice, PDF.
///
/// Free text is trimmed. A section is appended whenever its text is
/// non-empty, and the section text is appended unchanged.
pub fn combine_inputs(free_text: &str, voice_text: &str, pdf_text: &str) -> String {
    let mut combined = free_text.trim().to_string();
    if !voice_text.is_empty() {
        combined.push_str(VOICE_HEADER);
        combined.push_str(voice_text);
    }
    if !pdf_text.is_empty() {
        combined.push_str(PDF_HEADER);
        combined.push_str(pdf_text);
    }
    combined
}

/// The content handed to the prompt template.
///
/// Empty content with an image becomes [`IMAGE_ONLY_SENTINEL`]; empty
/// content without one is a validation failure.
pub fn resolve_content(combined: String, has_image: bool) -> Result<String, AidLensError> {
    if !combined.trim().is_empty() {
        return Ok(combined);
    }
    if has_image {
        Ok(IMAGE_ONLY_SENTINEL.to_string())
    } else {
        Err(AidLensError::NoInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_only_is_unchanged() {
        assert_eq!(combine_inputs("hello", "", ""), "hello");
    }

    #[test]
    fn all_sections_in_order() {
        assert_eq!(
            combine_inputs("hello", "voice", "doc"),
            "hello\n\n--- Voice Transcript ---\nvoice\n\n--- PDF Content ---\ndoc"
        );
    }

    #[test]
    fn free_text_is_trimmed() {
        assert_eq!(combine_inputs("  hello \n", "", ""), "hello");
    }

    #[test]
    fn pdf_without_voice() {
        assert_eq!(
            combine_inputs("", "", "doc"),
            "\n\n--- PDF Content ---\ndoc"
        );
    }

    #[test]
    fn empty_sections_are_skipped() {
        assert_eq!(combine_inputs("hi", "", ""), "hi");
        assert_eq!(combine_inputs("", "", ""), "");
    }

    #[test]
    fn whitespace_sections_are_kept_verbatim() {
        assert_eq!(combine_inputs("hi", "  ", ""), "hi\n\n--- Voice Transcript ---\n  ");
        assert_eq!(combine_inputs("", "", "\n"), "\n\n--- PDF Content ---\n\n");
    }

    #[test]
    fn sentinel_only_with_image() {
        assert_eq!(resolve_content(String::new(), true).unwrap(), IMAGE_ONLY_SENTINEL);
        assert!(matches!(
            resolve_content(String::new(), false),
            Err(AidLensError::NoInput)
        ));
        assert_eq!(resolve_content("hi".into(), true).unwrap(), "hi");
    }
}
