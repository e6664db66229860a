//! PDF text extraction.
//!
//! [`extract_document_text`] works on any [`PaginatedDocument`]; the
//! production [`PdfiumLoader`] opens uploaded bytes with pdfium.
//!
//! ## Why a temp file?
//!
//! The bytes are staged in a [`tempfile::NamedTempFile`] and opened by path,
//! the same way pdfium is driven everywhere else. The file lives only for the
//! duration of one extraction and is removed on drop, success or not.
//!
//! pdfium is not async-safe, so [`extract_pdf_text`] runs the whole
//! open-read-close cycle inside `spawn_blocking`.

use crate::config::ExtractionLimits;
use crate::error::AidLensError;
use crate::input::is_pdf;
use pdfium_render::prelude::*;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

/// Marker appended when extracted text is cut at `max_chars`.
pub const TRUNCATION_MARKER: &str = "\n\n[Truncated]";

/// A document made of pages that each yield plain text.
pub trait PaginatedDocument {
    fn page_count(&self) -> usize;

    /// Text of the 0-indexed page.
    fn page_text(&self, index: usize) -> Result<String, AidLensError>;
}

/// Extracted text plus what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    /// Pages actually read (≤ `max_pages`).
    pub pages_read: usize,
    pub truncated: bool,
}

/// Read at most `limits.max_pages` pages and join their non-blank text.
///
/// Pages beyond the cap are never touched. Blank pages are skipped. The
/// joined text is cut to exactly `limits.max_chars` characters and marked
/// with [`TRUNCATION_MARKER`] when longer.
pub fn extract_document_text(
    document: &dyn PaginatedDocument,
    limits: ExtractionLimits,
) -> Result<ExtractedText, AidLensError> {
    let pages_read = document.page_count().min(limits.max_pages);

    let mut texts = Vec::with_capacity(pages_read);
    for idx in 0..pages_read {
        let text = document.page_text(idx)?;
        if text.trim().is_empty() {
            debug!("Page {}: no text, skipped", idx + 1);
            continue;
        }
        texts.push(text);
    }

    let joined = texts.join("\n\n");
    let (text, truncated) = truncate_chars(joined, limits.max_chars);

    Ok(ExtractedText {
        text,
        pages_read,
        truncated,
    })
}

fn truncate_chars(text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        None => (text, false),
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].to_string();
            cut.push_str(TRUNCATION_MARKER);
            (cut, true)
        }
    }
}

/// Turns raw document bytes into extracted text.
///
/// Implementations run on a blocking thread.
pub trait DocumentLoader: Send + Sync {
    fn extract(&self, bytes: &[u8], limits: ExtractionLimits)
        -> Result<ExtractedText, AidLensError>;
}

/// [`DocumentLoader`] backed by pdfium (auto-downloaded on first use).
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumLoader;

impl DocumentLoader for PdfiumLoader {
    fn extract(
        &self,
        bytes: &[u8],
        limits: ExtractionLimits,
    ) -> Result<ExtractedText, AidLensError> {
        if !is_pdf(bytes) {
            return Err(AidLensError::DocumentRead {
                detail: "not a PDF file".to_string(),
            });
        }

        let mut staged = tempfile::Builder::new()
            .prefix("aidlens-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| AidLensError::Internal(format!("tempfile: {e}")))?;
        staged
            .write_all(bytes)
            .map_err(|e| AidLensError::Internal(format!("tempfile write: {e}")))?;

        let pdfium = pdfium_auto::bind_pdfium_silent()
            .map_err(|e| AidLensError::PdfiumBindingFailed(e.to_string()))?;

        let document = pdfium
            .load_pdf_from_file(staged.path(), None)
            .map_err(|e| AidLensError::DocumentRead {
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        let pages = PageReader {
            count: pages.len() as usize,
            read: |index: usize| -> Result<String, AidLensError> {
                let page = pages
                    .get(index as u16)
                    .map_err(|e| AidLensError::DocumentRead {
                        detail: format!("page {}: {:?}", index + 1, e),
                    })?;
                let text = page.text().map_err(|e| AidLensError::DocumentRead {
                    detail: format!("page {} text: {:?}", index + 1, e),
                })?;
                Ok(text.all())
            },
        };
        info!("PDF loaded: {} pages", pages.page_count());

        extract_document_text(&pages, limits)
        // `staged` is dropped (and the file deleted) here
    }
}

/// Adapts a page count and a per-page reader closure to [`PaginatedDocument`].
struct PageReader<F> {
    count: usize,
    read: F,
}

impl<F> PaginatedDocument for PageReader<F>
where
    F: Fn(usize) -> Result<String, AidLensError>,
{
    fn page_count(&self) -> usize {
        self.count
    }

    fn page_text(&self, index: usize) -> Result<String, AidLensError> {
        (self.read)(index)
    }
}

/// Extract text from PDF bytes on a blocking thread.
pub async fn extract_pdf_text(
    loader: Arc<dyn DocumentLoader>,
    bytes: Vec<u8>,
    limits: ExtractionLimits,
) -> Result<ExtractedText, AidLensError> {
    tokio::task::spawn_blocking(move || loader.extract(&bytes, limits))
        .await
        .map_err(|e| AidLensError::Internal(format!("Extraction task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// In-memory document that records which pages were read.
    struct FakeDoc {
        pages: Vec<&'static str>,
        touched: RefCell<Vec<usize>>,
    }

    impl FakeDoc {
        fn new(pages: Vec<&'static str>) -> Self {
            Self {
                pages,
                touched: RefCell::new(Vec::new()),
            }
        }
    }

    impl PaginatedDocument for FakeDoc {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, index: usize) -> Result<String, AidLensError> {
            self.touched.borrow_mut().push(index);
            Ok(self.pages[index].to_string())
        }
    }

    fn limits(max_pages: usize, max_chars: usize) -> ExtractionLimits {
        ExtractionLimits {
            max_pages,
            max_chars,
        }
    }

    #[test]
    fn joins_non_blank_pages_untruncated() {
        let doc = FakeDoc::new(vec!["first", "  \n\t", "second", "", "third"]);
        let out = extract_document_text(&doc, limits(8, 12_000)).unwrap();
        assert_eq!(out.text, "first\n\nsecond\n\nthird");
        assert!(!out.truncated);
        assert_eq!(out.pages_read, 5);
    }

    #[test]
    fn pages_past_the_cap_are_never_read() {
        let doc = FakeDoc::new(vec!["a"; 20]);
        let out = extract_document_text(&doc, limits(8, 12_000)).unwrap();
        assert_eq!(out.pages_read, 8);
        assert_eq!(*doc.touched.borrow(), (0..8).collect::<Vec<_>>());
        assert_eq!(out.text.matches('a').count(), 8);
    }

    #[test]
    fn truncates_to_exact_char_count_plus_marker() {
        let doc = FakeDoc::new(vec!["abcdefghij", "klmnopqrst"]);
        let out = extract_document_text(&doc, limits(8, 15)).unwrap();
        assert!(out.truncated);
        assert_eq!(out.text, "abcdefghij\n\nklm\n\n[Truncated]");
        assert_eq!(out.text.chars().count(), 15 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn exact_fit_is_not_truncated() {
        let doc = FakeDoc::new(vec!["12345"]);
        let out = extract_document_text(&doc, limits(8, 5)).unwrap();
        assert_eq!(out.text, "12345");
        assert!(!out.truncated);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let doc = FakeDoc::new(vec!["नमस्ते दुनिया"]);
        let out = extract_document_text(&doc, limits(8, 4)).unwrap();
        let expected: String = "नमस्ते दुनिया".chars().take(4).collect();
        assert_eq!(out.text, format!("{expected}{TRUNCATION_MARKER}"));
        assert_eq!(out.text.chars().count(), 4 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn empty_document_yields_empty_text() {
        let doc = FakeDoc::new(vec![]);
        let out = extract_document_text(&doc, limits(8, 100)).unwrap();
        assert_eq!(out.text, "");
        assert_eq!(out.pages_read, 0);
    }

    #[test]
    fn page_error_is_not_swallowed() {
        struct Broken;
        impl PaginatedDocument for Broken {
            fn page_count(&self) -> usize {
                3
            }
            fn page_text(&self, index: usize) -> Result<String, AidLensError> {
                if index == 1 {
                    Err(AidLensError::DocumentRead {
                        detail: "bad page".into(),
                    })
                } else {
                    Ok("ok".into())
                }
            }
        }
        let err = extract_document_text(&Broken, limits(8, 100)).unwrap_err();
        assert!(matches!(err, AidLensError::DocumentRead { .. }));
    }

    #[test]
    fn pdfium_loader_rejects_non_pdf_without_binding() {
        let err = PdfiumLoader
            .extract(b"hello world", ExtractionLimits::default())
            .unwrap_err();
        assert!(matches!(err, AidLensError::DocumentRead { .. }));
    }

    #[tokio::test]
    async fn extract_pdf_text_runs_loader_on_blocking_thread() {
        struct Echo;
        impl DocumentLoader for Echo {
            fn extract(
                &self,
                bytes: &[u8],
                _limits: ExtractionLimits,
            ) -> Result<ExtractedText, AidLensError> {
                Ok(ExtractedText {
                    text: String::from_utf8_lossy(bytes).into_owned(),
                    pages_read: 1,
                    truncated: false,
                })
            }
        }
        let out = extract_pdf_text(Arc::new(Echo), b"page".to_vec(), ExtractionLimits::default())
            .await
            .unwrap();
        assert_eq!(out.text, "page");
    }
}
