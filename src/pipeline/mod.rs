//! Pipeline stages for one analysis request.
//!
//! Each submodule implements exactly one step with explicit inputs and one
//! return value, so stages can be tested alone and no state leaks between
//! them.
//!
//! ## Data Flow
//!
//! ```text
//! document ──┐
//! transcribe ┼─▶ combine ──▶ prompts ──▶ llm
//! free text ─┘
//! ```
//!
//! 1. [`document`]  : first `max_pages` pages of a PDF as text, capped at
//!    `max_chars`; pdfium runs in `spawn_blocking`
//! 2. [`transcribe`]: one voice clip to text through the model
//! 3. [`combine`]   : fixed-order concatenation plus the image-only sentinel
//! 4. [`llm`]       : the [`llm::GenerativeModel`] port and model-id
//!    normalisation; the only stage boundary with network I/O

pub mod combine;
pub mod document;
pub mod llm;
pub mod transcribe;
