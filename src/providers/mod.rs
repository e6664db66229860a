//! [`crate::pipeline::llm::GenerativeModel`] backends.
//!
//! * [`gemini`]: Gemini `generateContent` over REST; the default, and the
//!   only backend that carries inline audio for every model.
//! * [`edgequake`]: any provider `edgequake-llm` can build (OpenAI,
//!   Anthropic, Ollama, Azure, …), selected with `Settings::provider`.

pub mod edgequake;
pub mod gemini;

pub use edgequake::EdgequakeModel;
pub use gemini::GeminiClient;
