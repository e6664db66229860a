//! Request settings for an analysis.
//!
//! Everything that shapes a request but is not user content lives in
//! [`Settings`]: who the answer is for ([`Role`]), which language it is
//! written in ([`OutputLanguage`]), which model and credential to use, and
//! the caps applied to PDF extraction ([`ExtractionLimits`]).
//!
//! Settings are read once per request and never mutated while it runs.

use crate::error::AidLensError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Model used when neither `--model` nor `GEMINI_MODEL` is set.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Per-request settings.
///
/// Built via [`Settings::builder()`], [`Settings::from_env()`], or
/// [`Settings::default()`].
///
/// # Example
/// ```rust
/// use aidlens::{OutputLanguage, Role, Settings};
///
/// let settings = Settings::builder()
///     .role(Role::Volunteer)
///     .language(OutputLanguage::Hindi)
///     .model("gemini-2.5-flash")
///     .api_key("test-key")
///     .build()
///     .unwrap();
/// assert_eq!(settings.role, Role::Volunteer);
/// ```
#[derive(Clone)]
pub struct Settings {
    /// Who the answer is written for. Default: [`Role::NgoWorker`].
    pub role: Role,

    /// Language of the answer. Default: [`OutputLanguage::English`].
    pub language: OutputLanguage,

    /// Model identifier, with or without the `models/` prefix.
    pub model: String,

    /// Gemini API key. Required unless `provider` names another backend.
    pub api_key: String,

    /// Named edgequake provider ("openai", "anthropic", "ollama", …).
    /// `None` selects the built-in Gemini backend.
    pub provider: Option<String>,

    /// Sampling temperature forwarded to the model. `None` uses the model default.
    pub temperature: Option<f32>,

    /// HTTP request timeout for each model call, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Caps applied to PDF text extraction.
    pub limits: ExtractionLimits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            role: Role::default(),
            language: OutputLanguage::default(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            provider: None,
            temperature: None,
            api_timeout_secs: 60,
            limits: ExtractionLimits::default(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("role", &self.role)
            .field("language", &self.language)
            .field("model", &self.model)
            .field(
                "api_key",
                &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" },
            )
            .field("provider", &self.provider)
            .field("temperature", &self.temperature)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("limits", &self.limits)
            .finish()
    }
}

impl Settings {
    /// Create a new builder for `Settings`.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder {
            settings: Self::default(),
        }
    }

    /// Defaults overlaid with `GEMINI_API_KEY`, `GEMINI_MODEL`,
    /// `AIDLENS_PROVIDER`, `AIDLENS_ROLE` and `AIDLENS_LANGUAGE`.
    ///
    /// Unparseable role/language values are rejected rather than ignored.
    pub fn from_env() -> Result<Self, AidLensError> {
        let mut builder = Self::builder();

        if let Some(key) = non_empty_env("GEMINI_API_KEY") {
            builder = builder.api_key(key);
        }
        if let Some(model) = non_empty_env("GEMINI_MODEL") {
            builder = builder.model(model);
        }
        if let Some(provider) = non_empty_env("AIDLENS_PROVIDER") {
            builder = builder.provider(provider);
        }
        if let Some(role) = non_empty_env("AIDLENS_ROLE") {
            builder = builder.role(role.parse()?);
        }
        if let Some(lang) = non_empty_env("AIDLENS_LANGUAGE") {
            builder = builder.language(lang.parse()?);
        }

        builder.build()
    }

    /// Whether the built-in Gemini backend serves this request.
    pub fn uses_gemini(&self) -> bool {
        match self.provider.as_deref() {
            None => true,
            Some(p) => p.eq_ignore_ascii_case("gemini") || p.eq_ignore_ascii_case("google"),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`Settings`].
#[derive(Debug)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn role(mut self, role: Role) -> Self {
        self.settings.role = role;
        self
    }

    pub fn language(mut self, language: OutputLanguage) -> Self {
        self.settings.language = language;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.settings.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.settings.api_key = key.into();
        self
    }

    pub fn provider(mut self, name: impl Into<String>) -> Self {
        self.settings.provider = Some(name.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.settings.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.api_timeout_secs = secs;
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.settings.limits.max_pages = n;
        self
    }

    pub fn max_chars(mut self, n: usize) -> Self {
        self.settings.limits.max_chars = n;
        self
    }

    /// Build the settings, validating constraints.
    ///
    /// An empty API key is allowed here; it is checked when a request
    /// actually needs the Gemini backend.
    pub fn build(self) -> Result<Settings, AidLensError> {
        let s = &self.settings;
        if s.limits.max_pages == 0 {
            return Err(AidLensError::InvalidConfig(
                "max_pages must be ≥ 1".into(),
            ));
        }
        if s.limits.max_chars == 0 {
            return Err(AidLensError::InvalidConfig(
                "max_chars must be ≥ 1".into(),
            ));
        }
        if s.api_timeout_secs == 0 {
            return Err(AidLensError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.settings)
    }
}

/// Caps applied by [`crate::pipeline::document::extract_document_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionLimits {
    /// Only the first `max_pages` pages are read. Default: 8.
    pub max_pages: usize,
    /// Joined text longer than this many characters is truncated. Default: 12000.
    pub max_chars: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_pages: 8,
            max_chars: 12_000,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Audience the answer is tailored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    NgoWorker,
    Volunteer,
    Student,
}

impl Role {
    /// Label interpolated into the prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::NgoWorker => "NGO Worker",
            Role::Volunteer => "Volunteer",
            Role::Student => "Student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = AidLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match norm.as_str() {
            "ngo" | "ngoworker" => Ok(Role::NgoWorker),
            "volunteer" => Ok(Role::Volunteer),
            "student" => Ok(Role::Student),
            _ => Err(AidLensError::InvalidConfig(format!(
                "unknown role '{s}' (expected ngo-worker, volunteer or student)"
            ))),
        }
    }
}

/// Language the answer is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputLanguage {
    #[default]
    English,
    Hindi,
}

impl OutputLanguage {
    /// Label interpolated into the prompt.
    pub fn label(&self) -> &'static str {
        match self {
            OutputLanguage::English => "English",
            OutputLanguage::Hindi => "Hindi",
        }
    }
}

impl fmt::Display for OutputLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputLanguage {
    type Err = AidLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(OutputLanguage::English),
            "hindi" | "hi" => Ok(OutputLanguage::Hindi),
            _ => Err(AidLensError::InvalidConfig(format!(
                "unknown language '{s}' (expected english or hindi)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_extraction_caps() {
        let s = Settings::default();
        assert_eq!(s.limits.max_pages, 8);
        assert_eq!(s.limits.max_chars, 12_000);
        assert_eq!(s.api_timeout_secs, 60);
        assert_eq!(s.model, DEFAULT_MODEL);
        assert!(s.uses_gemini());
    }

    #[test]
    fn builder_rejects_zero_caps() {
        assert!(Settings::builder().max_pages(0).build().is_err());
        assert!(Settings::builder().max_chars(0).build().is_err());
        assert!(Settings::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn temperature_is_clamped() {
        let s = Settings::builder().temperature(5.0).build().unwrap();
        assert_eq!(s.temperature, Some(2.0));
    }

    #[test]
    fn debug_redacts_api_key() {
        let s = Settings::builder().api_key("secret-123").build().unwrap();
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("secret-123"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn role_parsing_accepts_labels_and_slugs() {
        assert_eq!("NGO Worker".parse::<Role>().unwrap(), Role::NgoWorker);
        assert_eq!("ngo-worker".parse::<Role>().unwrap(), Role::NgoWorker);
        assert_eq!("Volunteer".parse::<Role>().unwrap(), Role::Volunteer);
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        assert!("doctor".parse::<Role>().is_err());
    }

    #[test]
    fn language_parsing() {
        assert_eq!("Hindi".parse::<OutputLanguage>().unwrap(), OutputLanguage::Hindi);
        assert_eq!("en".parse::<OutputLanguage>().unwrap(), OutputLanguage::English);
        assert!("tamil".parse::<OutputLanguage>().is_err());
    }

    #[test]
    fn named_provider_disables_gemini_backend() {
        let s = Settings::builder().provider("openai").build().unwrap();
        assert!(!s.uses_gemini());
        let s = Settings::builder().provider("Gemini").build().unwrap();
        assert!(s.uses_gemini());
    }
}
