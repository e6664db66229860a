//! Progress-callback trait for per-stage analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::analyze::Analyzer::with_progress`] to hear about each stage as it
//! starts and finishes. The CLI uses it to drive a spinner; a web host could
//! forward the events to a socket instead.
//!
//! # Example
//!
//! ```rust
//! use aidlens::{AnalysisProgressCallback, Stage};
//! use std::sync::Mutex;
//!
//! struct Log(Mutex<Vec<String>>);
//!
//! impl AnalysisProgressCallback for Log {
//!     fn on_stage_start(&self, stage: Stage) {
//!         self.0.lock().unwrap().push(format!("start {stage}"));
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

/// A pipeline stage that does real work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Stage {
    ExtractDocument,
    Transcribe,
    Generate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ExtractDocument => "reading PDF",
            Stage::Transcribe => "transcribing voice note",
            Stage::Generate => "generating answer",
        })
    }
}

/// Called by the analyzer around each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Stages never overlap within one request.
pub trait AnalysisProgressCallback: Send + Sync {
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// # Arguments
    /// * `elapsed_ms`: wall-clock time spent in the stage
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when the stage fails; no later stage will start.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in the analyzer.
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    impl AnalysisProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.0.lock().unwrap().push(format!("start:{stage:?}"));
        }
        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.0.lock().unwrap().push(format!("error:{stage:?}:{error}"));
        }
    }

    #[test]
    fn defaults_are_noops_and_overrides_fire() {
        let rec = Recorder(Mutex::new(Vec::new()));
        rec.on_stage_start(Stage::Transcribe);
        rec.on_stage_complete(Stage::Transcribe, 12);
        rec.on_stage_error(Stage::Generate, "boom");
        assert_eq!(
            *rec.0.lock().unwrap(),
            vec!["start:Transcribe".to_string(), "error:Generate:boom".to_string()]
        );
    }

    #[test]
    fn callback_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoopProgressCallback>();
        let _cb: ProgressCallback = Arc::new(NoopProgressCallback);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::ExtractDocument.to_string(), "reading PDF");
    }
}
