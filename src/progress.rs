//! Progress-callback trait for per-stage generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to be told
//! when each stage of a request starts and finishes. The CLI uses this to
//! drive its spinner; a web front-end could forward the events over a
//! channel instead.
//!
//! # Example
//!
//! ```rust
//! use mcqgen::{GenerationConfig, GenerationProgressCallback, ResponseSchema, Stage};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl GenerationProgressCallback for Logger {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{stage}…");
//!     }
//! }
//!
//! let schema = ResponseSchema::from_value(serde_json::json!({"1": {"mcq": ""}}));
//! let config = GenerationConfig::builder(schema)
//!     .progress_callback(Arc::new(Logger) as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The stages a quiz request goes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Turning the document into text.
    Extract,
    /// The quiz-generation LLM call.
    Generate,
    /// The quiz-review LLM call.
    Review,
    /// Decoding, normalising and flattening the response.
    Tabulate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Extract => "Reading document",
            Stage::Generate => "Generating MCQs",
            Stage::Review => "Reviewing quiz",
            Stage::Tabulate => "Building table",
        };
        f.write_str(s)
    }
}

/// Called by the generation pipeline as it moves through each [`Stage`].
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// web UI shares one config across request tasks.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// # Arguments
    /// * `stage`      — the stage that finished
    /// * `output_len` — characters of text produced (extracted text, model
    ///   output) or rows produced for [`Stage::Tabulate`]
    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let _ = (stage, output_len);
    }

    /// Called once when a stage fails and the request is aborted.
    fn on_error(&self, stage: Stage, error: String) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl GenerationProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage:?}"));
        }

        fn on_stage_complete(&self, stage: Stage, output_len: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {stage:?} {output_len}"));
        }

        fn on_error(&self, stage: Stage, error: String) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {stage:?} {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Extract);
        cb.on_stage_complete(Stage::Extract, 1200);
        cb.on_error(Stage::Generate, "boom".into());
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Generate);
        rec.on_stage_complete(Stage::Generate, 512);
        rec.on_stage_start(Stage::Review);
        rec.on_error(Stage::Review, "timeout".into());

        let events = rec.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "start Generate",
                "done Generate 512",
                "start Review",
                "error Review timeout"
            ]
        );
    }

    #[test]
    fn stage_labels_are_human_readable() {
        assert_eq!(Stage::Generate.to_string(), "Generating MCQs");
        assert_eq!(Stage::Extract.to_string(), "Reading document");
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Tabulate);
    }
}
