//! Error types for the mcqgen library.
//!
//! A single fatal error type, [`McqGenError`], covers every way a quiz
//! request can be aborted. There is no partial-success channel: either a
//! complete table is produced or the request fails with one of these.
//!
//! Variants are grouped by the stage that raises them so the presentation
//! layer (CLI or web UI) can show a message that says *where* things went
//! wrong:
//!
//! * **input**: the user did not supply what a request needs;
//! * **extraction**: the document could not be turned into text;
//! * **LLM**: the generation chain could not be run;
//! * **response**: the model answered, but not with anything tabulable.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mcqgen library.
#[derive(Debug, Error)]
pub enum McqGenError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No document was supplied with the request.
    #[error("Please upload a file.")]
    MissingFile,

    /// The subject field was empty or whitespace.
    #[error("Please enter a subject.")]
    MissingSubject,

    /// Question count outside the accepted range.
    #[error("Number of MCQs must be between {min} and {max}, got {got}")]
    QuestionCountOutOfRange { got: u32, min: u32, max: u32 },

    /// Question count that is not a whole number at all.
    #[error("Number of MCQs must be a whole number between {min} and {max}, got '{raw}'")]
    QuestionCountInvalid { raw: String, min: u32, max: u32 },

    /// A free-text field exceeded its length limit.
    #[error("{field} must be at most {max} characters, got {got}")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        got: usize,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file is neither a PDF nor UTF-8 text.
    #[error("Unsupported file format for '{name}': only PDF and text files are supported")]
    UnsupportedFormat { name: String },

    /// The PDF could not be parsed.
    #[error("Failed to read PDF '{name}': {detail}")]
    PdfExtractionFailed { name: String, detail: String },

    /// The document parsed but contains no usable text.
    #[error("No text could be extracted from '{name}'")]
    EmptyDocument { name: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API call failed.
    #[error("Error while calling generator ({stage}): {message}")]
    LlmApiError { stage: &'static str, message: String },

    // ── Response errors ───────────────────────────────────────────────────
    /// The response could not be decoded into a JSON object.
    #[error("Generator returned an unexpected response format.")]
    UnexpectedResponseFormat,

    /// The response object has no `quiz` / `Quiz` / `QUIZ` entry.
    #[error("Generator response has no 'quiz' field.")]
    MissingQuiz,

    /// The quiz payload did not normalise to any question records.
    #[error("Could not parse 'quiz' from response.")]
    UnparseableQuiz,

    /// Question records existed but none flattened into a display row.
    #[error("Parsed quiz rows are empty after normalization.")]
    EmptyTable,

    // ── Config errors ─────────────────────────────────────────────────────
    /// The response-schema template file could not be read.
    #[error("Failed to read response schema '{path}': {source}")]
    SchemaUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The response-schema template file is not valid JSON.
    #[error("Response schema '{path}' is not valid JSON: {source}")]
    SchemaInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McqGenError {
    /// `true` for errors caused by the user's form input rather than by the
    /// document, the provider or the model.
    ///
    /// The web UI answers these with `400 Bad Request`.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            McqGenError::MissingFile
                | McqGenError::MissingSubject
                | McqGenError::QuestionCountOutOfRange { .. }
                | McqGenError::QuestionCountInvalid { .. }
                | McqGenError::FieldTooLong { .. }
                | McqGenError::UnsupportedFormat { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_errors_have_distinct_messages() {
        let msgs = [
            McqGenError::UnexpectedResponseFormat.to_string(),
            McqGenError::MissingQuiz.to_string(),
            McqGenError::UnparseableQuiz.to_string(),
            McqGenError::EmptyTable.to_string(),
        ];
        for (i, a) in msgs.iter().enumerate() {
            for b in &msgs[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unparseable_quiz_display() {
        assert!(McqGenError::UnparseableQuiz
            .to_string()
            .contains("Could not parse 'quiz'"));
    }

    #[test]
    fn count_out_of_range_display() {
        let e = McqGenError::QuestionCountOutOfRange {
            got: 60,
            min: 1,
            max: 50,
        };
        let msg = e.to_string();
        assert!(msg.contains("60"), "got: {msg}");
        assert!(msg.contains("50"), "got: {msg}");
    }

    #[test]
    fn invalid_count_display_quotes_input() {
        let e = McqGenError::QuestionCountInvalid {
            raw: "ten".into(),
            min: 1,
            max: 50,
        };
        assert_eq!(
            e.to_string(),
            "Number of MCQs must be a whole number between 1 and 50, got 'ten'"
        );
        assert!(e.is_input_error());
    }

    #[test]
    fn llm_error_display_names_stage() {
        let e = McqGenError::LlmApiError {
            stage: "review",
            message: "503 Service Unavailable".into(),
        };
        assert!(e.to_string().contains("review"));
        assert!(e.to_string().contains("503"));
    }

    #[test]
    fn input_errors_are_classified() {
        assert!(McqGenError::MissingFile.is_input_error());
        assert!(McqGenError::MissingSubject.is_input_error());
        assert!(!McqGenError::EmptyTable.is_input_error());
        assert!(!McqGenError::Internal("x".into()).is_input_error());
    }
}
