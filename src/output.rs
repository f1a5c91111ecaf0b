//! Generation results and the formats they can be rendered in.
//!
//! A [`QuizOutput`] is all-or-nothing: it only exists when at least one
//! row was produced. Row numbering in every rendered form is 1-based and
//! positional, independent of whatever the model put in the `No` column.

use crate::config::QuizRequest;
use crate::error::McqGenError;
use crate::pipeline::flatten::{DisplayRow, COLUMNS};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// A complete quiz table plus the context it was generated in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOutput {
    /// Document name (file name or URL).
    pub source: String,
    pub request: QuizRequest,
    pub rows: Vec<DisplayRow>,
    /// The review call's assessment, when the review stage ran.
    pub review: Option<String>,
    pub stats: GenerationStats,
}

/// Token usage and timings for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Characters of document text sent to the model.
    pub document_chars: usize,
    /// `true` when the document was cut to `max_input_chars`.
    pub truncated: bool,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl GenerationStats {
    /// One-line usage caption, e.g. for a status bar.
    pub fn caption(&self) -> String {
        format!(
            "Tokens — total: {}, prompt: {}, completion: {} · {}ms",
            self.total_input_tokens + self.total_output_tokens,
            self.total_input_tokens,
            self.total_output_tokens,
            self.total_duration_ms
        )
    }
}

/// How a [`QuizOutput`] is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// GFM pipe table with a leading row-number column. (default)
    #[default]
    Markdown,
    /// The eight display columns as CSV with a header row.
    Csv,
    /// The full [`QuizOutput`] as pretty JSON.
    Json,
}

impl OutputFormat {
    /// Infer the format from a file extension; unknown extensions are Markdown.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("csv") => OutputFormat::Csv,
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Markdown,
        }
    }
}

impl QuizOutput {
    /// Render in the given format.
    pub fn render(&self, format: OutputFormat) -> Result<String, McqGenError> {
        match format {
            OutputFormat::Markdown => Ok(self.to_markdown()),
            OutputFormat::Csv => self.to_csv(),
            OutputFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| McqGenError::Internal(format!("JSON serialisation: {e}"))),
        }
    }

    /// Markdown pipe table; the review, if any, follows as a quote block.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "| # | {} |", COLUMNS.join(" | "));
        let _ = writeln!(out, "|---:|{}", "---|".repeat(COLUMNS.len()));
        for (i, row) in self.rows.iter().enumerate() {
            let cells: Vec<String> = row.cells().iter().map(|c| escape_cell(c)).collect();
            let _ = writeln!(out, "| {} | {} |", i + 1, cells.join(" | "));
        }
        if let Some(ref review) = self.review {
            out.push('\n');
            for line in review.lines() {
                let _ = writeln!(out, "> {line}");
            }
        }
        out
    }

    /// CSV with the eight display columns.
    pub fn to_csv(&self) -> Result<String, McqGenError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            wtr.serialize(row)
                .map_err(|e| McqGenError::Internal(format!("CSV serialisation: {e}")))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| McqGenError::Internal(format!("CSV flush: {e}")))?;
        String::from_utf8(bytes).map_err(|e| McqGenError::Internal(format!("CSV encoding: {e}")))
    }
}

/// Make a cell safe inside a GFM table row.
fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace("\r\n", "<br>").replace('\n', "<br>")
}
