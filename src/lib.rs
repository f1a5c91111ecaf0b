//! # mcqgen
//!
//! Generate multiple-choice quizzes from documents with a Large Language
//! Model, and turn whatever shape of JSON the model returns into a fixed
//! eight-column table.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / text file / URL / upload
//!  │
//!  ├─ 1. Extract   read bytes, pull text (pdf-extract on the blocking pool)
//!  ├─ 2. Quiz      LLM call with subject, count, tone and the response schema
//!  ├─ 3. Review    optional second call assessing the quiz
//!  ├─ 4. Decode    lenient JSON decoding of the model text
//!  ├─ 5. Normalize any payload shape → ordered question records
//!  └─ 6. Flatten   question record → No / Question / Option A-D / combined / Correct
//! ```
//!
//! Steps 4-6 never fail on their own. Whether an empty result is an error,
//! and which one, is decided by [`tabulate`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mcqgen::{generate, GenerationConfig, QuizRequest, ResponseSchema};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let schema = ResponseSchema::load("response.json")?;
//!     let config = GenerationConfig::builder(schema).build()?;
//!     let request = QuizRequest::new(5, "Photosynthesis", "Simple")?;
//!     let quiz = generate("biology.pdf", &request, &config).await?;
//!     println!("{}", quiz.to_markdown());
//!     eprintln!("{}", quiz.stats.caption());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `mcqgen` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `server` | on      | Enables the web UI in [`server`] (axum + maud + tower-http) |
//!
//! Library-only use:
//! ```toml
//! mcqgen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod schema;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, QuizRequest};
pub use error::McqGenError;
pub use generate::{
    generate, generate_from_bytes, generate_sync, generate_to_file, table_from_response,
};
pub use output::{GenerationStats, OutputFormat, QuizOutput};
pub use pipeline::flatten::DisplayRow;
pub use pipeline::tabulate::{tabulate, RawResponse, Tabulated};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use schema::ResponseSchema;
