//! Configuration types for quiz generation.
//!
//! Two structs, two lifetimes:
//!
//! * [`GenerationConfig`] is built once per process (CLI run or server
//!   start): provider, model, sampling knobs, the response-schema template.
//!   Built via [`GenerationConfigBuilder`].
//! * [`QuizRequest`] is built once per submission from user input: how many
//!   questions, on what subject, in what tone. [`QuizRequest::new`] enforces
//!   the input bounds so invalid submissions are rejected before any
//!   external call is made.

use crate::error::McqGenError;
use crate::progress::ProgressCallback;
use crate::schema::ResponseSchema;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Fewest questions a request may ask for.
pub const MIN_QUESTIONS: u32 = 1;
/// Most questions a request may ask for.
pub const MAX_QUESTIONS: u32 = 50;
/// Question count used when the user does not pick one.
pub const DEFAULT_QUESTION_COUNT: u32 = 3;
/// Longest accepted subject, in characters.
pub const MAX_SUBJECT_CHARS: usize = 50;
/// Longest accepted tone / complexity level, in characters.
pub const MAX_TONE_CHARS: usize = 30;
/// Tone used when the user leaves the field blank.
pub const DEFAULT_TONE: &str = "Simple";

/// Model used when a provider is named without a model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Process-wide settings for the generation chain.
///
/// # Example
/// ```rust
/// use mcqgen::{GenerationConfig, ResponseSchema};
///
/// let schema = ResponseSchema::from_value(serde_json::json!({
///     "1": {"mcq": "question", "options": {"a": "", "b": "", "c": "", "d": ""}, "correct": "a"}
/// }));
/// let config = GenerationConfig::builder(schema)
///     .model("gpt-4.1-mini")
///     .temperature(0.5)
///     .build()
///     .unwrap();
/// assert!(config.review);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// JSON template the model is asked to follow. Loaded from disk at startup.
    pub response_schema: ResponseSchema,

    /// LLM model identifier, e.g. "gpt-4.1-nano", "claude-sonnet-4-20250514".
    /// If None, uses [`DEFAULT_MODEL`] or the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.7.
    ///
    /// Question writing benefits from some variety; the review call reuses
    /// the same value.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per call. Default: 4096.
    ///
    /// Fifty questions with four options each fit comfortably.
    pub max_tokens: usize,

    /// Custom system prompt for the quiz call. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Run the second, quiz-review call. Default: true.
    pub review: bool,

    /// Document text beyond this many characters is cut before prompting.
    /// Default: 24 000.
    pub max_input_chars: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("review", &self.review)
            .field("max_input_chars", &self.max_input_chars)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a builder around the (mandatory) response schema.
    pub fn builder(response_schema: ResponseSchema) -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: GenerationConfig {
                response_schema,
                model: None,
                provider_name: None,
                provider: None,
                temperature: 0.7,
                max_tokens: 4096,
                system_prompt: None,
                review: true,
                max_input_chars: 24_000,
                download_timeout_secs: 120,
                progress_callback: None,
            },
        }
    }
}

/// Builder for [`GenerationConfig`].
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl fmt::Debug for GenerationConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn review(mut self, v: bool) -> Self {
        self.config.review = v;
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, McqGenError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(McqGenError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.max_input_chars == 0 {
            return Err(McqGenError::InvalidConfig(
                "max_input_chars must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// One user submission: how many questions, on what, how hard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    /// Number of questions to generate, within `MIN_QUESTIONS..=MAX_QUESTIONS`.
    pub question_count: u32,
    /// Subject the questions are about. Never blank.
    pub subject: String,
    /// Complexity level / tone, e.g. "Simple" or "University level".
    pub tone: String,
}

impl QuizRequest {
    /// Validate raw form input.
    ///
    /// Subject and tone are trimmed; a blank tone becomes [`DEFAULT_TONE`].
    pub fn new(
        question_count: u32,
        subject: impl AsRef<str>,
        tone: impl AsRef<str>,
    ) -> Result<Self, McqGenError> {
        let subject = subject.as_ref().trim();
        let tone = tone.as_ref().trim();

        if subject.is_empty() {
            return Err(McqGenError::MissingSubject);
        }
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&question_count) {
            return Err(McqGenError::QuestionCountOutOfRange {
                got: question_count,
                min: MIN_QUESTIONS,
                max: MAX_QUESTIONS,
            });
        }
        check_len("Subject", subject, MAX_SUBJECT_CHARS)?;
        check_len("Complexity level", tone, MAX_TONE_CHARS)?;

        Ok(Self {
            question_count,
            subject: subject.to_string(),
            tone: if tone.is_empty() {
                DEFAULT_TONE.to_string()
            } else {
                tone.to_string()
            },
        })
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), McqGenError> {
    let got = value.chars().count();
    if got > max {
        return Err(McqGenError::FieldTooLong { field, max, got });
    }
    Ok(())
}
