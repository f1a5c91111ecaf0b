//! Quiz generation entry points.
//!
//! Every entry point runs the same four steps and stops at the first error:
//!
//! 1. resolve the document (path, URL or in-memory upload) and extract text;
//! 2. resolve the LLM provider;
//! 3. run the quiz chain;
//! 4. tabulate the response.
//!
//! Input validation happens before any of this, when the caller builds the
//! [`QuizRequest`].

use crate::config::{GenerationConfig, QuizRequest, DEFAULT_MODEL};
use crate::error::McqGenError;
use crate::output::{GenerationStats, OutputFormat, QuizOutput};
use crate::pipeline::chain::{self, ChatModel};
use crate::pipeline::extract::{self, SourceDocument};
use crate::pipeline::tabulate::{self, RawResponse};
use crate::progress::Stage;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Generate a quiz from a local file or HTTP/HTTPS URL.
///
/// # Example
/// ```rust,no_run
/// use mcqgen::{generate, GenerationConfig, QuizRequest, ResponseSchema};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let schema = ResponseSchema::load("response.json")?;
/// let config = GenerationConfig::builder(schema).build()?;
/// let request = QuizRequest::new(5, "Biology", "Simple")?;
/// let quiz = generate("chapter1.pdf", &request, &config).await?;
/// println!("{}", quiz.to_markdown());
/// # Ok(())
/// # }
/// ```
pub async fn generate(
    input: impl AsRef<str>,
    request: &QuizRequest,
    config: &GenerationConfig,
) -> Result<QuizOutput, McqGenError> {
    let input = input.as_ref();
    info!("Starting quiz generation: {}", input);

    notify_start(config, Stage::Extract);
    let doc = extract::load(input, config.download_timeout_secs)
        .await
        .inspect_err(|e| notify_error(config, Stage::Extract, e))?;
    generate_from_document(doc, request, config).await
}

/// Generate a quiz from document bytes already in memory (e.g. an upload).
///
/// `name` is used for messages and to recognise `.pdf` files whose bytes
/// lack the usual header.
pub async fn generate_from_bytes(
    name: impl Into<String>,
    bytes: Vec<u8>,
    request: &QuizRequest,
    config: &GenerationConfig,
) -> Result<QuizOutput, McqGenError> {
    notify_start(config, Stage::Extract);
    generate_from_document(SourceDocument::new(name, bytes), request, config).await
}

/// Generate a quiz and write it to `output_path`.
///
/// With `format` unset the format follows the file extension. Uses atomic
/// write (temp file + rename) to prevent partial files.
pub async fn generate_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    format: Option<OutputFormat>,
    request: &QuizRequest,
    config: &GenerationConfig,
) -> Result<QuizOutput, McqGenError> {
    let output = generate(input, request, config).await?;
    let path = output_path.as_ref();
    let format = format.unwrap_or_else(|| OutputFormat::from_path(path));
    let rendered = output.render(format)?;
    write_atomic(path, &rendered).await?;
    info!("Wrote {} rows to {}", output.rows.len(), path.display());
    Ok(output)
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input: impl AsRef<str>,
    request: &QuizRequest,
    config: &GenerationConfig,
) -> Result<QuizOutput, McqGenError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| McqGenError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input, request, config))
}

/// Turn an already-obtained chain response into a quiz table.
///
/// This is step 4 of the pipeline on its own, for callers that run the
/// model themselves.
pub fn table_from_response(
    raw: RawResponse,
) -> Result<tabulate::Tabulated, McqGenError> {
    tabulate::tabulate(raw)
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn generate_from_document(
    doc: SourceDocument,
    request: &QuizRequest,
    config: &GenerationConfig,
) -> Result<QuizOutput, McqGenError> {
    run_pipeline(doc, request, config, resolve_provider).await
}

/// Steps 1 to 4. `model_for` is only consulted once text was extracted.
async fn run_pipeline<M, F>(
    doc: SourceDocument,
    request: &QuizRequest,
    config: &GenerationConfig,
    model_for: F,
) -> Result<QuizOutput, McqGenError>
where
    M: ChatModel,
    F: FnOnce(&GenerationConfig) -> Result<M, McqGenError>,
{
    let total_start = Instant::now();

    // ── Step 1: Extract text ─────────────────────────────────────────────
    let extract_start = Instant::now();
    let full_text = extract::extract_text(&doc)
        .await
        .inspect_err(|e| notify_error(config, Stage::Extract, e))?;
    let text = extract::truncate_chars(&full_text, config.max_input_chars);
    let truncated = text.len() < full_text.len();
    if truncated {
        warn!(
            "Document text cut to {} characters for the prompt",
            config.max_input_chars
        );
    }
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    let document_chars = text.chars().count();
    notify_complete(config, Stage::Extract, document_chars);

    // ── Step 2: Get/create provider ──────────────────────────────────────
    let model = model_for(config).inspect_err(|e| notify_error(config, Stage::Generate, e))?;

    // ── Step 3: Run the chain ────────────────────────────────────────────
    let chained = chain::run_chain(&model, text, request, config)
        .await
        .inspect_err(|e| {
            let stage = match e {
                McqGenError::LlmApiError { stage: "review", .. } => Stage::Review,
                _ => Stage::Generate,
            };
            notify_error(config, stage, e)
        })?;

    // ── Step 4: Tabulate ─────────────────────────────────────────────────
    notify_start(config, Stage::Tabulate);
    let table = tabulate::tabulate(chained.response)
        .inspect_err(|e| notify_error(config, Stage::Tabulate, e))?;
    notify_complete(config, Stage::Tabulate, table.rows.len());

    let stats = GenerationStats {
        document_chars,
        truncated,
        total_input_tokens: chained.input_tokens,
        total_output_tokens: chained.output_tokens,
        extract_duration_ms,
        llm_duration_ms: chained.duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Quiz complete: {} rows, {}ms total",
        table.rows.len(),
        stats.total_duration_ms
    );

    Ok(QuizOutput {
        source: doc.name,
        request: request.clone(),
        rows: table.rows,
        review: table.review,
        stats,
    })
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), McqGenError> {
    let write_err = |source| McqGenError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, McqGenError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        McqGenError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, McqGenError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| McqGenError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn notify_start(config: &GenerationConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn notify_complete(config: &GenerationConfig, stage: Stage, len: usize) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, len);
    }
}

fn notify_error(config: &GenerationConfig, stage: Stage, error: &McqGenError) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_error(stage, error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::chain::scripted::{ok, ScriptedModel};
    use crate::progress::GenerationProgressCallback;
    use crate::schema::ResponseSchema;
    use std::sync::Mutex;

    const QUIZ_TEXT: &str = r#"{
        "2": {"mcq": "Which gas is released?", "options": {"a": "CO2", "b": "O2"}, "correct": "b"},
        "1": {"mcq": "Where is chlorophyll?", "options": {"a": "Chloroplast", "b": "Nucleus"}, "correct": "a"}
    }"#;

    const NOTES: &[u8] = b"Photosynthesis turns light into chemical energy in the chloroplast.";

    #[derive(Default)]
    struct Recorder {
        started: Mutex<Vec<Stage>>,
        errors: Mutex<Vec<(Stage, String)>>,
    }

    impl GenerationProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.started.lock().unwrap().push(stage);
        }

        fn on_error(&self, stage: Stage, error: String) {
            self.errors.lock().unwrap().push((stage, error));
        }
    }

    fn notes() -> SourceDocument {
        SourceDocument::new("notes.txt", NOTES.to_vec())
    }

    async fn run_scripted(
        model: ScriptedModel,
        config: &GenerationConfig,
    ) -> Result<QuizOutput, McqGenError> {
        let request = QuizRequest::new(2, "Biology", "").unwrap();
        run_pipeline(notes(), &request, config, move |_| Ok(model)).await
    }

    fn config_with(cb: Arc<Recorder>) -> GenerationConfig {
        GenerationConfig::builder(ResponseSchema::from_value(serde_json::json!({})))
            .progress_callback(cb)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn missing_file_aborts_before_provider() {
        let rec = Arc::new(Recorder::default());
        let config = config_with(Arc::clone(&rec));
        let request = QuizRequest::new(3, "History", "").unwrap();

        let err = generate("/no/such/file.pdf", &request, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, McqGenError::FileNotFound { .. }));

        let errors = rec.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, Stage::Extract);
    }

    #[tokio::test]
    async fn unsupported_upload_is_rejected() {
        let rec = Arc::new(Recorder::default());
        let config = config_with(Arc::clone(&rec));
        let request = QuizRequest::new(3, "History", "").unwrap();

        let err = generate_from_bytes("scan.bin", vec![0xff, 0xfe, 0x00, 0x81], &request, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, McqGenError::UnsupportedFormat { .. }));
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/quiz.csv");
        write_atomic(&path, "No,Question\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "No,Question\n");
        assert!(!dir.path().join("nested/out/quiz.csv.tmp").exists());
    }

    #[test]
    fn table_from_response_delegates() {
        let raw = RawResponse::Text(r#"{"quiz": {"mcq": "Q", "correct": "a"}}"#.into());
        let t = table_from_response(raw).unwrap();
        assert_eq!(t.rows[0].correct, "a");
    }

    #[tokio::test]
    async fn scripted_model_produces_sorted_table() {
        let rec = Arc::new(Recorder::default());
        let config = config_with(Arc::clone(&rec));
        let model = ScriptedModel::new(vec![ok(QUIZ_TEXT, 200, 80), ok("Clear questions.", 90, 12)]);

        let output = run_scripted(model, &config).await.unwrap();

        assert_eq!(output.source, "notes.txt");
        assert_eq!(output.rows.len(), 2);
        assert_eq!(output.rows[0].question, "Where is chlorophyll?");
        assert_eq!(output.rows[1].correct, "b");
        assert_eq!(output.review.as_deref(), Some("Clear questions."));
        assert_eq!(output.stats.total_input_tokens, 290);
        assert_eq!(output.stats.total_output_tokens, 92);
        assert!(!output.stats.truncated);
        assert_eq!(
            *rec.started.lock().unwrap(),
            vec![Stage::Extract, Stage::Generate, Stage::Review, Stage::Tabulate]
        );
        assert!(rec.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn review_off_leaves_review_empty() {
        let rec = Arc::new(Recorder::default());
        let config = GenerationConfig::builder(ResponseSchema::from_value(serde_json::json!({})))
            .progress_callback(Arc::clone(&rec) as Arc<dyn GenerationProgressCallback>)
            .review(false)
            .build()
            .unwrap();
        let model = ScriptedModel::new(vec![ok(QUIZ_TEXT, 200, 80)]);

        let output = run_scripted(model, &config).await.unwrap();

        assert_eq!(output.review, None);
        assert_eq!(output.stats.total_input_tokens, 200);
        assert!(!rec.started.lock().unwrap().contains(&Stage::Review));
    }

    #[tokio::test]
    async fn review_failure_is_reported_at_review_stage() {
        let rec = Arc::new(Recorder::default());
        let config = config_with(Arc::clone(&rec));
        let model = ScriptedModel::new(vec![ok(QUIZ_TEXT, 200, 80), Err("503 Service Unavailable".into())]);

        let err = run_scripted(model, &config).await.unwrap_err();

        assert!(matches!(err, McqGenError::LlmApiError { stage: "review", .. }), "{err:?}");
        let errors = rec.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, Stage::Review);
        assert!(errors[0].1.contains("503"));
    }

    #[tokio::test]
    async fn unreadable_quiz_fails_at_tabulate() {
        let rec = Arc::new(Recorder::default());
        let config = config_with(Arc::clone(&rec));
        let model = ScriptedModel::new(vec![ok("Sorry, I cannot help.", 10, 5), ok("n/a", 1, 1)]);

        let err = run_scripted(model, &config).await.unwrap_err();

        assert!(matches!(err, McqGenError::UnparseableQuiz), "{err:?}");
        assert_eq!(rec.errors.lock().unwrap()[0].0, Stage::Tabulate);
    }

    #[tokio::test]
    async fn long_document_is_cut_and_flagged() {
        let config = GenerationConfig::builder(ResponseSchema::from_value(serde_json::json!({})))
            .max_input_chars(14)
            .review(false)
            .build()
            .unwrap();
        let model = ScriptedModel::new(vec![ok(QUIZ_TEXT, 50, 20)]);

        let output = run_scripted(model, &config).await.unwrap();

        assert!(output.stats.truncated);
        assert_eq!(output.stats.document_chars, 14);
    }

    #[tokio::test]
    async fn extraction_failure_never_builds_a_model() {
        let config = config_with(Arc::new(Recorder::default()));
        let request = QuizRequest::new(1, "Biology", "").unwrap();
        let doc = SourceDocument::new("blank.txt", b"\n\n".to_vec());

        let err = run_pipeline(doc, &request, &config, |_| -> Result<ScriptedModel, McqGenError> {
            panic!("model requested before text was extracted")
        })
        .await
        .unwrap_err();

        assert!(matches!(err, McqGenError::EmptyDocument { .. }));
    }
}
