//! CLI binary for mcqgen.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` / `QuizRequest` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use mcqgen::{
    generate, generate_to_file, GenerationConfig, GenerationProgressCallback, OutputFormat,
    ProgressCallback, QuizRequest, ResponseSchema, Stage,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner whose message follows the
/// current stage, plus a log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<Stage, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, stage: Stage) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&stage))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(stage, Instant::now());
        }
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message("…");
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let unit = if stage == Stage::Tabulate { "rows" } else { "chars" };
        self.bar.println(format!(
            "  {} {:<18}  {:<12}  {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{output_len:>6} {unit}")),
            dim(&format!("{:.1}s", self.elapsed_secs(stage))),
        ));
        if stage == Stage::Tabulate {
            self.bar.finish_and_clear();
        }
    }

    fn on_error(&self, stage: Stage, error: String) {
        // Keep only the first line; the full error is printed on exit.
        let msg = error.lines().next().unwrap_or_default().to_string();
        self.bar.println(format!(
            "  {} {:<18}  {}  {}",
            red("✗"),
            stage.to_string(),
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs(stage))),
        ));
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Five questions on a chapter, table on stdout
  mcqgen generate chapter1.pdf --subject Biology --count 5

  # Harder questions, written to CSV
  mcqgen generate notes.txt -s "Organic chemistry" -n 10 --tone "University level" -o quiz.csv

  # From a URL, JSON output, no review call
  mcqgen generate https://example.com/lecture.pdf -s Physics --json --no-review

  # Web UI on http://127.0.0.1:8501
  mcqgen serve

RESPONSE SCHEMA:
  The model is asked to answer in the shape of a JSON template read at
  startup (default: ./response.json). Each entry needs a question ("mcq"),
  its options ("options": {"a": ..., "b": ...}) and the answer ("correct").

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  MCQGEN_SCHEMA           Path to the response schema template
  RUST_LOG                Log filter, e.g. mcqgen=debug

SETUP:
  1. Set API key:     export OPENAI_API_KEY=sk-...
  2. Generate:        mcqgen generate document.pdf --subject History
"#;

/// Generate multiple-choice quizzes from documents with LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "mcqgen",
    version,
    about = "Generate multiple-choice quizzes from PDF and text documents with LLMs",
    long_about = "Generate multiple-choice questions (MCQs) from PDF or text documents \
(local files or URLs) using Large Language Models, and render them as a table. \
Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any OpenAI-compatible \
endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MCQGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MCQGEN_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a quiz from one document.
    Generate(GenerateArgs),
    /// Serve the web UI.
    #[cfg(feature = "server")]
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Local PDF/text file path or HTTP/HTTPS URL.
    input: String,

    /// Subject the questions are about.
    #[arg(short, long, env = "MCQGEN_SUBJECT")]
    subject: String,

    /// Number of questions (1–50).
    #[arg(short = 'n', long, env = "MCQGEN_COUNT", default_value_t = 3)]
    count: u32,

    /// Complexity level of the questions. Blank means "Simple".
    #[arg(short, long, env = "MCQGEN_TONE", default_value = "")]
    tone: String,

    /// Write the quiz to this file instead of stdout.
    #[arg(short, long, env = "MCQGEN_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format. Defaults to the output file's extension, else Markdown.
    #[arg(long, env = "MCQGEN_FORMAT", value_enum)]
    format: Option<FormatArg>,

    /// Output structured JSON (same as --format json).
    #[arg(long, env = "MCQGEN_JSON")]
    json: bool,

    /// Disable progress spinner.
    #[arg(long, env = "MCQGEN_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[cfg(feature = "server")]
#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "MCQGEN_ADDR", default_value = "127.0.0.1:8501")]
    addr: std::net::SocketAddr,

    #[command(flatten)]
    model: ModelArgs,
}

/// Settings shared by `generate` and `serve`.
#[derive(Args, Debug)]
struct ModelArgs {
    /// JSON template the model's answer must follow.
    #[arg(long, env = "MCQGEN_SCHEMA", default_value = "response.json")]
    schema: PathBuf,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "MCQGEN_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "MCQGEN_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Path to a text file containing a custom system prompt for the quiz call.
    #[arg(long, env = "MCQGEN_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Skip the second, quiz-review LLM call.
    #[arg(long, env = "MCQGEN_NO_REVIEW")]
    no_review: bool,

    /// Document characters sent to the model; the rest is cut.
    #[arg(long, env = "MCQGEN_MAX_INPUT_CHARS", default_value_t = 24_000)]
    max_input_chars: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "MCQGEN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Md,
    Csv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Md => OutputFormat::Markdown,
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active.
    let show_progress = match cli.command {
        Command::Generate(ref args) => !cli.quiet && !args.no_progress && !args.json,
        #[cfg(feature = "server")]
        Command::Serve(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Generate(ref args) => run_generate(args, cli.quiet, show_progress).await,
        #[cfg(feature = "server")]
        Command::Serve(ref args) => {
            let config = build_config(&args.model, None).await?;
            mcqgen::server::serve(args.addr, config)
                .await
                .context("Web server failed")
        }
    }
}

async fn run_generate(args: &GenerateArgs, quiet: bool, show_progress: bool) -> Result<()> {
    // Bad input is rejected before the schema or the document is touched.
    let request = QuizRequest::new(args.count, &args.subject, &args.tone)?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&args.model, progress_cb).await?;

    let format = if args.json {
        Some(OutputFormat::Json)
    } else {
        args.format.map(OutputFormat::from)
    };

    if let Some(ref output_path) = args.output {
        let output = generate_to_file(&args.input, output_path, format, &request, &config)
            .await
            .context("Generation failed")?;

        if !quiet {
            eprintln!(
                "{}  {} questions  {}ms  →  {}",
                green("✔"),
                output.rows.len(),
                output.stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
            eprintln!("   {}", dim(&output.stats.caption()));
        }
    } else {
        let output = generate(&args.input, &request, &config)
            .await
            .context("Generation failed")?;

        let rendered = output
            .render(format.unwrap_or_default())
            .context("Failed to render quiz")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }

        if !quiet && !args.json {
            eprintln!("   {}", dim(&output.stats.caption()));
            if output.stats.truncated {
                eprintln!(
                    "   {}",
                    dim(&format!(
                        "document cut to {} characters",
                        output.stats.document_chars
                    ))
                );
            }
        }
    }

    Ok(())
}

/// Map CLI args to `GenerationConfig`.
async fn build_config(
    args: &ModelArgs,
    progress: Option<ProgressCallback>,
) -> Result<GenerationConfig> {
    let schema = ResponseSchema::load(&args.schema)
        .with_context(|| format!("Cannot start without a response schema ({:?})", args.schema))?;

    let mut builder = GenerationConfig::builder(schema)
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .review(!args.no_review)
        .max_input_chars(args.max_input_chars)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref path) = args.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
