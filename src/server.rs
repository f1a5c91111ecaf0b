//! Web UI: one form, one results page.
//!
//! | Route            | Purpose                                        |
//! |------------------|------------------------------------------------|
//! | `GET /`          | upload form                                    |
//! | `POST /generate` | multipart submission → quiz table or error     |
//! | `GET /health`    | liveness check, plain `ok`                     |
//!
//! Submissions are validated in the same order the form is laid out (file,
//! then subject, then count and tone) and rejected with `400 Bad Request`
//! before any LLM call. Pipeline failures are shown on the form page with
//! the error's message.

use crate::config::{
    GenerationConfig, QuizRequest, DEFAULT_QUESTION_COUNT, DEFAULT_TONE, MAX_QUESTIONS,
    MAX_SUBJECT_CHARS, MAX_TONE_CHARS, MIN_QUESTIONS,
};
use crate::error::McqGenError;
use crate::generate::generate_from_bytes;
use crate::output::QuizOutput;
use crate::pipeline::flatten::COLUMNS;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use maud::{html, Markup, DOCTYPE};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const TITLE: &str = "MCQs Creator Application";

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// State shared by all handlers.
pub struct AppState {
    pub config: GenerationConfig,
}

/// Build the router around a generation config.
pub fn router(config: GenerationConfig) -> Router {
    let state = Arc::new(AppState { config });

    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate_quiz))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, config: GenerationConfig) -> std::io::Result<()> {
    let app = router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

async fn index() -> Html<String> {
    Html(page(form(None)).into_string())
}

async fn health() -> &'static str {
    "ok"
}

async fn generate_quiz(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let submission = match read_submission(multipart).await {
        Ok(s) => s,
        Err(e) => return error_response(&e),
    };

    let request = match submission.validate() {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };

    let Some(upload) = submission.file else {
        return error_response(&McqGenError::MissingFile);
    };

    info!(
        "Generating {} MCQs on '{}' from upload '{}' ({} bytes)",
        request.question_count,
        request.subject,
        upload.name,
        upload.bytes.len()
    );

    match generate_from_bytes(upload.name, upload.bytes, &request, &state.config).await {
        Ok(output) => Html(page(results(&output)).into_string()).into_response(),
        Err(e) => error_response(&e),
    }
}

// ── Form handling ────────────────────────────────────────────────────────

struct Upload {
    name: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct Submission {
    file: Option<Upload>,
    count: Option<String>,
    subject: String,
    tone: String,
}

impl Submission {
    /// File first, then the text fields.
    fn validate(&self) -> Result<QuizRequest, McqGenError> {
        if self.file.is_none() {
            return Err(McqGenError::MissingFile);
        }
        let count = match self.count.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_QUESTION_COUNT,
            Some(raw) => raw.parse().map_err(|_| {
                // A blank subject still wins over a bad count.
                if self.subject.trim().is_empty() {
                    McqGenError::MissingSubject
                } else {
                    McqGenError::QuestionCountInvalid {
                        raw: raw.to_string(),
                        min: MIN_QUESTIONS,
                        max: MAX_QUESTIONS,
                    }
                }
            })?,
        };
        QuizRequest::new(count, &self.subject, &self.tone)
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, McqGenError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("failed to read multipart field: {e}");
        McqGenError::InvalidConfig(format!("Malformed form submission: {e}"))
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    warn!("failed to read uploaded file: {e}");
                    McqGenError::InvalidConfig(format!("Failed to read uploaded file: {e}"))
                })?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    submission.file = Some(Upload {
                        name: file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "count" | "subject" | "tone" => {
                let text = field.text().await.map_err(|e| {
                    McqGenError::InvalidConfig(format!("Failed to read field '{name}': {e}"))
                })?;
                match name.as_str() {
                    "count" => submission.count = Some(text),
                    "subject" => submission.subject = text,
                    _ => submission.tone = text,
                }
            }
            _ => {}
        }
    }

    Ok(submission)
}

fn error_response(e: &McqGenError) -> Response {
    let status = if e.is_input_error() || matches!(e, McqGenError::InvalidConfig(_)) {
        StatusCode::BAD_REQUEST
    } else {
        error!("Generation failed: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Html(page(form(Some(&e.to_string()))).into_string())).into_response()
}

// ── Views ────────────────────────────────────────────────────────────────

fn page(body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        head {
            meta charset="utf-8";
            meta name="viewport" content="width=device-width, initial-scale=1";
            title { (TITLE) }
            style { (STYLE) }
        }
        body {
            main {
                h1 { (TITLE) }
                (body)
            }
        }
    }
}

fn form(error: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = error {
            p.error role="alert" { (message) }
        }
        form method="post" action="/generate" enctype="multipart/form-data" onsubmit=(SHOW_BUSY) {
            label {
                "Upload a PDF or txt file"
                input type="file" name="file" accept=".pdf,.txt,text/plain,application/pdf";
            }
            label {
                "No. of MCQs"
                input type="number" name="count" min=(MIN_QUESTIONS) max=(MAX_QUESTIONS)
                    value=(DEFAULT_QUESTION_COUNT);
            }
            label {
                "Insert Subject"
                input type="text" name="subject" maxlength=(MAX_SUBJECT_CHARS);
            }
            label {
                "Complexity Level of Questions"
                input type="text" name="tone" maxlength=(MAX_TONE_CHARS)
                    placeholder=(DEFAULT_TONE);
            }
            button type="submit" { "Create MCQs" }
            p.status id="generating" role="status" hidden { "Generating MCQs..." }
        }
    }
}

/// Disable the button and reveal the status line while the POST runs.
const SHOW_BUSY: &str = "this.querySelector('button').disabled = true; \
document.getElementById('generating').hidden = false;";

fn results(output: &QuizOutput) -> Markup {
    html! {
        h2 { "Generated MCQs" }
        p.caption { (output.stats.caption()) }
        @if output.stats.truncated {
            p.caption {
                "Only the first " (output.stats.document_chars)
                " characters of the document were used."
            }
        }
        table {
            thead {
                tr {
                    th { "#" }
                    @for column in COLUMNS {
                        th { (column) }
                    }
                }
            }
            tbody {
                @for (i, row) in output.rows.iter().enumerate() {
                    tr {
                        td { (i + 1) }
                        @for cell in row.cells() {
                            td { (cell) }
                        }
                    }
                }
            }
        }
        @if let Some(ref review) = output.review {
            h2 { "Review" }
            blockquote { (review) }
        }
        p { a href="/" { "Create more MCQs" } }
    }
}

const STYLE: &str = "\
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 72rem; padding: 0 1rem; }
label { display: block; margin: 0.75rem 0; }
label input { display: block; margin-top: 0.25rem; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ccc; padding: 0.35rem 0.5rem; text-align: left; vertical-align: top; }
.error { color: #b00020; font-weight: bold; }
.caption { color: #666; font-size: 0.9rem; }
.status { color: #444; font-style: italic; }
blockquote { white-space: pre-wrap; border-left: 3px solid #ccc; margin-left: 0; padding-left: 1rem; }
";
