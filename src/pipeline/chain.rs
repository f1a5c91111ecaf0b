//! The quiz chain: one call to write the quiz, one call to review it.
//!
//! This module only builds messages and drives the provider. All wording
//! lives in [`crate::prompts`]. Its output mirrors what a prompt chain hands
//! back: a JSON object whose `quiz` entry is the model's raw text, plus a
//! `review` entry when the review call ran. Turning that text into rows is
//! [`crate::pipeline::tabulate`]'s job.
//!
//! Calls are made once each. A failed call aborts the request; nothing is
//! retried and no timeout is imposed beyond the provider's own.

use crate::config::{GenerationConfig, QuizRequest};
use crate::error::McqGenError;
use crate::pipeline::tabulate::RawResponse;
use crate::progress::Stage;
use crate::prompts::{quiz_prompt, review_prompt, DEFAULT_SYSTEM_PROMPT, REVIEW_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Key under which the chain stores the quiz text.
pub const QUIZ_KEY: &str = "quiz";
/// Key under which the chain stores the review text.
pub const REVIEW_KEY: &str = "review";

/// Result of running the chain.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    /// `{"quiz": "<model text>", "review": "<model text>"}`.
    pub response: RawResponse,
    /// Prompt tokens across both calls.
    pub input_tokens: u64,
    /// Completion tokens across both calls.
    pub output_tokens: u64,
    /// Wall-clock time spent waiting on the provider.
    pub duration_ms: u64,
}

/// One completed model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// The single exchange the chain needs from a model.
///
/// Implemented for every `edgequake_llm` provider. Errors are returned as
/// display text; the chain attaches the stage name.
pub trait ChatModel: Send + Sync {
    fn reply(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> impl Future<Output = Result<Reply, String>> + Send;
}

impl<'a> ChatModel for Arc<dyn LLMProvider + 'a> {
    async fn reply(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Reply, String> {
        let response = LLMProvider::chat(self.as_ref(), messages, Some(options))
            .await
            .map_err(|e| e.to_string())?;
        Ok(Reply {
            content: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

/// Run the quiz call and, if enabled, the review call.
pub async fn run_chain<M: ChatModel>(
    model: &M,
    text: &str,
    request: &QuizRequest,
    config: &GenerationConfig,
) -> Result<ChainOutput, McqGenError> {
    let start = Instant::now();
    let options = build_options(config);
    let mut response = Map::new();

    let system = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let user = quiz_prompt(text, request, &config.response_schema);

    notify_start(config, Stage::Generate);
    let quiz = complete(model, system, &user, &options, Stage::Generate).await?;
    notify_complete(config, Stage::Generate, quiz.content.len());
    info!(
        "Quiz call: {} input tokens, {} output tokens",
        quiz.input_tokens, quiz.output_tokens
    );

    let mut input_tokens = quiz.input_tokens;
    let mut output_tokens = quiz.output_tokens;

    let review = if config.review {
        notify_start(config, Stage::Review);
        let review = complete(
            model,
            REVIEW_SYSTEM_PROMPT,
            &review_prompt(&quiz.content, request),
            &options,
            Stage::Review,
        )
        .await?;
        notify_complete(config, Stage::Review, review.content.len());
        input_tokens += review.input_tokens;
        output_tokens += review.output_tokens;
        Some(review.content)
    } else {
        None
    };

    response.insert(QUIZ_KEY.to_string(), Value::String(quiz.content));
    if let Some(review) = review {
        response.insert(REVIEW_KEY.to_string(), Value::String(review));
    }

    Ok(ChainOutput {
        response: RawResponse::Mapping(response),
        input_tokens,
        output_tokens,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

async fn complete<M: ChatModel>(
    model: &M,
    system: &str,
    user: &str,
    options: &CompletionOptions,
    stage: Stage,
) -> Result<Reply, McqGenError> {
    let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
    let call_start = Instant::now();

    let reply = model
        .reply(&messages, options)
        .await
        .map_err(|message| McqGenError::LlmApiError {
            stage: stage_name(stage),
            message,
        })?;

    debug!(
        "{} call took {:?} ({} chars)",
        stage_name(stage),
        call_start.elapsed(),
        reply.content.len()
    );

    Ok(reply)
}

/// Build `CompletionOptions` from the generation config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn stage_name(stage: Stage) -> &'static str {
    match stage {
        Stage::Review => "review",
        _ => "quiz",
    }
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

/// A model that plays back canned replies in order.
#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    pub(crate) struct ScriptedModel {
        replies: Mutex<VecDeque<Result<Reply, String>>>,
        calls: Mutex<Vec<usize>>,
    }

    impl ScriptedModel {
        pub(crate) fn new(replies: Vec<Result<Reply, String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Number of messages sent with each call so far.
        pub(crate) fn calls(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    pub(crate) fn ok(content: &str, input_tokens: u64, output_tokens: u64) -> Result<Reply, String> {
        Ok(Reply {
            content: content.to_string(),
            input_tokens,
            output_tokens,
        })
    }

    impl ChatModel for ScriptedModel {
        async fn reply(
            &self,
            messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<Reply, String> {
            self.calls.lock().unwrap().push(messages.len());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("no reply scripted".to_string()))
        }
    }
}
