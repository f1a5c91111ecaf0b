//! Prompts for the two-call quiz chain.
//!
//! All prompt text lives here so the wording can change without touching
//! the call plumbing in [`crate::pipeline::chain`], and so tests can
//! inspect what the model is told without a provider.
//!
//! Callers can override the quiz system prompt via
//! [`crate::config::GenerationConfig::system_prompt`]; the review prompt
//! is fixed.

use crate::config::QuizRequest;
use crate::schema::ResponseSchema;

/// Default system prompt for the quiz-generation call.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert MCQ maker. You write clear, unambiguous multiple-choice questions strictly from the material you are given.

Follow these rules precisely:

1. Every question has exactly four options labelled a, b, c and d.
2. Exactly one option is correct.
3. Questions must not repeat, and must be answerable from the text alone.
4. Reply with JSON only. Do NOT wrap it in ``` fences and do NOT add commentary."#;

/// System prompt for the review call.
pub const REVIEW_SYSTEM_PROMPT: &str = r#"You are an expert English grammarian and writer. You review multiple-choice quizzes written for students."#;

/// Build the user message for the quiz-generation call.
pub fn quiz_prompt(text: &str, request: &QuizRequest, schema: &ResponseSchema) -> String {
    format!(
        "Text:\n\"\"\"\n{text}\n\"\"\"\n\n\
         Given the above text, create a quiz of {number} multiple choice questions \
         for {subject} students in a {tone} tone.\n\
         Make sure the questions are not repeated and check every question \
         against the text.\n\
         Format your response like the RESPONSE_JSON below and use it as a guide. \
         Make sure to produce {number} MCQs.\n\n\
         ### RESPONSE_JSON\n{schema}",
        number = request.question_count,
        subject = request.subject,
        tone = request.tone,
        schema = schema.to_prompt_string(),
    )
}

/// Build the user message for the review call.
pub fn review_prompt(quiz: &str, request: &QuizRequest) -> String {
    format!(
        "Given a multiple choice quiz for {subject} students, evaluate the complexity \
         of the questions and give a complete analysis of the quiz. Use at most \
         50 words for the complexity analysis.\n\
         If the quiz does not match the cognitive and analytical abilities of the \
         students, point out which questions need to change and suggest a tone \
         that fits them better.\n\n\
         Quiz MCQs:\n{quiz}\n\n\
         Check from an expert English writer of the above quiz:",
        subject = request.subject,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> QuizRequest {
        QuizRequest::new(7, "Biology", "University").unwrap()
    }

    #[test]
    fn quiz_prompt_carries_all_inputs() {
        let schema = ResponseSchema::from_value(json!({"1": {"mcq": "SCHEMA_MARKER"}}));
        let p = quiz_prompt("Mitochondria make ATP.", &request(), &schema);
        assert!(p.contains("Mitochondria make ATP."));
        assert!(p.contains("7 multiple choice questions"));
        assert!(p.contains("Biology students"));
        assert!(p.contains("University tone"));
        assert!(p.contains("SCHEMA_MARKER"));
    }

    #[test]
    fn review_prompt_embeds_quiz() {
        let p = review_prompt(r#"{"1": {"mcq": "Q"}}"#, &request());
        assert!(p.contains(r#"{"1": {"mcq": "Q"}}"#));
        assert!(p.contains("Biology"));
    }

    #[test]
    fn system_prompt_asks_for_bare_json() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("JSON only"));
    }
}
