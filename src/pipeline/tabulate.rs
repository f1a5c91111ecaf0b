//! From raw chain response to display rows.
//!
//! This is where the four response-shape failures are told apart, each with
//! its own [`McqGenError`] variant:
//!
//! ```text
//! RawResponse ──decode──▶ object?        no ─▶ UnexpectedResponseFormat
//!             ──lookup──▶ quiz key?      no ─▶ MissingQuiz
//!             ──normalize▶ any records?  no ─▶ UnparseableQuiz
//!             ──flatten──▶ any rows?     no ─▶ EmptyTable
//! ```
//!
//! Below this layer nothing fails: decoder, normaliser and flattener all
//! degrade to "nothing". Whether nothing is an error is decided here.

use crate::error::McqGenError;
use crate::pipeline::flatten::{self, DisplayRow};
use crate::pipeline::{decode, normalize};
use serde_json::{Map, Value};
use tracing::debug;

/// Keys the quiz payload may be stored under, in lookup order.
pub const QUIZ_KEYS: &[&str] = &["quiz", "Quiz", "QUIZ"];

/// Key of the optional review text.
pub const REVIEW_KEYS: &[&str] = &["review", "Review", "REVIEW"];

/// What the generation chain handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// Model text that still has to be decoded.
    Text(String),
    /// An already-structured response object.
    Mapping(Map<String, Value>),
}

impl RawResponse {
    /// Classify an arbitrary JSON value.
    ///
    /// Anything that is neither an object nor a string is kept as its JSON
    /// text; it will fail to decode into an object later, as it should.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => RawResponse::Mapping(map),
            Value::String(s) => RawResponse::Text(s),
            other => RawResponse::Text(other.to_string()),
        }
    }

    /// The response as a JSON object, loose-decoding text if necessary.
    pub fn into_mapping(self) -> Option<Map<String, Value>> {
        match self {
            RawResponse::Mapping(map) => Some(map),
            RawResponse::Text(text) => decode::loose_json_object(&text),
        }
    }
}

/// Rows plus the side information shown next to the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Tabulated {
    pub rows: Vec<DisplayRow>,
    pub review: Option<String>,
}

/// Turn a chain response into display rows.
pub fn tabulate(raw: RawResponse) -> Result<Tabulated, McqGenError> {
    let response = raw
        .into_mapping()
        .ok_or(McqGenError::UnexpectedResponseFormat)?;

    let payload = quiz_payload(&response).ok_or(McqGenError::MissingQuiz)?;

    let records: Vec<Value> = normalize::question_records(Some(payload))
        .into_iter()
        .map(Value::Object)
        .collect();
    if records.is_empty() {
        return Err(McqGenError::UnparseableQuiz);
    }
    debug!("Normalised quiz payload into {} records", records.len());

    let rows = flatten::display_rows(&records);
    if rows.is_empty() {
        return Err(McqGenError::EmptyTable);
    }

    Ok(Tabulated {
        rows,
        review: review_text(&response),
    })
}

/// The quiz payload: the first non-empty value under [`QUIZ_KEYS`], else
/// the first value present at all (possibly `null` or empty). `None` only
/// when no quiz key exists.
pub fn quiz_payload(response: &Map<String, Value>) -> Option<&Value> {
    flatten::first_present(response, QUIZ_KEYS)
        .or_else(|| QUIZ_KEYS.iter().find_map(|k| response.get(*k)))
}

fn review_text(response: &Map<String, Value>) -> Option<String> {
    flatten::first_present(response, REVIEW_KEYS)
        .map(flatten::display_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
