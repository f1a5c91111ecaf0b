//! Loose JSON decoding of model output.
//!
//! Language models asked for JSON tend to come close: they emit object
//! literals with single quotes, or wrap the object in a markdown code
//! fence. Each attempt below is a plain `Option`-returning function; failing
//! all of them is an expected outcome at this boundary, not an error.
//!
//! The heuristics are lossy (a single quote inside a string value breaks
//! attempt 2) and only aim at well-intentioned, slightly malformed output.

use serde_json::{Map, Value};
use tracing::debug;

/// Decode `input` as JSON, falling back to quote and fence heuristics.
///
/// Attempts, first success wins:
/// 1. the trimmed string as-is;
/// 2. every `'` replaced with `"`;
/// 3. leading/trailing backticks stripped.
pub fn loose_json(input: &str) -> Option<Value> {
    let trimmed = input.trim();

    if let Some(v) = parse(trimmed) {
        return Some(v);
    }
    if let Some(v) = parse(&trimmed.replace('\'', "\"")) {
        debug!("decoded model output after quote substitution");
        return Some(v);
    }
    if let Some(v) = parse(trimmed.trim_matches('`')) {
        debug!("decoded model output after stripping backticks");
        return Some(v);
    }

    debug!("model output is not decodable as JSON ({} bytes)", input.len());
    None
}

/// Like [`loose_json`], but only accepts a decoded JSON object.
pub fn loose_json_object(input: &str) -> Option<Map<String, Value>> {
    match loose_json(input)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn parse(s: &str) -> Option<Value> {
    serde_json::from_str(s).ok()
}
