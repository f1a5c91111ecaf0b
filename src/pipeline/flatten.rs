//! Flatten question records into fixed eight-column display rows.
//!
//! Every logical field has a small table of accepted key names, walked in
//! order by [`first_present`]. Adding a new alias the model starts using is a
//! one-word change to the table.
//!
//! Nothing here fails. A missing or oddly-shaped field becomes an empty cell;
//! a record that is not an object is skipped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Ordinal column aliases.
pub const ORDINAL_KEYS: &[&str] = &["no", "index", "id"];
/// Question text aliases.
pub const QUESTION_KEYS: &[&str] = &["mcq", "question"];
/// Options aliases.
pub const OPTIONS_KEYS: &[&str] = &["options"];
/// Correct answer aliases.
pub const CORRECT_KEYS: &[&str] = &["correct", "answer", "correct_answer"];

/// Option labels that get their own column, in column order.
pub const OPTION_LABELS: [&str; 4] = ["a", "b", "c", "d"];

/// Separator between entries of the combined options column.
pub const OPTIONS_SEPARATOR: &str = " | ";

/// Column headers, in display order.
pub const COLUMNS: [&str; 8] = [
    "No",
    "Question",
    "Option A",
    "Option B",
    "Option C",
    "Option D",
    "Options (combined)",
    "Correct",
];

/// One rendered table row. All eight columns are always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRow {
    #[serde(rename = "No")]
    pub no: String,
    #[serde(rename = "Question")]
    pub question: String,
    #[serde(rename = "Option A")]
    pub option_a: String,
    #[serde(rename = "Option B")]
    pub option_b: String,
    #[serde(rename = "Option C")]
    pub option_c: String,
    #[serde(rename = "Option D")]
    pub option_d: String,
    #[serde(rename = "Options (combined)")]
    pub options_combined: String,
    #[serde(rename = "Correct")]
    pub correct: String,
}

impl DisplayRow {
    /// Cells in [`COLUMNS`] order.
    pub fn cells(&self) -> [&str; 8] {
        [
            &self.no,
            &self.question,
            &self.option_a,
            &self.option_b,
            &self.option_c,
            &self.option_d,
            &self.options_combined,
            &self.correct,
        ]
    }
}

/// Flatten every object in `records` into a [`DisplayRow`].
pub fn display_rows(records: &[Value]) -> Vec<DisplayRow> {
    records
        .iter()
        .filter_map(|r| match r.as_object() {
            Some(map) => Some(flatten_record(map)),
            None => {
                debug!("skipping non-object question record");
                None
            }
        })
        .collect()
}

/// Flatten one question record.
pub fn flatten_record(record: &Map<String, Value>) -> DisplayRow {
    let options = first_present(record, OPTIONS_KEYS);
    let (columns, combined) = match options {
        None => Default::default(),
        Some(Value::Object(map)) => options_from_map(map),
        Some(Value::Array(items)) => options_from_list(items),
        Some(other) => (Default::default(), display_string(other)),
    };
    let [option_a, option_b, option_c, option_d] = columns;

    DisplayRow {
        no: field(record, ORDINAL_KEYS),
        question: field(record, QUESTION_KEYS),
        option_a,
        option_b,
        option_c,
        option_d,
        options_combined: combined,
        correct: field(record, CORRECT_KEYS),
    }
}

/// The first value under `keys` that is present and non-empty.
///
/// "Empty" means `null`, `false`, zero, `""`, `[]` or `{}`: a model that
/// emits `"correct": ""` next to `"answer": "b"` still gets `b`.
pub fn first_present<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !is_empty(v))
}

fn field(record: &Map<String, Value>, keys: &[&str]) -> String {
    first_present(record, keys)
        .map(display_string)
        .unwrap_or_default()
}

fn options_from_map(map: &Map<String, Value>) -> ([String; 4], String) {
    let columns = OPTION_LABELS.map(|label| map.get(label).map(display_string).unwrap_or_default());
    let combined = OPTION_LABELS
        .iter()
        .filter_map(|label| match map.get(*label) {
            Some(v) if !is_empty(v) => Some(format!("{label}) {}", display_string(v))),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(OPTIONS_SEPARATOR);
    (columns, combined)
}

fn options_from_list(items: &[Value]) -> ([String; 4], String) {
    let texts: Vec<String> = items.iter().map(display_string).collect();
    let columns = std::array::from_fn(|i| texts.get(i).cloned().unwrap_or_default());
    (columns, texts.join(OPTIONS_SEPARATOR))
}

/// Render a JSON value as cell text: strings unquoted, `null` empty,
/// everything else as compact JSON.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
