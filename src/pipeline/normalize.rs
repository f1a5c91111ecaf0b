//! Quiz payload normalisation: any accepted shape → list of question records.
//!
//! The generation chain has no enforced output contract. Across calls the
//! model has been seen to return:
//!
//! ```text
//! "{ ... }"                                  JSON text (decoded, then re-classified)
//! {"1": {"mcq": ..}, "2": {"mcq": ..}}       ordinal-keyed question table
//! {"mcq": .., "options": .., "correct": ..}  one bare question
//! [{"mcq": ..}, {"mcq": ..}]                 list of questions
//! ```
//!
//! Each shape is matched explicitly and converted into a `Vec` of JSON
//! objects. A shape that matches none of these yields an empty list; it is
//! never an error here. The caller decides what "no questions" means.

use crate::pipeline::decode;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use tracing::debug;

/// One question before display flattening. No field is guaranteed.
pub type QuestionRecord = Map<String, Value>;

/// Keys that mark an object as carrying question text.
pub const QUESTION_TEXT_KEYS: &[&str] = &["mcq", "question"];

/// Normalise a quiz payload into an ordered list of question records.
///
/// `None` stands for an absent payload (no `quiz` key in the response).
pub fn question_records(payload: Option<&Value>) -> Vec<QuestionRecord> {
    match payload {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => match decode::loose_json(s) {
            // Decoded text is classified once; a string inside a string is
            // not unwrapped again.
            Some(Value::String(_)) | None => Vec::new(),
            Some(decoded) => question_records(Some(&decoded)),
        },
        Some(Value::Object(map)) => from_object(map),
        Some(Value::Array(items)) => from_array(items),
        Some(other) => {
            debug!("quiz payload has unsupported shape: {}", kind(other));
            Vec::new()
        }
    }
}

fn from_object(map: &Map<String, Value>) -> Vec<QuestionRecord> {
    if is_question_table(map) {
        return ordered_entries(map)
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect();
    }
    if has_question_text(map) {
        return vec![map.clone()];
    }
    debug!(
        "quiz object has neither question rows nor question text ({} keys)",
        map.len()
    );
    Vec::new()
}

fn from_array(items: &[Value]) -> Vec<QuestionRecord> {
    items
        .iter()
        .map(|v| v.as_object().cloned())
        .collect::<Option<Vec<_>>>()
        .unwrap_or_else(|| {
            debug!("quiz array contains non-object elements");
            Vec::new()
        })
}

/// An ordinal table is a non-empty object of objects, at least one of which
/// carries question text.
fn is_question_table(map: &Map<String, Value>) -> bool {
    !map.is_empty()
        && map.values().all(Value::is_object)
        && map
            .values()
            .filter_map(Value::as_object)
            .any(has_question_text)
}

fn has_question_text(map: &Map<String, Value>) -> bool {
    QUESTION_TEXT_KEYS.iter().any(|k| map.contains_key(*k))
}

/// Values of `map` in ordinal order.
///
/// When every key is integer-like the entries are sorted numerically
/// (stable, so duplicate numbers such as `"1"` and `"01"` keep their order).
/// Keys of any length compare correctly. A single non-integer key leaves the
/// whole table in insertion order.
fn ordered_entries(map: &Map<String, Value>) -> Vec<&Value> {
    let keyed: Option<Vec<(Ordinal<'_>, &Value)>> = map
        .iter()
        .map(|(k, v)| Ordinal::parse(k).map(|n| (n, v)))
        .collect();

    match keyed {
        Some(mut entries) => {
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            entries.into_iter().map(|(_, v)| v).collect()
        }
        None => {
            debug!("quiz table has non-integer keys; keeping response order");
            map.values().collect()
        }
    }
}

/// An integer written as text: optional sign, then ASCII digits.
///
/// Compared as a number without parsing, so keys wider than any machine
/// integer still order correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ordinal<'a> {
    negative: bool,
    /// Digits without leading zeros; empty for zero.
    magnitude: &'a str,
}

impl<'a> Ordinal<'a> {
    fn parse(key: &'a str) -> Option<Self> {
        let key = key.trim();
        let (negative, digits) = match key.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, key.strip_prefix('+').unwrap_or(key)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let magnitude = digits.trim_start_matches('0');
        Some(Self {
            // "-0" is zero.
            negative: negative && !magnitude.is_empty(),
            magnitude,
        })
    }
}

impl Ord for Ordinal<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_magnitude = self
            .magnitude
            .len()
            .cmp(&other.magnitude.len())
            .then_with(|| self.magnitude.cmp(other.magnitude));
        match (self.negative, other.negative) {
            (false, false) => by_magnitude,
            (true, true) => by_magnitude.reverse(),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Ordinal<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn texts(records: &[QuestionRecord]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r.get("mcq").and_then(Value::as_str).unwrap_or(""))
            .collect()
    }

    #[test]
    fn absent_and_null_payloads_are_empty() {
        assert!(question_records(None).is_empty());
        assert!(question_records(Some(&Value::Null)).is_empty());
    }

    #[test]
    fn ordinal_table_sorted_numerically() {
        let payload: Value = serde_json::from_str(
            r#"{
                "10": {"mcq": "Q10"},
                "2":  {"mcq": "Q2"},
                "1":  {"mcq": "Q1", "options": {"a":"x","b":"y","c":"z","d":"w"}, "correct": "a"}
            }"#,
        )
        .unwrap();
        let records = question_records(Some(&payload));
        assert_eq!(texts(&records), vec!["Q1", "Q2", "Q10"]);
        assert_eq!(records[0]["correct"], "a");
    }

    #[test]
    fn ordinal_table_keys_with_whitespace_still_numeric() {
        let payload = json!({" 3": {"mcq": "c"}, "1 ": {"mcq": "a"}});
        assert_eq!(texts(&question_records(Some(&payload))), vec!["a", "c"]);
    }

    #[test]
    fn ordinal_keys_wider_than_i64_still_sort() {
        let payload = json!({
            "100000000000000000000": {"mcq": "huge"},
            "99999999999999999999": {"mcq": "big"},
            "2": {"mcq": "two"}
        });
        assert_eq!(
            texts(&question_records(Some(&payload))),
            vec!["two", "big", "huge"]
        );
    }

    #[test]
    fn ordinal_compare_handles_sign_and_zeros() {
        let mut keys = ["3", "-10", "+2", "007", "-0", "-2"];
        keys.sort_by(|a, b| Ordinal::parse(a).unwrap().cmp(&Ordinal::parse(b).unwrap()));
        assert_eq!(keys, ["-10", "-2", "-0", "+2", "3", "007"]);
        assert!(Ordinal::parse("-").is_none());
        assert!(Ordinal::parse("1.5").is_none());
        assert_eq!(Ordinal::parse("0"), Ordinal::parse("-000"));
    }

    #[test]
    fn mixed_keys_keep_insertion_order() {
        let payload: Value = serde_json::from_str(
            r#"{"2": {"mcq": "second"}, "intro": {"mcq": "first"}, "1": {"mcq": "third"}}"#,
        )
        .unwrap();
        assert_eq!(
            texts(&question_records(Some(&payload))),
            vec!["second", "first", "third"]
        );
    }

    #[test]
    fn table_needs_question_text_somewhere() {
        let payload = json!({"1": {"foo": 1}, "2": {"bar": 2}});
        assert!(question_records(Some(&payload)).is_empty());
    }

    #[test]
    fn table_with_one_question_row_keeps_all_rows() {
        let payload = json!({"1": {"question": "Q"}, "2": {"note": "n"}});
        assert_eq!(question_records(Some(&payload)).len(), 2);
    }

    #[test]
    fn single_question_object() {
        let payload = json!({"question": "Why?", "answer": "Because"});
        let records = question_records(Some(&payload));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["answer"], "Because");
    }

    #[test]
    fn object_mixing_scalars_and_rows_is_single_question_or_nothing() {
        let payload = json!({"mcq": "Q", "1": {"mcq": "inner"}});
        let records = question_records(Some(&payload));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["mcq"], "Q");

        let payload = json!({"title": "quiz", "1": {"mcq": "inner"}});
        assert!(question_records(Some(&payload)).is_empty());
    }

    #[test]
    fn list_of_objects_passes_through() {
        let payload = json!([{"mcq": "A"}, {"mcq": "B"}, {"other": true}]);
        let records = question_records(Some(&payload));
        assert_eq!(records.len(), 3);
        assert_eq!(texts(&records), vec!["A", "B", ""]);
    }

    #[test]
    fn list_with_non_object_is_empty() {
        let payload = json!([{"mcq": "A"}, "B"]);
        assert!(question_records(Some(&payload)).is_empty());
    }

    #[test]
    fn empty_list_is_empty() {
        assert!(question_records(Some(&json!([]))).is_empty());
    }

    #[test]
    fn json_string_is_decoded_then_classified() {
        let payload = Value::String(r#"{"1": {"mcq": "Q1"}, "2": {"mcq": "Q2"}}"#.into());
        assert_eq!(texts(&question_records(Some(&payload))), vec!["Q1", "Q2"]);
    }

    #[test]
    fn single_quoted_string_payload() {
        let payload = Value::String("{'mcq': 'Q?', 'options': {'a':'1'}}".into());
        let records = question_records(Some(&payload));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["options"], json!({"a": "1"}));
    }

    #[test]
    fn undecodable_or_nested_string_is_empty() {
        assert!(question_records(Some(&Value::String("not json".into()))).is_empty());
        let nested = Value::String(r#""{\"mcq\": \"Q\"}""#.into());
        assert!(question_records(Some(&nested)).is_empty());
    }

    #[test]
    fn scalars_are_empty() {
        assert!(question_records(Some(&json!(42))).is_empty());
        assert!(question_records(Some(&json!(true))).is_empty());
    }
}
