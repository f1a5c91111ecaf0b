//! The response-schema template sent to the model.
//!
//! The quiz prompt shows the model a JSON skeleton of the answer it should
//! produce. The skeleton lives in a JSON file next to the deployment
//! (`response.json` by default) and is loaded once at process start. A
//! missing or malformed file stops the process: there is no built-in
//! fallback, so what the model sees is always what the operator shipped.

use crate::error::McqGenError;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// A parsed response-schema template.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    template: Value,
}

impl ResponseSchema {
    /// Load the template from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, McqGenError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| McqGenError::SchemaUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let template =
            serde_json::from_str(&raw).map_err(|source| McqGenError::SchemaInvalid {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Loaded response schema from {}", path.display());
        Ok(Self { template })
    }

    /// Wrap an in-memory template.
    pub fn from_value(template: Value) -> Self {
        Self { template }
    }

    /// The template as parsed.
    pub fn as_value(&self) -> &Value {
        &self.template
    }

    /// The template as it is embedded into the prompt.
    pub fn to_prompt_string(&self) -> String {
        // Serialising a `Value` cannot fail.
        serde_json::to_string_pretty(&self.template).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn load_valid_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"1": {{"mcq": "q", "correct": "a"}}}}"#).unwrap();
        let schema = ResponseSchema::load(f.path()).unwrap();
        assert_eq!(schema.as_value()["1"]["correct"], "a");
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = ResponseSchema::load("/definitely/not/here/response.json").unwrap_err();
        assert!(matches!(err, McqGenError::SchemaUnreadable { .. }));
    }

    #[test]
    fn invalid_json_is_fatal() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{{'not': json").unwrap();
        let err = ResponseSchema::load(f.path()).unwrap_err();
        assert!(matches!(err, McqGenError::SchemaInvalid { .. }));
    }

    #[test]
    fn prompt_string_is_pretty_json() {
        let schema = ResponseSchema::from_value(json!({"1": {"mcq": "q"}}));
        let s = schema.to_prompt_string();
        assert!(s.contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&s).unwrap(), *schema.as_value());
    }
}
