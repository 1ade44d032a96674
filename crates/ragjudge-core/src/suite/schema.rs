//! JSON Schema validation for evaluation suites.
//!
//! Suites are validated against schema/suite.schema.json before they are
//! deserialized.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded suite schema (loaded at compile time).
const SUITE_SCHEMA_JSON: &str = include_str!("../../schema/suite.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(SUITE_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;
        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result
        .as_ref()
        .map_err(|e| SchemaError::LoadError(e.clone()))
}

/// Validate a suite JSON value against the schema.
///
/// Returns every violation, each suffixed with its instance path.
pub fn validate_suite_schema(suite_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(suite_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_suite_passes() {
        let value = serde_json::json!({});
        assert!(validate_suite_schema(&value).is_ok());
    }

    #[test]
    fn test_full_suite_passes() {
        let value = serde_json::json!({
            "name": "support-bot",
            "defaults": { "threshold": 0.7, "include_reason": false, "strict_mode": false },
            "metrics": [
                { "key": "faithfulness" },
                { "key": "answer_relevancy", "strict_mode": true },
                { "key": "geval", "parameters": "Customer Support" },
                { "key": "rouge", "n": 2, "threshold": 0.3 }
            ],
            "normalization": { "lowercase": true, "stopwords_top_n": 10 }
        });
        assert!(validate_suite_schema(&value).is_ok());
    }

    #[test]
    fn test_unknown_metric_fails() {
        let value = serde_json::json!({ "metrics": [{ "key": "toxicity" }] });
        let errors = validate_suite_schema(&value).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("/metrics/0/key")));
    }

    #[test]
    fn test_threshold_out_of_range_fails() {
        let value = serde_json::json!({ "defaults": { "threshold": 1.5 } });
        assert!(validate_suite_schema(&value).is_err());
    }

    #[test]
    fn test_zero_ngram_size_fails() {
        let value = serde_json::json!({ "metrics": [{ "key": "rouge", "n": 0 }] });
        assert!(validate_suite_schema(&value).is_err());
    }

    #[test]
    fn test_additional_properties_fail() {
        let value = serde_json::json!({ "judge": "gpt" });
        assert!(validate_suite_schema(&value).is_err());
    }
}
