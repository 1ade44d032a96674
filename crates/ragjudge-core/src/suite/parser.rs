//! Suite parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_suite_schema;
use crate::normalize::NormalizeOptions;
use crate::scoring::MetricConfig;
use crate::types::MetricKey;

/// Evaluation parameters used by the default G-Eval rubric.
pub const DEFAULT_GEVAL_PARAMETERS: &str = "Rag Pipeline";

/// Errors that can occur when loading a suite.
#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Failed to read suite file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Suite does not match schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Suite validation failed: {0}")]
    ValidationError(String),
}

/// One metric entry in a suite, with optional per-metric overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub key: MetricKey,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_reason: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_mode: Option<bool>,

    /// N-gram size (rouge only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<usize>,

    /// What the rubric evaluates (geval only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
}

impl MetricSpec {
    pub fn new(key: MetricKey) -> Self {
        Self {
            key,
            threshold: None,
            include_reason: None,
            strict_mode: None,
            n: None,
            parameters: None,
        }
    }

    pub fn with_n(mut self, n: usize) -> Self {
        self.n = Some(n);
        self
    }

    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }

    /// Merge this entry's overrides onto the suite defaults.
    pub fn config(&self, defaults: &MetricConfig) -> MetricConfig {
        MetricConfig {
            threshold: self.threshold.unwrap_or(defaults.threshold),
            include_reason: self.include_reason.unwrap_or(defaults.include_reason),
            strict_mode: self.strict_mode.unwrap_or(defaults.strict_mode),
        }
    }

    pub fn ngram_size(&self) -> usize {
        self.n.unwrap_or(1)
    }

    pub fn geval_parameters(&self) -> &str {
        self.parameters.as_deref().unwrap_or(DEFAULT_GEVAL_PARAMETERS)
    }
}

/// An evaluation suite: which metrics run, in what configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Human-readable name
    #[serde(default = "default_name")]
    pub name: String,

    /// Settings applied to every metric unless overridden
    #[serde(default)]
    pub defaults: MetricConfig,

    /// Metrics to run. Execution order is always the declared metric order.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricSpec>,

    /// Normalization for the statistical metrics
    #[serde(default)]
    pub normalization: NormalizeOptions,
}

fn default_name() -> String {
    "default".to_string()
}

fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new(MetricKey::Faithfulness),
        MetricSpec::new(MetricKey::AnswerRelevancy),
        MetricSpec::new(MetricKey::ContextualRelevancy),
        MetricSpec::new(MetricKey::GEval).with_parameters(DEFAULT_GEVAL_PARAMETERS),
        MetricSpec::new(MetricKey::Hallucination),
        MetricSpec::new(MetricKey::KnowledgeRetention),
        MetricSpec::new(MetricKey::Meteor),
        MetricSpec::new(MetricKey::Rouge).with_n(1),
    ]
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            defaults: MetricConfig::default(),
            metrics: default_metrics(),
            normalization: NormalizeOptions::default(),
        }
    }
}

impl SuiteConfig {
    /// Parse a suite from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SuiteError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a suite from JSON string.
    pub fn from_json(json: &str) -> Result<Self, SuiteError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Load a suite from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SuiteError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load a suite from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SuiteError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn from_value(value: serde_json::Value) -> Result<Self, SuiteError> {
        // An empty YAML document parses as null
        let value = if value.is_null() {
            serde_json::json!({})
        } else {
            value
        };
        validate_suite_schema(&value).map_err(SuiteError::SchemaError)?;
        let suite: SuiteConfig = serde_json::from_value(value)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Semantic checks the schema cannot express.
    pub fn validate(&self) -> Result<(), SuiteError> {
        if self.name.trim().is_empty() {
            return Err(SuiteError::ValidationError("name must not be empty".into()));
        }

        check_threshold(self.defaults.threshold, "defaults")?;

        let mut seen = HashSet::new();
        for spec in &self.metrics {
            if !seen.insert(spec.key) {
                return Err(SuiteError::ValidationError(format!(
                    "metric '{}' is listed more than once",
                    spec.key
                )));
            }
            if let Some(threshold) = spec.threshold {
                check_threshold(threshold, spec.key.as_str())?;
            }
            if spec.n == Some(0) {
                return Err(SuiteError::ValidationError(format!(
                    "metric '{}': n must be at least 1",
                    spec.key
                )));
            }
        }

        Ok(())
    }

    /// Metric entries sorted into declared execution order.
    pub fn ordered_metrics(&self) -> Vec<&MetricSpec> {
        let mut specs: Vec<&MetricSpec> = self.metrics.iter().collect();
        specs.sort_by_key(|s| s.key);
        specs
    }

    pub fn spec(&self, key: MetricKey) -> Option<&MetricSpec> {
        self.metrics.iter().find(|s| s.key == key)
    }

    pub fn config_for(&self, key: MetricKey) -> MetricConfig {
        self.spec(key)
            .map(|s| s.config(&self.defaults))
            .unwrap_or(self.defaults)
    }
}

fn check_threshold(threshold: f64, scope: &str) -> Result<(), SuiteError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(SuiteError::ValidationError(format!(
            "{}: threshold {} is outside [0, 1]",
            scope, threshold
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_suite() {
        let suite = SuiteConfig::default();
        assert!(suite.validate().is_ok());
        assert_eq!(suite.metrics.len(), 8);
        assert!(suite.spec(MetricKey::BertScore).is_none());
        assert_eq!(suite.spec(MetricKey::GEval).unwrap().geval_parameters(), "Rag Pipeline");
    }

    #[test]
    fn test_parse_yaml_suite() {
        let yaml = r#"
name: "support-bot"
defaults:
  threshold: 0.7
metrics:
  - key: rouge
    n: 2
  - key: faithfulness
    strict_mode: true
  - key: answer_relevancy
    threshold: 0.4
    include_reason: false
"#;
        let suite = SuiteConfig::from_yaml(yaml).unwrap();
        assert_eq!(suite.name, "support-bot");

        let ordered: Vec<MetricKey> = suite.ordered_metrics().iter().map(|s| s.key).collect();
        assert_eq!(
            ordered,
            vec![MetricKey::Faithfulness, MetricKey::AnswerRelevancy, MetricKey::Rouge]
        );

        let faithfulness = suite.config_for(MetricKey::Faithfulness);
        assert!(faithfulness.strict_mode);
        assert_eq!(faithfulness.threshold, 0.7);
        assert_eq!(faithfulness.effective_threshold(), 1.0);

        let relevancy = suite.config_for(MetricKey::AnswerRelevancy);
        assert_eq!(relevancy.threshold, 0.4);
        assert!(!relevancy.include_reason);

        assert_eq!(suite.spec(MetricKey::Rouge).unwrap().ngram_size(), 2);
    }

    #[test]
    fn test_parse_json_suite() {
        let json = r#"{"metrics": [{"key": "geval", "parameters": "Summary"}]}"#;
        let suite = SuiteConfig::from_json(json).unwrap();
        assert_eq!(suite.name, "default");
        assert_eq!(suite.spec(MetricKey::GEval).unwrap().geval_parameters(), "Summary");
        assert!(suite.normalization.lemmatize);
    }

    #[test]
    fn test_empty_mapping_is_default_suite() {
        let suite = SuiteConfig::from_yaml("{}").unwrap();
        assert_eq!(suite, SuiteConfig::default());
    }

    #[test]
    fn test_duplicate_metric_rejected() {
        let yaml = r#"
metrics:
  - key: meteor
  - key: meteor
"#;
        let err = SuiteConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, SuiteError::ValidationError(_)));
    }

    #[test]
    fn test_schema_violation_reported() {
        let yaml = r#"
metrics:
  - key: bleu
"#;
        match SuiteConfig::from_yaml(yaml) {
            Err(SuiteError::SchemaError(errors)) => assert!(!errors.is_empty()),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_yaml() {
        let result = SuiteConfig::from_yaml("metrics: [unclosed");
        assert!(matches!(result, Err(SuiteError::YamlError(_))));
    }

    #[test]
    fn test_programmatic_validation_catches_bad_threshold() {
        let mut suite = SuiteConfig::default();
        suite.defaults.threshold = 2.0;
        assert!(suite.validate().is_err());
    }
}
