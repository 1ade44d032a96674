//! Evaluation suite configuration.
//!
//! A suite names the metrics to run and their pass/fail settings. Suites are
//! structured data validated against JSON Schema, then checked semantically.

mod parser;
mod schema;

pub use parser::{MetricSpec, SuiteConfig, SuiteError, DEFAULT_GEVAL_PARAMETERS};
pub use schema::{validate_suite_schema, SchemaError};
