//! JSON Schema check for incoming documents.
//!
//! Documents are checked against `schema/analysis.schema.json`. Violations
//! never stop the pipeline; they are reported as warnings.

use std::sync::OnceLock;
use thiserror::Error;

use crate::warnings::{Warning, WarningKind};

/// Embedded document schema (loaded at compile time).
const ANALYSIS_SCHEMA_JSON: &str = include_str!("../../schema/analysis.schema.json");

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
        let schema_value: serde_json::Value = match serde_json::from_str(ANALYSIS_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a document JSON value against the schema.
///
/// Returns every violation as `"<message> at <instance path>"`.
pub fn validate_document_schema(document: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Schema violations as pipeline warnings.
pub fn schema_warnings(document: &serde_json::Value) -> Vec<Warning> {
    match validate_document_schema(document) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .into_iter()
            .map(|e| Warning::at_document(WarningKind::SchemaViolation, e))
            .collect(),
    }
}
