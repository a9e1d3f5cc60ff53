//! The eight-step assessment document.
//!
//! Documents arrive as loosely shaped JSON (or YAML). Only the envelope is
//! typed here; step records stay as raw objects until [`migrate::ingest`]
//! turns them into per-step records. Unknown keys at every level survive a
//! round trip.

pub mod lenient;
pub mod migrate;
pub mod records;
mod schema;

pub use lenient::FormulaLabel;
pub use migrate::{canonicalize_keys, ingest, read_company_context, Ingested, CURRENT_SCORE_SCALE};
pub use records::{
    BenefitRecord, CompanyContext, FrictionRecord, KeySpec, PriorityRecord, ReadinessRecord,
    StepRecords, UseCaseRecord,
};
pub use schema::{schema_warnings, validate_document_schema, SchemaError};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Step numbers with typed records.
pub const COMPANY_STEP: usize = 0;
pub const FRICTION_STEP: usize = 3;
pub const USE_CASE_STEP: usize = 4;
pub const BENEFIT_STEP: usize = 5;
pub const READINESS_STEP: usize = 6;
pub const PRIORITY_STEP: usize = 7;

/// Errors that can occur when reading or writing a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A complete assessment document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDocument {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// Written by the pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_warnings: Option<Vec<String>>,

    #[serde(default, deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub benefits_capped: Option<bool>,

    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub cap_scale_factor: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_analysis: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executive_dashboard: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One step of the assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Step number 0–7; when absent the step's position is used
    #[serde(
        default,
        alias = "index",
        alias = "stepNumber",
        deserialize_with = "step_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub step: Option<usize>,

    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Raw records. Anything other than an array of objects is carried
    /// through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn step_number<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient::value_as_number(&value)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .map(|n| n as usize))
}

impl Step {
    pub fn new(step: usize, title: impl Into<String>) -> Self {
        Self {
            step: Some(step),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Records as raw objects. Non-object entries are skipped.
    pub fn records(&self) -> Vec<&Map<String, Value>> {
        match &self.data {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            _ => Vec::new(),
        }
    }

    /// Number of entries in `data` that are not objects.
    pub fn non_object_records(&self) -> usize {
        match &self.data {
            Some(Value::Array(items)) => items.iter().filter(|v| !v.is_object()).count(),
            _ => 0,
        }
    }

    pub fn set_records(&mut self, records: Vec<Map<String, Value>>) {
        self.data = Some(Value::Array(records.into_iter().map(Value::Object).collect()));
    }
}

impl AnalysisDocument {
    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a document from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a document from a file, choosing the format by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&contents),
            _ => Self::from_json(&contents),
        }
    }

    /// Load a JSON document from a file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value, DocumentError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Array position of the step with this number.
    pub fn step_position(&self, number: usize) -> Option<usize> {
        self.steps
            .iter()
            .enumerate()
            .position(|(pos, s)| s.step.unwrap_or(pos) == number)
    }

    pub fn step(&self, number: usize) -> Option<&Step> {
        self.step_position(number).map(|pos| &self.steps[pos])
    }

    pub fn step_mut(&mut self, number: usize) -> Option<&mut Step> {
        self.step_position(number).map(move |pos| &mut self.steps[pos])
    }

    /// The step with this number, appended if the document lacks it.
    pub fn step_or_insert(&mut self, number: usize, title: &str) -> &mut Step {
        let pos = match self.step_position(number) {
            Some(pos) => pos,
            None => {
                self.steps.push(Step::new(number, title));
                self.steps.len() - 1
            }
        };
        &mut self.steps[pos]
    }
}
