//! Validation warnings emitted by the pipeline.
//!
//! Every correction the pipeline makes is backed by a warning that points
//! to the step, record and field it touched. Warnings are never fatal;
//! they accumulate into one ordered list handed back to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a validation warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Formula or labels could not be parsed; value fell back to zero.
    ParseFailure,
    /// A parsed value was outside its policy range and was clamped.
    BoundViolation,
    /// Extracted hours disagreed with recorded friction-point hours.
    CrossReferenceMismatch,
    /// A per-use-case or portfolio cap forced a proportional rescale.
    CapExceeded,
    /// Totals suggest benefits were counted more than once.
    DoubleCounting,
    /// A role label was replaced by its canonical entry.
    RoleNormalized,
    /// A function or AI-primitive label matched nothing in its taxonomy.
    TaxonomyUnknown,
    /// A missing record was synthesized from neighbouring steps.
    Synthesized,
    /// The input document deviates from the expected schema.
    SchemaViolation,
    /// Company context needed for a check was not available.
    MissingContext,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::ParseFailure => "parse_failure",
            WarningKind::BoundViolation => "bound_violation",
            WarningKind::CrossReferenceMismatch => "cross_reference_mismatch",
            WarningKind::CapExceeded => "cap_exceeded",
            WarningKind::DoubleCounting => "double_counting",
            WarningKind::RoleNormalized => "role_normalized",
            WarningKind::TaxonomyUnknown => "taxonomy_unknown",
            WarningKind::Synthesized => "synthesized",
            WarningKind::SchemaViolation => "schema_violation",
            WarningKind::MissingContext => "missing_context",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation warning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warning {
    /// What kind of correction or signal this is
    pub kind: WarningKind,

    /// Pointer to the location (e.g., "step5[UC-003].Cost Formula")
    pub pointer: String,

    /// Human-readable explanation
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            pointer: pointer.into(),
            message: message.into(),
        }
    }

    /// Warning attached to a field of a record in a step.
    pub fn at_record(
        kind: WarningKind,
        step: usize,
        record_id: &str,
        field: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::new(kind, record_pointer(step, record_id, field), message)
    }

    /// Warning about the document as a whole.
    pub fn at_document(kind: WarningKind, message: impl Into<String>) -> Self {
        Self::new(kind, "document", message)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.pointer, self.message)
    }
}

/// Build a pointer string for a record field.
pub fn record_pointer(step: usize, record_id: &str, field: &str) -> String {
    if field.is_empty() {
        format!("step{}[{}]", step, record_id)
    } else {
        format!("step{}[{}].{}", step, record_id, field)
    }
}

/// Ordered warning accumulator.
///
/// Each push is mirrored to `tracing` so operators see corrections in the
/// log stream as they happen.
#[derive(Debug, Clone, Default)]
pub struct WarningLog {
    entries: Vec<Warning>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn push(&mut self, warning: Warning) {
        tracing::warn!(
            kind = warning.kind.as_str(),
            pointer = %warning.pointer,
            "{}",
            warning.message
        );
        self.entries.push(warning);
    }

    /// Record every warning from an iterator, preserving order.
    pub fn extend(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        for warning in warnings {
            self.push(warning);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count warnings of one kind.
    pub fn count(&self, kind: WarningKind) -> usize {
        self.entries.iter().filter(|w| w.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.entries.iter()
    }

    /// Render every warning as a display string, in order.
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(|w| w.to_string()).collect()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.entries
    }
}
