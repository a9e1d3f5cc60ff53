//! Formula input extraction.
//!
//! Turns what the model wrote for one benefit (structured labels, formula
//! text, or both) into named inputs. Structured labels are the primary
//! source; magnitude bucketing of formula text fills whatever the labels
//! leave open. Only the text left of the first `=` is read, so the model's
//! own arithmetic is never trusted.
//!
//! Extraction never fails. It yields inputs, a zero sentinel when the text
//! says the benefit does not apply, or an unparseable marker with a reason.

pub mod labels;
pub mod patterns;
pub mod resolve;
pub mod text;

pub use resolve::{resolve, ResolveContext, Resolved};

use std::collections::BTreeMap;

use crate::calc::InputField;
use crate::document::FormulaLabel;
use crate::types::BenefitKind;

/// Outcome of extracting one benefit's inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Inputs(T),
    /// The benefit explicitly does not apply
    Zero,
    /// Nothing usable; the reason is reported as a warning
    Unparseable(String),
}

/// Where the extracted values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Labels,
    Text,
    Mixed,
}

/// Named inputs found for one benefit kind. Fields may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialInputs {
    pub kind: BenefitKind,
    pub values: BTreeMap<InputField, f64>,
    pub source: InputSource,
}

impl PartialInputs {
    pub fn new(kind: BenefitKind, source: InputSource) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
            source,
        }
    }

    pub fn get(&self, field: InputField) -> Option<f64> {
        self.values.get(&field).copied()
    }

    pub fn has(&self, field: InputField) -> bool {
        self.values.contains_key(&field)
    }

    pub fn set(&mut self, field: InputField, value: f64) {
        self.values.insert(field, value);
    }

    /// Set the field unless it already has a value.
    pub fn fill(&mut self, field: InputField, value: f64) -> bool {
        if self.has(field) {
            return false;
        }
        self.set(field, value);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fill gaps from another extraction; existing values win.
    pub fn merge_missing(&mut self, other: &PartialInputs) {
        let mut added = false;
        for (field, value) in &other.values {
            added |= self.fill(*field, *value);
        }
        if added && self.source != other.source {
            self.source = InputSource::Mixed;
        }
    }
}

/// Extract the inputs of one benefit.
///
/// Labels are read first; formula text fills the gaps. A negated formula
/// with no labels is a zero sentinel.
pub fn extract(
    kind: BenefitKind,
    formula: Option<&str>,
    labels: Option<&[FormulaLabel]>,
) -> Extraction<PartialInputs> {
    let from_labels = labels
        .map(|l| labels::from_labels(kind, l))
        .filter(|p| !p.is_empty());
    let formula = formula.map(str::trim).filter(|f| !f.is_empty());

    let from_text = match formula {
        Some(text) if patterns::is_negated(text) => {
            if from_labels.is_none() {
                return Extraction::Zero;
            }
            None
        }
        Some(text) => Some(text::from_text(kind, text)).filter(|p| !p.is_empty()),
        None => None,
    };

    match (from_labels, from_text) {
        (Some(mut l), Some(t)) => {
            l.merge_missing(&t);
            Extraction::Inputs(l)
        }
        (Some(l), None) => Extraction::Inputs(l),
        (None, Some(t)) => Extraction::Inputs(t),
        (None, None) => match formula {
            Some(text) => {
                tracing::warn!(kind = %kind, formula = text, "No numeric inputs in formula");
                Extraction::Unparseable(format!("no numeric inputs found in \"{}\"", text))
            }
            None => Extraction::Unparseable("no formula or inputs given".to_string()),
        },
    }
}
