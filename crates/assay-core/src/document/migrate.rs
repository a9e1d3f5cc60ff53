//! Ingestion: raw step records into typed per-step records.
//!
//! This is the only place legacy shapes are handled. Key spellings are
//! canonicalized, 1–5 readiness scales are promoted to 1–10, and the
//! company context is read out of step 0. Everything downstream sees the
//! current schema only.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::lenient::{value_as_number, value_as_string};
use super::records::{
    BenefitRecord, CompanyContext, FrictionRecord, KeySpec, PriorityRecord, ReadinessRecord,
    StepRecords, UseCaseRecord, BENEFIT_KEYS, FRICTION_KEYS, PRIORITY_KEYS, READINESS_KEYS,
    USE_CASE_KEYS,
};
use super::{
    AnalysisDocument, BENEFIT_STEP, COMPANY_STEP, FRICTION_STEP, PRIORITY_STEP, READINESS_STEP,
    USE_CASE_STEP,
};
use crate::config::PolicyConfig;
use crate::currency::quantize_currency;
use crate::warnings::{Warning, WarningKind};

/// Scale label written on promoted readiness records.
pub const CURRENT_SCORE_SCALE: &str = "1-10";

lazy_static! {
    /// `Label: value` lines in free text, optionally bulleted or bolded.
    static ref CONTEXT_LINE: Regex = Regex::new(
        r"(?m)^[\s\-*•]*\**(?P<label>[A-Za-z][A-Za-z0-9 /&()'.-]{1,60}?)\**\s*[:=]\s*\**(?P<value>[^\n]+?)\**\s*$"
    ).unwrap();
}

/// Typed view of a document's records.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub context: CompanyContext,
    pub records: BTreeMap<usize, StepRecords>,
    /// Readiness records whose scores were promoted from a 1–5 scale
    pub legacy_promoted: usize,
    pub warnings: Vec<Warning>,
}

impl Ingested {
    pub fn friction(&self) -> &[FrictionRecord] {
        match self.records.get(&FRICTION_STEP) {
            Some(StepRecords::Friction(r)) => r,
            _ => &[],
        }
    }

    pub fn use_cases(&self) -> &[UseCaseRecord] {
        match self.records.get(&USE_CASE_STEP) {
            Some(StepRecords::UseCases(r)) => r,
            _ => &[],
        }
    }

    pub fn benefits(&self) -> &[BenefitRecord] {
        match self.records.get(&BENEFIT_STEP) {
            Some(StepRecords::Benefits(r)) => r,
            _ => &[],
        }
    }

    pub fn readiness(&self) -> &[ReadinessRecord] {
        match self.records.get(&READINESS_STEP) {
            Some(StepRecords::Readiness(r)) => r,
            _ => &[],
        }
    }

    pub fn priorities(&self) -> &[PriorityRecord] {
        match self.records.get(&PRIORITY_STEP) {
            Some(StepRecords::Priorities(r)) => r,
            _ => &[],
        }
    }
}

/// Rewrite record keys to their canonical spelling.
///
/// Matching is case-insensitive and ignores surrounding whitespace. When a
/// record carries both a canonical key and one of its aliases, the
/// canonical key's value wins. Unknown keys pass through in place.
pub fn canonicalize_keys(record: &Map<String, Value>, specs: &[KeySpec]) -> Map<String, Value> {
    let mut out = Map::new();
    let mut canonical_seen: Vec<&'static str> = Vec::new();

    for (key, value) in record {
        let trimmed = key.trim();
        if let Some(spec) = specs.iter().find(|s| s.canonical.eq_ignore_ascii_case(trimmed)) {
            out.insert(spec.canonical.to_string(), value.clone());
            canonical_seen.push(spec.canonical);
            continue;
        }
        if let Some(spec) = specs
            .iter()
            .find(|s| s.aliases.iter().any(|a| a.eq_ignore_ascii_case(trimmed)))
        {
            if !canonical_seen.contains(&spec.canonical) && !out.contains_key(spec.canonical) {
                out.insert(spec.canonical.to_string(), value.clone());
            }
            continue;
        }
        out.insert(key.clone(), value.clone());
    }

    out
}

fn typed_records<T: DeserializeOwned>(
    step: usize,
    raw: &[&Map<String, Value>],
    specs: &[KeySpec],
    warnings: &mut Vec<Warning>,
) -> Vec<T> {
    raw.iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let canonical = canonicalize_keys(record, specs);
            match serde_json::from_value(Value::Object(canonical)) {
                Ok(typed) => Some(typed),
                Err(e) => {
                    warnings.push(Warning::new(
                        WarningKind::SchemaViolation,
                        format!("step{}[{}]", step, i),
                        format!("Record could not be read and was dropped: {}", e),
                    ));
                    None
                }
            }
        })
        .collect()
}

/// Type the raw records of one step.
pub fn step_records(step: usize, raw: &[&Map<String, Value>], warnings: &mut Vec<Warning>) -> StepRecords {
    match step {
        FRICTION_STEP => StepRecords::Friction(typed_records(step, raw, FRICTION_KEYS, warnings)),
        USE_CASE_STEP => StepRecords::UseCases(typed_records(step, raw, USE_CASE_KEYS, warnings)),
        BENEFIT_STEP => StepRecords::Benefits(typed_records(step, raw, BENEFIT_KEYS, warnings)),
        READINESS_STEP => StepRecords::Readiness(typed_records(step, raw, READINESS_KEYS, warnings)),
        PRIORITY_STEP => StepRecords::Priorities(typed_records(step, raw, PRIORITY_KEYS, warnings)),
        _ => StepRecords::Untyped(raw.iter().map(|r| (*r).clone()).collect()),
    }
}

/// Map a 1–5 legacy score onto the 1–10 scale.
pub fn rescale_legacy(value: f64, legacy_max: f64) -> f64 {
    let span = (legacy_max - 1.0).max(f64::EPSILON);
    let v = value.clamp(1.0, legacy_max);
    1.0 + (v - 1.0) * 9.0 / span
}

fn is_legacy_scale(scale: &str) -> bool {
    let digits: Vec<&str> = scale
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .collect();
    digits.last().map_or(false, |top| *top == "5")
}

/// Promote a readiness record from the 1–5 scale. Returns whether anything
/// was rescaled.
pub fn promote_legacy_readiness(record: &mut ReadinessRecord, legacy_max: f64) -> bool {
    let legacy_scale = record.score_scale.as_deref().map_or(false, is_legacy_scale);
    let mut promoted = false;

    if legacy_scale {
        for field in [
            &mut record.organizational_capacity,
            &mut record.data_quality,
            &mut record.technical_infrastructure,
            &mut record.governance,
        ] {
            if let Some(v) = field.as_mut() {
                *v = rescale_legacy(*v, legacy_max);
                promoted = true;
            }
        }
    }

    let pairs = [
        (record.legacy_organizational.take(), &mut record.organizational_capacity),
        (record.legacy_data.take(), &mut record.data_quality),
        (record.legacy_technical.take(), &mut record.technical_infrastructure),
        (record.legacy_governance.take(), &mut record.governance),
    ];
    for (legacy, current) in pairs {
        match legacy {
            Some(v) if current.is_none() => {
                *current = Some(rescale_legacy(v, legacy_max));
                promoted = true;
            }
            _ => {}
        }
    }

    if promoted || legacy_scale {
        record.score_scale = Some(CURRENT_SCORE_SCALE.to_string());
    }
    promoted
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ContextField {
    Revenue,
    Employees,
    DataMaturity,
    Industry,
}

fn classify_context_label(label: &str) -> Option<ContextField> {
    let label = label.trim().to_lowercase();
    if label.contains("per ") || label.contains("growth") || label.contains("margin") {
        return None;
    }
    if label.contains("revenue") || label == "sales" || label.contains("annual sales") {
        Some(ContextField::Revenue)
    } else if label.contains("employee") || label.contains("headcount") || label == "fte" || label == "ftes" {
        Some(ContextField::Employees)
    } else if label.contains("maturity") {
        Some(ContextField::DataMaturity)
    } else if label.contains("industry") || label == "sector" || label == "vertical" {
        Some(ContextField::Industry)
    } else {
        None
    }
}

fn apply_context(context: &mut CompanyContext, field: ContextField, value: &Value) {
    match field {
        ContextField::Revenue if context.annual_revenue.is_none() => {
            context.annual_revenue = value_as_number(value).filter(|v| *v > 0.0);
        }
        ContextField::Employees if context.total_employees.is_none() => {
            context.total_employees = value_as_number(value).filter(|v| *v > 0.0);
        }
        ContextField::DataMaturity if context.data_maturity_level.is_none() => {
            context.data_maturity_level =
                value_as_number(value).filter(|v| (1.0..=5.0).contains(v));
        }
        ContextField::Industry if context.industry.is_none() => {
            context.industry = value_as_string(value);
        }
        _ => {}
    }
}

const METRIC_KEYS: [&str; 5] = ["Metric", "Label", "Field", "Name", "Attribute"];
const VALUE_KEYS: [&str; 2] = ["Value", "Amount"];

fn get_ci<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    record
        .iter()
        .find(|(k, _)| keys.iter().any(|want| k.trim().eq_ignore_ascii_case(want)))
        .map(|(_, v)| v)
}

/// Read the company context from step 0.
///
/// Direct keys win over metric/value pairs, which win over `Label: value`
/// lines in the step's content.
pub fn read_company_context(document: &AnalysisDocument) -> CompanyContext {
    let mut context = CompanyContext::default();
    let Some(step) = document.step(COMPANY_STEP) else {
        return context;
    };
    let records = step.records();

    for record in &records {
        for (key, value) in record.iter() {
            if let Some(field) = classify_context_label(key) {
                apply_context(&mut context, field, value);
            }
        }
    }

    for record in &records {
        let metric = get_ci(record, &METRIC_KEYS).and_then(value_as_string);
        let value = get_ci(record, &VALUE_KEYS);
        if let (Some(metric), Some(value)) = (metric, value) {
            if let Some(field) = classify_context_label(&metric) {
                apply_context(&mut context, field, value);
            }
        }
    }

    if let Some(content) = step.content.as_deref() {
        for caps in CONTEXT_LINE.captures_iter(content) {
            let label = &caps["label"];
            if let Some(field) = classify_context_label(label) {
                apply_context(&mut context, field, &Value::String(caps["value"].to_string()));
            }
        }
    }

    context
}

/// Ingest a document: type every step's records and read the context.
pub fn ingest(document: &AnalysisDocument, config: &PolicyConfig) -> Ingested {
    let mut ingested = Ingested {
        context: read_company_context(document),
        ..Ingested::default()
    };

    for (pos, step) in document.steps.iter().enumerate() {
        let number = step.step.unwrap_or(pos);
        if step.data.is_none() {
            continue;
        }
        let stray = step.non_object_records();
        if stray > 0 && (FRICTION_STEP..=PRIORITY_STEP).contains(&number) {
            ingested.warnings.push(Warning::new(
                WarningKind::SchemaViolation,
                format!("step{}", number),
                format!("{} non-object record(s) ignored", stray),
            ));
        }
        let records = step_records(number, &step.records(), &mut ingested.warnings);
        ingested.records.entry(number).or_insert(records);
    }

    if let Some(StepRecords::Readiness(records)) = ingested.records.get_mut(&READINESS_STEP) {
        let legacy_max = config.scoring.legacy_scale_max;
        ingested.legacy_promoted = records
            .iter_mut()
            .map(|r| promote_legacy_readiness(r, legacy_max))
            .filter(|promoted| *promoted)
            .count();
        for record in records.iter_mut() {
            quantize_stated_costs(record);
        }
    }
    if ingested.legacy_promoted > 0 {
        tracing::debug!(records = ingested.legacy_promoted, "Promoted legacy 1-5 readiness scores");
    }

    ingested
}

/// Stated costs are only ever written back as currency strings, so they
/// are read at that precision on every run.
fn quantize_stated_costs(record: &mut ReadinessRecord) {
    record.implementation_cost = record.implementation_cost.map(quantize_currency);
    record.annual_token_cost = record.annual_token_cost.map(quantize_currency);
}
