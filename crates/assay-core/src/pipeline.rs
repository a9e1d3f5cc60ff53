//! The correction pipeline.
//!
//! Runs every stage over one document, in order:
//!
//! 1. schema check
//! 2. ingestion and migration
//! 3. friction-point role normalization and cost recompute
//! 4. use-case taxonomy normalization
//! 5. per-benefit extraction, cross-reference, clamping and calculation
//! 6. use-case and portfolio caps
//! 7. readiness recompute
//! 8. priority scoring
//! 9. scenario analysis and executive dashboard
//!
//! The pipeline never fails on malformed content. The only case it leaves
//! alone is a document without benefit records, which is returned
//! unchanged.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::aggregate::{aggregate, Aggregation, BenefitLine};
use crate::calc::{safe_calculate, BenefitCalculation, BenefitInputs, InputField};
use crate::config::PolicyConfig;
use crate::crossref::cross_reference_hours;
use crate::currency::format_currency;
use crate::dashboard::build_dashboard;
use crate::document::records::record_to_map;
use crate::document::{
    ingest, schema_warnings, AnalysisDocument, BenefitRecord, FormulaLabel,
    FrictionRecord, PriorityRecord, ReadinessRecord, UseCaseRecord, BENEFIT_STEP, FRICTION_STEP,
    PRIORITY_STEP, READINESS_STEP, USE_CASE_STEP,
};
use crate::extract::{extract, resolve, Extraction, ResolveContext};
use crate::friction::correct_friction;
use crate::projection::scenario_analysis;
use crate::scoring::{score_priorities, score_readiness_record, synthesize_readiness, PriorityInput};
use crate::taxonomy::normalize_use_case;
use crate::types::{BenefitKind, Scenario};
use crate::warnings::{Warning, WarningKind, WarningLog};

/// Suffix appended to formula text that could not be validated.
pub const UNVALIDATED_SUFFIX: &str = " (could not validate)";

/// Whether the pipeline corrected the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Corrected,
    /// No benefit records; the input is returned as given
    Unchanged,
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub document: AnalysisDocument,
    pub warnings: Vec<Warning>,
    pub status: PipelineStatus,
}

impl PipelineOutcome {
    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

/// Outcome of valuing one benefit of one use case.
#[derive(Debug, Clone)]
struct BenefitResult {
    kind: BenefitKind,
    value: f64,
    formula: Option<String>,
    /// Canonical inputs to write back; `None` leaves the record's own
    inputs: Option<Vec<FormulaLabel>>,
    calculation: Option<BenefitCalculation>,
    hours: f64,
    note: Option<String>,
}

impl BenefitResult {
    fn zero(kind: BenefitKind, formula: Option<String>, note: &str) -> Self {
        Self {
            kind,
            value: 0.0,
            formula,
            inputs: None,
            calculation: None,
            hours: 0.0,
            note: Some(note.to_string()),
        }
    }
}

/// Formula text without a suffix left by an earlier run.
fn strip_unvalidated(formula: &str) -> &str {
    let trimmed = formula.trim_end();
    trimmed
        .strip_suffix(UNVALIDATED_SUFFIX.trim_start())
        .map_or(trimmed, str::trim_end)
}

fn mark_unvalidated(formula: Option<&str>) -> Option<String> {
    formula.map(|f| format!("{}{}", strip_unvalidated(f), UNVALIDATED_SUFFIX))
}

/// Lowercased trimmed key used to join records across steps.
fn join_key(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Validates and corrects assessment documents against a policy.
pub struct Pipeline {
    config: PolicyConfig,
}

impl Pipeline {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Run every stage over `document`.
    pub fn run(&self, document: &AnalysisDocument) -> PipelineOutcome {
        let config = &self.config;
        let mut log = WarningLog::new();

        match document.to_value() {
            Ok(value) => log.extend(schema_warnings(&value)),
            Err(e) => tracing::debug!(error = %e, "Document could not be re-serialized for schema check"),
        }

        let ingested = ingest(document, config);
        log.extend(ingested.warnings.iter().cloned());

        if ingested.benefits().is_empty() {
            tracing::info!("No benefit records; document returned unchanged");
            return PipelineOutcome {
                document: document.clone(),
                warnings: log.into_vec(),
                status: PipelineStatus::Unchanged,
            };
        }

        let context = ingested.context.clone();
        let mut stage = Vec::new();

        let friction = correct_friction(ingested.friction(), config, &mut stage);
        let use_cases: Vec<UseCaseRecord> = ingested
            .use_cases()
            .iter()
            .map(|u| normalize_use_case(u, &mut stage))
            .collect();
        log.extend(stage.drain(..));

        let benefits = complete_benefit_records(ingested.benefits(), &use_cases, &mut stage);
        log.extend(stage.drain(..));

        let resolve_ctx = ResolveContext {
            context_maturity: context
                .data_maturity_level
                .map(|level| config.multipliers.maturity_multiplier(level)),
            annual_revenue: context.annual_revenue,
            fallback_rate: config.default_role().hourly_rate,
        };

        let mut results: Vec<Vec<BenefitResult>> = Vec::with_capacity(benefits.len());
        let mut lines = Vec::with_capacity(benefits.len());
        for record in &benefits {
            let id = record.id.clone().unwrap_or_default();
            let target = target_friction(record, &use_cases);
            let mut line = BenefitLine::new(id.clone());
            let mut per_kind = Vec::with_capacity(BenefitKind::ALL.len());

            for kind in BenefitKind::ALL {
                let result = self.value_benefit(kind, record, &id, target.as_deref(), &friction, &resolve_ctx, &mut stage);
                line = line.with_amount(kind, result.value);
                if kind == BenefitKind::Cost {
                    line.hours_saved = result.hours;
                }
                per_kind.push(result);
            }
            log.extend(stage.drain(..));

            lines.push(line);
            results.push(per_kind);
        }

        let aggregation = aggregate(&lines, &context, &config.caps);
        log.extend(aggregation.warnings.iter().cloned());

        let benefits: Vec<BenefitRecord> = benefits
            .iter()
            .zip(&results)
            .enumerate()
            .map(|(i, (record, per_kind))| write_benefit_record(record, per_kind, &aggregation, i))
            .collect();

        let readiness = rebuild_readiness(&benefits, ingested.readiness(), config, &mut stage);
        log.extend(stage.drain(..));

        let priorities = rebuild_priorities(&benefits, &readiness, ingested.priorities(), config, &mut stage);
        log.extend(stage.drain(..));

        let stated_cost: Vec<f64> = readiness.iter().filter_map(|r| r.implementation_cost).collect();
        let implementation_cost = if stated_cost.is_empty() {
            aggregation.portfolio_total * config.projection.implementation_cost_ratio
        } else {
            stated_cost.iter().sum()
        };
        let run_cost: f64 = readiness.iter().filter_map(|r| r.annual_token_cost).sum();
        let benefit_cap = context
            .annual_revenue
            .filter(|r| *r > 0.0)
            .map(|r| r * config.caps.portfolio_revenue_ratio);

        let analysis = scenario_analysis(aggregation.portfolio_total, implementation_cost, run_cost, benefit_cap, config);
        let dashboard = build_dashboard(&aggregation, &readiness, &priorities, config.scoring.top_use_cases);

        let mut out = document.clone();
        if let Some(step) = out.step_mut(FRICTION_STEP) {
            if !friction.is_empty() {
                step.set_records(friction.iter().map(record_to_map).collect());
            }
        }
        if let Some(step) = out.step_mut(USE_CASE_STEP) {
            if !use_cases.is_empty() {
                step.set_records(use_cases.iter().map(record_to_map).collect());
            }
        }
        out.step_or_insert(BENEFIT_STEP, "Benefit Quantification")
            .set_records(benefits.iter().map(record_to_map).collect());
        out.step_or_insert(READINESS_STEP, "Readiness Assessment")
            .set_records(readiness.iter().map(record_to_map).collect());
        out.step_or_insert(PRIORITY_STEP, "Priority Matrix")
            .set_records(priorities.iter().map(record_to_map).collect());

        out.benefits_capped = Some(aggregation.benefits_capped);
        out.cap_scale_factor = Some(aggregation.scale_factor);
        out.scenario_analysis = serde_json::to_value(&analysis).ok();
        out.executive_dashboard = serde_json::to_value(&dashboard).ok();
        out.validation_warnings = Some(log.messages());

        tracing::info!(
            use_cases = benefits.len(),
            total = %format_currency(aggregation.portfolio_total),
            capped = aggregation.benefits_capped,
            warnings = log.len(),
            "Assessment corrected"
        );

        PipelineOutcome {
            document: out,
            warnings: log.into_vec(),
            status: PipelineStatus::Corrected,
        }
    }

    /// Value one benefit of one record at the moderate scenario.
    #[allow(clippy::too_many_arguments)]
    fn value_benefit(
        &self,
        kind: BenefitKind,
        record: &BenefitRecord,
        id: &str,
        target: Option<&str>,
        friction: &[FrictionRecord],
        ctx: &ResolveContext,
        warnings: &mut Vec<Warning>,
    ) -> BenefitResult {
        let config = &self.config;
        let formula = record.formula(kind).map(strip_unvalidated);
        let field = format!("{} Formula", kind.label());

        let parse_failure = |reason: &str, warnings: &mut Vec<Warning>| {
            warnings.push(Warning::at_record(
                WarningKind::ParseFailure,
                BENEFIT_STEP,
                id,
                &field,
                format!("{} benefit set to $0: {}", kind.label(), reason),
            ));
            BenefitResult::zero(kind, mark_unvalidated(formula), reason)
        };

        let mut partial = match extract(kind, formula, record.inputs(kind)) {
            Extraction::Inputs(partial) => partial,
            Extraction::Zero => {
                return BenefitResult::zero(kind, formula.map(str::to_string), "does not apply");
            }
            Extraction::Unparseable(reason) => {
                let has_text = formula.map_or(false, |f| !f.trim().is_empty());
                let stated = record.amount(kind).unwrap_or(0.0);
                if !has_text && stated <= 0.0 {
                    return BenefitResult::zero(kind, formula.map(str::to_string), "not stated");
                }
                let reason = if has_text {
                    reason
                } else {
                    format!("stated {} has no formula or inputs", format_currency(stated))
                };
                return parse_failure(&reason, warnings);
            }
        };

        if kind == BenefitKind::Cost {
            if let Some(hours) = partial.get(InputField::Hours) {
                let check = cross_reference_hours(hours, target, friction, &config.caps);
                if let Some(message) = check.message() {
                    warnings.push(Warning::at_record(
                        WarningKind::CrossReferenceMismatch,
                        BENEFIT_STEP,
                        id,
                        &field,
                        message,
                    ));
                    partial.set(InputField::Hours, check.hours);
                }
            }
        }

        let resolved = match resolve(&partial, ctx, config) {
            Ok(resolved) => resolved,
            Err(reason) => return parse_failure(&reason, warnings),
        };
        for note in &resolved.defaults_applied {
            warnings.push(Warning::at_record(
                WarningKind::MissingContext,
                BENEFIT_STEP,
                id,
                &field,
                format!("{} not stated; {}", kind.label(), note),
            ));
        }

        let safe = safe_calculate(&resolved.inputs, Scenario::Moderate, config);
        for message in &safe.warnings {
            warnings.push(Warning::at_record(
                WarningKind::BoundViolation,
                BENEFIT_STEP,
                id,
                &field,
                message.clone(),
            ));
        }

        let calc = safe.calculation;
        tracing::debug!(
            use_case = id,
            kind = %kind,
            raw = calc.raw_value,
            value = calc.value,
            "Benefit calculated"
        );

        let hours = match safe.inputs {
            BenefitInputs::Cost(c) => c.hours,
            _ => 0.0,
        };
        BenefitResult {
            kind,
            value: calc.value,
            formula: Some(calc.formula_text.clone()),
            inputs: Some(safe.inputs.labels()),
            hours,
            note: None,
            calculation: Some(calc),
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

/// Ensure every record has an ID and every step-4 use case has a step-5
/// record.
fn complete_benefit_records(
    records: &[BenefitRecord],
    use_cases: &[UseCaseRecord],
    warnings: &mut Vec<Warning>,
) -> Vec<BenefitRecord> {
    let mut out: Vec<BenefitRecord> = Vec::with_capacity(records.len().max(use_cases.len()));

    for (i, record) in records.iter().enumerate() {
        let mut record = record.clone();
        if join_key(record.id.as_deref()).is_none() {
            let by_name = join_key(record.name.as_deref()).and_then(|name| {
                use_cases
                    .iter()
                    .find(|u| join_key(u.name.as_deref()).as_deref() == Some(name.as_str()))
                    .and_then(|u| u.id.clone())
            });
            let id = by_name.unwrap_or_else(|| format!("UC-{:03}", i + 1));
            warnings.push(Warning::at_record(
                WarningKind::Synthesized,
                BENEFIT_STEP,
                &id,
                "ID",
                "Record had no ID; one was assigned",
            ));
            record.id = Some(id);
        }
        out.push(record);
    }

    for use_case in use_cases {
        let Some(key) = join_key(use_case.id.as_deref()) else {
            continue;
        };
        if out.iter().any(|b| join_key(b.id.as_deref()).as_deref() == Some(key.as_str())) {
            continue;
        }
        let id = use_case.id.clone().unwrap_or_default();
        warnings.push(Warning::at_record(
            WarningKind::Synthesized,
            BENEFIT_STEP,
            &id,
            "",
            "Use case had no benefit record; one was added with zero benefits",
        ));
        out.push(BenefitRecord {
            id: use_case.id.clone(),
            name: use_case.name.clone(),
            ..BenefitRecord::default()
        });
    }

    out
}

/// The friction point a benefit record's use case targets.
fn target_friction(record: &BenefitRecord, use_cases: &[UseCaseRecord]) -> Option<String> {
    let id = join_key(record.id.as_deref());
    let use_case = use_cases
        .iter()
        .find(|u| id.is_some() && join_key(u.id.as_deref()) == id);

    use_case
        .and_then(|u| u.target_friction.clone().or_else(|| u.name.clone()))
        .or_else(|| record.name.clone())
}

fn audit_entry(result: &BenefitResult, final_value: f64) -> Value {
    match &result.calculation {
        Some(calc) => {
            let mut entry = match serde_json::to_value(calc) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            };
            entry.insert("finalValue".to_string(), json!(final_value));
            Value::Object(entry)
        }
        None => json!({
            "kind": result.kind,
            "value": 0.0,
            "finalValue": final_value,
            "note": result.note,
        }),
    }
}

/// Write calculated and capped amounts, formulas, inputs and the audit
/// trail into a benefit record.
fn write_benefit_record(
    record: &BenefitRecord,
    results: &[BenefitResult],
    aggregation: &Aggregation,
    index: usize,
) -> BenefitRecord {
    let mut out = record.clone();
    let line = &aggregation.lines[index];
    let capped = aggregation.line_capped[index] || aggregation.scale_factor < 1.0;

    let mut trail = Map::new();
    for result in results {
        let final_value = line.amount(result.kind);
        let mut formula = result.formula.clone();
        if capped && final_value < result.value {
            formula = formula.map(|f| format!("{} → {} after revenue cap", f, format_currency(final_value)));
        }
        out.set_amount(result.kind, final_value);
        out.set_formula(result.kind, formula);
        out.set_inputs(result.kind, result.inputs.clone());
        trail.insert(result.kind.label().to_string(), audit_entry(result, final_value));
    }

    let pre_cap: f64 = results.iter().map(|r| r.value).sum();
    trail.insert("scenario".to_string(), json!(Scenario::Moderate));
    trail.insert("preCapTotal".to_string(), json!(pre_cap));
    if capped && pre_cap > 0.0 {
        trail.insert("capFactor".to_string(), json!(line.total() / pre_cap));
    }

    out.total_annual_value = Some(line.total());
    out.cap_applied = Some(capped && line.total() < pre_cap);
    out.audit_trail = Some(Value::Object(trail));
    out
}

/// Readiness record for every benefit record, in the same order, followed
/// by any step-6 records that match no use case.
fn rebuild_readiness(
    benefits: &[BenefitRecord],
    existing: &[ReadinessRecord],
    config: &PolicyConfig,
    warnings: &mut Vec<Warning>,
) -> Vec<ReadinessRecord> {
    let mut by_id: HashMap<String, usize> = HashMap::new();
    for (i, r) in existing.iter().enumerate() {
        if let Some(key) = join_key(r.id.as_deref()).or_else(|| join_key(r.name.as_deref())) {
            by_id.entry(key).or_insert(i);
        }
    }

    let mut used = vec![false; existing.len()];
    let mut out = Vec::with_capacity(benefits.len());
    for benefit in benefits {
        let id = benefit.id.as_deref().unwrap_or_default();
        let found = join_key(benefit.id.as_deref())
            .and_then(|k| by_id.get(&k))
            .or_else(|| join_key(benefit.name.as_deref()).and_then(|k| by_id.get(&k)))
            .copied()
            .filter(|i| !used[*i]);

        match found {
            Some(i) => {
                used[i] = true;
                let mut record = score_readiness_record(&existing[i], config, warnings);
                if record.id.is_none() {
                    record.id = benefit.id.clone();
                }
                out.push(record);
            }
            None => {
                warnings.push(Warning::at_record(
                    WarningKind::Synthesized,
                    READINESS_STEP,
                    id,
                    "",
                    format!(
                        "No readiness record; neutral scores of {} assumed",
                        config.scoring.default_component_score
                    ),
                ));
                out.push(synthesize_readiness(id, benefit.name.as_deref(), config));
            }
        }
    }

    for (i, record) in existing.iter().enumerate() {
        if !used[i] {
            out.push(score_readiness_record(record, config, warnings));
        }
    }

    out
}

/// Rebuild step 7 from corrected values, keeping unknown keys of existing
/// priority records. Rows are ordered by priority score.
fn rebuild_priorities(
    benefits: &[BenefitRecord],
    readiness: &[ReadinessRecord],
    existing: &[PriorityRecord],
    config: &PolicyConfig,
    warnings: &mut Vec<Warning>,
) -> Vec<PriorityRecord> {
    let readiness_of = |id: Option<&str>| {
        let key = join_key(id)?;
        readiness.iter().find(|r| join_key(r.id.as_deref()).as_deref() == Some(key.as_str()))
    };
    let existing_of = |b: &BenefitRecord| {
        let id = join_key(b.id.as_deref());
        let name = join_key(b.name.as_deref());
        existing
            .iter()
            .find(|p| id.is_some() && join_key(p.id.as_deref()) == id)
            .or_else(|| existing.iter().find(|p| name.is_some() && join_key(p.name.as_deref()) == name))
    };

    let inputs: Vec<PriorityInput> = benefits
        .iter()
        .map(|b| {
            let r = readiness_of(b.id.as_deref());
            PriorityInput {
                id: b.id.clone().unwrap_or_default(),
                readiness: r.and_then(|r| r.readiness_score).unwrap_or(config.scoring.default_component_score),
                total_value: b.total_annual_value.unwrap_or(0.0),
                time_to_value_months: r
                    .and_then(|r| r.time_to_value_months)
                    .or_else(|| existing_of(b).and_then(|p| p.time_to_value_months)),
            }
        })
        .collect();

    let scores = score_priorities(&inputs, &config.scoring, config.rounding.score_decimals);

    let mut rows: Vec<PriorityRecord> = benefits
        .iter()
        .zip(inputs.iter().zip(scores))
        .map(|(b, (input, score))| {
            let mut row = match existing_of(b) {
                Some(p) => p.clone(),
                None => {
                    if !existing.is_empty() {
                        warnings.push(Warning::at_record(
                            WarningKind::Synthesized,
                            PRIORITY_STEP,
                            &score.id,
                            "",
                            "No priority record; one was added",
                        ));
                    }
                    PriorityRecord::default()
                }
            };
            row.id = b.id.clone();
            if row.name.is_none() {
                row.name = b.name.clone();
            }
            row.priority_score = Some(score.priority);
            row.readiness_score = Some(score.readiness);
            row.normalized_value_score = Some(score.normalized_value);
            row.ttv_score = score.ttv_score;
            row.total_annual_value = Some(input.total_value);
            row.time_to_value_months = input.time_to_value_months;
            row.tier = Some(score.tier.as_str().to_string());
            row.phase = Some(score.phase.as_str().to_string());
            row
        })
        .collect();

    if existing.is_empty() && !rows.is_empty() {
        warnings.push(Warning::at_document(
            WarningKind::Synthesized,
            format!("Priority matrix missing; built for {} use case(s)", rows.len()),
        ));
    }

    rows.sort_by(|a, b| {
        let pa = a.priority_score.unwrap_or(0.0);
        let pb = b.priority_score.unwrap_or(0.0);
        pb.total_cmp(&pa)
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> AnalysisDocument {
        AnalysisDocument::from_value(json!({
            "companyName": "Acme",
            "steps": [
                { "step": 0, "title": "Company", "data": [
                    { "Metric": "Annual Revenue", "Value": "$100M" },
                    { "Metric": "Total Employees", "Value": "800" }
                ]},
                { "step": 3, "title": "Friction", "data": [
                    { "Function": "Finance", "Friction Point": "Manual invoice matching",
                      "Annual Hours": 28000, "Role": "AP Clerk", "Hourly Rate": "$65" }
                ]},
                { "step": 4, "title": "Use Cases", "data": [
                    { "ID": "UC-001", "Use Case": "Invoice matching agent",
                      "Target Friction": "Manual invoice matching", "Function": "Finance",
                      "AI Primitives": "Data Analysis, Automation" },
                    { "ID": "UC-002", "Use Case": "Ticket triage", "Function": "Customer Support" }
                ]},
                { "step": 5, "title": "Benefits", "data": [
                    { "ID": "UC-001", "Use Case": "Invoice matching agent",
                      "Cost Formula": "420,000,000 hours × $50/hr × 1.35 × 0.90 × 0.75 = $9B",
                      "Revenue Formula": "No direct revenue impact",
                      "Cash Flow Formula": "$100M revenue × 10 days / 365 × 8% × 0.85 × 0.75 = $50K",
                      "Risk Formula": "significant",
                      "Total Annual Value": "$9B" }
                ]},
                { "step": 6, "title": "Readiness", "data": [
                    { "ID": "UC-001", "Organizational Capacity": 8, "Data Availability & Quality": 7,
                      "Technical Infrastructure": 6, "Governance": 5, "Time-to-Value (months)": 3 }
                ]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_no_benefits_unchanged() {
        let doc = AnalysisDocument::from_value(json!({
            "steps": [{ "step": 0, "title": "Company", "content": "Annual Revenue: $5M" }]
        }))
        .unwrap();
        let outcome = Pipeline::default().run(&doc);
        assert_eq!(outcome.status, PipelineStatus::Unchanged);
        assert_eq!(outcome.document, doc);
    }

    #[test]
    fn test_full_run() {
        let outcome = Pipeline::default().run(&document());
        assert_eq!(outcome.status, PipelineStatus::Corrected);
        assert!(outcome.count(WarningKind::CrossReferenceMismatch) >= 1);
        assert!(outcome.count(WarningKind::ParseFailure) >= 1);
        assert!(outcome.count(WarningKind::Synthesized) >= 1);

        let doc = outcome.document;
        let benefits = doc.step(BENEFIT_STEP).unwrap().records();
        assert_eq!(benefits.len(), 2);

        let first = benefits[0];
        assert_eq!(first["Revenue Benefit"], json!("$0"));
        assert!(first["Risk Formula"].as_str().unwrap().ends_with("(could not validate)"));
        assert!(first["Cost Inputs"].is_array());
        assert!(first["Audit Trail"]["Cost"]["formulaText"].is_string());

        // capped at 15% of $100M
        let total = crate::currency::parse_amount(first["Total Annual Value"].as_str().unwrap()).unwrap();
        assert!(total <= 15_000_000.0);

        assert_eq!(doc.step(READINESS_STEP).unwrap().records().len(), 2);
        assert_eq!(doc.step(PRIORITY_STEP).unwrap().records().len(), 2);
        assert!(doc.scenario_analysis.is_some());
        assert!(doc.executive_dashboard.is_some());
        assert_eq!(doc.cap_scale_factor, Some(1.0));
    }

    #[test]
    fn test_cost_hours_cross_referenced() {
        let outcome = Pipeline::default().run(&document());
        let benefits = outcome.document.step(BENEFIT_STEP).unwrap().records();
        let inputs = benefits[0]["Cost Inputs"].as_array().unwrap();
        let hours = inputs
            .iter()
            .find(|l| l["label"] == "Hours Saved")
            .and_then(|l| l["value"].as_f64());
        assert_eq!(hours, Some(28_000.0));
    }

    #[test]
    fn test_rerun_is_stable() {
        let pipeline = Pipeline::default();
        let first = pipeline.run(&document()).document;
        let second = pipeline.run(&first).document;
        let amounts = |doc: &AnalysisDocument| -> Vec<Value> {
            doc.step(BENEFIT_STEP)
                .unwrap()
                .records()
                .iter()
                .flat_map(|r| {
                    ["Cost Benefit", "Revenue Benefit", "Cash Flow Benefit", "Risk Benefit", "Total Annual Value"]
                        .iter()
                        .map(|k| r.get(*k).cloned().unwrap_or(Value::Null))
                        .collect::<Vec<_>>()
                })
                .collect()
        };
        assert_eq!(amounts(&first), amounts(&second));
        assert_eq!(first.executive_dashboard, second.executive_dashboard);
    }

    #[test]
    fn test_mark_unvalidated_once() {
        let once = mark_unvalidated(Some("vague")).unwrap();
        assert_eq!(once, "vague (could not validate)");
        assert_eq!(mark_unvalidated(Some(&once)).unwrap(), once);
    }
}
