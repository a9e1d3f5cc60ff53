//! Readiness and priority scoring.
//!
//! Readiness is a weighted sum of four 1–10 component scores. Priority
//! blends readiness with each use case's total annual value, min-max
//! normalized across the portfolio onto the same 1–10 scale. Tier and
//! phase follow from the two.

use crate::config::{Bound, PolicyConfig, ScoringPolicy, TokenPricing};
use crate::currency::quantize_currency;
use crate::document::{ReadinessRecord, CURRENT_SCORE_SCALE, READINESS_STEP};
use crate::types::{Phase, Tier};
use crate::warnings::{Warning, WarningKind};

/// Midpoint of the 1–10 scale; every score when all values are equal.
pub const NEUTRAL_SCORE: f64 = 5.5;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// The four readiness components, already on the 1–10 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadinessComponents {
    pub organizational_capacity: f64,
    pub data_quality: f64,
    pub technical_infrastructure: f64,
    pub governance: f64,
}

impl ReadinessComponents {
    pub fn uniform(score: f64) -> Self {
        Self {
            organizational_capacity: score,
            data_quality: score,
            technical_infrastructure: score,
            governance: score,
        }
    }
}

/// Weighted readiness with every component clamped into `bound`.
pub fn readiness_score(components: &ReadinessComponents, bound: Bound, policy: &ScoringPolicy, decimals: u32) -> f64 {
    let w = &policy.readiness_weights;
    let score = w.organizational_capacity * bound.clamp(components.organizational_capacity)
        + w.data_quality * bound.clamp(components.data_quality)
        + w.technical_infrastructure * bound.clamp(components.technical_infrastructure)
        + w.governance * bound.clamp(components.governance);
    round_to(score, decimals)
}

/// Min-max normalize onto [1, 10]. All-equal input maps to 5.5.
pub fn normalize_values(values: &[f64]) -> Vec<f64> {
    let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
    let min = values.iter().copied().map(finite).fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().map(finite).fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|v| {
            if !(span > 0.0) {
                NEUTRAL_SCORE
            } else {
                1.0 + (finite(*v) - min) / span * 9.0
            }
        })
        .collect()
}

pub fn priority_score(readiness: f64, normalized_value: f64, policy: &ScoringPolicy, decimals: u32) -> f64 {
    round_to(
        policy.priority_readiness_weight * readiness + policy.priority_value_weight * normalized_value,
        decimals,
    )
}

/// 1 for immediate value, falling linearly to 0 at the horizon.
pub fn ttv_score(months: f64, policy: &ScoringPolicy) -> f64 {
    if !months.is_finite() || !(policy.ttv_horizon_months > 0.0) {
        return 0.0;
    }
    (1.0 - (months.max(0.0) / policy.ttv_horizon_months).min(1.0)).max(0.0)
}

pub fn tier_for(priority: f64, normalized_value: f64, readiness: f64, policy: &ScoringPolicy) -> Tier {
    if priority >= policy.champion_threshold {
        Tier::Champions
    } else if normalized_value < policy.value_split && readiness >= policy.readiness_split {
        Tier::QuickWin
    } else if normalized_value >= policy.value_split && readiness < policy.readiness_split {
        Tier::Strategic
    } else {
        Tier::Foundation
    }
}

pub fn phase_for(priority: f64, readiness: f64, policy: &ScoringPolicy) -> Phase {
    if priority >= policy.q1_priority && readiness >= policy.q1_readiness {
        Phase::Q1
    } else if priority >= policy.q2_priority && readiness >= policy.q2_readiness {
        Phase::Q2
    } else if priority >= policy.q3_priority {
        Phase::Q3
    } else {
        Phase::Q4
    }
}

/// Annual token cost and monthly tokens from per-run counts.
///
/// Returns `None` unless input tokens, output tokens and runs per month
/// are all known.
pub fn token_costs(record: &ReadinessRecord, pricing: &TokenPricing) -> Option<(f64, f64)> {
    let input = record.input_tokens_per_run?.max(0.0);
    let output = record.output_tokens_per_run?.max(0.0);
    let runs = record.runs_per_month?.max(0.0);

    let monthly_tokens = (input + output) * runs;
    let monthly_cost = runs * (input * pricing.input_per_million + output * pricing.output_per_million) / 1e6;
    Some((monthly_tokens, round_to(12.0 * monthly_cost, 2)))
}

/// Recompute a readiness record: components, composite score and token
/// fields. Missing components take the policy's neutral score.
pub fn score_readiness_record(
    record: &ReadinessRecord,
    config: &PolicyConfig,
    warnings: &mut Vec<Warning>,
) -> ReadinessRecord {
    let mut out = record.clone();
    let policy = &config.scoring;
    let bound = config.bounds.readiness_component;
    let id = record.id.as_deref().or(record.name.as_deref()).unwrap_or("unnamed use case");

    let mut missing = Vec::new();
    let mut component = |value: Option<f64>, name: &'static str| -> f64 {
        match value {
            Some(v) => {
                let clamped = bound.clamp(v);
                if clamped != v {
                    warnings.push(Warning::at_record(
                        WarningKind::BoundViolation,
                        READINESS_STEP,
                        id,
                        name,
                        format!("{} outside [{}, {}]; clamped to {}", v, bound.min, bound.max, clamped),
                    ));
                }
                clamped
            }
            None => {
                missing.push(name);
                policy.default_component_score
            }
        }
    };

    let components = ReadinessComponents {
        organizational_capacity: component(record.organizational_capacity, "Organizational Capacity"),
        data_quality: component(record.data_quality, "Data Availability & Quality"),
        technical_infrastructure: component(record.technical_infrastructure, "Technical Infrastructure"),
        governance: component(record.governance, "Governance"),
    };

    if !missing.is_empty() {
        warnings.push(Warning::at_record(
            WarningKind::Synthesized,
            READINESS_STEP,
            id,
            "",
            format!(
                "Missing readiness component(s) {} set to {}",
                missing.join(", "),
                policy.default_component_score
            ),
        ));
    }

    out.organizational_capacity = Some(components.organizational_capacity);
    out.data_quality = Some(components.data_quality);
    out.technical_infrastructure = Some(components.technical_infrastructure);
    out.governance = Some(components.governance);
    out.score_scale = Some(CURRENT_SCORE_SCALE.to_string());
    out.readiness_score = Some(readiness_score(&components, bound, policy, config.rounding.score_decimals));

    if let Some(months) = record.time_to_value_months {
        out.time_to_value_months = Some(config.bounds.time_to_value_months.clamp(months));
    }

    if let Some((monthly_tokens, annual_cost)) = token_costs(record, &config.tokens) {
        out.monthly_tokens = Some(monthly_tokens);
        // kept at the precision it is written with
        out.annual_token_cost = Some(quantize_currency(annual_cost));
    }

    out
}

/// A neutral readiness record for a use case step 6 never mentioned.
pub fn synthesize_readiness(id: &str, name: Option<&str>, config: &PolicyConfig) -> ReadinessRecord {
    let score = config.scoring.default_component_score;
    let components = ReadinessComponents::uniform(score);
    ReadinessRecord {
        id: Some(id.to_string()),
        name: name.map(str::to_string),
        organizational_capacity: Some(score),
        data_quality: Some(score),
        technical_infrastructure: Some(score),
        governance: Some(score),
        score_scale: Some(CURRENT_SCORE_SCALE.to_string()),
        readiness_score: Some(readiness_score(
            &components,
            config.bounds.readiness_component,
            &config.scoring,
            config.rounding.score_decimals,
        )),
        ..ReadinessRecord::default()
    }
}

/// Inputs to one priority row.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityInput {
    pub id: String,
    pub readiness: f64,
    pub total_value: f64,
    pub time_to_value_months: Option<f64>,
}

/// Scores of one priority row.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityScore {
    pub id: String,
    pub priority: f64,
    pub readiness: f64,
    pub normalized_value: f64,
    pub ttv_score: Option<f64>,
    pub tier: Tier,
    pub phase: Phase,
}

/// Score every use case against the whole portfolio.
pub fn score_priorities(inputs: &[PriorityInput], policy: &ScoringPolicy, decimals: u32) -> Vec<PriorityScore> {
    let values: Vec<f64> = inputs.iter().map(|i| i.total_value).collect();
    let normalized = normalize_values(&values);

    inputs
        .iter()
        .zip(normalized)
        .map(|(input, value)| {
            let value = round_to(value, decimals);
            let priority = priority_score(input.readiness, value, policy, decimals);
            PriorityScore {
                id: input.id.clone(),
                priority,
                readiness: input.readiness,
                normalized_value: value,
                ttv_score: input
                    .time_to_value_months
                    .map(|m| round_to(ttv_score(m, policy), decimals)),
                tier: tier_for(priority, value, input.readiness, policy),
                phase: phase_for(priority, input.readiness, policy),
            }
        })
        .collect()
}
