//! Friction-point correction (step 3).
//!
//! Every friction record gets a canonical role and that role's loaded
//! rate, then its cost and severity are recomputed from hours × rate.

use crate::config::PolicyConfig;
use crate::currency::format_currency;
use crate::document::{FrictionRecord, FRICTION_STEP};
use crate::roles::normalize_role;
use crate::types::{MatchConfidence, Severity};
use crate::warnings::{Warning, WarningKind};

/// Severity from annual cost and impact flags.
///
/// Customer or compliance impact lowers the cost needed for the two top
/// levels.
pub fn severity_for(annual_cost: f64, customer_impact: bool, compliance_impact: bool) -> Severity {
    let flagged = customer_impact || compliance_impact;
    if annual_cost >= 5_000_000.0 || (flagged && annual_cost >= 2_000_000.0) {
        Severity::Critical
    } else if annual_cost >= 1_000_000.0 || (flagged && annual_cost >= 500_000.0) {
        Severity::High
    } else if annual_cost >= 250_000.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Normalize the role of one record and recompute its cost and severity.
pub fn correct_friction_record(
    record: &FrictionRecord,
    config: &PolicyConfig,
    warnings: &mut Vec<Warning>,
) -> FrictionRecord {
    let mut out = record.clone();
    let label = record.role.as_deref().unwrap_or("");
    let matched = normalize_role(label, record.function.as_deref(), config);
    let role = matched.role;

    let renamed = record.role.as_deref() != Some(role.name.as_str());
    let repriced = record.hourly_rate != Some(role.hourly_rate);
    if renamed || repriced {
        let from = if label.is_empty() { "(none)" } else { label };
        let mut message = format!(
            "Role \"{}\" normalized to \"{}\" ({}) at {}/hr",
            from,
            role.name,
            matched.confidence,
            format_currency(role.hourly_rate)
        );
        if let Some(previous) = record.hourly_rate.filter(|_| repriced) {
            message.push_str(&format!(", was {}/hr", format_currency(previous)));
        }
        warnings.push(Warning::at_record(
            WarningKind::RoleNormalized,
            FRICTION_STEP,
            record.label(),
            "Role",
            message,
        ));
    }
    if matches!(matched.confidence, MatchConfidence::Default) && !label.is_empty() {
        tracing::debug!(role = label, "Role label matched nothing; using default role");
    }

    out.role = Some(role.name.clone());
    out.role_id = Some(role.id.clone());
    out.role_match = Some(matched.confidence.as_str().to_string());
    out.hourly_rate = Some(role.hourly_rate);

    if let Some(hours) = record.annual_hours {
        let cost = (hours.max(0.0) * role.hourly_rate).round();
        out.annual_cost = Some(cost);
        out.severity = Some(
            severity_for(
                cost,
                record.customer_impact.unwrap_or(false),
                record.compliance_impact.unwrap_or(false),
            )
            .as_str()
            .to_string(),
        );
    }

    out
}

/// Correct every friction record, in order.
pub fn correct_friction(
    records: &[FrictionRecord],
    config: &PolicyConfig,
    warnings: &mut Vec<Warning>,
) -> Vec<FrictionRecord> {
    records
        .iter()
        .map(|r| correct_friction_record(r, config, warnings))
        .collect()
}
