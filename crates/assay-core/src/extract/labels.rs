//! Structured label matching.
//!
//! Each benefit kind has an ordered rule table. A label is assigned to the
//! first rule whose field is still open and whose needles it contains
//! (case-insensitive). A rule matches when any one of its needle groups is
//! fully contained in the label. A needle written `!word` must be absent.

use super::{InputSource, PartialInputs};
use crate::calc::InputField;
use crate::document::FormulaLabel;
use crate::types::BenefitKind;

type Rule = (InputField, &'static [&'static [&'static str]]);

const REALIZATION: Rule = (InputField::Realization, &[&["realization"], &["adoption"]]);
const MATURITY: Rule = (InputField::DataMaturity, &[&["maturity"], &["data quality"]]);

const COST_RULES: &[Rule] = &[
    REALIZATION,
    MATURITY,
    (InputField::HourlyRate, &[&["hourly"], &["per hour"], &["rate", "hour"], &["labor rate"], &["wage"]]),
    (InputField::Hours, &[&["hour"], &["time saved"]]),
    (InputField::BenefitsLoading, &[&["loading"], &["burden"], &["overhead"]]),
];

const REVENUE_RULES: &[Rule] = &[
    REALIZATION,
    MATURITY,
    (InputField::Margin, &[&["margin"]]),
    (InputField::Uplift, &[&["uplift"], &["increase"], &["growth"], &["lift"], &["improvement"], &["conversion"]]),
    (InputField::RevenueAtRisk, &[&["revenue"], &["sales"], &["base"], &["at risk"], &["pipeline"]]),
];

const CASH_FLOW_RULES: &[Rule] = &[
    REALIZATION,
    MATURITY,
    (InputField::CostOfCapital, &[&["cost of capital"], &["capital"], &["wacc"], &["interest"]]),
    (InputField::DaysImproved, &[&["day"], &["dso"], &["dpo"], &["dio"], &["cycle"]]),
    (InputField::AnnualRevenue, &[&["revenue"], &["sales"]]),
];

const RISK_RULES: &[Rule] = &[
    REALIZATION,
    MATURITY,
    (
        InputField::ProbabilityAfter,
        &[&["prob", "after"], &["likelihood", "after"], &["prob", "post"], &["prob", "with", "!without"], &["prob", "reduced"], &["residual", "prob"]],
    ),
    (
        InputField::ImpactAfter,
        &[&["impact", "after"], &["loss", "after"], &["impact", "post"], &["impact", "with", "!without"], &["residual", "impact"]],
    ),
    (InputField::ProbabilityBefore, &[&["prob"], &["likelihood"], &["frequency"]]),
    (InputField::ImpactBefore, &[&["impact"], &["loss"], &["exposure"], &["cost"], &["fine"], &["penalty"]]),
];

fn rules_for(kind: BenefitKind) -> &'static [Rule] {
    match kind {
        BenefitKind::Cost => COST_RULES,
        BenefitKind::Revenue => REVENUE_RULES,
        BenefitKind::CashFlow => CASH_FLOW_RULES,
        BenefitKind::Risk => RISK_RULES,
    }
}

fn matches_rule(label: &str, groups: &[&[&str]]) -> bool {
    groups.iter().any(|group| {
        group.iter().all(|needle| match needle.strip_prefix('!') {
            Some(absent) => !label.contains(absent),
            None => label.contains(needle),
        })
    })
}

/// Ratio fields stated as percentages (`30` for 30%) are read as shares.
fn normalize_value(field: InputField, value: f64) -> f64 {
    if field.is_ratio() && value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

/// Assign structured labels to input fields.
pub fn from_labels(kind: BenefitKind, labels: &[FormulaLabel]) -> PartialInputs {
    let rules = rules_for(kind);
    let mut inputs = PartialInputs::new(kind, InputSource::Labels);

    for entry in labels {
        let label = entry.label.to_lowercase();
        let hit = rules
            .iter()
            .find(|(field, groups)| !inputs.has(*field) && matches_rule(&label, groups));
        match hit {
            Some((field, _)) => inputs.set(*field, normalize_value(*field, entry.value)),
            None => tracing::debug!(kind = %kind, label = %entry.label, "Unrecognized formula label"),
        }
    }

    inputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{BenefitInputs, CashFlowInputs, CostInputs, RevenueInputs, RiskInputs};

    #[test]
    fn test_cost_labels() {
        let labels = vec![
            FormulaLabel::new("Annual Hours Saved", 28_000.0),
            FormulaLabel::new("Loaded Hourly Rate", 50.0),
            FormulaLabel::new("Data Maturity Factor", 0.8),
            FormulaLabel::new("Favorite Color", 3.0),
        ];
        let p = from_labels(BenefitKind::Cost, &labels);
        assert_eq!(p.get(InputField::Hours), Some(28_000.0));
        assert_eq!(p.get(InputField::HourlyRate), Some(50.0));
        assert_eq!(p.get(InputField::DataMaturity), Some(0.8));
        assert_eq!(p.values.len(), 3);
    }

    #[test]
    fn test_realization_rate_is_not_hourly_rate() {
        let labels = vec![
            FormulaLabel::new("Realization Rate", 0.9),
            FormulaLabel::new("Hourly Rate", 50.0),
            FormulaLabel::new("Hours Saved", 28_000.0),
            FormulaLabel::new("Adoption Rate", 0.7),
        ];
        let p = from_labels(BenefitKind::Cost, &labels);
        assert_eq!(p.get(InputField::Realization), Some(0.9));
        assert_eq!(p.get(InputField::HourlyRate), Some(50.0));
        assert_eq!(p.get(InputField::Hours), Some(28_000.0));
        // realization is already taken
        assert_eq!(p.values.len(), 3);
    }

    #[test]
    fn test_percent_values_become_shares() {
        let labels = vec![
            FormulaLabel::new("Revenue Uplift %", 5.0),
            FormulaLabel::new("Gross Margin", 40.0),
            FormulaLabel::new("Revenue at Risk", 20_000_000.0),
        ];
        let p = from_labels(BenefitKind::Revenue, &labels);
        assert_eq!(p.get(InputField::Uplift), Some(0.05));
        assert_eq!(p.get(InputField::Margin), Some(0.40));
        assert_eq!(p.get(InputField::RevenueAtRisk), Some(20_000_000.0));
    }

    #[test]
    fn test_risk_before_and_after() {
        let labels = vec![
            FormulaLabel::new("Probability Before", 0.10),
            FormulaLabel::new("Financial Impact", 5_000_000.0),
            FormulaLabel::new("Probability After", 0.02),
        ];
        let p = from_labels(BenefitKind::Risk, &labels);
        assert_eq!(p.get(InputField::ProbabilityBefore), Some(0.10));
        assert_eq!(p.get(InputField::ProbabilityAfter), Some(0.02));
        assert_eq!(p.get(InputField::ImpactBefore), Some(5_000_000.0));
        assert!(!p.has(InputField::ImpactAfter));
    }

    #[test]
    fn test_without_reads_as_before() {
        let labels = vec![
            FormulaLabel::new("Probability Without AI", 0.10),
            FormulaLabel::new("Probability With AI", 0.02),
            FormulaLabel::new("Impact Without AI", 5_000_000.0),
            FormulaLabel::new("Impact With AI", 4_000_000.0),
        ];
        let p = from_labels(BenefitKind::Risk, &labels);
        assert_eq!(p.get(InputField::ProbabilityBefore), Some(0.10));
        assert_eq!(p.get(InputField::ProbabilityAfter), Some(0.02));
        assert_eq!(p.get(InputField::ImpactBefore), Some(5_000_000.0));
        assert_eq!(p.get(InputField::ImpactAfter), Some(4_000_000.0));
    }

    #[test]
    fn test_canonical_labels_read_back() {
        let bundles = [
            BenefitInputs::Cost(CostInputs {
                hours: 28_000.0,
                hourly_rate: 50.0,
                benefits_loading: 1.35,
                realization: 0.9,
                data_maturity: 0.75,
            }),
            BenefitInputs::Revenue(RevenueInputs {
                uplift: 0.05,
                revenue_at_risk: 20_000_000.0,
                margin: 0.3,
                realization: 0.95,
                data_maturity: 0.75,
            }),
            BenefitInputs::CashFlow(CashFlowInputs {
                annual_revenue: 365_000_000.0,
                days_improved: 15.0,
                cost_of_capital: 0.08,
                realization: 0.85,
                data_maturity: 0.75,
            }),
            BenefitInputs::Risk(RiskInputs {
                probability_before: 0.1,
                impact_before: 5_000_000.0,
                probability_after: 0.02,
                impact_after: 4_000_000.0,
                realization: 0.8,
                data_maturity: 0.75,
            }),
        ];
        for bundle in bundles {
            let p = from_labels(bundle.kind(), &bundle.labels());
            for (field, value) in bundle.fields() {
                assert_eq!(p.get(field), Some(value), "{:?} {:?}", bundle.kind(), field);
            }
        }
    }
}
