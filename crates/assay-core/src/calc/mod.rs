//! Pure benefit calculators.
//!
//! Each calculator takes a complete input bundle and a scenario and
//! returns the benefit rounded down to the policy increment, together with
//! an audit trace: the formula template, every named input, intermediate
//! values, the unrounded result and rendered formula text. Calculators
//! never panic; a non-finite result collapses to zero.
//!
//! Inputs are taken as given. Use [`safe`] to clamp them to policy bounds
//! first.

pub mod safe;

pub use safe::{safe_calculate, SafeCalculation};

use serde::Serialize;

use crate::config::PolicyConfig;
use crate::currency::{format_currency, format_factor, format_number, format_percent};
use crate::document::FormulaLabel;
use crate::types::{BenefitKind, Scenario};

pub const COST_TEMPLATE: &str =
    "Hours Saved × Hourly Rate × Benefits Loading × Realization × Data Maturity × Scenario";
pub const REVENUE_TEMPLATE: &str =
    "min(Uplift, Max Uplift) × Revenue at Risk × Margin × Realization × Data Maturity × Scenario";
pub const CASH_FLOW_TEMPLATE: &str =
    "Annual Revenue × (Days Improved / 365) × Cost of Capital × Realization × Data Maturity × Scenario";
pub const RISK_TEMPLATE: &str =
    "min(P_before × I_before − P_after × I_after, Max Reduction × P_before × I_before) × Realization × Data Maturity × Scenario";

/// A named calculator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InputField {
    Hours,
    HourlyRate,
    BenefitsLoading,
    Realization,
    DataMaturity,
    Uplift,
    RevenueAtRisk,
    Margin,
    AnnualRevenue,
    DaysImproved,
    CostOfCapital,
    ProbabilityBefore,
    ImpactBefore,
    ProbabilityAfter,
    ImpactAfter,
}

impl InputField {
    /// Label written into structured input arrays.
    pub fn label(&self) -> &'static str {
        match self {
            InputField::Hours => "Hours Saved",
            InputField::HourlyRate => "Hourly Rate",
            InputField::BenefitsLoading => "Benefits Loading",
            InputField::Realization => "Realization Factor",
            InputField::DataMaturity => "Data Maturity",
            InputField::Uplift => "Revenue Uplift",
            InputField::RevenueAtRisk => "Revenue at Risk",
            InputField::Margin => "Gross Margin",
            InputField::AnnualRevenue => "Annual Revenue",
            InputField::DaysImproved => "Days Improved",
            InputField::CostOfCapital => "Cost of Capital",
            InputField::ProbabilityBefore => "Probability Before",
            InputField::ImpactBefore => "Impact Before",
            InputField::ProbabilityAfter => "Probability After",
            InputField::ImpactAfter => "Impact After",
        }
    }

    /// Whether the value is a share in [0, 1].
    pub fn is_ratio(&self) -> bool {
        matches!(
            self,
            InputField::Realization
                | InputField::DataMaturity
                | InputField::Uplift
                | InputField::Margin
                | InputField::CostOfCapital
                | InputField::ProbabilityBefore
                | InputField::ProbabilityAfter
        )
    }

    /// Whether the value is a dollar amount.
    pub fn is_money(&self) -> bool {
        matches!(
            self,
            InputField::HourlyRate
                | InputField::RevenueAtRisk
                | InputField::AnnualRevenue
                | InputField::ImpactBefore
                | InputField::ImpactAfter
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostInputs {
    pub hours: f64,
    pub hourly_rate: f64,
    pub benefits_loading: f64,
    pub realization: f64,
    pub data_maturity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueInputs {
    pub uplift: f64,
    pub revenue_at_risk: f64,
    pub margin: f64,
    pub realization: f64,
    pub data_maturity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlowInputs {
    pub annual_revenue: f64,
    pub days_improved: f64,
    pub cost_of_capital: f64,
    pub realization: f64,
    pub data_maturity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    pub probability_before: f64,
    pub impact_before: f64,
    pub probability_after: f64,
    pub impact_after: f64,
    pub realization: f64,
    pub data_maturity: f64,
}

/// A complete input bundle for one benefit kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BenefitInputs {
    Cost(CostInputs),
    Revenue(RevenueInputs),
    CashFlow(CashFlowInputs),
    Risk(RiskInputs),
}

impl BenefitInputs {
    pub fn kind(&self) -> BenefitKind {
        match self {
            BenefitInputs::Cost(_) => BenefitKind::Cost,
            BenefitInputs::Revenue(_) => BenefitKind::Revenue,
            BenefitInputs::CashFlow(_) => BenefitKind::CashFlow,
            BenefitInputs::Risk(_) => BenefitKind::Risk,
        }
    }

    /// Inputs as `(field, value)` pairs in formula order.
    pub fn fields(&self) -> Vec<(InputField, f64)> {
        use InputField::*;
        match *self {
            BenefitInputs::Cost(i) => vec![
                (Hours, i.hours),
                (HourlyRate, i.hourly_rate),
                (BenefitsLoading, i.benefits_loading),
                (Realization, i.realization),
                (DataMaturity, i.data_maturity),
            ],
            BenefitInputs::Revenue(i) => vec![
                (Uplift, i.uplift),
                (RevenueAtRisk, i.revenue_at_risk),
                (Margin, i.margin),
                (Realization, i.realization),
                (DataMaturity, i.data_maturity),
            ],
            BenefitInputs::CashFlow(i) => vec![
                (AnnualRevenue, i.annual_revenue),
                (DaysImproved, i.days_improved),
                (CostOfCapital, i.cost_of_capital),
                (Realization, i.realization),
                (DataMaturity, i.data_maturity),
            ],
            BenefitInputs::Risk(i) => vec![
                (ProbabilityBefore, i.probability_before),
                (ImpactBefore, i.impact_before),
                (ProbabilityAfter, i.probability_after),
                (ImpactAfter, i.impact_after),
                (Realization, i.realization),
                (DataMaturity, i.data_maturity),
            ],
        }
    }

    /// Inputs as structured labels.
    pub fn labels(&self) -> Vec<FormulaLabel> {
        self.fields()
            .into_iter()
            .map(|(field, value)| FormulaLabel::new(field.label(), value))
            .collect()
    }
}

/// Result of one benefit calculation with its audit trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitCalculation {
    pub kind: BenefitKind,
    /// Rounded down to the policy increment
    pub value: f64,
    pub raw_value: f64,
    pub scenario: Scenario,
    pub scenario_multiplier: f64,
    pub template: &'static str,
    pub inputs: Vec<FormulaLabel>,
    pub intermediates: Vec<FormulaLabel>,
    pub formula_text: String,
}

impl BenefitCalculation {
    /// A zero result for a benefit that does not apply.
    pub fn zero(kind: BenefitKind, scenario: Scenario, reason: &str) -> Self {
        Self {
            kind,
            value: 0.0,
            raw_value: 0.0,
            scenario,
            scenario_multiplier: 1.0,
            template: template_for(kind),
            inputs: Vec::new(),
            intermediates: Vec::new(),
            formula_text: reason.to_string(),
        }
    }
}

pub fn template_for(kind: BenefitKind) -> &'static str {
    match kind {
        BenefitKind::Cost => COST_TEMPLATE,
        BenefitKind::Revenue => REVENUE_TEMPLATE,
        BenefitKind::CashFlow => CASH_FLOW_TEMPLATE,
        BenefitKind::Risk => RISK_TEMPLATE,
    }
}

/// Round down to a multiple of `increment`. Non-finite and negative values
/// become zero.
pub fn floor_to_increment(value: f64, increment: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 || !(increment > 0.0) {
        return 0.0;
    }
    // Tolerate float error just under an exact multiple
    ((value / increment) + 1e-9).floor() * increment
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn scenario_suffix(multiplier: f64) -> String {
    if (multiplier - 1.0).abs() < 1e-12 {
        String::new()
    } else {
        format!(" × {} scenario", format_factor(multiplier))
    }
}

fn finish(
    inputs: BenefitInputs,
    raw: f64,
    scenario: Scenario,
    config: &PolicyConfig,
    intermediates: Vec<FormulaLabel>,
    render: impl FnOnce(&str) -> String,
) -> BenefitCalculation {
    let raw_value = finite_or_zero(raw).max(0.0);
    let value = floor_to_increment(raw_value, config.rounding.benefit_increment);
    let kind = inputs.kind();

    BenefitCalculation {
        kind,
        value,
        raw_value,
        scenario,
        scenario_multiplier: config.scenario_multiplier(scenario),
        template: template_for(kind),
        inputs: inputs.labels(),
        intermediates,
        formula_text: render(&format_currency(value)),
    }
}

/// Cost = Hours × Rate × Loading × Realization × Data Maturity × Scenario.
pub fn cost_benefit(inputs: &CostInputs, scenario: Scenario, config: &PolicyConfig) -> BenefitCalculation {
    let m = config.scenario_multiplier(scenario);
    let labor = inputs.hours * inputs.hourly_rate;
    let loaded = labor * inputs.benefits_loading;
    let raw = loaded * inputs.realization * inputs.data_maturity * m;

    let i = *inputs;
    finish(
        BenefitInputs::Cost(i),
        raw,
        scenario,
        config,
        vec![
            FormulaLabel::new("Labor Cost", finite_or_zero(labor)),
            FormulaLabel::new("Loaded Cost", finite_or_zero(loaded)),
        ],
        |result| {
            format!(
                "{} hours × ${}/hr × {} × {} × {}{} = {}",
                format_number(i.hours),
                format_number(i.hourly_rate),
                format_factor(i.benefits_loading),
                format_factor(i.realization),
                format_factor(i.data_maturity),
                scenario_suffix(m),
                result
            )
        },
    )
}

/// Revenue = min(Uplift, cap) × Revenue at Risk × Margin × Realization ×
/// Data Maturity × Scenario.
pub fn revenue_benefit(inputs: &RevenueInputs, scenario: Scenario, config: &PolicyConfig) -> BenefitCalculation {
    let m = config.scenario_multiplier(scenario);
    let uplift = inputs.uplift.min(config.multipliers.max_uplift);
    let incremental = uplift * inputs.revenue_at_risk;
    let profit = incremental * inputs.margin;
    let raw = profit * inputs.realization * inputs.data_maturity * m;

    let i = *inputs;
    finish(
        BenefitInputs::Revenue(i),
        raw,
        scenario,
        config,
        vec![
            FormulaLabel::new("Effective Uplift", finite_or_zero(uplift)),
            FormulaLabel::new("Incremental Revenue", finite_or_zero(incremental)),
            FormulaLabel::new("Incremental Profit", finite_or_zero(profit)),
        ],
        |result| {
            format!(
                "{} uplift × {} revenue at risk × {} margin × {} × {}{} = {}",
                format_percent(uplift),
                format_currency(i.revenue_at_risk),
                format_percent(i.margin),
                format_factor(i.realization),
                format_factor(i.data_maturity),
                scenario_suffix(m),
                result
            )
        },
    )
}

/// Cash Flow = Annual Revenue × (Days / 365) × Cost of Capital ×
/// Realization × Data Maturity × Scenario.
///
/// The benefit is the financing cost saved on working capital released by
/// collecting (or paying) `days_improved` days sooner.
pub fn cash_flow_benefit(inputs: &CashFlowInputs, scenario: Scenario, config: &PolicyConfig) -> BenefitCalculation {
    let m = config.scenario_multiplier(scenario);
    let released = inputs.annual_revenue * (inputs.days_improved / 365.0);
    let financing = released * inputs.cost_of_capital;
    let raw = financing * inputs.realization * inputs.data_maturity * m;

    let i = *inputs;
    finish(
        BenefitInputs::CashFlow(i),
        raw,
        scenario,
        config,
        vec![
            FormulaLabel::new("Working Capital Released", finite_or_zero(released)),
            FormulaLabel::new("Financing Cost Saved", finite_or_zero(financing)),
        ],
        |result| {
            format!(
                "{} revenue × {} days / 365 × {} cost of capital × {} × {}{} = {}",
                format_currency(i.annual_revenue),
                format_number(i.days_improved),
                format_percent(i.cost_of_capital),
                format_factor(i.realization),
                format_factor(i.data_maturity),
                scenario_suffix(m),
                result
            )
        },
    )
}

/// Risk = min(expected loss reduction, cap × baseline exposure) ×
/// Realization × Data Maturity × Scenario. Negative reductions floor at 0.
pub fn risk_benefit(inputs: &RiskInputs, scenario: Scenario, config: &PolicyConfig) -> BenefitCalculation {
    let m = config.scenario_multiplier(scenario);
    let exposure_before = inputs.probability_before * inputs.impact_before;
    let exposure_after = inputs.probability_after * inputs.impact_after;
    let reduction = exposure_before - exposure_after;
    let cap = config.multipliers.max_risk_reduction * exposure_before;
    let capped = reduction.min(cap).max(0.0);
    let raw = capped * inputs.realization * inputs.data_maturity * m;
    let was_capped = reduction > cap;

    let i = *inputs;
    let max_share = config.multipliers.max_risk_reduction;
    finish(
        BenefitInputs::Risk(i),
        raw,
        scenario,
        config,
        vec![
            FormulaLabel::new("Exposure Before", finite_or_zero(exposure_before)),
            FormulaLabel::new("Exposure After", finite_or_zero(exposure_after)),
            FormulaLabel::new("Gross Reduction", finite_or_zero(reduction)),
            FormulaLabel::new("Reduction Applied", finite_or_zero(capped)),
        ],
        |result| {
            let note = if was_capped {
                format!(" (reduction capped at {} of baseline exposure)", format_percent(max_share))
            } else {
                String::new()
            };
            format!(
                "({} × {} − {} × {}) × {} × {}{} = {}{}",
                format_percent(i.probability_before),
                format_currency(i.impact_before),
                format_percent(i.probability_after),
                format_currency(i.impact_after),
                format_factor(i.realization),
                format_factor(i.data_maturity),
                scenario_suffix(m),
                result,
                note
            )
        },
    )
}

/// Dispatch on the input bundle's kind.
pub fn calculate(inputs: &BenefitInputs, scenario: Scenario, config: &PolicyConfig) -> BenefitCalculation {
    match inputs {
        BenefitInputs::Cost(i) => cost_benefit(i, scenario, config),
        BenefitInputs::Revenue(i) => revenue_benefit(i, scenario, config),
        BenefitInputs::CashFlow(i) => cash_flow_benefit(i, scenario, config),
        BenefitInputs::Risk(i) => risk_benefit(i, scenario, config),
    }
}
