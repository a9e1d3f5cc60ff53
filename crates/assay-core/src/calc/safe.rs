//! Bounded calculation.
//!
//! Every input is clamped into its policy range before a calculator sees
//! it. Out-of-range values are never rejected: they are clamped and each
//! clamp is reported. Non-finite values land on the lower bound.

use super::{calculate, BenefitCalculation, BenefitInputs, CashFlowInputs, CostInputs, InputField, RevenueInputs, RiskInputs};
use crate::config::{Bound, Bounds, PolicyConfig};
use crate::currency::{format_currency, format_factor, format_number};
use crate::types::Scenario;

/// Inputs are quantized to cents and to millionths of a ratio.
const MONEY_SCALE: f64 = 100.0;
const RATIO_SCALE: f64 = 1e6;

/// A calculation together with the clamps applied to its inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeCalculation {
    pub calculation: BenefitCalculation,
    /// The inputs actually used
    pub inputs: BenefitInputs,
    pub warnings: Vec<String>,
    pub inputs_clamped: bool,
}

fn render(field: InputField, value: f64) -> String {
    if field.is_money() {
        format_currency(value)
    } else if field.is_ratio() || field == InputField::BenefitsLoading {
        format_factor(value)
    } else {
        format_number(value)
    }
}

fn quantize(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

/// Clamp one input into its bound, recording a message when it moves.
pub fn clamp_input(field: InputField, value: f64, bound: Bound, warnings: &mut Vec<String>) -> f64 {
    let clamped = bound.clamp(value);
    if !value.is_finite() {
        warnings.push(format!(
            "{} is not a finite number; using {}",
            field.label(),
            render(field, clamped)
        ));
    } else if clamped != value {
        warnings.push(format!(
            "{} {} outside [{}, {}]; clamped to {}",
            field.label(),
            render(field, value),
            render(field, bound.min),
            render(field, bound.max),
            render(field, clamped)
        ));
    }

    let scale = if field.is_ratio() { RATIO_SCALE } else { MONEY_SCALE };
    quantize(clamped, scale)
}

fn bound_for(field: InputField, bounds: &Bounds) -> Bound {
    match field {
        InputField::Hours => bounds.hours_saved,
        InputField::HourlyRate => bounds.hourly_rate,
        InputField::BenefitsLoading => bounds.benefits_loading,
        InputField::Realization => bounds.realization,
        InputField::DataMaturity => bounds.data_maturity,
        InputField::Uplift => bounds.uplift,
        InputField::Margin => bounds.margin,
        InputField::DaysImproved => bounds.days_improved,
        InputField::CostOfCapital => bounds.cost_of_capital,
        InputField::ProbabilityBefore | InputField::ProbabilityAfter => bounds.probability,
        InputField::RevenueAtRisk
        | InputField::AnnualRevenue
        | InputField::ImpactBefore
        | InputField::ImpactAfter => bounds.amount,
    }
}

/// Clamp every input of a bundle into its policy bound.
pub fn clamp_inputs(inputs: &BenefitInputs, bounds: &Bounds) -> (BenefitInputs, Vec<String>) {
    let mut warnings = Vec::new();
    let mut c = |field: InputField, value: f64| clamp_input(field, value, bound_for(field, bounds), &mut warnings);

    let clamped = match *inputs {
        BenefitInputs::Cost(i) => BenefitInputs::Cost(CostInputs {
            hours: c(InputField::Hours, i.hours),
            hourly_rate: c(InputField::HourlyRate, i.hourly_rate),
            benefits_loading: c(InputField::BenefitsLoading, i.benefits_loading),
            realization: c(InputField::Realization, i.realization),
            data_maturity: c(InputField::DataMaturity, i.data_maturity),
        }),
        BenefitInputs::Revenue(i) => BenefitInputs::Revenue(RevenueInputs {
            uplift: c(InputField::Uplift, i.uplift),
            revenue_at_risk: c(InputField::RevenueAtRisk, i.revenue_at_risk),
            margin: c(InputField::Margin, i.margin),
            realization: c(InputField::Realization, i.realization),
            data_maturity: c(InputField::DataMaturity, i.data_maturity),
        }),
        BenefitInputs::CashFlow(i) => BenefitInputs::CashFlow(CashFlowInputs {
            annual_revenue: c(InputField::AnnualRevenue, i.annual_revenue),
            days_improved: c(InputField::DaysImproved, i.days_improved),
            cost_of_capital: c(InputField::CostOfCapital, i.cost_of_capital),
            realization: c(InputField::Realization, i.realization),
            data_maturity: c(InputField::DataMaturity, i.data_maturity),
        }),
        BenefitInputs::Risk(i) => BenefitInputs::Risk(RiskInputs {
            probability_before: c(InputField::ProbabilityBefore, i.probability_before),
            impact_before: c(InputField::ImpactBefore, i.impact_before),
            probability_after: c(InputField::ProbabilityAfter, i.probability_after),
            impact_after: c(InputField::ImpactAfter, i.impact_after),
            realization: c(InputField::Realization, i.realization),
            data_maturity: c(InputField::DataMaturity, i.data_maturity),
        }),
    };

    (clamped, warnings)
}

/// Clamp, then calculate.
pub fn safe_calculate(inputs: &BenefitInputs, scenario: Scenario, config: &PolicyConfig) -> SafeCalculation {
    let (clamped, warnings) = clamp_inputs(inputs, &config.bounds);
    SafeCalculation {
        calculation: calculate(&clamped, scenario, config),
        inputs: clamped,
        inputs_clamped: !warnings.is_empty(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cost(hours: f64, rate: f64) -> BenefitInputs {
        BenefitInputs::Cost(CostInputs {
            hours,
            hourly_rate: rate,
            benefits_loading: 1.35,
            realization: 0.90,
            data_maturity: 0.75,
        })
    }

    #[test]
    fn test_in_range_inputs_untouched() {
        let config = PolicyConfig::default();
        let result = safe_calculate(&cost(28_000.0, 50.0), Scenario::Moderate, &config);
        assert!(!result.inputs_clamped);
        assert!(result.warnings.is_empty());
        // 28,000 × 50 × 1.35 × 0.9 × 0.75 = 1,275,750
        assert_eq!(result.calculation.value, 1_200_000.0);
    }

    #[test]
    fn test_rate_clamped_with_message() {
        let config = PolicyConfig::default();
        let result = safe_calculate(&cost(1_000.0, 900.0), Scenario::Moderate, &config);
        assert!(result.inputs_clamped);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Hourly Rate"));
        assert!(result.warnings[0].contains("$500"));
        match result.inputs {
            BenefitInputs::Cost(i) => assert_eq!(i.hourly_rate, 500.0),
            _ => panic!("expected cost inputs"),
        }
    }

    #[test]
    fn test_non_finite_lands_on_lower_bound() {
        let config = PolicyConfig::default();
        let result = safe_calculate(&cost(f64::NAN, 50.0), Scenario::Moderate, &config);
        assert!(result.inputs_clamped);
        assert!(result.warnings[0].contains("not a finite number"));
        assert_eq!(result.calculation.value, 0.0);
    }

    #[test]
    fn test_maturity_raised_to_floor() {
        let config = PolicyConfig::default();
        let inputs = BenefitInputs::CashFlow(CashFlowInputs {
            annual_revenue: 100_000_000.0,
            days_improved: 200.0,
            cost_of_capital: 0.5,
            realization: 0.85,
            data_maturity: 0.2,
        });
        let (clamped, warnings) = clamp_inputs(&inputs, &config.bounds);
        assert_eq!(warnings.len(), 3);
        match clamped {
            BenefitInputs::CashFlow(i) => {
                assert_eq!(i.days_improved, 120.0);
                assert!((i.cost_of_capital - 0.20).abs() < 1e-9);
                assert!((i.data_maturity - 0.60).abs() < 1e-9);
            }
            _ => panic!("expected cash flow inputs"),
        }
    }
}
