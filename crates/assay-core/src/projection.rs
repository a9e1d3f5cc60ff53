//! Multi-year financial projection per scenario.
//!
//! Yearly benefit is the scenario's annual benefit times its adoption
//! curve. Implementation cost lands on the 60/30/10 schedule at the start
//! of each year; run cost and benefit accrue linearly through the year.
//! NPV discounts year t by (1 + r)^t, starting at t = 1.
//!
//! A scenario's annual benefit is the capped moderate portfolio total
//! times the scenario multiplier, not a rerun of the calculators. The
//! calculators are linear in the multiplier before flooring, so the two
//! differ only by the rounding increment and by per-use-case caps, which
//! bind on the moderate figures.

use serde::Serialize;

use crate::config::{PolicyConfig, ScenarioSettings};
use crate::document::lenient::ser_money_required;
use crate::scoring::round_to;
use crate::types::Scenario;

/// Derivative magnitude below which Newton steps are abandoned.
const MIN_DERIVATIVE: f64 = 1e-12;

/// One projected year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearFlow {
    pub year: usize,
    pub adoption: f64,
    pub benefit: f64,
    pub implementation_cost: f64,
    pub run_cost: f64,
    pub net: f64,
}

/// Headline figures of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutcome {
    #[serde(serialize_with = "ser_money_required")]
    pub annual_benefit: f64,
    #[serde(serialize_with = "ser_money_required")]
    pub npv: f64,
    pub payback_months: Option<f64>,
    pub irr: Option<f64>,
    #[serde(skip)]
    pub years: Vec<YearFlow>,
}

/// All three scenarios.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioAnalysis {
    pub conservative: ScenarioOutcome,
    pub moderate: ScenarioOutcome,
    pub aggressive: ScenarioOutcome,
    #[serde(serialize_with = "ser_money_required")]
    pub implementation_cost: f64,
    #[serde(serialize_with = "ser_money_required")]
    pub annual_run_cost: f64,
    pub discount_rate: f64,
}

impl ScenarioAnalysis {
    pub fn get(&self, scenario: Scenario) -> &ScenarioOutcome {
        match scenario {
            Scenario::Conservative => &self.conservative,
            Scenario::Moderate => &self.moderate,
            Scenario::Aggressive => &self.aggressive,
        }
    }
}

/// Adoption share in a 1-based year. The curve's last entry holds after
/// it ends; an empty curve means full adoption.
pub fn adoption_for(year: usize, settings: &ScenarioSettings) -> f64 {
    match settings.adoption.len() {
        0 => 1.0,
        len => settings.adoption[year.saturating_sub(1).min(len - 1)],
    }
}

/// Project yearly flows for one scenario.
pub fn yearly_flows(
    annual_benefit: f64,
    implementation_cost: f64,
    run_cost: f64,
    settings: &ScenarioSettings,
    config: &PolicyConfig,
) -> Vec<YearFlow> {
    let schedule = &config.projection.cost_schedule;
    (1..=config.projection.years)
        .map(|year| {
            let adoption = adoption_for(year, settings);
            let benefit = annual_benefit * adoption;
            let implementation = schedule.get(year - 1).copied().unwrap_or(0.0) * implementation_cost;
            YearFlow {
                year,
                adoption,
                benefit,
                implementation_cost: implementation,
                run_cost,
                net: benefit - implementation - run_cost,
            }
        })
        .collect()
}

/// Net present value of yearly nets, the first discounted one period.
pub fn npv(nets: &[f64], rate: f64) -> f64 {
    nets.iter()
        .enumerate()
        .map(|(i, net)| net / (1.0 + rate).powi(i as i32 + 1))
        .sum()
}

/// Month in which cumulative net cash first reaches zero, to one decimal.
///
/// Each year's implementation cost is paid on its first day; benefit net
/// of run cost accrues evenly over its twelve months.
pub fn payback_months(flows: &[YearFlow]) -> Option<f64> {
    let mut cumulative = 0.0;
    for flow in flows {
        let elapsed = (flow.year - 1) as f64 * 12.0;
        cumulative -= flow.implementation_cost;
        if cumulative >= 0.0 && flow.year > 1 {
            return Some(elapsed);
        }

        let monthly = (flow.benefit - flow.run_cost) / 12.0;
        if monthly > 0.0 && cumulative + 12.0 * monthly >= 0.0 {
            let months_in = (-cumulative / monthly).max(0.0);
            return Some(round_to(elapsed + months_in, 1));
        }
        cumulative += 12.0 * monthly;
    }
    None
}

/// Internal rate of return by Newton–Raphson on the NPV function.
///
/// `None` when the flows never change sign, the derivative vanishes, the
/// rate leaves (−max, max), or the iteration budget runs out.
pub fn irr(nets: &[f64], config: &PolicyConfig) -> Option<f64> {
    let p = &config.projection;
    let has_negative = nets.iter().any(|n| *n < 0.0);
    let has_positive = nets.iter().any(|n| *n > 0.0);
    if !(has_negative && has_positive) {
        return None;
    }

    let mut rate = p.irr_initial_guess;
    for _ in 0..p.irr_max_iterations {
        let (value, derivative) = nets.iter().enumerate().fold((0.0, 0.0), |(v, d), (i, net)| {
            let t = i as f64 + 1.0;
            let base = 1.0 + rate;
            (v + net / base.powf(t), d - t * net / base.powf(t + 1.0))
        });
        if !derivative.is_finite() || derivative.abs() < MIN_DERIVATIVE {
            return None;
        }

        let next = rate - value / derivative;
        if !next.is_finite() || next.abs() >= p.irr_max_abs_rate || next <= -1.0 {
            return None;
        }
        if (next - rate).abs() < p.irr_tolerance {
            return Some(next);
        }
        rate = next;
    }

    tracing::debug!(iterations = p.irr_max_iterations, "IRR did not converge");
    None
}

/// Project one scenario.
///
/// `base_benefit` is the moderate annual benefit; the scenario multiplier
/// is applied and the result held under `benefit_cap` when one is given.
pub fn project_scenario(
    scenario: Scenario,
    base_benefit: f64,
    implementation_cost: f64,
    run_cost: f64,
    benefit_cap: Option<f64>,
    config: &PolicyConfig,
) -> ScenarioOutcome {
    let settings = config.scenarios.get(scenario);
    let mut annual_benefit = base_benefit.max(0.0) * settings.multiplier;
    if let Some(cap) = benefit_cap {
        annual_benefit = annual_benefit.min(cap);
    }

    let years = yearly_flows(annual_benefit, implementation_cost.max(0.0), run_cost.max(0.0), settings, config);
    let nets: Vec<f64> = years.iter().map(|y| y.net).collect();

    ScenarioOutcome {
        annual_benefit: annual_benefit.round(),
        npv: npv(&nets, config.projection.discount_rate).round(),
        payback_months: payback_months(&years),
        irr: irr(&nets, config).map(|r| round_to(r, 4)),
        years,
    }
}

/// Project all three scenarios.
pub fn scenario_analysis(
    base_benefit: f64,
    implementation_cost: f64,
    run_cost: f64,
    benefit_cap: Option<f64>,
    config: &PolicyConfig,
) -> ScenarioAnalysis {
    let project = |s| project_scenario(s, base_benefit, implementation_cost, run_cost, benefit_cap, config);
    ScenarioAnalysis {
        conservative: project(Scenario::Conservative),
        moderate: project(Scenario::Moderate),
        aggressive: project(Scenario::Aggressive),
        implementation_cost: implementation_cost.max(0.0),
        annual_run_cost: run_cost.max(0.0),
        discount_rate: config.projection.discount_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adoption_holds_last_value() {
        let config = PolicyConfig::default();
        let moderate = config.scenarios.get(Scenario::Moderate);
        assert_eq!(adoption_for(1, moderate), 0.40);
        assert_eq!(adoption_for(3, moderate), 0.85);
        assert_eq!(adoption_for(5, moderate), 0.85);
    }

    #[test]
    fn test_moderate_projection() {
        let config = PolicyConfig::default();
        let outcome = project_scenario(Scenario::Moderate, 1_000_000.0, 500_000.0, 0.0, None, &config);
        let nets: Vec<f64> = outcome.years.iter().map(|y| y.net.round()).collect();
        assert_eq!(nets, vec![100_000.0, 500_000.0, 800_000.0, 850_000.0, 850_000.0]);
        // 100/1.1 + 500/1.21 + 800/1.331 + 850/1.4641 + 850/1.61051, in $K
        assert!((outcome.npv - 2_213_530.0).abs() < 10.0);
        assert_eq!(outcome.payback_months, Some(9.0));
        assert_eq!(outcome.irr, None);
    }

    #[test]
    fn test_scenarios_scale_and_cap() {
        let config = PolicyConfig::default();
        let analysis = scenario_analysis(1_000_000.0, 500_000.0, 0.0, Some(1_200_000.0), &config);
        assert_eq!(analysis.conservative.annual_benefit, 600_000.0);
        assert_eq!(analysis.moderate.annual_benefit, 1_000_000.0);
        assert_eq!(analysis.aggressive.annual_benefit, 1_200_000.0);
        assert!(analysis.conservative.npv < analysis.moderate.npv);
    }

    #[test]
    fn test_scenario_scaling_matches_calculators() {
        use crate::calc::{calculate, BenefitInputs, CostInputs};

        let config = PolicyConfig::default();
        let inputs = BenefitInputs::Cost(CostInputs {
            hours: 28_000.0,
            hourly_rate: 50.0,
            benefits_loading: 1.35,
            realization: 0.9,
            data_maturity: 0.75,
        });
        let moderate = calculate(&inputs, Scenario::Moderate, &config).raw_value;
        for scenario in [Scenario::Conservative, Scenario::Aggressive] {
            let direct = calculate(&inputs, scenario, &config).raw_value;
            let scaled = project_scenario(scenario, moderate, 0.0, 0.0, None, &config).annual_benefit;
            // annual benefit is kept to whole dollars
            assert!((direct - scaled).abs() <= 0.5, "{:?}", scenario);
        }
    }

    #[test]
    fn test_payback_never() {
        let config = PolicyConfig::default();
        let outcome = project_scenario(Scenario::Conservative, 10_000.0, 5_000_000.0, 0.0, None, &config);
        assert_eq!(outcome.payback_months, None);
    }

    #[test]
    fn test_payback_in_later_year() {
        let flows = vec![
            YearFlow { year: 1, adoption: 1.0, benefit: 120.0, implementation_cost: 300.0, run_cost: 0.0, net: -180.0 },
            YearFlow { year: 2, adoption: 1.0, benefit: 240.0, implementation_cost: 0.0, run_cost: 0.0, net: 240.0 },
        ];
        // 180 left after year 1, repaid at 20 per month
        assert_eq!(payback_months(&flows), Some(21.0));
    }

    #[test]
    fn test_irr_newton() {
        let config = PolicyConfig::default();
        let rate = irr(&[-100.0, 121.0], &config).unwrap();
        assert!((rate - 0.21).abs() < 1e-3);
        assert_eq!(irr(&[100.0, 100.0], &config), None);
    }

    #[test]
    fn test_run_cost_reduces_npv() {
        let config = PolicyConfig::default();
        let without = project_scenario(Scenario::Moderate, 1_000_000.0, 500_000.0, 0.0, None, &config);
        let with = project_scenario(Scenario::Moderate, 1_000_000.0, 500_000.0, 50_000.0, None, &config);
        assert!(with.npv < without.npv);
        assert!(with.payback_months.unwrap() > without.payback_months.unwrap());
    }

    #[test]
    fn test_serialized_shape() {
        let config = PolicyConfig::default();
        let analysis = scenario_analysis(1_000_000.0, 500_000.0, 0.0, None, &config);
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["moderate"]["annualBenefit"], "$1M");
        assert_eq!(value["moderate"]["paybackMonths"], 9.0);
        assert!(value["moderate"]["irr"].is_null());
        assert!(value["moderate"].get("years").is_none());
    }
}
