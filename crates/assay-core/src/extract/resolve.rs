//! Completing extracted inputs into calculator bundles.
//!
//! Benefits loading and realization are policy constants, whatever the
//! formula says. Data maturity comes from the company context when known,
//! then from the formula, then from the policy default. Each kind has its
//! own required inputs; a bundle missing one is unparseable.

use super::PartialInputs;
use crate::calc::{BenefitInputs, CashFlowInputs, CostInputs, InputField, RevenueInputs, RiskInputs};
use crate::config::PolicyConfig;
use crate::currency::{format_currency, format_percent};
use crate::types::BenefitKind;

/// Facts from outside the formula used to complete it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveContext {
    /// Data maturity multiplier implied by the company's maturity level
    pub context_maturity: Option<f64>,
    pub annual_revenue: Option<f64>,
    /// Rate used when a cost formula states none
    pub fallback_rate: f64,
}

/// A complete bundle plus notes on every default it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub inputs: BenefitInputs,
    pub defaults_applied: Vec<String>,
}

fn require(partial: &PartialInputs, field: InputField) -> Result<f64, String> {
    partial
        .get(field)
        .ok_or_else(|| format!("missing {}", field.label().to_lowercase()))
}

/// Complete a partial extraction.
pub fn resolve(partial: &PartialInputs, ctx: &ResolveContext, config: &PolicyConfig) -> Result<Resolved, String> {
    let m = &config.multipliers;
    let mut notes = Vec::new();

    let data_maturity = match (ctx.context_maturity, partial.get(InputField::DataMaturity)) {
        (Some(level), _) => level,
        (None, Some(stated)) => stated,
        (None, None) => m.default_data_maturity,
    };

    let inputs = match partial.kind {
        BenefitKind::Cost => {
            let hours = require(partial, InputField::Hours)?;
            let hourly_rate = match partial.get(InputField::HourlyRate) {
                Some(rate) => rate,
                None => {
                    notes.push(format!("hourly rate defaulted to {}", format_currency(ctx.fallback_rate)));
                    ctx.fallback_rate
                }
            };
            BenefitInputs::Cost(CostInputs {
                hours,
                hourly_rate,
                benefits_loading: m.benefits_loading,
                realization: m.cost_realization,
                data_maturity,
            })
        }
        BenefitKind::Revenue => {
            let uplift = require(partial, InputField::Uplift)?;
            let revenue_at_risk = require(partial, InputField::RevenueAtRisk)?;
            let margin = match partial.get(InputField::Margin) {
                Some(margin) => margin,
                None => {
                    notes.push(format!("margin defaulted to {}", format_percent(m.default_margin)));
                    m.default_margin
                }
            };
            BenefitInputs::Revenue(RevenueInputs {
                uplift,
                revenue_at_risk,
                margin,
                realization: m.revenue_realization,
                data_maturity,
            })
        }
        BenefitKind::CashFlow => {
            let days_improved = require(partial, InputField::DaysImproved)?;
            let annual_revenue = ctx
                .annual_revenue
                .or_else(|| partial.get(InputField::AnnualRevenue))
                .ok_or_else(|| "missing annual revenue".to_string())?;
            let cost_of_capital = match partial.get(InputField::CostOfCapital) {
                Some(rate) => rate,
                None => {
                    notes.push(format!("cost of capital defaulted to {}", format_percent(m.cost_of_capital)));
                    m.cost_of_capital
                }
            };
            BenefitInputs::CashFlow(CashFlowInputs {
                annual_revenue,
                days_improved,
                cost_of_capital,
                realization: m.cash_flow_realization,
                data_maturity,
            })
        }
        BenefitKind::Risk => {
            let probability_before = require(partial, InputField::ProbabilityBefore)?;
            let impact_before = require(partial, InputField::ImpactBefore)?;
            let probability_after = require(partial, InputField::ProbabilityAfter)?;
            let impact_after = partial.get(InputField::ImpactAfter).unwrap_or(impact_before);
            BenefitInputs::Risk(RiskInputs {
                probability_before,
                impact_before,
                probability_after,
                impact_after,
                realization: m.risk_realization,
                data_maturity,
            })
        }
    };

    Ok(Resolved {
        inputs,
        defaults_applied: notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::InputSource;

    fn ctx() -> ResolveContext {
        ResolveContext {
            context_maturity: None,
            annual_revenue: None,
            fallback_rate: 75.0,
        }
    }

    fn partial(kind: BenefitKind, values: &[(InputField, f64)]) -> PartialInputs {
        let mut p = PartialInputs::new(kind, InputSource::Text);
        for (field, value) in values {
            p.set(*field, *value);
        }
        p
    }

    #[test]
    fn test_cost_uses_policy_constants() {
        let config = PolicyConfig::default();
        let p = partial(
            BenefitKind::Cost,
            &[
                (InputField::Hours, 1_000.0),
                (InputField::HourlyRate, 50.0),
                (InputField::BenefitsLoading, 1.9),
                (InputField::Realization, 0.5),
            ],
        );
        let resolved = resolve(&p, &ctx(), &config).unwrap();
        let BenefitInputs::Cost(i) = resolved.inputs else {
            panic!("expected cost inputs");
        };
        assert_eq!(i.benefits_loading, 1.35);
        assert_eq!(i.realization, 0.90);
        assert_eq!(i.data_maturity, 0.75);
        assert!(resolved.defaults_applied.is_empty());
    }

    #[test]
    fn test_cost_rate_fallback_noted() {
        let config = PolicyConfig::default();
        let p = partial(BenefitKind::Cost, &[(InputField::Hours, 1_000.0)]);
        let resolved = resolve(&p, &ctx(), &config).unwrap();
        let BenefitInputs::Cost(i) = resolved.inputs else {
            panic!("expected cost inputs");
        };
        assert_eq!(i.hourly_rate, 75.0);
        assert_eq!(resolved.defaults_applied.len(), 1);
    }

    #[test]
    fn test_context_maturity_wins() {
        let config = PolicyConfig::default();
        let p = partial(
            BenefitKind::Cost,
            &[(InputField::Hours, 1_000.0), (InputField::DataMaturity, 0.95)],
        );
        let context = ResolveContext {
            context_maturity: Some(0.8),
            ..ctx()
        };
        let BenefitInputs::Cost(i) = resolve(&p, &context, &config).unwrap().inputs else {
            panic!("expected cost inputs");
        };
        assert_eq!(i.data_maturity, 0.8);
    }

    #[test]
    fn test_missing_required_is_error() {
        let config = PolicyConfig::default();
        let p = partial(BenefitKind::Revenue, &[(InputField::Uplift, 0.05)]);
        let err = resolve(&p, &ctx(), &config).unwrap_err();
        assert!(err.contains("revenue at risk"));
    }

    #[test]
    fn test_cash_flow_prefers_context_revenue() {
        let config = PolicyConfig::default();
        let p = partial(
            BenefitKind::CashFlow,
            &[(InputField::DaysImproved, 15.0), (InputField::AnnualRevenue, 1_000_000.0)],
        );
        let context = ResolveContext {
            annual_revenue: Some(365_000_000.0),
            ..ctx()
        };
        let BenefitInputs::CashFlow(i) = resolve(&p, &context, &config).unwrap().inputs else {
            panic!("expected cash flow inputs");
        };
        assert_eq!(i.annual_revenue, 365_000_000.0);
        assert_eq!(i.cost_of_capital, 0.08);
    }

    #[test]
    fn test_risk_impact_after_defaults_to_before() {
        let config = PolicyConfig::default();
        let p = partial(
            BenefitKind::Risk,
            &[
                (InputField::ProbabilityBefore, 0.10),
                (InputField::ImpactBefore, 5_000_000.0),
                (InputField::ProbabilityAfter, 0.02),
            ],
        );
        let BenefitInputs::Risk(i) = resolve(&p, &ctx(), &config).unwrap().inputs else {
            panic!("expected risk inputs");
        };
        assert_eq!(i.impact_after, 5_000_000.0);
    }
}
