//! Executive dashboard summary.

use serde::Serialize;

use crate::aggregate::Aggregation;
use crate::document::lenient::{ser_money, ser_money_required};
use crate::document::{PriorityRecord, ReadinessRecord};
use crate::types::BenefitKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub monthly_tokens: f64,
    pub annual_tokens: f64,
    #[serde(serialize_with = "ser_money_required")]
    pub annual_token_cost: f64,
}

/// One row of the top use cases table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUseCase {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(serialize_with = "ser_money_required")]
    pub total_annual_value: f64,
    pub priority_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveDashboard {
    #[serde(serialize_with = "ser_money_required")]
    pub total_cost_benefit: f64,
    #[serde(serialize_with = "ser_money_required")]
    pub total_revenue_benefit: f64,
    #[serde(serialize_with = "ser_money_required")]
    pub total_cash_flow_benefit: f64,
    #[serde(serialize_with = "ser_money_required")]
    pub total_risk_benefit: f64,
    #[serde(serialize_with = "ser_money_required")]
    pub total_annual_value: f64,
    pub use_case_count: usize,
    pub token_usage: TokenUsage,
    /// Annual value per million tokens consumed; absent without token data
    #[serde(serialize_with = "ser_money", skip_serializing_if = "Option::is_none")]
    pub value_per_million_tokens: Option<f64>,
    pub top_use_cases: Vec<TopUseCase>,
}

/// Summarize the corrected portfolio.
///
/// Top use cases are ranked by priority score, then by total value.
pub fn build_dashboard(
    aggregation: &Aggregation,
    readiness: &[ReadinessRecord],
    priorities: &[PriorityRecord],
    top_n: usize,
) -> ExecutiveDashboard {
    let monthly_tokens: f64 = readiness.iter().filter_map(|r| r.monthly_tokens).sum();
    let annual_token_cost: f64 = readiness.iter().filter_map(|r| r.annual_token_cost).sum();
    let annual_tokens = monthly_tokens * 12.0;
    let total = aggregation.portfolio_total;

    let value_per_million_tokens = (annual_tokens > 0.0).then(|| (total / (annual_tokens / 1e6)).round());

    let mut ranked: Vec<TopUseCase> = priorities
        .iter()
        .map(|p| TopUseCase {
            id: p.id.clone().unwrap_or_default(),
            name: p.name.clone(),
            total_annual_value: p.total_annual_value.unwrap_or(0.0),
            priority_score: p.priority_score.unwrap_or(0.0),
            tier: p.tier.clone(),
            phase: p.phase.clone(),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.priority_score
            .total_cmp(&a.priority_score)
            .then(b.total_annual_value.total_cmp(&a.total_annual_value))
    });
    ranked.truncate(top_n);

    ExecutiveDashboard {
        total_cost_benefit: aggregation.total_of(BenefitKind::Cost),
        total_revenue_benefit: aggregation.total_of(BenefitKind::Revenue),
        total_cash_flow_benefit: aggregation.total_of(BenefitKind::CashFlow),
        total_risk_benefit: aggregation.total_of(BenefitKind::Risk),
        total_annual_value: total,
        use_case_count: aggregation.lines.len(),
        token_usage: TokenUsage {
            monthly_tokens,
            annual_tokens,
            annual_token_cost,
        },
        value_per_million_tokens,
        top_use_cases: ranked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, BenefitLine};
    use crate::config::CapPolicy;
    use crate::document::CompanyContext;

    fn priority(id: &str, score: f64, value: f64) -> PriorityRecord {
        PriorityRecord {
            id: Some(id.to_string()),
            priority_score: Some(score),
            total_annual_value: Some(value),
            ..PriorityRecord::default()
        }
    }

    #[test]
    fn test_totals_and_ranking() {
        let lines = vec![
            BenefitLine::new("UC-001").with_amount(BenefitKind::Cost, 1_000_000.0),
            BenefitLine::new("UC-002")
                .with_amount(BenefitKind::Revenue, 500_000.0)
                .with_amount(BenefitKind::Risk, 100_000.0),
        ];
        let context = CompanyContext {
            annual_revenue: Some(500_000_000.0),
            ..CompanyContext::default()
        };
        let agg = aggregate(&lines, &context, &CapPolicy::default());
        let readiness = vec![ReadinessRecord {
            monthly_tokens: Some(1_000_000.0),
            annual_token_cost: Some(2_400.0),
            ..ReadinessRecord::default()
        }];
        let priorities = vec![
            priority("UC-001", 6.0, 1_000_000.0),
            priority("UC-002", 8.0, 600_000.0),
            priority("UC-003", 6.0, 2_000_000.0),
        ];

        let dash = build_dashboard(&agg, &readiness, &priorities, 2);
        assert_eq!(dash.total_cost_benefit, 1_000_000.0);
        assert_eq!(dash.total_risk_benefit, 100_000.0);
        assert_eq!(dash.total_annual_value, 1_600_000.0);
        assert_eq!(dash.token_usage.annual_tokens, 12_000_000.0);
        // 1.6M over 12M tokens
        assert_eq!(dash.value_per_million_tokens, Some(133_333.0));
        let ids: Vec<&str> = dash.top_use_cases.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["UC-002", "UC-003"]);
    }

    #[test]
    fn test_no_tokens_no_ratio() {
        let agg = aggregate(&[], &CompanyContext::default(), &CapPolicy::default());
        let dash = build_dashboard(&agg, &[], &[], 10);
        assert_eq!(dash.value_per_million_tokens, None);
        let value = serde_json::to_value(&dash).unwrap();
        assert!(value.get("valuePerMillionTokens").is_none());
        assert_eq!(value["totalAnnualValue"], "$0");
    }
}
