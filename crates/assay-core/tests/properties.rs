//! Property tests for the invariants every corrected document must hold.

use assay_core::aggregate::{aggregate, BenefitLine};
use assay_core::config::{Bound, CapPolicy, ScoringPolicy};
use assay_core::document::{CompanyContext, BENEFIT_STEP, READINESS_STEP};
use assay_core::scoring::{normalize_values, readiness_score, ReadinessComponents};
use assay_core::{parse_amount, AnalysisDocument, BenefitKind, Pipeline};
use proptest::prelude::*;
use serde_json::{json, Value};

fn line(id: usize, amounts: [f64; 4]) -> BenefitLine {
    BenefitKind::ALL
        .iter()
        .zip(amounts)
        .fold(BenefitLine::new(format!("UC-{:03}", id)), |line, (kind, v)| line.with_amount(*kind, v))
}

fn generated_document(revenue: f64, cases: &[(f64, f64, f64)], implementation_cost: f64) -> AnalysisDocument {
    let benefits: Vec<Value> = cases
        .iter()
        .enumerate()
        .map(|(i, (hours, rate, uplift))| {
            json!({
                "ID": format!("UC-{:03}", i + 1),
                "Use Case": format!("Use case {}", i + 1),
                "Cost Formula": format!("{} hours × ${}/hr × 1.35 × 0.90 × 0.75", hours, rate),
                "Revenue Formula": format!("{}% uplift × $20M revenue at risk × 30% margin × 0.95 × 0.75", uplift),
                "Risk Formula": "(10% × $5M) − (2% × $5M) × 0.80 × 0.75"
            })
        })
        .collect();
    let readiness: Vec<Value> = (0..cases.len())
        .map(|i| {
            json!({
                "ID": format!("UC-{:03}", i + 1),
                "Implementation Cost": implementation_cost / cases.len() as f64,
                "Annual Token Cost": 1_620.0 * (i + 1) as f64
            })
        })
        .collect();

    AnalysisDocument::from_value(json!({
        "steps": [
            { "step": 0, "title": "Company", "data": [{ "Annual Revenue": revenue }] },
            { "step": 5, "title": "Benefits", "data": benefits },
            { "step": 6, "title": "Readiness", "data": readiness }
        ]
    }))
    .unwrap()
}

fn totals(doc: &AnalysisDocument) -> Vec<f64> {
    doc.step(BENEFIT_STEP)
        .unwrap()
        .records()
        .iter()
        .map(|r| r["Total Annual Value"].as_str().and_then(parse_amount).unwrap_or(f64::NAN))
        .collect()
}

/// Exact post-cap totals from the audit trail; the record fields are
/// rounded currency strings.
fn audited_totals(doc: &AnalysisDocument) -> Vec<f64> {
    doc.step(BENEFIT_STEP)
        .unwrap()
        .records()
        .iter()
        .map(|r| {
            BenefitKind::ALL
                .iter()
                .map(|k| r["Audit Trail"][k.label()]["finalValue"].as_f64().unwrap_or(f64::NAN))
                .sum()
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_caps_hold(
        revenue in 1_000_000.0f64..1_000_000_000.0,
        amounts in prop::collection::vec(prop::array::uniform4(0.0f64..500_000_000.0), 1..8),
    ) {
        let lines: Vec<BenefitLine> = amounts.iter().enumerate().map(|(i, a)| line(i, *a)).collect();
        let context = CompanyContext { annual_revenue: Some(revenue), ..CompanyContext::default() };
        let caps = CapPolicy::default();
        let result = aggregate(&lines, &context, &caps);

        for capped in &result.lines {
            prop_assert!(capped.total() <= caps.use_case_revenue_ratio * revenue + 1.0);
        }
        prop_assert!(result.portfolio_total <= caps.portfolio_revenue_ratio * revenue + 1.0);
        prop_assert!(result.scale_factor > 0.0 && result.scale_factor <= 1.0);
    }

    #[test]
    fn prop_normalized_values_in_range(values in prop::collection::vec(0.0f64..1e9, 1..20)) {
        let normalized = normalize_values(&values);
        prop_assert_eq!(normalized.len(), values.len());
        for v in normalized {
            prop_assert!((1.0..=10.0).contains(&v));
        }
    }

    #[test]
    fn prop_equal_values_are_neutral(value in 0.0f64..1e9, n in 1usize..10) {
        let normalized = normalize_values(&vec![value; n]);
        prop_assert!(normalized.iter().all(|v| *v == 5.5));
    }

    #[test]
    fn prop_readiness_in_range(components in prop::array::uniform4(-20.0f64..40.0)) {
        let c = ReadinessComponents {
            organizational_capacity: components[0],
            data_quality: components[1],
            technical_infrastructure: components[2],
            governance: components[3],
        };
        let score = readiness_score(&c, Bound::new(1.0, 10.0), &ScoringPolicy::default(), 2);
        prop_assert!((1.0..=10.0).contains(&score));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_pipeline_is_idempotent(
        revenue in 5_000_000.0f64..2_000_000_000.0,
        cases in prop::collection::vec((100.0f64..2_000_000.0, 20.0f64..600.0, 1.0f64..60.0), 1..5),
        implementation_cost in 10_000.0f64..50_000_000.0,
    ) {
        let revenue = revenue.round();
        let cases: Vec<(f64, f64, f64)> = cases
            .into_iter()
            .map(|(h, r, u)| (h.round(), r.round(), u.round()))
            .collect();
        let pipeline = Pipeline::default();

        let first = pipeline.run(&generated_document(revenue, &cases, implementation_cost)).document;
        let second = pipeline.run(&first).document;

        prop_assert_eq!(totals(&first), totals(&second));
        prop_assert_eq!(&first.step(BENEFIT_STEP).unwrap().data, &second.step(BENEFIT_STEP).unwrap().data);
        prop_assert_eq!(&first.step(READINESS_STEP).unwrap().data, &second.step(READINESS_STEP).unwrap().data);
        prop_assert_eq!(&first.scenario_analysis, &second.scenario_analysis);
        prop_assert_eq!(&first.executive_dashboard, &second.executive_dashboard);

        for total in audited_totals(&first) {
            prop_assert!(total <= 0.15 * revenue + 1.0);
        }
    }
}
