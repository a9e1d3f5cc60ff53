//! End-to-end runs over a realistic assessment.

use assay_core::document::{BENEFIT_STEP, FRICTION_STEP, PRIORITY_STEP, READINESS_STEP, USE_CASE_STEP};
use assay_core::{parse_amount, AnalysisDocument, Pipeline, PipelineStatus, PolicyConfig, WarningKind};
use serde_json::{Map, Value};

const REVENUE: f64 = 50_000_000.0;

fn fixture() -> AnalysisDocument {
    AnalysisDocument::from_json(include_str!("fixtures/assessment.json")).unwrap()
}

fn money(record: &Map<String, Value>, key: &str) -> f64 {
    record
        .get(key)
        .and_then(Value::as_str)
        .and_then(parse_amount)
        .unwrap_or_else(|| panic!("{} is not a currency string: {:?}", key, record.get(key)))
}

fn find<'a>(records: &[&'a Map<String, Value>], id: &str) -> &'a Map<String, Value> {
    records
        .iter()
        .find(|r| r.get("ID").and_then(Value::as_str) == Some(id))
        .copied()
        .unwrap_or_else(|| panic!("no record {}", id))
}

#[test]
fn test_fixture_is_corrected() {
    let outcome = Pipeline::default().run(&fixture());
    assert_eq!(outcome.status, PipelineStatus::Corrected);

    let doc = &outcome.document;
    assert_eq!(doc.validation_warnings.as_ref().map(Vec::len), Some(outcome.warnings.len()));
    assert!(doc.scenario_analysis.is_some());
    assert!(doc.executive_dashboard.is_some());

    // UC-004 has no benefit record of its own
    let benefits = doc.step(BENEFIT_STEP).unwrap().records();
    assert_eq!(benefits.len(), 4);
    assert_eq!(money(find(&benefits, "UC-004"), "Total Annual Value"), 0.0);
}

#[test]
fn test_caps_hold() {
    let outcome = Pipeline::default().run(&fixture());
    let benefits = outcome.document.step(BENEFIT_STEP).unwrap().records();

    let mut portfolio = 0.0;
    for record in &benefits {
        let total = money(record, "Total Annual Value");
        assert!(total <= 0.15 * REVENUE + 1.0, "{:?} over use case cap", record.get("ID"));
        portfolio += total;
    }
    assert!(portfolio <= 0.50 * REVENUE + 1.0);

    let pricing = find(&benefits, "UC-002");
    assert_eq!(pricing.get("Cap Applied"), Some(&Value::Bool(true)));
    assert!(pricing["Revenue Formula"].as_str().unwrap().contains("after revenue cap"));
    assert!(outcome.warnings.iter().any(|w| w.kind == WarningKind::CapExceeded));
}

#[test]
fn test_hallucinated_hours_replaced() {
    let outcome = Pipeline::default().run(&fixture());
    let benefits = outcome.document.step(BENEFIT_STEP).unwrap().records();
    let assistant = find(&benefits, "UC-003");

    let hours = assistant["Cost Inputs"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["label"] == "Hours Saved")
        .and_then(|l| l["value"].as_f64());
    assert_eq!(hours, Some(9_000.0));
    assert!(money(assistant, "Cost Benefit") < 1_000_000.0);
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::CrossReferenceMismatch && w.pointer.starts_with("step5[UC-003]")));
}

#[test]
fn test_unparseable_and_negated_formulas() {
    let outcome = Pipeline::default().run(&fixture());
    let benefits = outcome.document.step(BENEFIT_STEP).unwrap().records();
    let pricing = find(&benefits, "UC-002");

    // "No direct cost savings" is a zero, not a failure
    assert_eq!(money(pricing, "Cost Benefit"), 0.0);
    assert_eq!(pricing["Cost Formula"], "No direct cost savings");

    // a stated $300K risk with no numbers behind it
    assert_eq!(money(pricing, "Risk Benefit"), 0.0);
    assert!(pricing["Risk Formula"].as_str().unwrap().ends_with("(could not validate)"));
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::ParseFailure && w.pointer == "step5[UC-002].Risk Formula"));
}

#[test]
fn test_friction_and_taxonomy_normalized() {
    let outcome = Pipeline::default().run(&fixture());
    let doc = &outcome.document;

    let friction = doc.step(FRICTION_STEP).unwrap().records();
    assert_eq!(friction.len(), 2);
    for record in &friction {
        assert!(record.contains_key("Role ID"));
        assert!(record.contains_key("Severity"));
    }

    let use_cases = doc.step(USE_CASE_STEP).unwrap().records();
    let pricing = find(&use_cases, "UC-002");
    let primitives: Vec<&str> = pricing["AI Primitives"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(primitives.contains(&"Quantum Teleportation"));
    assert!(outcome.warnings.iter().any(|w| w.kind == WarningKind::TaxonomyUnknown));
    assert!(outcome.warnings.iter().any(|w| w.kind == WarningKind::SchemaViolation));
}

#[test]
fn test_readiness_rebuilt() {
    let outcome = Pipeline::default().run(&fixture());
    let readiness = outcome.document.step(READINESS_STEP).unwrap().records();
    assert_eq!(readiness.len(), 4);

    // promoted from the 1-5 scale
    let pricing = find(&readiness, "UC-002");
    assert_eq!(pricing["Score Scale"], "1-10");
    let score = pricing["Readiness Score"].as_f64().unwrap();
    assert!((1.0..=10.0).contains(&score));

    let agent = find(&readiness, "UC-001");
    assert_eq!(agent["Monthly Tokens"].as_f64(), Some(14_400_000.0));

    let synthesized = find(&readiness, "UC-003");
    assert_eq!(synthesized["Readiness Score"].as_f64(), Some(5.0));
}

#[test]
fn test_priorities_keep_extra_columns() {
    let outcome = Pipeline::default().run(&fixture());
    let priorities = outcome.document.step(PRIORITY_STEP).unwrap().records();
    assert_eq!(priorities.len(), 4);

    let scores: Vec<f64> = priorities
        .iter()
        .map(|p| p["Priority Score"].as_f64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));

    assert_eq!(find(&priorities, "UC-002")["Owner"], "VP Sales");
    assert_eq!(find(&priorities, "UC-001")["Owner"], "Controller");
    // the model's 9.9 is not kept
    assert!(find(&priorities, "UC-002")["Priority Score"].as_f64().unwrap() <= 10.0);
}

#[test]
fn test_rerun_changes_no_amounts() {
    let pipeline = Pipeline::default();
    let first = pipeline.run(&fixture()).document;
    let second = pipeline.run(&first).document;

    for step in [FRICTION_STEP, BENEFIT_STEP, READINESS_STEP, PRIORITY_STEP] {
        assert_eq!(
            first.step(step).unwrap().data,
            second.step(step).unwrap().data,
            "step {} changed on rerun",
            step
        );
    }
    assert_eq!(first.scenario_analysis, second.scenario_analysis);
    assert_eq!(first.executive_dashboard, second.executive_dashboard);
    assert_eq!(first.cap_scale_factor, second.cap_scale_factor);
}

#[test]
fn test_rerun_with_unrounded_costs() {
    let mut raw: Value = serde_json::from_str(include_str!("fixtures/assessment.json")).unwrap();
    let readiness = raw["steps"]
        .as_array_mut()
        .unwrap()
        .iter_mut()
        .find(|s| s["step"] == 6)
        .unwrap();
    readiness["data"][0]["Implementation Cost"] = Value::from(1_234_567);
    readiness["data"][1]["Annual Token Cost"] = Value::from(1_620);
    let doc = AnalysisDocument::from_value(raw).unwrap();

    let pipeline = Pipeline::default();
    let first = pipeline.run(&doc).document;
    let second = pipeline.run(&first).document;

    assert_eq!(first.step(READINESS_STEP).unwrap().data, second.step(READINESS_STEP).unwrap().data);
    assert_eq!(first.scenario_analysis, second.scenario_analysis);
    assert_eq!(first.executive_dashboard, second.executive_dashboard);

    let written = first.step(READINESS_STEP).unwrap().records();
    assert_eq!(money(find(&written, "UC-001"), "Implementation Cost"), 1_200_000.0);
    assert_eq!(money(find(&written, "UC-002"), "Annual Token Cost"), 2_000.0);
}

#[test]
fn test_empty_role_table_uses_generic_role() {
    let config = PolicyConfig {
        roles: Vec::new(),
        ..PolicyConfig::default()
    };
    let outcome = Pipeline::new(config).run(&fixture());
    let friction = outcome.document.step(FRICTION_STEP).unwrap().records();
    assert_eq!(friction.len(), 2);
    for record in &friction {
        assert_eq!(record["Role ID"], "knowledge_worker");
        assert_eq!(money(record, "Hourly Rate"), 75.0);
    }
}

#[test]
fn test_policy_override() {
    let config = PolicyConfig::from_yaml(
        r#"
caps:
  use_case_revenue_ratio: 0.05
"#,
    )
    .unwrap();
    let outcome = Pipeline::new(config).run(&fixture());
    let benefits = outcome.document.step(BENEFIT_STEP).unwrap().records();
    for record in &benefits {
        assert!(money(record, "Total Annual Value") <= 0.05 * REVENUE + 1.0);
    }
}
