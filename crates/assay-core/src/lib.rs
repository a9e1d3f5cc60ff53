//! # assay-core
//!
//! Deterministic validation and correction of model-generated business
//! value assessments.
//!
//! A language model drafts an eight-step assessment: company context,
//! friction points, use cases, benefit formulas, readiness and a priority
//! matrix. The figures it writes are often wrong by orders of magnitude.
//! This crate re-derives every financial number from the formula inputs,
//! holds them to policy bounds and revenue caps, and records how each one
//! was reached.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same document and policy always produce the same output
//! 2. **Never fails on content**: Malformed values become $0 plus a warning
//! 3. **Traceable**: Every benefit carries its formula, inputs and audit trail
//! 4. **Idempotent**: Re-running on a corrected document changes no amounts
//!
//! ## Example
//!
//! ```rust,ignore
//! use assay_core::{AnalysisDocument, Pipeline, PolicyConfig, PipelineStatus};
//!
//! let doc = AnalysisDocument::from_json_file("assessment.json")?;
//! let outcome = Pipeline::new(PolicyConfig::from_yaml_file("policy.yaml")?).run(&doc);
//!
//! if outcome.status == PipelineStatus::Corrected {
//!     for warning in &outcome.warnings {
//!         println!("{}", warning);
//!     }
//!     std::fs::write("corrected.json", outcome.document.to_json_pretty()?)?;
//! }
//! ```

pub mod aggregate;
pub mod calc;
pub mod config;
pub mod crossref;
pub mod currency;
pub mod dashboard;
pub mod document;
pub mod extract;
pub mod friction;
pub mod matching;
pub mod pipeline;
pub mod projection;
pub mod roles;
pub mod scoring;
pub mod taxonomy;
pub mod types;
pub mod warnings;

// Re-export main types at crate root
pub use calc::{calculate, safe_calculate, BenefitCalculation, BenefitInputs, InputField};
pub use config::{ConfigError, PolicyConfig};
pub use currency::{format_currency, parse_amount};
pub use document::{AnalysisDocument, CompanyContext, DocumentError, FormulaLabel};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineStatus};
pub use projection::{scenario_analysis, ScenarioAnalysis, ScenarioOutcome};
pub use roles::{normalize_role, RoleMatch, StandardizedRole};
pub use types::{BenefitKind, MatchConfidence, Phase, Scenario, Severity, Tier};
pub use warnings::{Warning, WarningKind};

/// Validate and correct a document under the default policy.
///
/// This is the main entry point for one-off use. Build a [`Pipeline`] to
/// reuse a custom policy across documents.
pub fn validate(document: &AnalysisDocument) -> PipelineOutcome {
    Pipeline::default().run(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_corrects_benefits() {
        let doc = AnalysisDocument::from_json(
            r#"{
  "steps": [
    { "step": 0, "title": "Company", "data": [{ "Annual Revenue": "$500M" }] },
    { "step": 5, "title": "Benefits", "data": [
      { "ID": "UC-001", "Use Case": "Claims intake",
        "Cost Formula": "34,000 hours × $150/hr × 1.35 × 0.90 × 0.75 = $40M" }
    ]}
  ]
}"#,
        )
        .unwrap();

        let outcome = validate(&doc);
        assert_eq!(outcome.status, PipelineStatus::Corrected);
        let benefits = outcome.document.step(document::BENEFIT_STEP).unwrap().records();
        assert_eq!(benefits[0]["Cost Benefit"], "$4.6M");
    }

    #[test]
    fn test_validate_without_benefits() {
        let doc = AnalysisDocument::from_json(r#"{ "steps": [] }"#).unwrap();
        let outcome = validate(&doc);
        assert_eq!(outcome.status, PipelineStatus::Unchanged);
        assert_eq!(outcome.document, doc);
    }
}
