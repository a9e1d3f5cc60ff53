//! Fixed business-function and AI-primitive taxonomies.
//!
//! Use cases name their function and AI primitives in free text. Both are
//! resolved against a closed vocabulary so downstream grouping works.

use lazy_static::lazy_static;

use crate::document::{UseCaseRecord, USE_CASE_STEP};
use crate::matching::{match_label, LabelMatch};
use crate::types::MatchConfidence;
use crate::warnings::{Warning, WarningKind};

/// Minimum token overlap for a fuzzy taxonomy match.
const MIN_TAXONOMY_OVERLAP: f64 = 0.4;

struct Entry {
    name: &'static str,
    aliases: Vec<String>,
}

fn entry(name: &'static str, aliases: &[&str]) -> Entry {
    Entry {
        name,
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

lazy_static! {
    static ref FUNCTIONS: Vec<Entry> = vec![
        entry("Finance", &["accounting", "finance & accounting", "fp&a", "treasury", "financial planning", "accounts payable", "accounts receivable"]),
        entry("Sales", &["business development", "sales operations", "revenue", "commercial"]),
        entry("Marketing", &["growth", "brand", "communications", "demand generation"]),
        entry("Customer Service", &["customer support", "support", "customer success", "customer experience", "cx", "contact center"]),
        entry("Operations", &["ops", "manufacturing", "production", "facilities", "business operations"]),
        entry("Human Resources", &["hr", "people", "people operations", "talent", "recruiting"]),
        entry("Information Technology", &["it", "technology", "infrastructure", "it operations"]),
        entry("Legal & Compliance", &["legal", "compliance", "risk", "regulatory", "risk & compliance"]),
        entry("Supply Chain", &["logistics", "inventory", "distribution", "warehouse", "fulfillment"]),
        entry("Procurement", &["purchasing", "sourcing", "vendor management"]),
        entry("Product & Engineering", &["engineering", "r&d", "product", "research & development", "software development"]),
        entry("Executive", &["leadership", "strategy", "c-suite", "general management"]),
    ];

    static ref PRIMITIVES: Vec<Entry> = vec![
        entry("Content Creation", &["content generation", "writing", "drafting", "summarization", "document generation"]),
        entry("Research & Information Retrieval", &["research", "information retrieval", "search", "knowledge retrieval", "document q&a", "rag"]),
        entry("Coding", &["code generation", "coding assistance", "software development", "code review"]),
        entry("Data Analysis", &["analytics", "forecasting", "classification", "data extraction", "anomaly detection", "prediction"]),
        entry("Ideation & Strategy", &["brainstorming", "strategy", "planning", "ideation"]),
        entry("Automation", &["workflow automation", "process automation", "agents", "agentic workflows", "orchestration"]),
    ];
}

/// A resolved taxonomy label.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyMatch {
    pub name: String,
    pub confidence: MatchConfidence,
}

fn resolve(label: &str, table: &[Entry]) -> Option<TaxonomyMatch> {
    let candidates = table.iter().map(|e| (e.name, e.aliases.as_slice()));
    let found = match_label(label, candidates, MIN_TAXONOMY_OVERLAP)?;
    let confidence = match found {
        LabelMatch::Exact(_) => MatchConfidence::Exact,
        LabelMatch::Alias(_) => MatchConfidence::Alias,
        LabelMatch::Fuzzy(..) => MatchConfidence::Fuzzy,
    };
    Some(TaxonomyMatch {
        name: table[found.index()].name.to_string(),
        confidence,
    })
}

/// Resolve a business-function label.
pub fn normalize_function(label: &str) -> Option<TaxonomyMatch> {
    resolve(label, &FUNCTIONS)
}

/// Resolve a single AI-primitive label.
pub fn normalize_primitive(label: &str) -> Option<TaxonomyMatch> {
    resolve(label, &PRIMITIVES)
}

/// Canonical function names, in table order.
pub fn function_names() -> Vec<&'static str> {
    FUNCTIONS.iter().map(|e| e.name).collect()
}

/// Canonical AI-primitive names, in table order.
pub fn primitive_names() -> Vec<&'static str> {
    PRIMITIVES.iter().map(|e| e.name).collect()
}

/// Split a primitives field ("Data Analysis, Automation") into labels.
pub fn split_primitives(field: &str) -> Vec<String> {
    field
        .split([',', ';', '|', '+'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize the function, sub-function and AI primitives of a use case.
///
/// Labels that match nothing are kept verbatim and reported.
pub fn normalize_use_case(record: &UseCaseRecord, warnings: &mut Vec<Warning>) -> UseCaseRecord {
    let mut out = record.clone();
    let id = record
        .id
        .as_deref()
        .or(record.name.as_deref())
        .unwrap_or("unnamed use case");

    if let Some(function) = record.function.as_deref() {
        match normalize_function(function) {
            Some(m) => out.function = Some(m.name),
            None => warnings.push(Warning::at_record(
                WarningKind::TaxonomyUnknown,
                USE_CASE_STEP,
                id,
                "Function",
                format!("Unknown business function \"{}\" kept as written", function),
            )),
        }
    }

    let mut primitives: Vec<String> = Vec::new();
    for label in record.ai_primitives.iter().flat_map(|p| split_primitives(p)) {
        let name = match normalize_primitive(&label) {
            Some(m) => m.name,
            None => {
                warnings.push(Warning::at_record(
                    WarningKind::TaxonomyUnknown,
                    USE_CASE_STEP,
                    id,
                    "AI Primitives",
                    format!("Unknown AI primitive \"{}\" kept as written", label),
                ));
                label
            }
        };
        if !primitives.contains(&name) {
            primitives.push(name);
        }
    }
    out.ai_primitives = primitives;

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_alias() {
        let m = normalize_function("Customer Support").unwrap();
        assert_eq!(m.name, "Customer Service");
        assert_eq!(m.confidence, MatchConfidence::Alias);
    }

    #[test]
    fn test_function_exact_case_insensitive() {
        let m = normalize_function("finance").unwrap();
        assert_eq!(m.name, "Finance");
        assert_eq!(m.confidence, MatchConfidence::Exact);
    }

    #[test]
    fn test_function_unknown() {
        assert!(normalize_function("Underwater Basket Weaving").is_none());
    }

    #[test]
    fn test_primitive_fuzzy() {
        let m = normalize_primitive("Automated invoice workflow automation").unwrap();
        assert_eq!(m.name, "Automation");
        assert_eq!(m.confidence, MatchConfidence::Fuzzy);
    }

    #[test]
    fn test_split_primitives() {
        assert_eq!(
            split_primitives("Data Analysis, Automation; Research"),
            vec!["Data Analysis", "Automation", "Research"]
        );
        assert!(split_primitives("  ").is_empty());
    }

    #[test]
    fn test_table_names() {
        assert_eq!(function_names().len(), 12);
        assert!(primitive_names().contains(&"Coding"));
    }

    #[test]
    fn test_normalize_use_case() {
        let record = UseCaseRecord {
            id: Some("UC-001".to_string()),
            function: Some("accounts payable".to_string()),
            ai_primitives: vec!["data extraction, workflow automation".to_string(), "Telepathy".to_string()],
            ..UseCaseRecord::default()
        };
        let mut warnings = Vec::new();
        let out = normalize_use_case(&record, &mut warnings);
        assert_eq!(out.function.as_deref(), Some("Finance"));
        assert_eq!(out.ai_primitives, vec!["Data Analysis", "Automation", "Telepathy"]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::TaxonomyUnknown);
        assert_eq!(warnings[0].pointer, "step4[UC-001].AI Primitives");
    }

    #[test]
    fn test_unknown_function_kept() {
        let record = UseCaseRecord {
            function: Some("Underwater Basket Weaving".to_string()),
            ..UseCaseRecord::default()
        };
        let mut warnings = Vec::new();
        let out = normalize_use_case(&record, &mut warnings);
        assert_eq!(out.function, record.function);
        assert_eq!(warnings.len(), 1);
    }
}
