//! Canonical role table and role normalizer.
//!
//! Model output names roles however it likes ("Sr. AP Specialist",
//! "billing clerk", "Accounts payable team"). Friction costs are only
//! comparable when every role resolves to one entry of a fixed table with
//! a fully-loaded hourly rate.
//!
//! Match order:
//! 1. exact canonical name or alias (case-insensitive)
//! 2. substring containment in either direction
//! 3. token overlap (Jaccard, minimum 0.4)
//! 4. function-based fallback
//! 5. fixed default role

use serde::{Deserialize, Serialize};

use crate::config::PolicyConfig;
use crate::matching::{match_label, token_overlap, LabelMatch};
use crate::types::MatchConfidence;

/// Minimum token overlap for a fuzzy role match.
pub const MIN_ROLE_OVERLAP: f64 = 0.4;

/// Broad grouping of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
    Executive,
    Management,
    Professional,
    Technical,
    Operational,
    Support,
}

/// One entry of the canonical role table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedRole {
    /// Stable identifier (e.g., "ap_clerk")
    pub id: String,

    /// Canonical display name
    pub name: String,

    /// Alternative spellings that resolve to this role
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Fully-loaded hourly rate in dollars
    pub hourly_rate: f64,

    pub category: RoleCategory,

    /// Canonical business functions this role typically sits in
    #[serde(default)]
    pub functions: Vec<String>,
}

impl StandardizedRole {
    /// Whether this role applies to the given canonical function.
    pub fn applies_to(&self, function: &str) -> bool {
        self.functions
            .iter()
            .any(|f| f.eq_ignore_ascii_case(function.trim()))
    }
}

/// Result of resolving a free-text role label.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleMatch<'a> {
    pub role: &'a StandardizedRole,
    pub confidence: MatchConfidence,
    /// Token-overlap score for fuzzy matches, 1.0 otherwise
    pub score: f64,
}

/// Resolve a role label against the configured role table.
///
/// `function_hint` is the record's business function, if known. It breaks
/// ties between equally good fuzzy matches and drives the function-based
/// fallback.
pub fn normalize_role<'a>(
    label: &str,
    function_hint: Option<&str>,
    config: &'a PolicyConfig,
) -> RoleMatch<'a> {
    let roles = &config.roles;
    let candidates = roles.iter().map(|r| (r.name.as_str(), r.aliases.as_slice()));

    match match_label(label, candidates, MIN_ROLE_OVERLAP) {
        Some(LabelMatch::Exact(i)) => {
            return RoleMatch {
                role: &roles[i],
                confidence: MatchConfidence::Exact,
                score: 1.0,
            }
        }
        Some(LabelMatch::Alias(i)) => {
            return RoleMatch {
                role: &roles[i],
                confidence: MatchConfidence::Alias,
                score: 1.0,
            }
        }
        Some(LabelMatch::Fuzzy(i, score)) => {
            let role = prefer_function_tie(label, function_hint, roles, i, score);
            return RoleMatch {
                role,
                confidence: MatchConfidence::Fuzzy,
                score,
            };
        }
        None => {}
    }

    if let Some(function) = function_hint {
        if let Some(role) = function_fallback(function, config) {
            return RoleMatch {
                role,
                confidence: MatchConfidence::FunctionFallback,
                score: 0.0,
            };
        }
    }

    RoleMatch {
        role: config.default_role(),
        confidence: MatchConfidence::Default,
        score: 0.0,
    }
}

/// Among roles scoring the same overlap as the winner, prefer one that
/// applies to the hinted function.
fn prefer_function_tie<'a>(
    label: &str,
    function_hint: Option<&str>,
    roles: &'a [StandardizedRole],
    winner: usize,
    score: f64,
) -> &'a StandardizedRole {
    let Some(function) = function_hint else {
        return &roles[winner];
    };
    if roles[winner].applies_to(function) || score >= 1.0 {
        return &roles[winner];
    }

    roles
        .iter()
        .filter(|r| r.applies_to(function))
        .find(|r| {
            let best = std::iter::once(r.name.as_str())
                .chain(r.aliases.iter().map(String::as_str))
                .map(|c| token_overlap(label, c))
                .fold(0.0_f64, f64::max);
            (best - score).abs() < f64::EPSILON
        })
        .unwrap_or(&roles[winner])
}

/// Role used when only the business function is known.
fn function_fallback<'a>(function: &str, config: &'a PolicyConfig) -> Option<&'a StandardizedRole> {
    let canonical = crate::taxonomy::normalize_function(function)
        .map(|m| m.name)
        .unwrap_or_else(|| function.trim().to_string());

    config
        .function_defaults
        .iter()
        .find(|(f, _)| f.eq_ignore_ascii_case(&canonical))
        .and_then(|(_, role_id)| config.role_by_id(role_id))
        .or_else(|| config.roles.iter().find(|r| r.applies_to(&canonical)))
}

/// The built-in role table.
pub fn default_roles() -> Vec<StandardizedRole> {
    use RoleCategory::*;

    let table: &[(&str, &str, &[&str], f64, RoleCategory, &[&str])] = &[
        ("executive", "Executive", &["ceo", "cfo", "coo", "cto", "cio", "vp", "vice president", "chief officer", "c-suite"], 250.0, Executive, &["Executive"]),
        ("director", "Director", &["senior director", "head of department", "department head", "senior manager"], 150.0, Management, &["Executive", "Operations", "Finance", "Sales", "Marketing"]),
        ("manager", "Manager", &["team lead", "supervisor", "team manager", "line manager"], 110.0, Management, &["Operations", "Customer Service", "Sales"]),
        ("software_engineer", "Software Engineer", &["developer", "software developer", "programmer", "engineer", "devops engineer"], 125.0, Technical, &["Product & Engineering", "Information Technology"]),
        ("data_scientist", "Data Scientist", &["ml engineer", "machine learning engineer", "ai engineer"], 135.0, Technical, &["Product & Engineering", "Information Technology"]),
        ("data_analyst", "Data Analyst", &["analytics specialist", "reporting analyst", "bi analyst"], 85.0, Professional, &["Information Technology", "Marketing", "Operations"]),
        ("business_analyst", "Business Analyst", &["process analyst", "operations analyst"], 90.0, Professional, &["Operations", "Information Technology"]),
        ("financial_analyst", "Financial Analyst", &["fp&a analyst", "finance analyst", "budget analyst"], 95.0, Professional, &["Finance"]),
        ("accountant", "Accountant", &["staff accountant", "senior accountant", "accounting specialist", "bookkeeper", "controller"], 80.0, Professional, &["Finance"]),
        ("ap_ar_clerk", "AP/AR Clerk", &["accounts payable clerk", "accounts receivable clerk", "ap specialist", "ar specialist", "billing clerk", "billing specialist", "collections specialist"], 50.0, Operational, &["Finance"]),
        ("sales_rep", "Sales Representative", &["account executive", "sales executive", "sdr", "bdr", "sales associate", "inside sales"], 85.0, Professional, &["Sales"]),
        ("sales_ops", "Sales Operations Specialist", &["revenue operations", "sales ops", "revops specialist"], 80.0, Operational, &["Sales"]),
        ("marketing_specialist", "Marketing Specialist", &["marketing coordinator", "content marketer", "digital marketer", "marketing manager"], 80.0, Professional, &["Marketing"]),
        ("customer_service_rep", "Customer Service Representative", &["support agent", "customer support agent", "call center agent", "customer service agent", "csr", "contact center agent"], 45.0, Support, &["Customer Service"]),
        ("customer_success_manager", "Customer Success Manager", &["csm", "account manager", "client success manager"], 90.0, Professional, &["Customer Service", "Sales"]),
        ("hr_specialist", "HR Specialist", &["recruiter", "hr generalist", "talent acquisition specialist", "hr coordinator", "people operations specialist"], 70.0, Professional, &["Human Resources"]),
        ("it_support", "IT Support Specialist", &["help desk technician", "service desk analyst", "desktop support", "it technician"], 75.0, Technical, &["Information Technology"]),
        ("systems_administrator", "Systems Administrator", &["sysadmin", "network administrator", "it administrator", "infrastructure engineer"], 95.0, Technical, &["Information Technology"]),
        ("legal_counsel", "Legal Counsel", &["attorney", "lawyer", "general counsel", "corporate counsel"], 200.0, Professional, &["Legal & Compliance"]),
        ("paralegal", "Paralegal", &["legal assistant", "contracts administrator", "contract specialist"], 75.0, Support, &["Legal & Compliance"]),
        ("compliance_analyst", "Compliance Analyst", &["compliance officer", "risk analyst", "audit specialist", "internal auditor"], 95.0, Professional, &["Legal & Compliance", "Finance"]),
        ("procurement_specialist", "Procurement Specialist", &["buyer", "purchasing agent", "sourcing specialist", "category manager", "procurement analyst"], 75.0, Professional, &["Procurement"]),
        ("supply_chain_analyst", "Supply Chain Analyst", &["logistics coordinator", "demand planner", "inventory analyst", "supply planner"], 85.0, Professional, &["Supply Chain"]),
        ("operations_specialist", "Operations Specialist", &["operations associate", "operations coordinator", "ops specialist", "production coordinator"], 70.0, Operational, &["Operations"]),
        ("administrative_assistant", "Administrative Assistant", &["admin assistant", "office administrator", "data entry clerk", "executive assistant", "receptionist"], 45.0, Support, &["Operations", "Executive"]),
        ("product_manager", "Product Manager", &["product owner", "product lead"], 130.0, Management, &["Product & Engineering"]),
        ("project_manager", "Project Manager", &["program manager", "pmo analyst", "project coordinator"], 105.0, Management, &["Operations", "Information Technology", "Product & Engineering"]),
    ];

    let mut roles: Vec<StandardizedRole> = table
        .iter()
        .map(|(id, name, aliases, rate, category, functions)| StandardizedRole {
            id: id.to_string(),
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            hourly_rate: *rate,
            category: *category,
            functions: functions.iter().map(|f| f.to_string()).collect(),
        })
        .collect();
    roles.push(generic_role());
    roles
}

/// Catch-all role for titles nothing else resolves to.
pub fn generic_role() -> StandardizedRole {
    StandardizedRole {
        id: "knowledge_worker".to_string(),
        name: "Knowledge Worker".to_string(),
        aliases: ["staff", "employee", "team member", "professional staff"]
            .iter()
            .map(|a| a.to_string())
            .collect(),
        hourly_rate: 75.0,
        category: RoleCategory::Professional,
        functions: Vec::new(),
    }
}

/// Built-in function → role fallbacks.
pub fn default_function_roles() -> Vec<(String, String)> {
    [
        ("Finance", "financial_analyst"),
        ("Sales", "sales_rep"),
        ("Marketing", "marketing_specialist"),
        ("Customer Service", "customer_service_rep"),
        ("Operations", "operations_specialist"),
        ("Human Resources", "hr_specialist"),
        ("Information Technology", "it_support"),
        ("Legal & Compliance", "paralegal"),
        ("Supply Chain", "supply_chain_analyst"),
        ("Procurement", "procurement_specialist"),
        ("Product & Engineering", "software_engineer"),
        ("Executive", "director"),
    ]
    .iter()
    .map(|(f, r)| (f.to_string(), r.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PolicyConfig {
        PolicyConfig::default()
    }

    #[test]
    fn test_exact_match() {
        let config = config();
        let m = normalize_role("data analyst", None, &config);
        assert_eq!(m.role.id, "data_analyst");
        assert_eq!(m.confidence, MatchConfidence::Exact);
    }

    #[test]
    fn test_alias_match() {
        let config = config();
        let m = normalize_role("Accounts Payable Clerk", None, &config);
        assert_eq!(m.role.id, "ap_ar_clerk");
        assert_eq!(m.confidence, MatchConfidence::Alias);
        assert_eq!(m.role.hourly_rate, 50.0);
    }

    #[test]
    fn test_containment_match() {
        let config = config();
        let m = normalize_role("Senior Financial Analyst (FP&A)", None, &config);
        assert_eq!(m.role.id, "financial_analyst");
        assert_eq!(m.confidence, MatchConfidence::Fuzzy);
    }

    #[test]
    fn test_token_overlap_match() {
        let config = config();
        let m = normalize_role("Analyst, Supply Chain Planning", None, &config);
        assert_eq!(m.role.id, "supply_chain_analyst");
        assert_eq!(m.confidence, MatchConfidence::Fuzzy);
    }

    #[test]
    fn test_function_fallback() {
        let config = config();
        let m = normalize_role("Claims Adjudicator", Some("Finance"), &config);
        assert_eq!(m.role.id, "financial_analyst");
        assert_eq!(m.confidence, MatchConfidence::FunctionFallback);
    }

    #[test]
    fn test_function_fallback_uses_taxonomy_alias() {
        let config = config();
        let m = normalize_role("Claims Adjudicator", Some("customer support"), &config);
        assert_eq!(m.role.id, "customer_service_rep");
        assert_eq!(m.confidence, MatchConfidence::FunctionFallback);
    }

    #[test]
    fn test_default_role() {
        let config = config();
        let m = normalize_role("Zamboni Driver", None, &config);
        assert_eq!(m.role.id, "knowledge_worker");
        assert_eq!(m.confidence, MatchConfidence::Default);
    }

    #[test]
    fn test_table_size_and_unique_ids() {
        let roles = default_roles();
        assert!(roles.len() >= 25);
        let mut ids: Vec<_> = roles.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), roles.len());
    }

    #[test]
    fn test_all_rates_inside_policy_bounds() {
        let config = config();
        for role in &config.roles {
            assert!(config.bounds.hourly_rate.contains(role.hourly_rate), "{}", role.id);
        }
    }
}
