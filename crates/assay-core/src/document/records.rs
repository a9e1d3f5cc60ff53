//! Typed records for the steps the pipeline corrects.
//!
//! Each record keeps every key it does not understand in `extra`, so the
//! corrected document carries them through untouched. Field names are the
//! current schema's; legacy spellings are rewritten to these by
//! [`super::migrate`] before deserialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient::{self, FormulaLabel};
use crate::types::BenefitKind;

/// A canonical record key and the spellings that migrate to it.
#[derive(Debug, Clone, Copy)]
pub struct KeySpec {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

const fn key(canonical: &'static str, aliases: &'static [&'static str]) -> KeySpec {
    KeySpec { canonical, aliases }
}

pub const ID_KEY: KeySpec = key("ID", &["Use Case ID", "UseCase ID", "Id", "UC ID"]);
pub const NAME_KEY: KeySpec = key("Use Case", &["Use Case Name", "Name", "Title"]);
pub const TTV_KEY: KeySpec = key(
    "Time-to-Value (months)",
    &["Time-to-Value", "Time to Value", "Time to Value (months)", "TTV", "TTV (months)", "Time-to-Value (Months)"],
);

pub const FRICTION_KEYS: &[KeySpec] = &[
    key("Function", &["Business Function", "Department"]),
    key("Sub-Function", &["Sub Function", "Subfunction", "Sub-function"]),
    key("Friction Point", &["Friction", "Pain Point", "Friction Point Name"]),
    key("Annual Hours", &["Hours", "Annual Hours Lost", "Hours per Year", "Annual Hours Wasted"]),
    key("Hourly Rate", &["Loaded Hourly Rate", "Rate", "Fully Loaded Rate"]),
    key("Role", &["Primary Role", "Role Affected", "Roles"]),
    key("Role ID", &["RoleId"]),
    key("Role Match", &[]),
    key("Estimated Annual Cost", &["Annual Cost", "Estimated Cost", "Annual Friction Cost"]),
    key("Severity", &["Impact Severity"]),
    key("Customer Impact", &["Customer Facing", "Customer-Facing"]),
    key("Compliance Impact", &["Compliance Risk", "Regulatory Impact"]),
];

pub const USE_CASE_KEYS: &[KeySpec] = &[
    ID_KEY,
    NAME_KEY,
    key("Target Friction", &["Friction Point", "Target Friction Point", "Addresses Friction", "Friction Addressed"]),
    key("AI Primitives", &["AI Primitive", "Primitives"]),
    key("Function", &["Business Function", "Department"]),
    key("Sub-Function", &["Sub Function", "Subfunction", "Sub-function"]),
];

pub const BENEFIT_KEYS: &[KeySpec] = &[
    ID_KEY,
    NAME_KEY,
    key("Cost Benefit", &["Cost Reduction", "Cost Savings", "Cost Benefit ($)"]),
    key("Cost Formula", &["Cost Reduction Formula", "Cost Calculation"]),
    key("Cost Inputs", &["Cost Formula Labels", "Cost Labels"]),
    key("Revenue Benefit", &["Revenue Growth", "Revenue Impact", "Revenue Benefit ($)"]),
    key("Revenue Formula", &["Revenue Growth Formula", "Revenue Calculation"]),
    key("Revenue Inputs", &["Revenue Formula Labels", "Revenue Labels"]),
    key("Cash Flow Benefit", &["Cash Flow Improvement", "Working Capital Benefit", "Cash Flow Benefit ($)"]),
    key("Cash Flow Formula", &["Cash Flow Improvement Formula", "Cash Flow Calculation"]),
    key("Cash Flow Inputs", &["Cash Flow Formula Labels", "Cash Flow Labels"]),
    key("Risk Benefit", &["Risk Reduction", "Risk Mitigation", "Risk Benefit ($)"]),
    key("Risk Formula", &["Risk Reduction Formula", "Risk Calculation"]),
    key("Risk Inputs", &["Risk Formula Labels", "Risk Labels"]),
    key("Probability of Success", &["Success Probability", "Probability", "Likelihood of Success"]),
    key("Total Annual Value", &["Total Value", "Total Annual Benefit", "Total Annual Value ($)"]),
    key("Cap Applied", &[]),
    key("Audit Trail", &[]),
];

pub const READINESS_KEYS: &[KeySpec] = &[
    ID_KEY,
    NAME_KEY,
    key("Organizational Capacity", &["Org Capacity", "Organizational Capacity Score"]),
    key("Data Availability & Quality", &["Data Quality", "Data Availability", "Data Availability and Quality"]),
    key("Technical Infrastructure", &["Tech Infrastructure", "Technical Infrastructure Score"]),
    key("Governance", &["Governance & Compliance", "Governance Score"]),
    key("Organizational Readiness", &[]),
    key("Data Readiness", &[]),
    key("Technical Readiness", &[]),
    key("Governance Readiness", &[]),
    key("Score Scale", &["Scale"]),
    key("Readiness Score", &["Readiness", "Overall Readiness"]),
    TTV_KEY,
    key("Input Tokens per Run", &["Input Tokens", "Tokens In"]),
    key("Output Tokens per Run", &["Output Tokens", "Tokens Out"]),
    key("Runs per Month", &["Monthly Runs", "Runs/Month"]),
    key("Monthly Tokens", &["Tokens per Month", "Total Monthly Tokens"]),
    key("Annual Token Cost", &["Token Cost", "Annual LLM Cost"]),
    key("Implementation Cost", &["Estimated Implementation Cost", "Build Cost"]),
];

pub const PRIORITY_KEYS: &[KeySpec] = &[
    ID_KEY,
    NAME_KEY,
    key("Priority Score", &["Priority"]),
    key("Readiness Score", &["Readiness"]),
    key("Normalized Value Score", &["Value Score", "Normalized Value"]),
    key("TTV Score", &["Time-to-Value Score"]),
    key("Total Annual Value", &["Total Value", "Annual Value"]),
    TTV_KEY,
    key("Priority Tier", &["Tier"]),
    key("Recommended Phase", &["Phase", "Implementation Phase"]),
];

/// A documented operational inefficiency (step 3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrictionRecord {
    #[serde(rename = "Function", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    #[serde(rename = "Sub-Function", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub sub_function: Option<String>,

    #[serde(rename = "Friction Point", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub friction_point: Option<String>,

    #[serde(rename = "Annual Hours", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub annual_hours: Option<f64>,

    #[serde(rename = "Hourly Rate", default, deserialize_with = "lenient::opt_number", serialize_with = "lenient::ser_money", skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,

    #[serde(rename = "Role", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(rename = "Role ID", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,

    /// How the role label was resolved
    #[serde(rename = "Role Match", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub role_match: Option<String>,

    #[serde(rename = "Estimated Annual Cost", default, deserialize_with = "lenient::opt_number", serialize_with = "lenient::ser_money", skip_serializing_if = "Option::is_none")]
    pub annual_cost: Option<f64>,

    #[serde(rename = "Severity", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    #[serde(rename = "Customer Impact", default, deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub customer_impact: Option<bool>,

    #[serde(rename = "Compliance Impact", default, deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub compliance_impact: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FrictionRecord {
    /// Label used in warnings.
    pub fn label(&self) -> &str {
        self.friction_point.as_deref().unwrap_or("unnamed friction point")
    }
}

/// A proposed AI use case (step 4).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UseCaseRecord {
    #[serde(rename = "ID", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "Use Case", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "Target Friction", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub target_friction: Option<String>,

    #[serde(rename = "AI Primitives", default, deserialize_with = "lenient::string_list", skip_serializing_if = "Vec::is_empty")]
    pub ai_primitives: Vec<String>,

    #[serde(rename = "Function", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    #[serde(rename = "Sub-Function", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub sub_function: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Four-way benefit valuation of a use case (step 5).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenefitRecord {
    #[serde(rename = "ID", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "Use Case", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "Cost Benefit", default, deserialize_with = "lenient::opt_number", serialize_with = "lenient::ser_money", skip_serializing_if = "Option::is_none")]
    pub cost_benefit: Option<f64>,

    #[serde(rename = "Cost Formula", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub cost_formula: Option<String>,

    #[serde(rename = "Cost Inputs", default, deserialize_with = "lenient::opt_labels", skip_serializing_if = "Option::is_none")]
    pub cost_inputs: Option<Vec<FormulaLabel>>,

    #[serde(rename = "Revenue Benefit", default, deserialize_with = "lenient::opt_number", serialize_with = "lenient::ser_money", skip_serializing_if = "Option::is_none")]
    pub revenue_benefit: Option<f64>,

    #[serde(rename = "Revenue Formula", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub revenue_formula: Option<String>,

    #[serde(rename = "Revenue Inputs", default, deserialize_with = "lenient::opt_labels", skip_serializing_if = "Option::is_none")]
    pub revenue_inputs: Option<Vec<FormulaLabel>>,

    #[serde(rename = "Cash Flow Benefit", default, deserialize_with = "lenient::opt_number", serialize_with = "lenient::ser_money", skip_serializing_if = "Option::is_none")]
    pub cash_flow_benefit: Option<f64>,

    #[serde(rename = "Cash Flow Formula", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub cash_flow_formula: Option<String>,

    #[serde(rename = "Cash Flow Inputs", default, deserialize_with = "lenient::opt_labels", skip_serializing_if = "Option::is_none")]
    pub cash_flow_inputs: Option<Vec<FormulaLabel>>,

    #[serde(rename = "Risk Benefit", default, deserialize_with = "lenient::opt_number", serialize_with = "lenient::ser_money", skip_serializing_if = "Option::is_none")]
    pub risk_benefit: Option<f64>,

    #[serde(rename = "Risk Formula", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub risk_formula: Option<String>,

    #[serde(rename = "Risk Inputs", default, deserialize_with = "lenient::opt_labels", skip_serializing_if = "Option::is_none")]
    pub risk_inputs: Option<Vec<FormulaLabel>>,

    #[serde(rename = "Probability of Success", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub probability_of_success: Option<f64>,

    #[serde(rename = "Total Annual Value", default, deserialize_with = "lenient::opt_number", serialize_with = "lenient::ser_money", skip_serializing_if = "Option::is_none")]
    pub total_annual_value: Option<f64>,

    #[serde(rename = "Cap Applied", default, deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub cap_applied: Option<bool>,

    /// Calculation traces written by the pipeline
    #[serde(rename = "Audit Trail", default, skip_serializing_if = "Option::is_none")]
    pub audit_trail: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BenefitRecord {
    pub fn amount(&self, kind: BenefitKind) -> Option<f64> {
        match kind {
            BenefitKind::Cost => self.cost_benefit,
            BenefitKind::Revenue => self.revenue_benefit,
            BenefitKind::CashFlow => self.cash_flow_benefit,
            BenefitKind::Risk => self.risk_benefit,
        }
    }

    pub fn formula(&self, kind: BenefitKind) -> Option<&str> {
        match kind {
            BenefitKind::Cost => self.cost_formula.as_deref(),
            BenefitKind::Revenue => self.revenue_formula.as_deref(),
            BenefitKind::CashFlow => self.cash_flow_formula.as_deref(),
            BenefitKind::Risk => self.risk_formula.as_deref(),
        }
    }

    pub fn inputs(&self, kind: BenefitKind) -> Option<&[FormulaLabel]> {
        match kind {
            BenefitKind::Cost => self.cost_inputs.as_deref(),
            BenefitKind::Revenue => self.revenue_inputs.as_deref(),
            BenefitKind::CashFlow => self.cash_flow_inputs.as_deref(),
            BenefitKind::Risk => self.risk_inputs.as_deref(),
        }
    }

    pub fn set_amount(&mut self, kind: BenefitKind, value: f64) {
        let slot = match kind {
            BenefitKind::Cost => &mut self.cost_benefit,
            BenefitKind::Revenue => &mut self.revenue_benefit,
            BenefitKind::CashFlow => &mut self.cash_flow_benefit,
            BenefitKind::Risk => &mut self.risk_benefit,
        };
        *slot = Some(value);
    }

    pub fn set_formula(&mut self, kind: BenefitKind, formula: Option<String>) {
        let slot = match kind {
            BenefitKind::Cost => &mut self.cost_formula,
            BenefitKind::Revenue => &mut self.revenue_formula,
            BenefitKind::CashFlow => &mut self.cash_flow_formula,
            BenefitKind::Risk => &mut self.risk_formula,
        };
        *slot = formula;
    }

    /// Replace the structured inputs of one benefit. `None` keeps whatever
    /// the record had.
    pub fn set_inputs(&mut self, kind: BenefitKind, inputs: Option<Vec<FormulaLabel>>) {
        if inputs.is_none() {
            return;
        }
        let slot = match kind {
            BenefitKind::Cost => &mut self.cost_inputs,
            BenefitKind::Revenue => &mut self.revenue_inputs,
            BenefitKind::CashFlow => &mut self.cash_flow_inputs,
            BenefitKind::Risk => &mut self.risk_inputs,
        };
        *slot = inputs;
    }
}

/// Implementation readiness of a use case (step 6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadinessRecord {
    #[serde(rename = "ID", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "Use Case", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "Organizational Capacity", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub organizational_capacity: Option<f64>,

    #[serde(rename = "Data Availability & Quality", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<f64>,

    #[serde(rename = "Technical Infrastructure", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub technical_infrastructure: Option<f64>,

    #[serde(rename = "Governance", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub governance: Option<f64>,

    // Legacy 1–5 components, promoted by migration and never written back.
    #[serde(rename = "Organizational Readiness", default, deserialize_with = "lenient::opt_number", skip_serializing)]
    pub legacy_organizational: Option<f64>,

    #[serde(rename = "Data Readiness", default, deserialize_with = "lenient::opt_number", skip_serializing)]
    pub legacy_data: Option<f64>,

    #[serde(rename = "Technical Readiness", default, deserialize_with = "lenient::opt_number", skip_serializing)]
    pub legacy_technical: Option<f64>,

    #[serde(rename = "Governance Readiness", default, deserialize_with = "lenient::opt_number", skip_serializing)]
    pub legacy_governance: Option<f64>,

    #[serde(rename = "Score Scale", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub score_scale: Option<String>,

    #[serde(rename = "Readiness Score", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub readiness_score: Option<f64>,

    #[serde(rename = "Time-to-Value (months)", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub time_to_value_months: Option<f64>,

    #[serde(rename = "Input Tokens per Run", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub input_tokens_per_run: Option<f64>,

    #[serde(rename = "Output Tokens per Run", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub output_tokens_per_run: Option<f64>,

    #[serde(rename = "Runs per Month", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub runs_per_month: Option<f64>,

    #[serde(rename = "Monthly Tokens", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub monthly_tokens: Option<f64>,

    #[serde(rename = "Annual Token Cost", default, deserialize_with = "lenient::opt_number", serialize_with = "lenient::ser_money", skip_serializing_if = "Option::is_none")]
    pub annual_token_cost: Option<f64>,

    #[serde(rename = "Implementation Cost", default, deserialize_with = "lenient::opt_number", serialize_with = "lenient::ser_money", skip_serializing_if = "Option::is_none")]
    pub implementation_cost: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Priority ranking of a use case (step 7).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityRecord {
    #[serde(rename = "ID", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "Use Case", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "Priority Score", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub priority_score: Option<f64>,

    #[serde(rename = "Readiness Score", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub readiness_score: Option<f64>,

    #[serde(rename = "Normalized Value Score", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub normalized_value_score: Option<f64>,

    #[serde(rename = "TTV Score", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub ttv_score: Option<f64>,

    #[serde(rename = "Total Annual Value", default, deserialize_with = "lenient::opt_number", serialize_with = "lenient::ser_money", skip_serializing_if = "Option::is_none")]
    pub total_annual_value: Option<f64>,

    #[serde(rename = "Time-to-Value (months)", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub time_to_value_months: Option<f64>,

    #[serde(rename = "Priority Tier", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,

    #[serde(rename = "Recommended Phase", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ground-truth company facts read from step 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyContext {
    pub annual_revenue: Option<f64>,
    pub total_employees: Option<f64>,
    /// 1–5 data maturity level
    pub data_maturity_level: Option<f64>,
    pub industry: Option<String>,
}

/// Records of one step, typed by step number.
#[derive(Debug, Clone, PartialEq)]
pub enum StepRecords {
    /// Step 3
    Friction(Vec<FrictionRecord>),
    /// Step 4
    UseCases(Vec<UseCaseRecord>),
    /// Step 5
    Benefits(Vec<BenefitRecord>),
    /// Step 6
    Readiness(Vec<ReadinessRecord>),
    /// Step 7
    Priorities(Vec<PriorityRecord>),
    /// Steps 0–2 and anything unrecognized
    Untyped(Vec<Map<String, Value>>),
}

impl StepRecords {
    pub fn len(&self) -> usize {
        match self {
            StepRecords::Friction(r) => r.len(),
            StepRecords::UseCases(r) => r.len(),
            StepRecords::Benefits(r) => r.len(),
            StepRecords::Readiness(r) => r.len(),
            StepRecords::Priorities(r) => r.len(),
            StepRecords::Untyped(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize back into the document's loose record shape.
    pub fn to_maps(&self) -> Vec<Map<String, Value>> {
        match self {
            StepRecords::Friction(r) => r.iter().map(record_to_map).collect(),
            StepRecords::UseCases(r) => r.iter().map(record_to_map).collect(),
            StepRecords::Benefits(r) => r.iter().map(record_to_map).collect(),
            StepRecords::Readiness(r) => r.iter().map(record_to_map).collect(),
            StepRecords::Priorities(r) => r.iter().map(record_to_map).collect(),
            StepRecords::Untyped(r) => r.clone(),
        }
    }
}

/// Serialize a typed record into a JSON object.
pub fn record_to_map<T: Serialize>(record: &T) -> Map<String, Value> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
