//! Policy configuration: bounds, multipliers, caps, scoring thresholds and
//! the canonical role table.
//!
//! A `PolicyConfig` is an immutable value threaded through every pipeline
//! call. `PolicyConfig::default()` is the built-in policy; YAML files may
//! override any subset of it.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::roles::{default_function_roles, default_roles, generic_role, StandardizedRole};
use crate::types::Scenario;

lazy_static! {
    static ref GENERIC_ROLE: StandardizedRole = generic_role();
}

/// Errors that can occur when loading a policy configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read policy file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Policy validation failed: {0}")]
    ValidationError(String),
}

/// Inclusive numeric range used for clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub min: f64,
    pub max: f64,
}

impl Bound {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp into the range. Non-finite values land on `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

/// Policy ranges for every calculator input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub hourly_rate: Bound,
    pub hours_saved: Bound,
    pub benefits_loading: Bound,
    pub realization: Bound,
    pub data_maturity: Bound,
    pub uplift: Bound,
    pub margin: Bound,
    pub days_improved: Bound,
    pub cost_of_capital: Bound,
    pub probability: Bound,
    pub amount: Bound,
    pub readiness_component: Bound,
    pub time_to_value_months: Bound,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            hourly_rate: Bound::new(25.0, 500.0),
            hours_saved: Bound::new(0.0, 500_000.0),
            benefits_loading: Bound::new(1.0, 2.0),
            realization: Bound::new(0.0, 1.0),
            data_maturity: Bound::new(0.60, 1.00),
            uplift: Bound::new(0.0, 0.50),
            margin: Bound::new(0.0, 1.0),
            days_improved: Bound::new(0.0, 120.0),
            cost_of_capital: Bound::new(0.02, 0.20),
            probability: Bound::new(0.0, 1.0),
            amount: Bound::new(0.0, 1.0e12),
            readiness_component: Bound::new(1.0, 10.0),
            time_to_value_months: Bound::new(0.0, 60.0),
        }
    }
}

/// Fixed multipliers applied by the benefit calculators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Multipliers {
    pub benefits_loading: f64,
    pub cost_realization: f64,
    pub revenue_realization: f64,
    pub cash_flow_realization: f64,
    pub risk_realization: f64,
    /// Used when neither the company context nor the formula states one
    pub default_data_maturity: f64,
    pub cost_of_capital: f64,
    /// Used when a revenue formula omits the margin
    pub default_margin: f64,
    /// Revenue uplift can never exceed this share
    pub max_uplift: f64,
    /// Risk reduction can never exceed this share of the baseline exposure
    pub max_risk_reduction: f64,
    /// Multiplier for data maturity level 1
    pub maturity_floor: f64,
    /// Added per data maturity level above 1
    pub maturity_step: f64,
}

impl Default for Multipliers {
    fn default() -> Self {
        Self {
            benefits_loading: 1.35,
            cost_realization: 0.90,
            revenue_realization: 0.95,
            cash_flow_realization: 0.85,
            risk_realization: 0.80,
            default_data_maturity: 0.75,
            cost_of_capital: 0.08,
            default_margin: 0.30,
            max_uplift: 0.50,
            max_risk_reduction: 0.50,
            maturity_floor: 0.60,
            maturity_step: 0.10,
        }
    }
}

impl Multipliers {
    /// Map a 1–5 data maturity level onto its multiplier.
    pub fn maturity_multiplier(&self, level: f64) -> f64 {
        let level = if level.is_finite() { level.clamp(1.0, 5.0) } else { 1.0 };
        self.maturity_floor + (level - 1.0) * self.maturity_step
    }
}

/// Per-scenario settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSettings {
    /// Applied to every calculator output
    pub multiplier: f64,
    /// Adoption share by year; the last entry holds for later years
    pub adoption: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioTable {
    pub conservative: ScenarioSettings,
    pub moderate: ScenarioSettings,
    pub aggressive: ScenarioSettings,
}

impl Default for ScenarioTable {
    fn default() -> Self {
        Self {
            conservative: ScenarioSettings {
                multiplier: 0.60,
                adoption: vec![0.25, 0.50, 0.70],
            },
            moderate: ScenarioSettings {
                multiplier: 1.00,
                adoption: vec![0.40, 0.65, 0.85],
            },
            aggressive: ScenarioSettings {
                multiplier: 1.30,
                adoption: vec![0.55, 0.80, 0.95],
            },
        }
    }
}

impl ScenarioTable {
    pub fn get(&self, scenario: Scenario) -> &ScenarioSettings {
        match scenario {
            Scenario::Conservative => &self.conservative,
            Scenario::Moderate => &self.moderate,
            Scenario::Aggressive => &self.aggressive,
        }
    }
}

/// Revenue-relative caps and double-counting thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapPolicy {
    /// A single use case may claim at most this share of annual revenue
    pub use_case_revenue_ratio: f64,
    /// The whole portfolio may claim at most this share of annual revenue
    pub portfolio_revenue_ratio: f64,
    pub total_warning_ratio: f64,
    pub revenue_benefit_warning_ratio: f64,
    /// Share of headcount above which implied FTE savings are flagged
    pub fte_warning_ratio: f64,
    pub hours_per_fte: f64,
    /// Extracted hours above this are never trusted as-is
    pub hours_ceiling: f64,
}

impl Default for CapPolicy {
    fn default() -> Self {
        Self {
            use_case_revenue_ratio: 0.15,
            portfolio_revenue_ratio: 0.50,
            total_warning_ratio: 0.50,
            revenue_benefit_warning_ratio: 0.30,
            fte_warning_ratio: 0.20,
            hours_per_fte: 2080.0,
            hours_ceiling: 500_000.0,
        }
    }
}

/// Weights of the four readiness components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessWeights {
    pub organizational_capacity: f64,
    pub data_quality: f64,
    pub technical_infrastructure: f64,
    pub governance: f64,
}

impl Default for ReadinessWeights {
    fn default() -> Self {
        Self {
            organizational_capacity: 0.30,
            data_quality: 0.30,
            technical_infrastructure: 0.20,
            governance: 0.20,
        }
    }
}

impl ReadinessWeights {
    pub fn sum(&self) -> f64 {
        self.organizational_capacity + self.data_quality + self.technical_infrastructure + self.governance
    }
}

/// Scoring weights and tier/phase thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub readiness_weights: ReadinessWeights,
    pub priority_readiness_weight: f64,
    pub priority_value_weight: f64,
    pub champion_threshold: f64,
    pub value_split: f64,
    pub readiness_split: f64,
    pub q1_priority: f64,
    pub q1_readiness: f64,
    pub q2_priority: f64,
    pub q2_readiness: f64,
    pub q3_priority: f64,
    pub ttv_horizon_months: f64,
    /// Component score given to synthesized readiness records
    pub default_component_score: f64,
    /// Top of the legacy readiness scale
    pub legacy_scale_max: f64,
    pub top_use_cases: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            readiness_weights: ReadinessWeights::default(),
            priority_readiness_weight: 0.5,
            priority_value_weight: 0.5,
            champion_threshold: 7.5,
            value_split: 5.5,
            readiness_split: 5.5,
            q1_priority: 7.5,
            q1_readiness: 6.0,
            q2_priority: 6.0,
            q2_readiness: 5.0,
            q3_priority: 4.5,
            ttv_horizon_months: 12.0,
            default_component_score: 5.0,
            legacy_scale_max: 5.0,
            top_use_cases: 10,
        }
    }
}

/// Multi-year projection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionPolicy {
    pub years: usize,
    pub discount_rate: f64,
    /// Share of implementation cost landing in years 1, 2, 3, ...
    pub cost_schedule: Vec<f64>,
    /// Implementation cost as a share of annual benefit when no record states one
    pub implementation_cost_ratio: f64,
    pub irr_max_iterations: usize,
    pub irr_tolerance: f64,
    pub irr_initial_guess: f64,
    /// IRR results at or beyond this magnitude are discarded
    pub irr_max_abs_rate: f64,
}

impl Default for ProjectionPolicy {
    fn default() -> Self {
        Self {
            years: 5,
            discount_rate: 0.10,
            cost_schedule: vec![0.60, 0.30, 0.10],
            implementation_cost_ratio: 0.50,
            irr_max_iterations: 100,
            irr_tolerance: 1e-4,
            irr_initial_guess: 0.10,
            irr_max_abs_rate: 10.0,
        }
    }
}

/// Rounding rules for calculator output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundingPolicy {
    /// Benefits are rounded down to a multiple of this
    pub benefit_increment: f64,
    pub score_decimals: u32,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            benefit_increment: 100_000.0,
            score_decimals: 2,
        }
    }
}

/// Token pricing per million tokens, in dollars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Default for TokenPricing {
    fn default() -> Self {
        Self {
            input_per_million: 3.0,
            output_per_million: 15.0,
        }
    }
}

/// The complete policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub bounds: Bounds,
    pub multipliers: Multipliers,
    pub scenarios: ScenarioTable,
    pub caps: CapPolicy,
    pub scoring: ScoringPolicy,
    pub projection: ProjectionPolicy,
    pub rounding: RoundingPolicy,
    pub tokens: TokenPricing,

    /// Canonical role table
    pub roles: Vec<StandardizedRole>,

    /// Role used when nothing else matches
    pub default_role_id: String,

    /// Canonical function → role id used when only the function is known
    pub function_defaults: Vec<(String, String)>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            multipliers: Multipliers::default(),
            scenarios: ScenarioTable::default(),
            caps: CapPolicy::default(),
            scoring: ScoringPolicy::default(),
            projection: ProjectionPolicy::default(),
            rounding: RoundingPolicy::default(),
            tokens: TokenPricing::default(),
            roles: default_roles(),
            default_role_id: "knowledge_worker".to_string(),
            function_defaults: default_function_roles(),
        }
    }
}

impl PolicyConfig {
    /// Parse a policy override from a YAML string.
    ///
    /// Absent sections and fields keep their built-in values.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: PolicyConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a policy override from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Multiplier for a scenario.
    pub fn scenario_multiplier(&self, scenario: Scenario) -> f64 {
        self.scenarios.get(scenario).multiplier
    }

    pub fn role_by_id(&self, id: &str) -> Option<&StandardizedRole> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// The fallback role. Validation guarantees it exists; an unvalidated
    /// config falls back to the first table entry, then to the built-in
    /// catch-all role.
    pub fn default_role(&self) -> &StandardizedRole {
        self.role_by_id(&self.default_role_id)
            .or_else(|| self.roles.first())
            .unwrap_or_else(|| &*GENERIC_ROLE)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

        let weights = self.scoring.readiness_weights.sum();
        if (weights - 1.0).abs() > 1e-6 {
            return invalid(format!("Readiness weights must sum to 1.0, got {}", weights));
        }

        let priority = self.scoring.priority_readiness_weight + self.scoring.priority_value_weight;
        if (priority - 1.0).abs() > 1e-6 {
            return invalid(format!("Priority weights must sum to 1.0, got {}", priority));
        }

        for (name, ratio) in [
            ("use_case_revenue_ratio", self.caps.use_case_revenue_ratio),
            ("portfolio_revenue_ratio", self.caps.portfolio_revenue_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return invalid(format!("caps.{} must be in (0, 1], got {}", name, ratio));
            }
        }

        let b = &self.bounds;
        for (name, bound) in [
            ("hourly_rate", b.hourly_rate),
            ("hours_saved", b.hours_saved),
            ("benefits_loading", b.benefits_loading),
            ("realization", b.realization),
            ("data_maturity", b.data_maturity),
            ("uplift", b.uplift),
            ("margin", b.margin),
            ("days_improved", b.days_improved),
            ("cost_of_capital", b.cost_of_capital),
            ("probability", b.probability),
            ("amount", b.amount),
            ("readiness_component", b.readiness_component),
            ("time_to_value_months", b.time_to_value_months),
        ] {
            if !(bound.min <= bound.max) {
                return invalid(format!("bounds.{} has min {} > max {}", name, bound.min, bound.max));
            }
        }

        for scenario in Scenario::ALL {
            let settings = self.scenarios.get(scenario);
            if settings.adoption.is_empty() {
                return invalid(format!("Scenario {} has an empty adoption curve", scenario));
            }
            if settings.adoption.iter().any(|a| !(0.0..=1.0).contains(a)) {
                return invalid(format!("Scenario {} adoption must lie in [0, 1]", scenario));
            }
        }

        let schedule: f64 = self.projection.cost_schedule.iter().sum();
        if (schedule - 1.0).abs() > 1e-6 {
            return invalid(format!("Implementation cost schedule must sum to 1.0, got {}", schedule));
        }
        if self.projection.discount_rate <= -1.0 {
            return invalid("Discount rate must be greater than -100%".to_string());
        }
        if self.projection.years == 0 {
            return invalid("Projection horizon must be at least one year".to_string());
        }
        if self.rounding.benefit_increment <= 0.0 {
            return invalid("Benefit rounding increment must be positive".to_string());
        }

        if self.roles.is_empty() {
            return invalid("Role table is empty".to_string());
        }
        if self.role_by_id(&self.default_role_id).is_none() {
            return invalid(format!("Default role '{}' is not in the role table", self.default_role_id));
        }
        for (function, role_id) in &self.function_defaults {
            if self.role_by_id(role_id).is_none() {
                return invalid(format!(
                    "Function default for '{}' references unknown role '{}'",
                    function, role_id
                ));
            }
        }

        Ok(())
    }
}
