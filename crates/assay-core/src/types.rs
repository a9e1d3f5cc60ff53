//! Shared enums used across the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four benefit categories every use case is valued on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BenefitKind {
    Cost,
    Revenue,
    CashFlow,
    Risk,
}

impl BenefitKind {
    pub const ALL: [BenefitKind; 4] = [
        BenefitKind::Cost,
        BenefitKind::Revenue,
        BenefitKind::CashFlow,
        BenefitKind::Risk,
    ];

    /// Human label used in record keys and warnings.
    pub fn label(&self) -> &'static str {
        match self {
            BenefitKind::Cost => "Cost",
            BenefitKind::Revenue => "Revenue",
            BenefitKind::CashFlow => "Cash Flow",
            BenefitKind::Risk => "Risk",
        }
    }
}

impl fmt::Display for BenefitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Projection scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::Conservative,
        Scenario::Moderate,
        Scenario::Aggressive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Conservative => "conservative",
            Scenario::Moderate => "moderate",
            Scenario::Aggressive => "aggressive",
        }
    }

    /// Parse a scenario name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "conservative" | "low" => Some(Scenario::Conservative),
            "moderate" | "base" | "expected" => Some(Scenario::Moderate),
            "aggressive" | "high" | "optimistic" => Some(Scenario::Aggressive),
            _ => None,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority tier assigned from readiness and normalized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Champions,
    #[serde(rename = "Quick Win")]
    QuickWin,
    Strategic,
    Foundation,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Champions => "Champions",
            Tier::QuickWin => "Quick Win",
            Tier::Strategic => "Strategic",
            Tier::Foundation => "Foundation",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommended implementation quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Q1 => "Q1",
            Phase::Q2 => "Q2",
            Phase::Q3 => "Q3",
            Phase::Q4 => "Q4",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Friction point severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a free-text label was resolved against a canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchConfidence {
    Exact,
    Alias,
    Fuzzy,
    FunctionFallback,
    Default,
}

impl MatchConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchConfidence::Exact => "exact",
            MatchConfidence::Alias => "alias",
            MatchConfidence::Fuzzy => "fuzzy",
            MatchConfidence::FunctionFallback => "function-fallback",
            MatchConfidence::Default => "default",
        }
    }
}

impl fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_parse() {
        assert_eq!(Scenario::parse("Aggressive"), Some(Scenario::Aggressive));
        assert_eq!(Scenario::parse(" base "), Some(Scenario::Moderate));
        assert_eq!(Scenario::parse("wild"), None);
    }

    #[test]
    fn test_tier_serializes_with_space() {
        let json = serde_json::to_string(&Tier::QuickWin).unwrap();
        assert_eq!(json, "\"Quick Win\"");
    }

    #[test]
    fn test_confidence_tags() {
        assert_eq!(MatchConfidence::FunctionFallback.as_str(), "function-fallback");
        let json = serde_json::to_string(&MatchConfidence::FunctionFallback).unwrap();
        assert_eq!(json, "\"function-fallback\"");
    }
}
