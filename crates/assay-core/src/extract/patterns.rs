//! Shared patterns for formula text.
//!
//! Formula text is whatever the model wrote, e.g.
//! `"28,000 hours × $50/hr × 1.35 × 0.90 × 0.75 = $1.2M"`. These patterns
//! pull out the numeric literals and spot the phrases that mean "no benefit".

use lazy_static::lazy_static;
use regex::Regex;

use crate::currency::suffix_multiplier;

lazy_static! {
    /// Numeric literal with optional divisor slash, `$` prefix, magnitude
    /// suffix and unit.
    static ref LITERAL_PATTERN: Regex = Regex::new(
        r"(?i)(?P<slash>/\s*)?(?P<dollar>\$)?\s*(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|\.\d+)\s*(?P<suffix>%|mm\b|bn\b|k\b|m\b|b\b|thousand\b|million\b|billion\b)?(?P<unit>\s*(?:/\s*(?:hr|hour|h)\b|per\s+hour\b|hours?\b|hrs?\b|days?\b))?"
    ).unwrap();

    /// Phrases meaning the benefit does not apply.
    static ref NEGATION_PATTERN: Regex = Regex::new(
        r"(?i)\bno\s+direct\b|\bnot\s+applicable\b|\bn/a\b|\bnone\b|\$\s*0(?:$|[^\d.,])"
    ).unwrap();
}

/// Unit written after a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    PerHour,
    Hours,
    Days,
}

/// A numeric literal found in formula text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Literal {
    /// Value with magnitude suffix applied; percentages are ratios
    pub value: f64,
    pub percent: bool,
    pub dollar: bool,
    pub unit: Option<Unit>,
}

impl Literal {
    /// A bare ratio such as `0.90`.
    pub fn is_bare_decimal(&self) -> bool {
        !self.percent && !self.dollar && self.unit.is_none() && self.value > 0.0 && self.value <= 1.0
    }
}

/// Text left of the first `=`: the inputs, not the stated result.
pub fn formula_inputs(text: &str) -> &str {
    text.split('=').next().unwrap_or(text)
}

/// Whether the text says the benefit does not apply. Only the inputs are
/// checked; a stated `= $0` result does not void them.
pub fn is_negated(text: &str) -> bool {
    NEGATION_PATTERN.is_match(formula_inputs(text))
}

/// Every numeric literal in the text, in order.
///
/// Divisors (`/365`) and digits glued to identifiers (`Q1`, `UC-001`) are
/// skipped.
pub fn literals(text: &str) -> Vec<Literal> {
    LITERAL_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            if caps.name("slash").is_some() {
                return None;
            }
            let whole = caps.get(0)?;
            if glued_to_identifier(&text[..whole.start()]) {
                return None;
            }

            let digits = caps.name("num")?.as_str().replace(',', "");
            let mut value: f64 = digits.parse().ok()?;
            let suffix = caps.name("suffix").map(|s| s.as_str().to_lowercase());
            if let Some(suffix) = &suffix {
                value *= suffix_multiplier(suffix);
            }
            if !value.is_finite() {
                return None;
            }

            let unit = caps.name("unit").map(|u| {
                let u = u.as_str().trim().to_lowercase();
                if u.starts_with('/') || u.starts_with("per") {
                    Unit::PerHour
                } else if u.starts_with('d') {
                    Unit::Days
                } else {
                    Unit::Hours
                }
            });

            Some(Literal {
                value,
                percent: suffix.as_deref() == Some("%"),
                dollar: caps.name("dollar").is_some(),
                unit,
            })
        })
        .collect()
}

fn glued_to_identifier(before: &str) -> bool {
    let mut chars = before.chars().rev();
    match chars.next() {
        Some(c) if c.is_alphanumeric() || c == '_' => true,
        Some('-') => chars.next().map_or(false, |c| c.is_alphanumeric()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_formula_literals() {
        let found = literals(formula_inputs("28,000 hours × $50/hr × 1.35 × 0.90 × 0.75 = $1.2M"));
        assert_eq!(found.len(), 5);
        assert_eq!(found[0].value, 28_000.0);
        assert_eq!(found[0].unit, Some(Unit::Hours));
        assert_eq!(found[1].value, 50.0);
        assert!(found[1].dollar);
        assert_eq!(found[1].unit, Some(Unit::PerHour));
        assert!(found[4].is_bare_decimal());
    }

    #[test]
    fn test_suffixes_and_percent() {
        let found = literals("$365M revenue × 15 days / 365 × 8%");
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].value, 365_000_000.0);
        assert_eq!(found[1].unit, Some(Unit::Days));
        assert!(found[2].percent);
        assert!((found[2].value - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_identifiers_skipped() {
        let found = literals("UC-001 in Q1: 4 weeks");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, 4.0);
    }

    #[test]
    fn test_negation_markers() {
        assert!(is_negated("No direct revenue impact"));
        assert!(is_negated("N/A"));
        assert!(is_negated("$0"));
        assert!(is_negated("Not applicable for this use case"));
        assert!(!is_negated("$0.5M × 10%"));
        assert!(!is_negated("28,000 hours × $50/hr"));
    }

    #[test]
    fn test_stated_zero_result_is_not_negation() {
        assert!(!is_negated("28,000 hours × $50/hr × 1.35 × 0.90 × 0.75 = $0"));
        assert!(!is_negated("5% uplift × $20M × 30% = none"));
        assert!(is_negated("N/A = $0"));
    }

    #[test]
    fn test_formula_inputs_stops_at_equals() {
        assert_eq!(formula_inputs("a × b = $1M = c"), "a × b ");
        assert_eq!(formula_inputs("no result"), "no result");
    }
}
