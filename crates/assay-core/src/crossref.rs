//! Cross-reference of extracted hours against documented friction.
//!
//! The model sometimes writes hours that are off by orders of magnitude
//! (420,000,000 hours for a team of twelve). Before an hours figure reaches
//! the cost calculator it is checked against the Annual Hours of the
//! friction point the use case targets.

use crate::config::CapPolicy;
use crate::currency::format_number;
use crate::document::FrictionRecord;
use crate::matching::match_label;

/// Minimum token overlap for a friction-point name match.
pub const MIN_FRICTION_OVERLAP: f64 = 0.5;

/// What the check did to the extracted figure.
#[derive(Debug, Clone, PartialEq)]
pub enum HoursCheck {
    /// Within bounds; unchanged
    Accepted,
    /// Above the hard ceiling; replaced by the matched friction hours
    Substituted { ground_truth: f64 },
    /// Above the matched friction hours; capped to them
    CappedToFriction { ground_truth: f64 },
    /// No friction match; capped to the portfolio friction total or the ceiling
    CappedToPortfolio { limit: f64 },
}

/// Result of cross-referencing one extracted hours figure.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossReference {
    pub hours: f64,
    pub extracted: f64,
    /// Name of the matched friction point
    pub matched: Option<String>,
    pub check: HoursCheck,
}

impl CrossReference {
    pub fn changed(&self) -> bool {
        self.check != HoursCheck::Accepted
    }

    /// Human-readable explanation for a changed figure.
    pub fn message(&self) -> Option<String> {
        let extracted = format_number(self.extracted);
        let matched = self.matched.as_deref().unwrap_or("");
        match &self.check {
            HoursCheck::Accepted => None,
            HoursCheck::Substituted { ground_truth } => Some(format!(
                "Sanity check failed: {} hours exceeds the ceiling; using {} hours documented for \"{}\"",
                extracted,
                format_number(*ground_truth),
                matched
            )),
            HoursCheck::CappedToFriction { ground_truth } => Some(format!(
                "{} hours exceeds the {} hours documented for \"{}\"; capped",
                extracted,
                format_number(*ground_truth),
                matched
            )),
            HoursCheck::CappedToPortfolio { limit } => Some(format!(
                "No matching friction point; {} hours capped to {}",
                extracted,
                format_number(*limit)
            )),
        }
    }
}

/// Find the friction record a use case targets.
pub fn find_friction<'a>(target: &str, friction: &'a [FrictionRecord]) -> Option<&'a FrictionRecord> {
    let named: Vec<&FrictionRecord> = friction
        .iter()
        .filter(|f| f.friction_point.is_some() && f.annual_hours.is_some())
        .collect();
    let candidates = named
        .iter()
        .map(|f| (f.friction_point.as_deref().unwrap_or(""), &[] as &[String]));

    match_label(target, candidates, MIN_FRICTION_OVERLAP).map(|m| named[m.index()])
}

/// Check an extracted hours figure.
///
/// With a matching friction point: above the ceiling the documented hours
/// are substituted, above the documented hours the figure is capped to
/// them. Without one: capped to the smaller of the total documented
/// friction hours (when positive) and the ceiling.
pub fn cross_reference_hours(
    extracted: f64,
    target: Option<&str>,
    friction: &[FrictionRecord],
    caps: &CapPolicy,
) -> CrossReference {
    let matched = target.and_then(|t| find_friction(t, friction));

    if let Some(record) = matched {
        let ground_truth = record.annual_hours.unwrap_or(0.0);
        let name = record.friction_point.clone();
        let check = if extracted > caps.hours_ceiling {
            HoursCheck::Substituted { ground_truth }
        } else if extracted > ground_truth {
            HoursCheck::CappedToFriction { ground_truth }
        } else {
            HoursCheck::Accepted
        };
        let hours = match check {
            HoursCheck::Accepted => extracted,
            _ => ground_truth,
        };
        return CrossReference {
            hours,
            extracted,
            matched: name,
            check,
        };
    }

    let total: f64 = friction.iter().filter_map(|f| f.annual_hours).sum();
    let limit = if total > 0.0 {
        total.min(caps.hours_ceiling)
    } else {
        caps.hours_ceiling
    };

    if extracted > limit {
        CrossReference {
            hours: limit,
            extracted,
            matched: None,
            check: HoursCheck::CappedToPortfolio { limit },
        }
    } else {
        CrossReference {
            hours: extracted,
            extracted,
            matched: None,
            check: HoursCheck::Accepted,
        }
    }
}
