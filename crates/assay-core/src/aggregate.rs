//! Aggregation and revenue-relative capping.
//!
//! A fold over immutable benefit lines. Each use case's total is capped at
//! a share of annual revenue, then the whole portfolio is capped with one
//! global scale factor. Threshold checks that suggest double counting are
//! reported but never change a value.

use serde::Serialize;

use crate::config::CapPolicy;
use crate::currency::{format_currency, format_factor, format_number, format_percent};
use crate::document::{CompanyContext, BENEFIT_STEP};
use crate::types::BenefitKind;
use crate::warnings::{Warning, WarningKind};

/// The four benefits of one use case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitLine {
    pub id: String,
    pub cost: f64,
    pub revenue: f64,
    pub cash_flow: f64,
    pub risk: f64,
    /// Hours behind the cost benefit, used for the headcount check
    pub hours_saved: f64,
}

impl BenefitLine {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cost: 0.0,
            revenue: 0.0,
            cash_flow: 0.0,
            risk: 0.0,
            hours_saved: 0.0,
        }
    }

    pub fn amount(&self, kind: BenefitKind) -> f64 {
        match kind {
            BenefitKind::Cost => self.cost,
            BenefitKind::Revenue => self.revenue,
            BenefitKind::CashFlow => self.cash_flow,
            BenefitKind::Risk => self.risk,
        }
    }

    pub fn with_amount(mut self, kind: BenefitKind, value: f64) -> Self {
        let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        match kind {
            BenefitKind::Cost => self.cost = value,
            BenefitKind::Revenue => self.revenue = value,
            BenefitKind::CashFlow => self.cash_flow = value,
            BenefitKind::Risk => self.risk = value,
        }
        self
    }

    pub fn total(&self) -> f64 {
        self.cost + self.revenue + self.cash_flow + self.risk
    }

    /// A copy with all four benefits scaled and floored to whole dollars.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |v: f64| (v * factor).floor().max(0.0);
        Self {
            id: self.id.clone(),
            cost: scale(self.cost),
            revenue: scale(self.revenue),
            cash_flow: scale(self.cash_flow),
            risk: scale(self.risk),
            hours_saved: self.hours_saved,
        }
    }
}

/// Capped lines plus what the caps did.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub lines: Vec<BenefitLine>,
    /// Per line: whether the use-case cap rescaled it
    pub line_capped: Vec<bool>,
    pub pre_cap_total: f64,
    pub portfolio_total: f64,
    /// Global factor from the portfolio cap; 1.0 when it did not bind
    pub scale_factor: f64,
    pub benefits_capped: bool,
    pub warnings: Vec<Warning>,
}

impl Aggregation {
    /// Portfolio total of one benefit kind.
    pub fn total_of(&self, kind: BenefitKind) -> f64 {
        self.lines.iter().map(|l| l.amount(kind)).sum()
    }
}

fn sum_of(lines: &[BenefitLine], kind: BenefitKind) -> f64 {
    lines.iter().map(|l| l.amount(kind)).sum()
}

/// Threshold checks on the pre-cap lines.
fn double_counting_checks(
    lines: &[BenefitLine],
    revenue: f64,
    context: &CompanyContext,
    caps: &CapPolicy,
    warnings: &mut Vec<Warning>,
) {
    let total: f64 = lines.iter().map(BenefitLine::total).sum();
    if total > caps.total_warning_ratio * revenue {
        warnings.push(Warning::at_document(
            WarningKind::DoubleCounting,
            format!(
                "Total benefits {} exceed {} of annual revenue {}",
                format_currency(total),
                format_percent(caps.total_warning_ratio),
                format_currency(revenue)
            ),
        ));
    }

    let revenue_benefits = sum_of(lines, BenefitKind::Revenue);
    if revenue_benefits > caps.revenue_benefit_warning_ratio * revenue {
        warnings.push(Warning::at_document(
            WarningKind::DoubleCounting,
            format!(
                "Revenue benefits {} exceed {} of annual revenue {}",
                format_currency(revenue_benefits),
                format_percent(caps.revenue_benefit_warning_ratio),
                format_currency(revenue)
            ),
        ));
    }

    let hours: f64 = lines.iter().map(|l| l.hours_saved).sum();
    match context.total_employees.filter(|e| *e > 0.0) {
        Some(employees) if caps.hours_per_fte > 0.0 => {
            let fte = hours / caps.hours_per_fte;
            if fte > caps.fte_warning_ratio * employees {
                warnings.push(Warning::at_document(
                    WarningKind::DoubleCounting,
                    format!(
                        "Implied savings of {} FTE exceed {} of {} employees",
                        format_number(fte),
                        format_percent(caps.fte_warning_ratio),
                        format_number(employees)
                    ),
                ));
            }
        }
        _ if hours > 0.0 => {
            tracing::debug!(hours, "Headcount unknown; skipping FTE check");
        }
        _ => {}
    }
}

/// Cap and total the benefit lines.
///
/// Without a positive annual revenue no revenue-relative cap or check can
/// run; the lines pass through unchanged with a warning.
pub fn aggregate(lines: &[BenefitLine], context: &CompanyContext, caps: &CapPolicy) -> Aggregation {
    let mut warnings = Vec::new();
    let pre_cap_total: f64 = lines.iter().map(BenefitLine::total).sum();

    let Some(revenue) = context.annual_revenue.filter(|r| r.is_finite() && *r > 0.0) else {
        warnings.push(Warning::at_document(
            WarningKind::MissingContext,
            "Annual revenue unknown; revenue-relative caps and checks skipped",
        ));
        return Aggregation {
            lines: lines.to_vec(),
            line_capped: vec![false; lines.len()],
            pre_cap_total,
            portfolio_total: pre_cap_total,
            scale_factor: 1.0,
            benefits_capped: false,
            warnings,
        };
    };

    double_counting_checks(lines, revenue, context, caps, &mut warnings);

    let use_case_cap = caps.use_case_revenue_ratio * revenue;
    let (capped, line_capped): (Vec<BenefitLine>, Vec<bool>) = lines
        .iter()
        .map(|line| {
            let total = line.total();
            if total <= use_case_cap {
                return (line.clone(), false);
            }
            let factor = use_case_cap / total;
            warnings.push(Warning::at_record(
                WarningKind::CapExceeded,
                BENEFIT_STEP,
                &line.id,
                "Total Annual Value",
                format!(
                    "Total {} exceeds {} of annual revenue ({}); benefits scaled by {}",
                    format_currency(total),
                    format_percent(caps.use_case_revenue_ratio),
                    format_currency(use_case_cap),
                    format_factor((factor * 1e4).floor() / 1e4)
                ),
            ));
            (line.scaled(factor), true)
        })
        .unzip();

    let capped_total: f64 = capped.iter().map(BenefitLine::total).sum();
    let portfolio_cap = caps.portfolio_revenue_ratio * revenue;
    let (lines, scale_factor) = if capped_total > portfolio_cap {
        let factor = portfolio_cap / capped_total;
        warnings.push(Warning::at_document(
            WarningKind::CapExceeded,
            format!(
                "Portfolio total {} exceeds {} of annual revenue ({}); all benefits scaled by {}",
                format_currency(capped_total),
                format_percent(caps.portfolio_revenue_ratio),
                format_currency(portfolio_cap),
                format_factor((factor * 1e4).floor() / 1e4)
            ),
        ));
        (capped.iter().map(|l| l.scaled(factor)).collect::<Vec<_>>(), factor)
    } else {
        (capped, 1.0)
    };

    let portfolio_total = lines.iter().map(BenefitLine::total).sum();
    let benefits_capped = scale_factor < 1.0 || line_capped.iter().any(|c| *c);

    Aggregation {
        lines,
        line_capped,
        pre_cap_total,
        portfolio_total,
        scale_factor,
        benefits_capped,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, cost: f64, revenue: f64) -> BenefitLine {
        BenefitLine::new(id)
            .with_amount(BenefitKind::Cost, cost)
            .with_amount(BenefitKind::Revenue, revenue)
    }

    fn context(revenue: f64) -> CompanyContext {
        CompanyContext {
            annual_revenue: Some(revenue),
            total_employees: Some(1_000.0),
            ..CompanyContext::default()
        }
    }

    #[test]
    fn test_under_caps_unchanged() {
        let lines = vec![line("UC-001", 1_000_000.0, 500_000.0)];
        let agg = aggregate(&lines, &context(100_000_000.0), &CapPolicy::default());
        assert_eq!(agg.lines, lines);
        assert_eq!(agg.scale_factor, 1.0);
        assert!(!agg.benefits_capped);
        assert!(agg.warnings.is_empty());
    }

    #[test]
    fn test_use_case_cap_scales_proportionally() {
        let lines = vec![line("UC-001", 20_000_000.0, 10_000_000.0)];
        let agg = aggregate(&lines, &context(100_000_000.0), &CapPolicy::default());
        let capped = &agg.lines[0];
        assert!(capped.total() <= 15_000_000.0);
        assert_eq!(capped.cost, 10_000_000.0);
        assert_eq!(capped.revenue, 5_000_000.0);
        assert!(agg.line_capped[0]);
        assert!(agg.benefits_capped);
        assert_eq!(agg.warnings.iter().filter(|w| w.kind == WarningKind::CapExceeded).count(), 1);
    }

    #[test]
    fn test_portfolio_cap_applies_one_factor() {
        let lines: Vec<BenefitLine> = (0..5)
            .map(|i| line(&format!("UC-{:03}", i), 14_000_000.0, 0.0))
            .collect();
        let agg = aggregate(&lines, &context(100_000_000.0), &CapPolicy::default());
        assert!(agg.portfolio_total <= 50_000_000.0);
        assert!((agg.scale_factor - 50.0 / 70.0).abs() < 1e-9);
        let first = agg.lines[0].cost;
        assert!(agg.lines.iter().all(|l| l.cost == first));
    }

    #[test]
    fn test_missing_revenue_skips_caps() {
        let lines = vec![line("UC-001", 90_000_000.0, 0.0)];
        let agg = aggregate(&lines, &CompanyContext::default(), &CapPolicy::default());
        assert_eq!(agg.lines, lines);
        assert_eq!(agg.warnings.len(), 1);
        assert_eq!(agg.warnings[0].kind, WarningKind::MissingContext);
    }

    #[test]
    fn test_double_counting_signals() {
        let mut heavy = line("UC-001", 0.0, 14_000_000.0);
        heavy.hours_saved = 500_000.0;
        let lines = vec![heavy, line("UC-002", 0.0, 14_000_000.0), line("UC-003", 0.0, 14_000_000.0)];
        let agg = aggregate(&lines, &context(80_000_000.0), &CapPolicy::default());
        let signals: Vec<&Warning> = agg
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::DoubleCounting)
            .collect();
        // total > 50%, revenue > 30%, 240 FTE > 20% of 1,000
        assert_eq!(signals.len(), 3);
    }

    #[test]
    fn test_negative_amounts_floor_at_zero() {
        let l = BenefitLine::new("UC-001").with_amount(BenefitKind::Risk, -5.0);
        assert_eq!(l.risk, 0.0);
        assert_eq!(l.with_amount(BenefitKind::Cost, f64::NAN).cost, 0.0);
    }
}
