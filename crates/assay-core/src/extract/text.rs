//! Magnitude bucketing of formula text.
//!
//! When a formula comes without structured labels, its literals are sorted
//! into inputs by unit, by magnitude and by position. This is a shim for
//! older output: it is right for the formula shapes the model writes in
//! practice and makes no promises beyond them.

use super::patterns::{formula_inputs, literals, Literal, Unit};
use super::{InputSource, PartialInputs};
use crate::calc::InputField;
use crate::types::BenefitKind;

/// Bucket the literals left of the first `=`.
pub fn from_text(kind: BenefitKind, text: &str) -> PartialInputs {
    let found = literals(formula_inputs(text));
    let mut inputs = PartialInputs::new(kind, InputSource::Text);
    match kind {
        BenefitKind::Cost => bucket_cost(&found, &mut inputs),
        BenefitKind::Revenue => bucket_revenue(&found, &mut inputs),
        BenefitKind::CashFlow => bucket_cash_flow(&found, &mut inputs),
        BenefitKind::Risk => bucket_risk(&found, &mut inputs),
    }
    inputs
}

/// Assign `values` to the open fields of `slots`, in order.
fn fill_slots(inputs: &mut PartialInputs, slots: &[InputField], values: &[f64]) {
    let open: Vec<InputField> = slots.iter().copied().filter(|f| !inputs.has(*f)).collect();
    for (field, value) in open.into_iter().zip(values.iter()) {
        inputs.set(field, *value);
    }
}

/// Like [`fill_slots`], but when there are fewer values than open slots the
/// optional slot (which has a policy default) is skipped.
fn fill_slots_skipping(inputs: &mut PartialInputs, slots: &[InputField], optional: InputField, values: &[f64]) {
    let open = slots.iter().filter(|f| !inputs.has(**f)).count();
    if values.len() < open {
        let reduced: Vec<InputField> = slots.iter().copied().filter(|f| *f != optional).collect();
        fill_slots(inputs, &reduced, values);
    } else {
        fill_slots(inputs, slots, values);
    }
}

fn bucket_cost(found: &[Literal], inputs: &mut PartialInputs) {
    let mut decimals = Vec::new();
    for lit in found {
        let v = lit.value;
        match lit.unit {
            Some(Unit::PerHour) => {
                inputs.fill(InputField::HourlyRate, v);
            }
            Some(Unit::Hours) => {
                inputs.fill(InputField::Hours, v);
            }
            _ if v > 0.0 && v <= 1.0 => decimals.push(v),
            _ if v >= 1000.0 => {
                inputs.fill(InputField::Hours, v);
            }
            _ if lit.dollar && v > 1.0 => {
                inputs.fill(InputField::HourlyRate, v);
            }
            _ if (50.0..=500.0).contains(&v) => {
                inputs.fill(InputField::HourlyRate, v);
            }
            _ if v > 1.0 && v < 50.0 => {
                inputs.fill(InputField::BenefitsLoading, v);
            }
            _ => {}
        }
    }
    fill_slots(inputs, &[InputField::Realization, InputField::DataMaturity], &decimals);
}

fn bucket_revenue(found: &[Literal], inputs: &mut PartialInputs) {
    let mut decimals = Vec::new();
    let mut largest: Option<f64> = None;

    for lit in found {
        let v = lit.value;
        if lit.percent {
            if !inputs.fill(InputField::Uplift, v) && !inputs.fill(InputField::Margin, v) {
                decimals.push(v);
            }
        } else if v >= 1000.0 {
            largest = Some(largest.map_or(v, |l| l.max(v)));
        } else if lit.is_bare_decimal() {
            decimals.push(v);
        }
    }

    if let Some(amount) = largest {
        inputs.fill(InputField::RevenueAtRisk, amount);
    }
    fill_slots_skipping(
        inputs,
        &[InputField::Uplift, InputField::Margin, InputField::Realization, InputField::DataMaturity],
        InputField::Margin,
        &decimals,
    );
}

fn bucket_cash_flow(found: &[Literal], inputs: &mut PartialInputs) {
    let mut decimals = Vec::new();
    let mut largest: Option<f64> = None;
    let mut bare_counts = Vec::new();

    for lit in found {
        let v = lit.value;
        if lit.unit == Some(Unit::Days) {
            inputs.fill(InputField::DaysImproved, v);
        } else if lit.percent {
            if !inputs.fill(InputField::CostOfCapital, v) {
                decimals.push(v);
            }
        } else if (lit.dollar && v >= 1000.0) || v >= 1_000_000.0 {
            largest = Some(largest.map_or(v, |l| l.max(v)));
        } else if lit.is_bare_decimal() {
            decimals.push(v);
        } else if !lit.dollar && v > 1.0 && v <= 365.0 {
            bare_counts.push(v);
        }
    }

    if let Some(amount) = largest {
        inputs.fill(InputField::AnnualRevenue, amount);
    }
    if let Some(days) = bare_counts.first() {
        inputs.fill(InputField::DaysImproved, *days);
    }
    fill_slots_skipping(
        inputs,
        &[InputField::CostOfCapital, InputField::Realization, InputField::DataMaturity],
        InputField::CostOfCapital,
        &decimals,
    );
}

fn bucket_risk(found: &[Literal], inputs: &mut PartialInputs) {
    let has_percent = found.iter().any(|l| l.percent);
    let mut probabilities = Vec::new();
    let mut amounts = Vec::new();
    let mut decimals = Vec::new();

    for lit in found {
        let v = lit.value;
        if lit.percent {
            probabilities.push(v);
        } else if v >= 1000.0 {
            amounts.push(v);
        } else if lit.is_bare_decimal() {
            if has_percent {
                decimals.push(v);
            } else if v < 1.0 && probabilities.len() < 2 {
                probabilities.push(v);
            } else {
                decimals.push(v);
            }
        }
    }

    // Extra probabilities beyond before/after are multipliers
    if probabilities.len() > 2 {
        let extra = probabilities.split_off(2);
        decimals.splice(0..0, extra);
    }

    fill_slots(inputs, &[InputField::ProbabilityBefore, InputField::ProbabilityAfter], &probabilities);
    fill_slots(inputs, &[InputField::ImpactBefore, InputField::ImpactAfter], &amounts);
    fill_slots(inputs, &[InputField::Realization, InputField::DataMaturity], &decimals);
}
