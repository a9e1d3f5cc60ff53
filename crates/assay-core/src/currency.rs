//! Canonical money formatting and lenient amount parsing.
//!
//! Every monetary field leaving the pipeline goes through
//! [`format_currency`]; every monetary field entering it goes through
//! [`parse_amount`].

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// First numeric literal in a field value, with optional `$` and magnitude suffix.
    static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"(?i)(?P<neg>-\s*)?(?P<dollar>\$)?\s*(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|\.\d+)\s*(?P<suffix>%|mm\b|bn\b|k\b|m\b|b\b|thousand\b|million\b|billion\b)?"
    ).unwrap();
}

/// Parse a loosely formatted amount such as `"$1.2M"`, `"28,000 hours"`,
/// `"45%"` or `"$450K"`.
///
/// Percentages are returned as ratios (`"45%"` → `0.45`). Returns `None`
/// when the text holds no numeric literal.
pub fn parse_amount(text: &str) -> Option<f64> {
    let caps = AMOUNT_PATTERN.captures(text)?;
    let digits = caps.name("num")?.as_str().replace(',', "");
    let mut value: f64 = digits.parse().ok()?;

    if let Some(suffix) = caps.name("suffix") {
        value *= suffix_multiplier(suffix.as_str());
    }
    if caps.name("neg").is_some() {
        value = -value;
    }

    value.is_finite().then_some(value)
}

/// Multiplier for a magnitude suffix (`K`, `M`, `B`, `%`, ...).
pub(crate) fn suffix_multiplier(suffix: &str) -> f64 {
    match suffix.to_lowercase().as_str() {
        "%" => 0.01,
        "k" | "thousand" => 1_000.0,
        "m" | "mm" | "million" => 1_000_000.0,
        "b" | "bn" | "billion" => 1_000_000_000.0,
        _ => 1.0,
    }
}

/// Format a dollar amount canonically: `$1.2B`, `$4.6M`, `$450K`, `$45`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    let body = if abs >= 999_950_000.0 {
        format!("{}B", one_decimal(abs / 1_000_000_000.0))
    } else if abs >= 999_500.0 {
        format!("{}M", one_decimal(abs / 1_000_000.0))
    } else if abs >= 999.5 {
        format!("{}K", (abs / 1_000.0).round() as i64)
    } else {
        format!("{}", abs.round() as i64)
    };

    if body == "0" {
        return "$0".to_string();
    }

    format!("{}${}", sign, body)
}

/// Round a value to what [`format_currency`] would display.
///
/// Input-only amounts are quantized at ingestion so that re-reading a
/// formatted document yields the same number.
pub fn quantize_currency(value: f64) -> f64 {
    parse_amount(&format_currency(value)).unwrap_or(0.0)
}

/// Render a plain number with thousands separators and at most two decimals.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let rounded = (value * 100.0).round() / 100.0;
    let whole = rounded.trunc().abs() as u64;
    let frac = ((rounded.abs() - whole as f64) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    if frac == 0 {
        format!("{}{}", sign, grouped)
    } else if frac % 10 == 0 {
        format!("{}{}.{}", sign, grouped, frac / 10)
    } else {
        format!("{}{}.{:02}", sign, grouped, frac)
    }
}

/// Render a ratio as a percentage literal, e.g. `0.055` → `"5.5%"`.
pub fn format_percent(ratio: f64) -> String {
    format!("{}%", trim_decimal(ratio * 100.0, 4))
}

/// Render a multiplier with up to four decimals and no trailing zeros.
pub fn format_factor(value: f64) -> String {
    trim_decimal(value, 4)
}

fn one_decimal(value: f64) -> String {
    trim_decimal(value, 1)
}

fn trim_decimal(value: f64, places: usize) -> String {
    let text = format!("{:.*}", places, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
