//! Lenient field deserializers.
//!
//! Model output writes the same field as `28000`, `"28,000"`, `"28K hours"`
//! or `null`. These helpers accept any JSON shape and never fail: a value
//! that cannot be interpreted becomes `None`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::currency::{format_currency, parse_amount};
use crate::taxonomy::split_primitives;

/// Interpret a JSON value as a number.
pub fn value_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Interpret a JSON value as text.
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Interpret a JSON value as a yes/no flag.
pub fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" | "high" | "x" | "1" => Some(true),
            "no" | "n" | "false" | "low" | "none" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_number(&value))
}

pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_string(&value))
}

pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_bool(&value))
}

/// Accept `["a", "b"]` or `"a, b"`.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(value_as_string).collect(),
        Value::String(s) => split_primitives(&s),
        _ => Vec::new(),
    })
}

/// A structured formula input: a label and its numeric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaLabel {
    pub label: String,
    pub value: f64,
}

impl FormulaLabel {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Accept `[{"label": "Hours Saved", "value": "28,000"}]` or
/// `{"Hours Saved": 28000}`. Entries without a readable value are dropped.
pub fn opt_labels<'de, D>(deserializer: D) -> Result<Option<Vec<FormulaLabel>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(labels_from_value(&value))
}

pub fn labels_from_value(value: &Value) -> Option<Vec<FormulaLabel>> {
    let labels: Vec<FormulaLabel> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let obj = item.as_object()?;
                let label = ["label", "name", "input"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(value_as_string))?;
                let value = obj.get("value").and_then(value_as_number)?;
                Some(FormulaLabel::new(label, value))
            })
            .collect(),
        Value::Object(obj) => obj
            .iter()
            .filter_map(|(k, v)| value_as_number(v).map(|n| FormulaLabel::new(k.clone(), n)))
            .collect(),
        _ => return None,
    };

    (!labels.is_empty()).then_some(labels)
}

/// Serialize an optional amount as a canonical currency string.
pub fn ser_money<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_str(&format_currency(*v)),
        None => serializer.serialize_none(),
    }
}

/// Serialize a required amount as a canonical currency string.
pub fn ser_money_required<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_currency(*value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_number")]
        amount: Option<f64>,
        #[serde(default, deserialize_with = "opt_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "string_list")]
        items: Vec<String>,
        #[serde(default, deserialize_with = "opt_labels")]
        labels: Option<Vec<FormulaLabel>>,
    }

    #[test]
    fn test_numbers_from_any_shape() {
        let p: Probe = serde_json::from_value(json!({"amount": "$1.2M"})).unwrap();
        assert_eq!(p.amount, Some(1_200_000.0));
        let p: Probe = serde_json::from_value(json!({"amount": 42})).unwrap();
        assert_eq!(p.amount, Some(42.0));
        let p: Probe = serde_json::from_value(json!({"amount": "unknown"})).unwrap();
        assert_eq!(p.amount, None);
        let p: Probe = serde_json::from_value(json!({"amount": [1, 2]})).unwrap();
        assert_eq!(p.amount, None);
    }

    #[test]
    fn test_flags() {
        let p: Probe = serde_json::from_value(json!({"flag": "Yes"})).unwrap();
        assert_eq!(p.flag, Some(true));
        let p: Probe = serde_json::from_value(json!({"flag": "maybe"})).unwrap();
        assert_eq!(p.flag, None);
    }

    #[test]
    fn test_string_list_from_csv() {
        let p: Probe = serde_json::from_value(json!({"items": "Data Analysis, Automation"})).unwrap();
        assert_eq!(p.items, vec!["Data Analysis", "Automation"]);
    }

    #[test]
    fn test_labels_array_and_object() {
        let p: Probe = serde_json::from_value(json!({
            "labels": [
                {"label": "Hours Saved", "value": "28,000"},
                {"label": "Hourly Rate", "value": 50},
                {"label": "Broken", "value": "n/a"}
            ]
        }))
        .unwrap();
        let labels = p.labels.unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], FormulaLabel::new("Hours Saved", 28_000.0));

        let p: Probe = serde_json::from_value(json!({"labels": {"Hours Saved": 100}})).unwrap();
        assert_eq!(p.labels.unwrap()[0].value, 100.0);

        let p: Probe = serde_json::from_value(json!({"labels": []})).unwrap();
        assert!(p.labels.is_none());
    }
}
