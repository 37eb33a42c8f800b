//! Value coercion shared by the wizard, the editors and payload mapping.
//!
//! Wizard values are plain JSON so they can cross the component boundary untouched. The helpers
//! here follow loose scripting semantics: nothing panics or errors, malformed input degrades to an
//! empty or default value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::spec::{FieldSpec, FieldType, TemplateSpec};

/// In-progress values of one wizard session, keyed by field key.
pub type WizardValues = Map<String, Value>;

/// Element of `checklist` field values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    pub done: bool,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>, done: bool) -> Self {
        Self {
            text: text.into(),
            done,
        }
    }

    /// Coerces a raw checklist entry. Non-object entries yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let record = value.as_object()?;
        let text = record
            .get("text")
            .filter(|text| is_truthy(text))
            .and_then(stringify)
            .unwrap_or_default();
        let done = record.get("done").map(is_truthy).unwrap_or(false);
        Some(Self { text, done })
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "text": self.text, "done": self.done })
    }
}

/// Effective initial value of a field when no explicit value is supplied.
pub fn default_value(field: &FieldSpec) -> Value {
    if let Some(value) = &field.default_value {
        return value.clone();
    }
    match field.kind {
        FieldType::Checkbox => Value::Bool(false),
        kind if kind.is_sequence() => Value::Array(Vec::new()),
        _ => Value::String(String::new()),
    }
}

/// Builds a fresh value map: supplied initial values win, template defaults fill the rest.
///
/// A `null` initial value counts as not supplied.
pub fn initial_values(template: &TemplateSpec, initial: Option<&WizardValues>) -> WizardValues {
    template
        .fields
        .iter()
        .map(|field| {
            let value = initial
                .and_then(|initial| initial.get(&field.key))
                .filter(|value| !value.is_null())
                .cloned()
                .unwrap_or_else(|| default_value(field));
            (field.key.clone(), value)
        })
        .collect()
}

/// True for absent/null values, blank strings and empty sequences. `0` and `false` are present.
pub fn is_missing_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Loose truthiness: `null`, `false`, `0` and `""` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form of a scalar. `null` has none; composite values use their JSON text.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(format_number(number)),
        other => Some(other.to_string()),
    }
}

/// Coerces a value to a list of non-empty strings.
///
/// Sequences are stringified element-wise; anything else is split on commas. Elements are
/// trimmed in both paths and blank ones dropped.
pub fn value_as_array(value: &Value) -> Vec<String> {
    if !is_truthy(value) {
        return Vec::new();
    }
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(stringify)
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        other => stringify(other)
            .map(|text| split_list(&text))
            .unwrap_or_default(),
    }
}

/// Coerces a value to a list of integral ids, discarding anything non-numeric.
pub fn value_as_id_array(value: &Value) -> Vec<i64> {
    if !is_truthy(value) {
        return Vec::new();
    }
    match value {
        Value::Array(items) => items.iter().filter_map(coerce_id).collect(),
        Value::String(text) => text
            .split(',')
            .filter_map(|part| coerce_id(&Value::String(part.to_string())))
            .collect(),
        other => coerce_id(other).into_iter().collect(),
    }
}

/// Finite numeric reading of a number or numeric string.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|n| n.is_finite()),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// Integral numeric reading; fractional numbers are rejected.
pub fn coerce_id(value: &Value) -> Option<i64> {
    coerce_number(value)
        .filter(|n| n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64)
        .map(|n| n as i64)
}

/// Reads checklist rows from a value, dropping entries that are not objects.
pub fn checklist_from_value(value: &Value) -> Vec<ChecklistItem> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(ChecklistItem::from_value).collect())
        .unwrap_or_default()
}

pub fn checklist_to_value(items: &[ChecklistItem]) -> Value {
    Value::Array(items.iter().map(ChecklistItem::to_value).collect())
}

/// Parses numeric editor input: blank is `0`, unparseable is `null`.
pub fn number_from_input(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Number(Number::from(0));
    }
    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => number_value(parsed),
        _ => Value::Null,
    }
}

/// Date editor display form: the first ten characters of the stored string.
pub fn date_for_display(value: &Value) -> String {
    if !is_truthy(value) {
        return String::new();
    }
    stringify(value)
        .map(|text| text.chars().take(10).collect())
        .unwrap_or_default()
}

/// Display form used by plain text inputs; `null` shows as empty.
pub fn text_for_display(value: Option<&Value>) -> String {
    value.and_then(stringify).unwrap_or_default()
}

pub(crate) fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

fn number_value(parsed: f64) -> Value {
    if parsed.fract() == 0.0 && parsed.abs() < 9.0e15 {
        Value::Number(Number::from(parsed as i64))
    } else {
        Number::from_f64(parsed)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn format_number(number: &Number) -> String {
    if let Some(value) = number.as_f64()
        && !number.is_i64()
        && !number.is_u64()
        && value.fract() == 0.0
        && value.abs() < 9.0e15
    {
        return (value as i64).to_string();
    }
    number.to_string()
}
