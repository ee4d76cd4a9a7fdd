use regex::Regex;
use serde_json::{Number, Value};

use crate::types::JsonType;

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Truthiness for `if`/`unless` conditions. `None` is the Undefined case
/// produced by path resolution.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(entries)) => !entries.is_empty(),
    }
}

/// Natural text form of a value: scalars print as themselves, null prints
/// empty, containers print as their JSON text.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

pub fn placeholder_for_type(value_type: JsonType) -> Value {
    match value_type {
        JsonType::String => Value::String(String::new()),
        JsonType::Number => Value::Number(Number::from(0)),
        JsonType::Boolean => Value::Bool(false),
        JsonType::Array => Value::Array(Vec::new()),
        JsonType::Object => Value::Object(serde_json::Map::new()),
        JsonType::Any => Value::Null,
    }
}

pub fn is_type_compatible(value: &Value, value_type: JsonType) -> bool {
    match value_type {
        JsonType::String => value.is_string(),
        JsonType::Number => value.is_number(),
        JsonType::Boolean => value.is_boolean(),
        JsonType::Array => value.is_array(),
        JsonType::Object => value.is_object(),
        JsonType::Any => true,
    }
}

/// Safe coercions only: numeric strings become numbers, scalar values become
/// their display text. Anything else is the caller's replace-with-default case.
pub fn coerce_value(value: &Value, value_type: JsonType) -> Option<Value> {
    match (value_type, value) {
        (JsonType::Number, Value::String(text)) => {
            let numeric = Regex::new(r"^[+-]?\d+(\.\d+)?$").expect("numeric regex must compile");
            let trimmed = text.trim();
            if !numeric.is_match(trimmed) {
                return None;
            }
            if let Ok(integer) = trimmed.parse::<i64>() {
                return Some(Value::Number(Number::from(integer)));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        }
        (JsonType::String, Value::Number(_)) | (JsonType::String, Value::Bool(_)) => {
            Some(Value::String(display_text(value)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn is_truthy_matches_falsiness_boundary() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&Value::Null)));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!([]))));
        assert!(!is_truthy(Some(&json!({}))));

        assert!(is_truthy(Some(&json!(true))));
        assert!(is_truthy(Some(&json!(-1))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!([0]))));
        assert!(is_truthy(Some(&json!({"a": 1}))));
    }

    #[test]
    fn display_text_keeps_scalars_natural_and_containers_json() {
        assert_eq!(display_text(&Value::Null), "");
        assert_eq!(display_text(&json!(true)), "true");
        assert_eq!(display_text(&json!(42)), "42");
        assert_eq!(display_text(&json!(4.5)), "4.5");
        assert_eq!(display_text(&json!("hi")), "hi");
        assert_eq!(display_text(&json!([1, 2])), "[1,2]");
        assert_eq!(display_text(&json!({"a": 1})), "{\"a\":1}");
    }

    #[test]
    fn placeholder_for_type_is_render_safe() {
        assert_eq!(placeholder_for_type(JsonType::String), json!(""));
        assert_eq!(placeholder_for_type(JsonType::Number), json!(0));
        assert_eq!(placeholder_for_type(JsonType::Boolean), json!(false));
        assert_eq!(placeholder_for_type(JsonType::Array), json!([]));
        assert_eq!(placeholder_for_type(JsonType::Object), json!({}));
        assert_eq!(placeholder_for_type(JsonType::Any), Value::Null);
    }

    #[test]
    fn coerce_value_accepts_numeric_strings() {
        assert_eq!(coerce_value(&json!("42"), JsonType::Number), Some(json!(42)));
        assert_eq!(
            coerce_value(&json!("-3.5"), JsonType::Number),
            Some(json!(-3.5))
        );
        assert_eq!(coerce_value(&json!(" 7 "), JsonType::Number), Some(json!(7)));
        assert_eq!(coerce_value(&json!("$1.2M"), JsonType::Number), None);
        assert_eq!(coerce_value(&json!(""), JsonType::Number), None);
    }

    #[test]
    fn coerce_value_stringifies_scalars_only() {
        assert_eq!(
            coerce_value(&json!(5), JsonType::String),
            Some(json!("5"))
        );
        assert_eq!(
            coerce_value(&json!(true), JsonType::String),
            Some(json!("true"))
        );
        assert_eq!(coerce_value(&json!([1]), JsonType::String), None);
        assert_eq!(coerce_value(&json!("x"), JsonType::Boolean), None);
    }
}
