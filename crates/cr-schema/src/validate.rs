use cr_core::{
    coerce_value, is_type_compatible, placeholder_for_type, type_name, Gap, GapReason, JsonType,
    ReportError, SchemaNode,
};
use serde_json::{Map, Number, Value};

/// Rejects internally inconsistent schemas. A bad schema is a configuration
/// error and fails fast; document problems never reach this path.
pub fn check_schema(schema: &SchemaNode) -> Result<(), ReportError> {
    check_schema_at(schema, "")
}

fn check_schema_at(schema: &SchemaNode, path: &str) -> Result<(), ReportError> {
    if !schema.children.is_empty() && schema.value_type != JsonType::Object {
        return Err(ReportError::new(
            "SCHEMA_CHILDREN_ON_NON_OBJECT",
            format!("Schema node \"{}\" declares children but is not an object.", path),
        ));
    }

    for name in &schema.required {
        if !schema.children.iter().any(|(child, _)| child == name) {
            return Err(ReportError::new(
                "SCHEMA_REQUIRED_UNKNOWN_FIELD",
                format!(
                    "Schema node \"{}\" requires field \"{}\" that it never declares.",
                    path, name
                ),
            ));
        }
    }

    if schema.item_schema.is_some() && schema.value_type != JsonType::Array {
        return Err(ReportError::new(
            "SCHEMA_ITEM_ON_NON_ARRAY",
            format!("Schema node \"{}\" declares an item schema but is not an array.", path),
        ));
    }

    if let Some(values) = &schema.enum_values {
        if values.is_empty() {
            return Err(ReportError::new(
                "SCHEMA_ENUM_EMPTY",
                format!("Schema node \"{}\" declares an empty enum.", path),
            ));
        }
        for value in values {
            if !is_type_compatible(value, schema.value_type) {
                return Err(ReportError::new(
                    "SCHEMA_ENUM_TYPE",
                    format!(
                        "Schema node \"{}\" enum value has type \"{}\" which does not match the field type.",
                        path,
                        type_name(value)
                    ),
                ));
            }
        }
    }

    if let Some(default) = &schema.default_value {
        if !is_type_compatible(default, schema.value_type) {
            return Err(ReportError::new(
                "SCHEMA_DEFAULT_TYPE",
                format!(
                    "Schema node \"{}\" default has type \"{}\" which does not match the field type.",
                    path,
                    type_name(default)
                ),
            ));
        }
        if let Some(values) = &schema.enum_values {
            if !values.contains(default) {
                return Err(ReportError::new(
                    "SCHEMA_DEFAULT_ENUM",
                    format!("Schema node \"{}\" default is not an enum member.", path),
                ));
            }
        }
    }

    if schema.min_value.is_some() || schema.max_value.is_some() {
        if schema.value_type != JsonType::Number {
            return Err(ReportError::new(
                "SCHEMA_RANGE_ON_NON_NUMBER",
                format!("Schema node \"{}\" declares a range but is not a number.", path),
            ));
        }
        if let (Some(min), Some(max)) = (schema.min_value, schema.max_value) {
            if min > max {
                return Err(ReportError::new(
                    "SCHEMA_RANGE_INVERTED",
                    format!("Schema node \"{}\" declares min {} above max {}.", path, min, max),
                ));
            }
        }
    }

    for (name, child) in &schema.children {
        check_schema_at(child, &join_path(path, name))?;
    }
    if let Some(item) = &schema.item_schema {
        check_schema_at(item, &join_path(path, "0"))?;
    }
    Ok(())
}

/// Completes a document against a schema. Total over any input value: the
/// result always has every required field present with the declared type, and
/// every detected problem is a Gap, never an error. Gap order follows schema
/// declaration order, depth-first.
pub fn validate(doc: &Value, schema: &SchemaNode) -> Result<(Value, Vec<Gap>), ReportError> {
    check_schema(schema)?;
    let mut gaps = Vec::new();
    let completed = complete(Some(doc), schema, "", &mut gaps);
    Ok((completed, gaps))
}

fn default_for(schema: &SchemaNode) -> Value {
    schema
        .default_value
        .clone()
        .unwrap_or_else(|| placeholder_for_type(schema.value_type))
}

// Called with None only for required-absent fields; optional absent fields
// are skipped by the object recursion and stay absent.
fn complete(value: Option<&Value>, schema: &SchemaNode, path: &str, gaps: &mut Vec<Gap>) -> Value {
    let mut base = match value {
        None => {
            gaps.push(Gap::new(path, GapReason::Missing));
            default_for(schema)
        }
        Some(value) if is_type_compatible(value, schema.value_type) => value.clone(),
        Some(value) => match coerce_value(value, schema.value_type) {
            Some(coerced) => coerced,
            None => {
                gaps.push(Gap::new(path, GapReason::WrongType));
                default_for(schema)
            }
        },
    };

    if let Some(values) = &schema.enum_values {
        if !values.contains(&base) {
            gaps.push(Gap::new(path, GapReason::WrongType));
            base = default_for(schema);
        }
    }

    if let Value::Number(number) = &base {
        if let Some(current) = number.as_f64() {
            let clamped = clamp(current, schema.min_value, schema.max_value);
            if clamped != current {
                gaps.push(Gap::new(path, GapReason::OutOfRange));
                base = number_value(clamped);
            }
        }
    }

    match schema.value_type {
        JsonType::Object => {
            let existing = match base {
                Value::Object(entries) => entries,
                _ => Map::new(),
            };
            let mut out = Map::new();
            for (name, child) in &schema.children {
                let child_path = join_path(path, name);
                match existing.get(name) {
                    Some(present) => {
                        out.insert(name.clone(), complete(Some(present), child, &child_path, gaps));
                    }
                    None if schema.required.contains(name) => {
                        out.insert(name.clone(), complete(None, child, &child_path, gaps));
                    }
                    None => {}
                }
            }
            for (name, extra) in existing {
                if !schema.children.iter().any(|(child, _)| *child == name) {
                    out.insert(name, extra);
                }
            }
            Value::Object(out)
        }
        JsonType::Array => {
            let Some(item_schema) = &schema.item_schema else {
                return base;
            };
            let items = match base {
                Value::Array(items) => items,
                _ => Vec::new(),
            };
            let completed = items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    complete(Some(item), item_schema, &join_path(path, &index.to_string()), gaps)
                })
                .collect();
            Value::Array(completed)
        }
        _ => base,
    }
}

fn clamp(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut clamped = value;
    if let Some(min) = min {
        clamped = clamped.max(min);
    }
    if let Some(max) = max {
        clamped = clamped.min(max);
    }
    clamped
}

fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Value::Number(Number::from(value as i64));
    }
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn join_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}
