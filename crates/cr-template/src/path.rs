use serde_json::{Number, Value};

/// One step of an `each`/`repeat` body. Frames form a stack; `this`,
/// `@index` and `@last` read the innermost frame only. Repeat frames carry
/// no element and no last-flag, so only `@index` resolves inside them.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationFrame {
    pub element: Option<Value>,
    pub index: usize,
    pub is_last: Option<bool>,
}

impl IterationFrame {
    pub fn element(element: Value, index: usize, is_last: bool) -> Self {
        Self {
            element: Some(element),
            index,
            is_last: Some(is_last),
        }
    }

    pub fn counter(index: usize) -> Self {
        Self {
            element: None,
            index,
            is_last: None,
        }
    }
}

/// Resolves a dotted path against the document and the active frame stack.
/// `None` is the Undefined case: missing key, index out of bounds, stepping
/// into a non-container, or a context token with no matching frame. Never
/// errors; callers decide how Undefined renders.
pub fn resolve(path: &str, data: &Value, frames: &[IterationFrame]) -> Option<Value> {
    let segments = split_path(path);
    let (head, rest) = segments.split_first()?;
    match *head {
        "@index" => {
            if !rest.is_empty() {
                return None;
            }
            frames
                .last()
                .map(|frame| Value::Number(Number::from(frame.index as u64)))
        }
        "@last" => {
            if !rest.is_empty() {
                return None;
            }
            frames.last().and_then(|frame| frame.is_last).map(Value::Bool)
        }
        "this" => {
            let base = match frames.last() {
                Some(frame) => frame.element.as_ref()?,
                None => data,
            };
            walk(base, rest).cloned()
        }
        _ => walk(data, &segments).cloned(),
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn walk<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = match current {
            Value::Object(entries) => entries.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
