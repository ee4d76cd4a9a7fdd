use cr_core::{display_text, is_truthy, ContextKind, ReportError, SectionKind, TemplateNode};
use serde_json::Value;

use crate::path::{resolve, IterationFrame};

// Upper bound on node visits plus iteration steps for one evaluate() call.
// Hitting it means the node tree or the data drive a runaway expansion; the
// assembler treats that as an internal failure and substitutes a fallback.
const EVAL_BUDGET: usize = 1_000_000;

/// Renders a parsed node tree against a validated document. Never fails on
/// data content; the only error is the budget guard tripping.
pub fn evaluate(nodes: &[TemplateNode], data: &Value) -> Result<String, ReportError> {
    let mut frames: Vec<IterationFrame> = Vec::new();
    let mut output = String::new();
    let mut budget = EVAL_BUDGET;
    evaluate_nodes(nodes, data, &mut frames, &mut output, &mut budget)?;
    Ok(output)
}

fn evaluate_nodes(
    nodes: &[TemplateNode],
    data: &Value,
    frames: &mut Vec<IterationFrame>,
    output: &mut String,
    budget: &mut usize,
) -> Result<(), ReportError> {
    for node in nodes {
        spend(budget)?;
        match node {
            TemplateNode::Literal { text } => output.push_str(text),
            TemplateNode::Variable { path, raw } => {
                let Some(value) = resolve(path, data, frames) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                let text = display_text(&value);
                if *raw {
                    output.push_str(&text);
                } else {
                    output.push_str(&escape_html(&text));
                }
            }
            TemplateNode::ContextRef { context } => {
                let Some(frame) = frames.last() else {
                    continue;
                };
                match context {
                    ContextKind::Index => output.push_str(&frame.index.to_string()),
                    ContextKind::Last => {
                        if let Some(is_last) = frame.is_last {
                            output.push_str(if is_last { "true" } else { "false" });
                        }
                    }
                    ContextKind::This => {
                        if let Some(element) = &frame.element {
                            output.push_str(&escape_html(&display_text(element)));
                        }
                    }
                }
            }
            TemplateNode::Section {
                section,
                path,
                body,
                else_body,
            } => {
                let resolved = resolve(path, data, frames);
                match section {
                    SectionKind::If => {
                        if is_truthy(resolved.as_ref()) {
                            evaluate_nodes(body, data, frames, output, budget)?;
                        } else if let Some(else_body) = else_body {
                            evaluate_nodes(else_body, data, frames, output, budget)?;
                        }
                    }
                    SectionKind::Unless => {
                        if !is_truthy(resolved.as_ref()) {
                            evaluate_nodes(body, data, frames, output, budget)?;
                        }
                    }
                    SectionKind::Each => {
                        let Some(Value::Array(items)) = resolved else {
                            continue;
                        };
                        let count = items.len();
                        for (index, item) in items.into_iter().enumerate() {
                            spend(budget)?;
                            frames.push(IterationFrame::element(item, index, index + 1 == count));
                            let result = evaluate_nodes(body, data, frames, output, budget);
                            frames.pop();
                            result?;
                        }
                    }
                }
            }
            TemplateNode::Repeat { path, body } => {
                let count = repeat_count(resolve(path, data, frames));
                for index in 0..count {
                    spend(budget)?;
                    frames.push(IterationFrame::counter(index));
                    let result = evaluate_nodes(body, data, frames, output, budget);
                    frames.pop();
                    result?;
                }
            }
        }
    }
    Ok(())
}

fn spend(budget: &mut usize) -> Result<(), ReportError> {
    if *budget == 0 {
        return Err(ReportError::new(
            "EVAL_BUDGET_EXCEEDED",
            "Evaluation exceeded its node budget.",
        ));
    }
    *budget -= 1;
    Ok(())
}

// Negative, fractional or non-numeric counts collapse to zero iterations.
fn repeat_count(value: Option<Value>) -> usize {
    let Some(Value::Number(number)) = value else {
        return 0;
    };
    match number.as_i64() {
        Some(count) if count > 0 => count as usize,
        Some(_) => 0,
        None => number
            .as_f64()
            .filter(|count| *count > 0.0 && count.fract() == 0.0)
            .map(|count| count as usize)
            .unwrap_or(0),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
