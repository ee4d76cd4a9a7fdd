pub mod report_schema;

use std::sync::OnceLock;

use cr_core::{Gap, ReportError, SchemaNode};
use cr_template::TemplateCache;
use serde_json::{json, Value};

/// Versioned template asset for the competitive-intelligence visual report.
pub const COMPETITIVE_VISUAL_TEMPLATE: &str = include_str!("../templates/competitive_visual.html");

const FALLBACK_FRAGMENT: &str =
    "<section class=\"render-fallback\"><p>Insufficient data to render this section.</p></section>";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub html: String,
    pub gaps: Vec<Gap>,
}

fn template_cache() -> &'static TemplateCache {
    static CACHE: OnceLock<TemplateCache> = OnceLock::new();
    CACHE.get_or_init(TemplateCache::new)
}

/// Validates the raw document, then renders the template against the
/// completed document. Template syntax and schema configuration problems
/// are fatal; anything wrong with the data becomes a Gap and a placeholder.
/// An evaluation failure is localized to the failing top-level node, which
/// is replaced by a fallback fragment while the rest of the page survives.
pub fn render(
    raw_doc: &Value,
    template: &str,
    schema: &SchemaNode,
) -> Result<RenderedReport, ReportError> {
    let (mut doc, gaps) = cr_schema::validate(raw_doc, schema)?;
    annotate_document(&mut doc, &gaps);

    let nodes = template_cache().parse_cached(template)?;

    let mut html = String::new();
    for node in nodes.iter() {
        match cr_template::evaluate(std::slice::from_ref(node), &doc) {
            Ok(fragment) => html.push_str(&fragment),
            Err(error) => {
                log::error!(
                    "report section evaluation failed, substituting fallback: {}",
                    error
                );
                html.push_str(FALLBACK_FRAGMENT);
            }
        }
    }

    Ok(RenderedReport { html, gaps })
}

/// Renders with the built-in competitive-intelligence template and schema.
pub fn render_competitive_visual(raw_doc: &Value) -> Result<RenderedReport, ReportError> {
    render(
        raw_doc,
        COMPETITIVE_VISUAL_TEMPLATE,
        &report_schema::competitive_visual_schema(),
    )
}

// Derived values the template reads but the producer never supplies: the
// gap list for the transparency section and the growth direction class.
fn annotate_document(doc: &mut Value, gaps: &[Gap]) {
    let gap_entries: Vec<Value> = gaps
        .iter()
        .map(|gap| {
            json!({
                "field_path": gap.field_path,
                "reason": gap.reason.as_str(),
            })
        })
        .collect();

    if let Value::Object(entries) = doc {
        entries.insert("validation_gaps".to_string(), Value::Array(gap_entries));
    }

    let growth = doc
        .pointer("/layer_1_hero/hero_snapshot/key_metrics/growth_90d")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let class = growth_class(growth);
    if let Some(Value::Object(metadata)) = doc.get_mut("metadata") {
        metadata.insert("growth_class".to_string(), Value::String(class.to_string()));
    }
}

fn growth_class(growth: &str) -> &'static str {
    if growth.starts_with('+') {
        "metric-up"
    } else if growth.starts_with('-') {
        "metric-down"
    } else {
        "metric-flat"
    }
}
