use serde_json::json;

use cr_core::SchemaNode;

/// Schema for the competitive-intelligence report document. Declaration
/// order here fixes the order gaps are reported in.
pub fn competitive_visual_schema() -> SchemaNode {
    SchemaNode::object()
        .required_child("metadata", metadata_schema())
        .required_child("layer_1_hero", hero_schema())
        .required_child("layer_2_visual", visual_schema())
        .required_child("layer_3_cards", cards_schema())
        .child("layer_4_detailed", detailed_schema())
        .child("ui_config", SchemaNode::any())
}

fn metadata_schema() -> SchemaNode {
    SchemaNode::object()
        .required_child(
            "product_name",
            SchemaNode::string().with_default(json!("Unknown Product")),
        )
        .required_child("report_date", SchemaNode::string())
        .required_child("version", SchemaNode::string().with_default(json!("2.0")))
        .child("report_type", SchemaNode::string())
}

fn hero_schema() -> SchemaNode {
    let key_metrics = SchemaNode::object()
        .required_child("arr", SchemaNode::string().with_default(json!("N/A")))
        .required_child("clients", SchemaNode::string().with_default(json!("N/A")))
        .required_child("growth_90d", SchemaNode::string().with_default(json!("N/A")))
        .required_child(
            "replication_difficulty",
            SchemaNode::string()
                .with_enum(vec![
                    json!("easy"),
                    json!("medium"),
                    json!("hard"),
                    json!("extreme"),
                ])
                .with_default(json!("medium")),
        );

    let hero_snapshot = SchemaNode::object()
        .required_child("tagline", SchemaNode::string())
        .required_child("key_metrics", key_metrics);

    let value_curve = SchemaNode::object()
        .required_child("problems", SchemaNode::array(SchemaNode::string()))
        .required_child("solutions", SchemaNode::array(SchemaNode::string()));

    SchemaNode::object()
        .required_child("hero_snapshot", hero_snapshot)
        .required_child("value_curve", value_curve)
}

fn visual_schema() -> SchemaNode {
    let radar_score = SchemaNode::number().with_range(0.0, 5.0);

    let competitor = SchemaNode::object()
        .required_child("name", SchemaNode::string().with_default(json!("Unknown")))
        .required_child("scores", SchemaNode::array(radar_score.clone()));

    let competitive_radar = SchemaNode::object()
        .required_child(
            "dimensions",
            SchemaNode::array(SchemaNode::string()).with_default(json!([
                "Customization",
                "Automation",
                "Openness",
                "Ecosystem",
                "Pricing"
            ])),
        )
        .required_child(
            "scores",
            SchemaNode::array(radar_score).with_default(json!([0, 0, 0, 0, 0])),
        )
        .required_child("competitors", SchemaNode::array(competitor));

    let milestone = SchemaNode::object()
        .required_child("date", SchemaNode::string())
        .required_child("milestone", SchemaNode::string())
        .required_child(
            "type",
            SchemaNode::string()
                .with_enum(vec![
                    json!("funding"),
                    json!("product"),
                    json!("growth"),
                    json!("partnership"),
                    json!("other"),
                ])
                .with_default(json!("other")),
        )
        .required_child("description", SchemaNode::string())
        .child("evidence_url", SchemaNode::string());

    let series_point = SchemaNode::object()
        .required_child("period", SchemaNode::string())
        .required_child("value", SchemaNode::number())
        .required_child("growth_rate", SchemaNode::number());

    let metrics_chart = SchemaNode::object()
        .required_child(
            "revenue_data",
            SchemaNode::array(series_point.clone()).with_default(placeholder_series()),
        )
        .required_child(
            "user_data",
            SchemaNode::array(series_point).with_default(placeholder_series()),
        );

    SchemaNode::object()
        .required_child("competitive_radar", competitive_radar)
        .required_child("growth_timeline", SchemaNode::array(milestone))
        .required_child("metrics_chart", metrics_chart)
}

fn cards_schema() -> SchemaNode {
    let insight_cards = SchemaNode::object()
        .required_child("pain_points", insight_card("Pain Points", "AlertTriangle"))
        .required_child("target_users", insight_card("Target Users", "Users"))
        .required_child("core_scenarios", insight_card("Core Scenarios", "Workflow"))
        .required_child("market_status", insight_card("Market Status", "TrendingUp"))
        .required_child("tech_stack", insight_card("Tech Stack", "Code"))
        .required_child("business_model", insight_card("Business Model", "DollarSign"));

    let founder_info = SchemaNode::object()
        .required_child("name", SchemaNode::string().with_default(json!("Unknown")))
        .required_child("title", SchemaNode::string())
        .child("avatar_url", SchemaNode::string());

    let quadrants = SchemaNode::object()
        .required_child("industry_knowhow", SchemaNode::string())
        .required_child("capital_backing", SchemaNode::string())
        .required_child("channel_resources", SchemaNode::string())
        .required_child("community_influence", SchemaNode::string());

    let founder_moat_canvas = SchemaNode::object()
        .required_child("founder_info", founder_info)
        .required_child("quadrants", quadrants);

    SchemaNode::object()
        .required_child("insight_cards", insight_cards)
        .required_child("founder_moat_canvas", founder_moat_canvas)
}

fn detailed_schema() -> SchemaNode {
    let source = SchemaNode::object()
        .required_child("url", SchemaNode::string())
        .required_child("title", SchemaNode::string().with_default(json!("Untitled")))
        .required_child("source_type", SchemaNode::string())
        .required_child(
            "reliability",
            SchemaNode::number().with_range(1.0, 5.0).with_default(json!(1)),
        );

    let detailed_research = SchemaNode::object()
        .required_child("full_analysis", SchemaNode::string())
        .required_child("methodology", SchemaNode::string())
        .required_child("research_sources", SchemaNode::array(source))
        .required_child("data_gaps", SchemaNode::array(SchemaNode::string()));

    let competitive_analysis = SchemaNode::object()
        .required_child("market_position", SchemaNode::string())
        .required_child("competitive_advantages", SchemaNode::array(SchemaNode::string()))
        .required_child("risks", SchemaNode::array(SchemaNode::string()))
        .required_child("opportunities", SchemaNode::array(SchemaNode::string()));

    SchemaNode::object()
        .required_child("detailed_research", detailed_research)
        .required_child("competitive_analysis", competitive_analysis)
}

fn insight_card(title: &str, icon: &str) -> SchemaNode {
    SchemaNode::object()
        .required_child("title", SchemaNode::string().with_default(json!(title)))
        .required_child("icon", SchemaNode::string().with_default(json!(icon)))
        .required_child(
            "content",
            SchemaNode::string().with_default(json!("Insufficient data.")),
        )
        .child("evidence_url", SchemaNode::string())
}

// Chart components need at least one series point to lay out their axes.
fn placeholder_series() -> serde_json::Value {
    json!([
        {"period": "Q1", "value": 0, "growth_rate": 0},
        {"period": "Q2", "value": 0, "growth_rate": 0},
        {"period": "Q3", "value": 0, "growth_rate": 0},
        {"period": "Q4", "value": 0, "growth_rate": 0}
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_schema_passes_configuration_checks() {
        let schema = competitive_visual_schema();
        cr_schema::check_schema(&schema).expect("schema is well formed");
    }

    #[test]
    fn empty_document_completes_without_error() {
        let schema = competitive_visual_schema();
        let (doc, gaps) = cr_schema::validate(&json!({}), &schema).expect("validate");
        assert!(!gaps.is_empty());
        assert_eq!(doc["metadata"]["product_name"], json!("Unknown Product"));
        assert_eq!(
            doc["layer_2_visual"]["metrics_chart"]["revenue_data"]
                .as_array()
                .map(Vec::len),
            Some(4)
        );
        // Optional sections stay absent rather than defaulting to stubs.
        assert!(doc.get("layer_4_detailed").is_none());
    }

    #[test]
    fn gap_order_follows_schema_declaration_order() {
        let schema = competitive_visual_schema();
        let (_, gaps) = cr_schema::validate(&json!({}), &schema).expect("validate");
        let first_paths: Vec<&str> = gaps.iter().take(4).map(|g| g.field_path.as_str()).collect();
        assert_eq!(
            first_paths,
            vec![
                "metadata",
                "metadata.product_name",
                "metadata.report_date",
                "metadata.version"
            ]
        );
    }
}
