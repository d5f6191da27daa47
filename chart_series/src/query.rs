use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use chart_series_report_types::ReportKind;

/// Widget-side filter selections, as entered in the configuration form.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FilterSelections {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub states: Vec<i64>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub templates: Vec<String>,
}

/// Backend aggregation request derived from widget selections.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportQuery {
    pub across: String,
    pub filter: Map<String, Value>,
}

fn string_list(values: &[String]) -> Value {
    Value::Array(values.iter().map(|v| Value::String(v.clone())).collect())
}

fn int_list(values: &[i64]) -> Value {
    Value::Array(values.iter().map(|v| Value::from(*v)).collect())
}

/// Builds the filter payload for a report call.
///
/// Selection keys map onto the backend's filter keys (`tags` →
/// `tag_ids`, `states` → `state_ids`, ...); empty selections are omitted
/// entirely. Family-specific selections only apply where the backend
/// understands them: work-item state filters and assessment template
/// filters are meaningless on other aggregations and are dropped there.
pub fn build_report_query(
    kind: ReportKind,
    across: &str,
    selections: &FilterSelections,
) -> ReportQuery {
    let mut filter = Map::new();

    if !selections.states.is_empty() && kind == ReportKind::WorkItemCounts {
        filter.insert("state_ids".to_string(), int_list(&selections.states));
    }
    if !selections.templates.is_empty() && kind == ReportKind::AssessmentCounts {
        filter.insert(
            "questionnaire_template_ids".to_string(),
            string_list(&selections.templates),
        );
    }
    if !selections.tags.is_empty() {
        filter.insert("tag_ids".to_string(), string_list(&selections.tags));
    }
    if !selections.products.is_empty() {
        filter.insert("product_ids".to_string(), string_list(&selections.products));
    }
    if !selections.assignees.is_empty() {
        filter.insert("user_ids".to_string(), string_list(&selections.assignees));
    }

    ReportQuery {
        across: across.to_string(),
        filter,
    }
}
