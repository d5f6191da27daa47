use std::collections::HashMap;

use chart_series_report_types::ReportKind;

use crate::data::Row;
use crate::labels::parse_epoch_key;

/// One underlying query of a multi-source widget, with its already
/// transformed rows.
#[derive(Clone, Debug)]
pub struct CompositeCall {
    pub id: String,
    pub kind: ReportKind,
    /// User-visible name of the child query; falls back to the call index
    /// when unnamed.
    pub child_name: Option<String>,
    /// Whether the widget is configured as a composite. A lone
    /// non-composite call passes through untouched.
    pub composite: bool,
    /// Display-name mapping for fields originating from this call, so
    /// tooltips remain distinguishable after merging.
    pub field_names: HashMap<String, String>,
    pub rows: Vec<Row>,
}

impl CompositeCall {
    pub fn new(id: impl Into<String>, kind: ReportKind, rows: Vec<Row>) -> CompositeCall {
        CompositeCall {
            id: id.into(),
            kind,
            child_name: None,
            composite: true,
            field_names: HashMap::new(),
            rows,
        }
    }

    pub fn with_child_name(mut self, child_name: impl Into<String>) -> CompositeCall {
        self.child_name = Some(child_name.into());
        self
    }
}

fn merged_field_name(call: &CompositeCall, field: &str, suffix: &str) -> String {
    match call.field_names.get(field) {
        Some(mapped) => format!("{}-{}", mapped, suffix),
        None => format!("{}-{}", field, suffix),
    }
}

fn numeric_key(row: &Row) -> f64 {
    row.key
        .as_deref()
        .and_then(parse_epoch_key)
        .map(|key| key as f64)
        .unwrap_or(f64::INFINITY)
}

/// Merges the transformed outputs of several concurrently-invoked report
/// calls into one row sequence keyed by category name.
///
/// Category identity is name-based: rows with the same name across calls
/// merge into one output row. Field names are suffixed with the child
/// name (or call index) so same-named metrics from different calls stay
/// apart; a collision after suffixing gets the suffix a second time.
/// Output is ordered by ascending numeric key so timestamp-keyed
/// composites come out chronological.
pub fn multiplex(calls: Vec<CompositeCall>) -> Vec<Row> {
    if calls.len() == 1 && !calls[0].composite {
        let mut calls = calls;
        return calls.remove(0).rows;
    }

    let mut merged: Vec<Row> = Vec::new();
    for (index, call) in calls.iter().enumerate() {
        let suffix = call
            .child_name
            .clone()
            .unwrap_or_else(|| index.to_string());

        for row in &call.rows {
            let position = merged.iter().position(|merged| merged.name == row.name);
            let target = match position {
                Some(position) => &mut merged[position],
                None => {
                    merged.push(Row::new(row.name.clone()));
                    merged.last_mut().expect("just pushed")
                }
            };
            if target.key.is_none() {
                target.key = row.key.clone();
            }
            if target.timestamp.is_none() {
                target.timestamp = row.timestamp;
            }

            for (field, value) in row.fields() {
                let mut name = merged_field_name(call, field, &suffix);
                if target.get(&name).is_some() {
                    name = format!("{}-{}", name, suffix);
                }
                target.set(name, value.clone());
            }
        }
    }

    merged.sort_by(|a, b| numeric_key(a).total_cmp(&numeric_key(b)));
    merged
}
