use chart_series_report_types::{ChartMark, Interval};

use crate::data::Row;
use crate::labels::{format_epoch, interval_format};

/// Row attributes that identify a row rather than carry chart data; they
/// pass through the merger unrenamed.
pub const RESERVED_FIELDS: [&str; 5] = ["name", "key", "id", "additional_key", "timestamp"];

/// Metric names rendered as bars; any other numeric field defaults to a
/// line.
const BAR_STYLE_FIELDS: [&str; 5] = [
    "count",
    "total",
    "total_tickets",
    "total_story_points",
    "total_issues",
];

/// Separator between the metric name, series name, and mark tag inside a
/// merged field name.
pub const SERIES_SEPARATOR: &str = "^^";

/// One named, interval-bucketed series feeding the merger.
#[derive(Clone, Debug)]
pub struct SeriesCall {
    pub child_name: String,
    /// Fields that are stacked-bar segments for this call.
    pub stack_keys: Vec<String>,
    pub rows: Vec<Row>,
}

impl SeriesCall {
    pub fn new(child_name: impl Into<String>, rows: Vec<Row>) -> SeriesCall {
        SeriesCall {
            child_name: child_name.into(),
            stack_keys: Vec::new(),
            rows,
        }
    }

    pub fn with_stack_keys(mut self, stack_keys: Vec<String>) -> SeriesCall {
        self.stack_keys = stack_keys;
        self
    }
}

fn mark_for(call: &SeriesCall, field: &str) -> ChartMark {
    if call.stack_keys.iter().any(|key| key == field) {
        ChartMark::StackedBar
    } else if BAR_STYLE_FIELDS.contains(&field) {
        ChartMark::Bar
    } else {
        ChartMark::Line
    }
}

fn series_field_name(call: &SeriesCall, field: &str) -> String {
    format!(
        "{field}{sep}{child}{sep}{mark}",
        field = field,
        sep = SERIES_SEPARATOR,
        child = call.child_name,
        mark = mark_for(call, field).tag()
    )
}

/// Merges several independently-fetched time series onto one shared
/// timeline keyed by timestamp.
///
/// Every non-reserved field is renamed to
/// `metric^^series^^{bar|line|stack}` so the chart can route each merged
/// field to its mark. Rows sharing a timestamp merge field-wise; later
/// calls add fields but never replace earlier ones. After sorting by
/// timestamp, each row's name is recomputed from its timestamp with the
/// interval's label format, so display label and sort key cannot
/// disagree.
pub fn merge_time_series(calls: &[SeriesCall], interval: Interval) -> Vec<Row> {
    let mut merged: Vec<Row> = Vec::new();

    for call in calls {
        for row in &call.rows {
            let Some(timestamp) = row.timestamp else {
                log::debug!(
                    "Skipping row '{}' of series '{}' without timestamp",
                    row.name,
                    call.child_name
                );
                continue;
            };

            let position = merged
                .iter()
                .position(|merged| merged.timestamp == Some(timestamp));
            let target = match position {
                Some(position) => &mut merged[position],
                None => {
                    let mut fresh = Row::new("");
                    fresh.timestamp = Some(timestamp);
                    fresh.key = row.key.clone();
                    merged.push(fresh);
                    merged.last_mut().expect("just pushed")
                }
            };

            for (field, value) in row.fields() {
                let name = if RESERVED_FIELDS.contains(&field) {
                    field.to_string()
                } else {
                    series_field_name(call, field)
                };
                // added to, not replacing
                if target.get(&name).is_none() {
                    target.set(name, value.clone());
                }
            }
        }
    }

    merged.sort_by_key(|row| row.timestamp);
    let format = interval_format(interval);
    for row in &mut merged {
        if let Some(timestamp) = row.timestamp {
            row.name = format_epoch(timestamp, format);
        }
    }
    merged
}
