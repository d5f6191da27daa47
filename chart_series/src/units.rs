use crate::data::{FieldValue, Row};
use crate::defaults::{SECONDS_PER_DAY, SECONDS_PER_MINUTE};

/// Target unit for duration-valued fields, per report policy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DurationUnit {
    Minutes,
    Days,
}

/// Field names that carry second-valued durations in backend payloads.
pub const DURATION_FIELDS: [&str; 5] = ["min", "max", "median", "mean", "sum"];

/// Rescales one second-valued measurement.
///
/// Minutes round to the nearest whole minute; days keep two decimal
/// places so sub-day resolutions stay visible on the chart.
pub fn convert_seconds(value: f64, unit: DurationUnit) -> f64 {
    match unit {
        DurationUnit::Minutes => (value / SECONDS_PER_MINUTE as f64).round(),
        DurationUnit::Days => ((value / SECONDS_PER_DAY as f64) * 100.0).round() / 100.0,
    }
}

/// Rescales the known duration fields on every row in place.
///
/// Text sentinels and absent fields are left untouched.
pub fn convert_duration_fields(rows: &mut [Row], unit: DurationUnit) {
    for row in rows {
        for field in DURATION_FIELDS {
            if let Some(value) = row.num(field) {
                row.set(field, FieldValue::Num(convert_seconds(value, unit)));
            }
        }
    }
}
