use chart_series_report_types::SortOrder;

use crate::data::Row;
use crate::policy::ReportPolicy;

/// Applies the report's sort key and direction, then slices to the record
/// limit, then optionally reverses for display.
///
/// When the across dimension is itself a time axis, value sorting is
/// skipped: timeline order produced upstream must be preserved. The
/// optional reversal is applied after slicing, never before.
pub fn sort_and_slice(rows: Vec<Row>, policy: &ReportPolicy, across: &str) -> Vec<Row> {
    sort_and_slice_with_limit(rows, policy, across, policy.max_records)
}

/// Same as [`sort_and_slice`] with a widget-level record limit overriding
/// the policy's.
pub fn sort_and_slice_with_limit(
    mut rows: Vec<Row>,
    policy: &ReportPolicy,
    across: &str,
    max_records: usize,
) -> Vec<Row> {
    if !policy.is_time_axis(across) {
        if let Some(sort_key) = policy.sort_key.as_deref() {
            // stable: equal values keep backend order
            match policy.sort_order {
                SortOrder::Descending => rows.sort_by(|a, b| {
                    b.num_or_zero(sort_key).total_cmp(&a.num_or_zero(sort_key))
                }),
                SortOrder::Ascending => rows.sort_by(|a, b| {
                    a.num_or_zero(sort_key).total_cmp(&b.num_or_zero(sort_key))
                }),
            }
        }
    }

    let keep = max_records.min(rows.len());
    let start = if policy.slice_from_end {
        rows.len().saturating_sub(keep)
    } else {
        0
    };
    let end = if policy.slice_from_end { rows.len() } else { keep };
    let mut rows: Vec<Row> = rows.drain(start..end).collect();

    if policy.should_reverse {
        rows.reverse();
    }
    rows
}
