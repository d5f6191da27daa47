use chart_series_report_types::Interval;

use crate::data::{Bucket, FieldValue, Row};
use crate::labels::interval_format;
use crate::normalize::{normalize, resolve_label};
use crate::policy::ReportPolicy;
use crate::sort_slice::sort_and_slice_with_limit;
use crate::stacks::collapse_stacks;
use crate::timeline::build_trend_rows;
use crate::units::convert_duration_fields;

/// Per-invocation parameters supplied by the widget configuration.
#[derive(Clone, Debug)]
pub struct TransformContext {
    /// Primary grouping dimension requested by the widget.
    pub across: String,
    pub interval: Interval,
    /// Widget-level record limit overriding the policy's.
    pub max_records: Option<usize>,
    /// Allow-list applied to bucket keys when grouping by label.
    pub label_filter: Vec<String>,
}

impl TransformContext {
    pub fn new(across: impl Into<String>) -> TransformContext {
        TransformContext {
            across: across.into(),
            interval: Interval::Day,
            max_records: None,
            label_filter: Vec::new(),
        }
    }

    pub fn with_interval(mut self, interval: Interval) -> TransformContext {
        self.interval = interval;
        self
    }

    pub fn with_max_records(mut self, max_records: usize) -> TransformContext {
        self.max_records = Some(max_records);
        self
    }
}

fn filter_buckets<'a>(buckets: &'a [Bucket], ctx: &TransformContext) -> Vec<&'a Bucket> {
    if ctx.across == "label" && !ctx.label_filter.is_empty() {
        buckets
            .iter()
            .filter(|bucket| ctx.label_filter.iter().any(|label| *label == bucket.key))
            .collect()
    } else {
        buckets.iter().collect()
    }
}

/// Transforms one report call's aggregation buckets into chart rows.
///
/// Time-axis calls route through continuous-timeline reconstruction with
/// a zero sentinel; everything else goes through the categorical path
/// (normalize, collapse stacks, sort, slice, reverse). Unit conversion
/// runs last in both paths.
pub fn transform_series(
    buckets: &[Bucket],
    policy: &ReportPolicy,
    ctx: &TransformContext,
) -> Vec<Row> {
    if policy.is_time_axis(&ctx.across) {
        return transform_trend(buckets, policy, ctx, &FieldValue::Num(0.0));
    }

    let filtered = filter_buckets(buckets, ctx);
    let rows: Vec<Row> = filtered
        .into_iter()
        .map(|bucket| categorical_row(bucket, policy))
        .collect();

    let limit = ctx.max_records.unwrap_or(policy.max_records);
    let mut rows = sort_and_slice_with_limit(rows, policy, &ctx.across, limit);
    if let Some(unit) = policy.convert_unit {
        convert_duration_fields(&mut rows, unit);
    }
    rows
}

/// Time-axis variant with a caller-specified sentinel for missing days.
pub fn transform_trend(
    buckets: &[Bucket],
    policy: &ReportPolicy,
    ctx: &TransformContext,
    default: &FieldValue,
) -> Vec<Row> {
    let filtered: Vec<Bucket> = filter_buckets(buckets, ctx)
        .into_iter()
        .cloned()
        .collect();

    let rows = build_trend_rows(&filtered, interval_format(ctx.interval), default);

    let limit = ctx.max_records.unwrap_or(policy.max_records);
    let mut rows = sort_and_slice_with_limit(rows, policy, &ctx.across, limit);
    if let Some(unit) = policy.convert_unit {
        convert_duration_fields(&mut rows, unit);
    }
    rows
}

fn categorical_row(bucket: &Bucket, policy: &ReportPolicy) -> Row {
    if bucket.stacks.is_empty() {
        return normalize(bucket, policy);
    }

    // stacked buckets expose the expanded stack fields instead of the raw
    // metric set
    let mut row = Row::new(resolve_label(bucket, policy.label));
    if !bucket.key.is_empty() {
        row.key = Some(bucket.key.clone());
    }
    if policy.keep_total_with_stacks {
        row.set(
            policy.total_key.clone(),
            FieldValue::Num(bucket.metric_or_zero(&policy.total_key)),
        );
    }
    for (label, value) in collapse_stacks(bucket, policy) {
        row.set(label, FieldValue::Num(value));
    }
    row
}

/// Converts each row's numeric fields to percentages of the row total.
///
/// Visualization mode for percentage-stacked bar charts; a zero total
/// leaves the row untouched rather than dividing by zero.
pub fn to_percentage_stacks(rows: &mut [Row]) {
    for row in rows {
        let total: f64 = row.fields().filter_map(|(_, value)| value.as_num()).sum();
        if total == 0.0 {
            continue;
        }
        let names: Vec<String> = row.field_names().iter().map(|s| s.to_string()).collect();
        for name in names {
            if let Some(value) = row.num(&name) {
                row.set(name, FieldValue::Num(value / total * 100.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyRegistry;
    use chart_series_report_types::ReportKind;

    fn registry() -> PolicyRegistry {
        PolicyRegistry::builtin()
    }

    #[test]
    fn rows_without_stacks_pass_through_in_order() {
        let buckets = vec![
            Bucket::new("admin").with_metric("count", 208.0),
            Bucket::new("viraj").with_metric("count", 41.0),
            Bucket::new("testread").with_metric("count", 31.0),
        ];
        let policy = registry().resolve(ReportKind::JobConfigChanges);
        let rows = transform_series(&buckets, &policy, &TransformContext::new("user_id"));

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "admin");
        assert_eq!(rows[0].num("count"), Some(208.0));
        assert_eq!(rows[2].name, "testread");
        assert_eq!(rows[2].num("count"), Some(31.0));
    }

    #[test]
    fn stacked_rows_expand_date_labelled_fields() {
        let buckets = vec![Bucket::new("admin").with_metric("count", 21.0).with_stacks(vec![
            Bucket::new("1599004800").with_metric("count", 13.0),
            Bucket::new("1598745600").with_metric("count", 7.0),
            Bucket::new("1606176000").with_metric("count", 1.0),
        ])];
        let policy = registry().resolve(ReportKind::JobConfigChanges);
        let rows = transform_series(&buckets, &policy, &TransformContext::new("user_id"));

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.name, "admin");
        assert_eq!(row.num("count"), Some(21.0));
        assert_eq!(row.num("09/02"), Some(13.0));
        assert_eq!(row.num("08/30"), Some(7.0));
        assert_eq!(row.num("11/24"), Some(1.0));
        assert_eq!(
            row.field_names(),
            vec!["count", "09/02", "08/30", "11/24"]
        );
    }

    #[test]
    fn ticket_stacks_drop_the_parent_metric_set() {
        let buckets = vec![Bucket::new("Open").with_metric("total_tickets", 10.0).with_stacks(vec![
            Bucket::new("HIGH").with_metric("total_tickets", 6.0),
            Bucket::new("LOW").with_metric("total_tickets", 4.0),
        ])];
        let policy = registry().resolve(ReportKind::TicketCounts);
        let rows = transform_series(&buckets, &policy, &TransformContext::new("status"));

        assert_eq!(rows[0].num("total_tickets"), None);
        assert_eq!(rows[0].num("HIGH"), Some(6.0));
        assert_eq!(rows[0].num("LOW"), Some(4.0));
    }

    #[test]
    fn time_axis_routes_through_timeline() {
        let d0: i64 = 1599004800;
        let buckets = vec![
            Bucket::new(d0.to_string()).with_metric("total_tickets", 4.0),
            Bucket::new((d0 + 2 * 86400).to_string()).with_metric("total_tickets", 6.0),
        ];
        let policy = registry().resolve(ReportKind::TicketTrend);
        let rows = transform_series(&buckets, &policy, &TransformContext::new("trend"));

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].num("total_tickets"), Some(0.0));
        // timeline order preserved, not value-sorted
        assert_eq!(rows[0].timestamp, Some(d0));
        assert_eq!(rows[2].timestamp, Some(d0 + 2 * 86400));
    }

    #[test]
    fn monthly_interval_reformats_labels_only() {
        // coarser intervals change the label format, not the day-resolution
        // timeline
        let d0: i64 = 1599004800;
        let buckets = vec![
            Bucket::new(d0.to_string()).with_metric("total_tickets", 4.0),
            Bucket::new((d0 + 86400).to_string()).with_metric("total_tickets", 6.0),
        ];
        let policy = registry().resolve(ReportKind::TicketTrend);
        let ctx = TransformContext::new("trend").with_interval(Interval::Month);

        let rows = transform_series(&buckets, &policy, &ctx);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Sep 2020");
        assert_eq!(rows[1].name, "Sep 2020");
    }

    #[test]
    fn label_filter_restricts_buckets() {
        let buckets = vec![
            Bucket::new("infra").with_metric("total_tickets", 4.0),
            Bucket::new("ui").with_metric("total_tickets", 2.0),
            Bucket::new("backend").with_metric("total_tickets", 7.0),
        ];
        let policy = registry().resolve(ReportKind::TicketCounts);
        let mut ctx = TransformContext::new("label");
        ctx.label_filter = vec!["infra".to_string(), "backend".to_string()];

        let rows = transform_series(&buckets, &policy, &ctx);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["backend", "infra"]);
    }

    #[test]
    fn widget_limit_overrides_policy() {
        let buckets: Vec<Bucket> = (0..10)
            .map(|i| Bucket::new(format!("u{}", i)).with_metric("count", i as f64))
            .collect();
        let policy = registry().resolve(ReportKind::JobConfigChanges);
        let ctx = TransformContext::new("user_id").with_max_records(4);

        assert_eq!(transform_series(&buckets, &policy, &ctx).len(), 4);
    }

    #[test]
    fn duration_report_converts_to_minutes() {
        let buckets = vec![Bucket::new("SYSTEM")
            .with_metric("median", 11.0)
            .with_metric("max", 11821.0)
            .with_metric("min", 0.0)];
        let policy = registry().resolve(ReportKind::JobDurations);
        let rows = transform_series(&buckets, &policy, &TransformContext::new("user_id"));

        assert_eq!(rows[0].num("median"), Some(0.0));
        assert_eq!(rows[0].num("max"), Some(197.0));
    }

    #[test]
    fn percentage_stacks_sum_to_hundred() {
        let mut row = Row::new("Open");
        row.set("HIGH", 6.0);
        row.set("LOW", 4.0);
        let mut rows = vec![row];

        to_percentage_stacks(&mut rows);

        assert_eq!(rows[0].num("HIGH"), Some(60.0));
        assert_eq!(rows[0].num("LOW"), Some(40.0));
    }

    #[test]
    fn percentage_stacks_skip_zero_totals() {
        let mut row = Row::new("Open");
        row.set("HIGH", 0.0);
        let mut rows = vec![row];
        to_percentage_stacks(&mut rows);
        assert_eq!(rows[0].num("HIGH"), Some(0.0));
    }
}
