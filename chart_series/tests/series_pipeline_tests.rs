use chart_series::data::{Bucket, FieldValue};
use chart_series::policy::PolicyRegistry;
use chart_series::series::{transform_series, transform_trend, TransformContext};
use chart_series_report_types::ReportKind;
use serde_json::json;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const DAY: i64 = 86400;
const D0: i64 = 1599004800; // 2020-09-02 UTC

#[test]
fn config_change_rows_pass_through_in_input_order() {
    init_logs();
    let payload = json!([
        {"key": "admin", "count": 208},
        {"key": "viraj", "count": 41},
        {"key": "testread", "count": 31},
        {"key": "meghana", "count": 9},
        {"key": "ishan", "count": 3},
        {"key": "gershon", "count": 2}
    ]);
    let buckets = Bucket::from_payload(&payload);
    let policy = PolicyRegistry::builtin().resolve(ReportKind::JobConfigChanges);

    let rows = transform_series(&buckets, &policy, &TransformContext::new("user_id"));

    let expected = [
        ("admin", 208.0),
        ("viraj", 41.0),
        ("testread", 31.0),
        ("meghana", 9.0),
        ("ishan", 3.0),
        ("gershon", 2.0),
    ];
    assert_eq!(rows.len(), expected.len());
    for (row, (name, count)) in rows.iter().zip(expected) {
        assert_eq!(row.name, name);
        assert_eq!(row.num("count"), Some(count));
    }
}

#[test]
fn stacked_config_changes_expand_to_date_fields() {
    init_logs();
    let payload = json!([
        {
            "count": 21,
            "key": "admin",
            "stacks": [
                {"key": "1599004800", "count": 13},
                {"key": "1598745600", "count": 7},
                {"key": "1606176000", "count": 1}
            ]
        },
        {
            "count": 2,
            "key": "viraj",
            "stacks": [{"key": "1606176000", "count": 2}]
        }
    ]);
    let buckets = Bucket::from_payload(&payload);
    let policy = PolicyRegistry::builtin().resolve(ReportKind::JobConfigChanges);

    let rows = transform_series(&buckets, &policy, &TransformContext::new("user_id"));

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "admin");
    assert_eq!(rows[0].num("count"), Some(21.0));
    assert_eq!(rows[0].num("09/02"), Some(13.0));
    assert_eq!(rows[0].num("08/30"), Some(7.0));
    assert_eq!(rows[0].num("11/24"), Some(1.0));

    assert_eq!(rows[1].name, "viraj");
    assert_eq!(rows[1].num("count"), Some(2.0));
    assert_eq!(rows[1].num("11/24"), Some(2.0));
}

#[test]
fn empty_payload_yields_empty_series() {
    init_logs();
    let buckets = Bucket::from_payload(&json!([]));
    let policy = PolicyRegistry::builtin().resolve(ReportKind::JobConfigChanges);
    assert!(transform_series(&buckets, &policy, &TransformContext::new("user_id")).is_empty());
}

#[test]
fn stack_collapse_conserves_the_parent_total() {
    init_logs();
    // 15 stack entries summing to 120, parent reports 130: the overflow
    // field must absorb both the dropped entries and the missing 10.
    let stacks: Vec<serde_json::Value> = (1..=15)
        .map(|i| json!({"key": format!("assignee-{}", i), "total_tickets": i}))
        .collect();
    let payload = json!([{"key": "Open", "total_tickets": 130, "stacks": stacks}]);
    let buckets = Bucket::from_payload(&payload);
    let policy = PolicyRegistry::builtin().resolve(ReportKind::TicketCounts);

    let rows = transform_series(&buckets, &policy, &TransformContext::new("status"));

    let total: f64 = rows[0]
        .fields()
        .filter_map(|(_, value)| value.as_num())
        .sum();
    assert_eq!(total, 130.0);
    assert_eq!(rows[0].num("Other"), Some(15.0 + 10.0));
}

#[test]
fn trend_timeline_fills_the_missing_day() {
    init_logs();
    let payload = json!([
        {"key": D0.to_string(), "total_tickets": 4},
        {"key": (D0 + 2 * DAY).to_string(), "total_tickets": 6}
    ]);
    let buckets = Bucket::from_payload(&payload);
    let policy = PolicyRegistry::builtin().resolve(ReportKind::TicketTrend);

    let rows = transform_series(&buckets, &policy, &TransformContext::new("trend"));

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].num("total_tickets"), Some(4.0));
    assert_eq!(rows[1].num("total_tickets"), Some(0.0));
    assert_eq!(rows[2].num("total_tickets"), Some(6.0));
    assert_eq!(rows[1].timestamp, Some(D0 + DAY));
}

#[test]
fn trend_sentinel_can_be_textual() {
    init_logs();
    let payload = json!([
        {"key": D0.to_string(), "total_tickets": 4},
        {"key": (D0 + 2 * DAY).to_string(), "total_tickets": 6}
    ]);
    let buckets = Bucket::from_payload(&payload);
    let policy = PolicyRegistry::builtin().resolve(ReportKind::TicketTrend);

    let rows = transform_trend(
        &buckets,
        &policy,
        &TransformContext::new("trend"),
        &FieldValue::no_data(),
    );

    assert_eq!(
        rows[1].get("total_tickets"),
        Some(&FieldValue::Text("No Data".to_string()))
    );
}

#[test]
fn resolution_times_convert_to_days_end_to_end() {
    init_logs();
    let payload = json!([
        {"key": "u-1", "additional_key": "Alice", "median": 172800, "min": 43200, "max": 259200}
    ]);
    let buckets = Bucket::from_payload(&payload);
    let policy = PolicyRegistry::builtin().resolve(ReportKind::ResolutionTimes);

    let rows = transform_series(&buckets, &policy, &TransformContext::new("assignee"));

    assert_eq!(rows[0].name, "Alice");
    assert_eq!(rows[0].num("median"), Some(2.0));
    assert_eq!(rows[0].num("min"), Some(0.5));
    assert_eq!(rows[0].num("max"), Some(3.0));
}

#[test]
fn malformed_payloads_degrade_to_empty_not_error() {
    init_logs();
    let policy = PolicyRegistry::builtin().resolve(ReportKind::TicketCounts);
    for payload in [json!(null), json!("text"), json!({"key": "a"}), json!(42)] {
        let buckets = Bucket::from_payload(&payload);
        assert!(transform_series(&buckets, &policy, &TransformContext::new("status")).is_empty());
    }
}
