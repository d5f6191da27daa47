use itertools::Itertools;

use crate::data::Bucket;
use crate::normalize::resolve_label;
use crate::policy::ReportPolicy;

/// Expands a bucket's nested stacks into named numeric fields, collapsing
/// entries beyond the policy's top-N into a single overflow field.
///
/// The overflow value accounts both for the explicitly dropped entries
/// and for any residual gap between the parent total and the sum of
/// reported sub-groups (ungrouped remainder from the backend).
///
/// Entries tying on value keep their original relative order: the window
/// cut must be reproducible across invocations.
pub fn collapse_stacks(bucket: &Bucket, policy: &ReportPolicy) -> Vec<(String, f64)> {
    if bucket.stacks.is_empty() {
        return Vec::new();
    }

    let total_key = policy.total_key.as_str();
    // stable: ties preserve insertion order
    let entries = bucket
        .stacks
        .iter()
        .sorted_by(|a, b| {
            b.metric_or_zero(total_key)
                .total_cmp(&a.metric_or_zero(total_key))
        })
        .collect_vec();

    let top_n = policy.top_n_stacks;
    let mut collapsed: Vec<(String, f64)> = Vec::new();
    let mut visible_total = 0.0;
    for &entry in entries.iter().take(top_n) {
        let value = entry.metric_or_zero(total_key);
        let label = resolve_label(entry, policy.stack_label);
        visible_total += value;
        match collapsed.iter_mut().find(|(name, _)| *name == label) {
            Some((_, existing)) => *existing += value,
            None => collapsed.push((label, value)),
        }
    }

    let overflow: f64 = entries
        .iter()
        .skip(top_n)
        .map(|entry| entry.metric_or_zero(total_key))
        .sum();

    let parent_total = bucket.metric_or_zero(total_key);
    let missing = (parent_total - (visible_total + overflow)).max(0.0);

    if overflow + missing > 0.0 {
        collapsed.push((policy.overflow_label.as_str().to_string(), overflow + missing));
    }

    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::DateFormat;
    use crate::policy::{LabelRule, OverflowLabel};
    use chart_series_report_types::ReportKind;

    fn policy() -> ReportPolicy {
        ReportPolicy::fallback(ReportKind::TicketCounts)
    }

    fn stack(key: &str, count: f64) -> Bucket {
        Bucket::new(key).with_metric("count", count)
    }

    #[test]
    fn no_stacks_yields_empty_map() {
        let bucket = Bucket::new("admin").with_metric("count", 21.0);
        assert!(collapse_stacks(&bucket, &policy()).is_empty());
    }

    #[test]
    fn expands_within_top_n() {
        let bucket = Bucket::new("admin").with_metric("count", 21.0).with_stacks(vec![
            stack("1599004800", 13.0),
            stack("1598745600", 7.0),
            stack("1606176000", 1.0),
        ]);
        let mut policy = policy();
        policy.stack_label = LabelRule::EpochDate(DateFormat::MonthDay);

        let collapsed = collapse_stacks(&bucket, &policy);
        assert_eq!(
            collapsed,
            vec![
                ("09/02".to_string(), 13.0),
                ("08/30".to_string(), 7.0),
                ("11/24".to_string(), 1.0),
            ]
        );
    }

    #[test]
    fn ties_keep_original_order() {
        let bucket = Bucket::new("x").with_metric("count", 17.0).with_stacks(vec![
            stack("a", 8.0),
            stack("b", 8.0),
            stack("c", 1.0),
        ]);
        let mut policy = policy();
        policy.top_n_stacks = 2;

        let collapsed = collapse_stacks(&bucket, &policy);
        assert_eq!(collapsed[0].0, "a");
        assert_eq!(collapsed[1].0, "b");
        assert_eq!(collapsed[2], ("Other".to_string(), 1.0));
    }

    #[test]
    fn overflow_absorbs_dropped_entries() {
        let stacks: Vec<Bucket> = (0..12)
            .map(|i| stack(&format!("s{}", i), (12 - i) as f64))
            .collect();
        // parent total equals the stack sum: 12+11+...+1
        let bucket = Bucket::new("x").with_metric("count", 78.0).with_stacks(stacks);

        let collapsed = collapse_stacks(&bucket, &policy());
        assert_eq!(collapsed.len(), 11);
        // top 10 are 12..3, overflow is 2 + 1
        assert_eq!(collapsed[10], ("Other".to_string(), 3.0));
        let total: f64 = collapsed.iter().map(|(_, value)| value).sum();
        assert_eq!(total, 78.0);
    }

    #[test]
    fn missing_remainder_joins_overflow() {
        // parent reports 30 but sub-groups only account for 21
        let bucket = Bucket::new("x").with_metric("count", 30.0).with_stacks(vec![
            stack("a", 13.0),
            stack("b", 8.0),
        ]);

        let collapsed = collapse_stacks(&bucket, &policy());
        assert_eq!(collapsed.last().unwrap(), &("Other".to_string(), 9.0));
        let total: f64 = collapsed.iter().map(|(_, value)| value).sum();
        assert_eq!(total, 30.0);
    }

    #[test]
    fn exact_cover_adds_no_overflow() {
        let bucket = Bucket::new("x").with_metric("count", 21.0).with_stacks(vec![
            stack("a", 13.0),
            stack("b", 8.0),
        ]);
        let collapsed = collapse_stacks(&bucket, &policy());
        assert_eq!(collapsed.len(), 2);
        assert!(collapsed.iter().all(|(name, _)| name != "Other"));
    }

    #[test]
    fn unestimated_label_for_story_point_stacks() {
        let mut policy = policy();
        policy.overflow_label = OverflowLabel::Unestimated;
        let bucket = Bucket::new("x").with_metric("count", 10.0).with_stacks(vec![
            stack("a", 4.0),
        ]);
        let collapsed = collapse_stacks(&bucket, &policy);
        assert_eq!(collapsed.last().unwrap(), &("Unestimated".to_string(), 6.0));
    }

    #[test]
    fn duplicate_labels_accumulate() {
        // two stack entries resolving to the same display label merge
        let bucket = Bucket::new("x").with_metric("count", 9.0).with_stacks(vec![
            Bucket::new("u1").with_additional_key("Alice").with_metric("count", 5.0),
            Bucket::new("u2").with_additional_key("Alice").with_metric("count", 4.0),
        ]);
        let mut policy = policy();
        policy.stack_label = LabelRule::PreferAdditional;

        let collapsed = collapse_stacks(&bucket, &policy);
        assert_eq!(collapsed, vec![("Alice".to_string(), 9.0)]);
    }
}
