use crate::data::{Bucket, FieldValue, Row};
use crate::defaults::UNKNOWN_LABEL;
use crate::labels::{format_epoch, parse_epoch_key};
use crate::policy::{LabelRule, ReportPolicy};

/// Resolves a bucket's display name under a label rule.
///
/// An empty resolution collapses to the `UNKNOWN` sentinel rather than
/// being dropped, so every output row carries a name.
pub fn resolve_label(bucket: &Bucket, rule: LabelRule) -> String {
    let label = match rule {
        LabelRule::RawKey => bucket.key.clone(),
        LabelRule::PreferAdditional => bucket
            .additional_key
            .clone()
            .filter(|additional| !additional.is_empty())
            .unwrap_or_else(|| bucket.key.clone()),
        LabelRule::AdditionalSlashKey => match &bucket.additional_key {
            Some(additional) if !additional.is_empty() => {
                format!("{}/{}", additional, bucket.key)
            }
            _ => bucket.key.clone(),
        },
        LabelRule::EpochDate(format) => match parse_epoch_key(&bucket.key) {
            Some(epoch) => format_epoch(epoch, format),
            None => bucket.key.clone(),
        },
    };

    if label.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        label
    }
}

/// Converts one aggregation bucket into a named row.
///
/// Copies all metric fields under their original names; nested stacks are
/// not expanded here (the collapser owns that).
pub fn normalize(bucket: &Bucket, policy: &ReportPolicy) -> Row {
    let mut row = Row::new(resolve_label(bucket, policy.label));
    if !bucket.key.is_empty() {
        row.key = Some(bucket.key.clone());
    }
    for (name, value) in &bucket.metrics {
        row.set(name.clone(), FieldValue::Num(*value));
    }
    row
}
