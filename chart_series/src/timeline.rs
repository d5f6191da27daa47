use itertools::Itertools;
use log::debug;

use crate::data::{Bucket, FieldValue, Row};
use crate::defaults::SECONDS_PER_DAY;
use crate::labels::{format_epoch, parse_epoch_key, start_of_day, DateFormat};

/// Reconstructs a contiguous daily timeline from a sparse bucket set.
///
/// With zero or one distinct timestamp there is no gap to fill and the
/// observed timestamps are returned as-is. Otherwise every day boundary
/// between the minimum and maximum observed timestamps is generated,
/// inclusive of both ends.
pub fn all_timestamps(buckets: &[Bucket]) -> Vec<i64> {
    let observed: Vec<i64> = buckets
        .iter()
        .filter_map(|bucket| parse_epoch_key(&bucket.key))
        .collect();

    if observed.len() <= 1 {
        return observed;
    }

    let Some((start, end)) = observed.iter().copied().minmax().into_option() else {
        return observed;
    };

    (0..)
        .map(|i| start + SECONDS_PER_DAY * i)
        .take_while(|timestamp| *timestamp <= end)
        .collect()
}

fn find_same_day<'a>(buckets: &'a [Bucket], timestamp: i64) -> Option<&'a Bucket> {
    let day = start_of_day(timestamp);
    buckets.iter().find(|bucket| {
        parse_epoch_key(&bucket.key)
            .map(|epoch| start_of_day(epoch) == day)
            .unwrap_or(false)
    })
}

/// Builds one row per generated timestamp, filling days without a backing
/// bucket with the caller-supplied sentinel.
///
/// Matching is same-day, not exact-epoch: upstream timestamps may carry
/// intra-day offsets. The field template comes from the first bucket, so
/// every row exposes the same field set.
pub fn build_trend_rows(buckets: &[Bucket], format: DateFormat, default: &FieldValue) -> Vec<Row> {
    let Some(first) = buckets.first() else {
        return Vec::new();
    };
    let template: Vec<String> = first.metrics.keys().cloned().collect();

    all_timestamps(buckets)
        .into_iter()
        .map(|timestamp| {
            let matched = find_same_day(buckets, timestamp);

            let mut row = Row::new(format_epoch(timestamp, format));
            row.timestamp = Some(timestamp);
            row.key = Some(
                matched
                    .map(|bucket| bucket.key.clone())
                    .unwrap_or_else(|| timestamp.to_string()),
            );

            if let Some(bucket) = matched {
                for (name, value) in &bucket.metrics {
                    row.set(name.clone(), FieldValue::Num(*value));
                }
            }
            for name in &template {
                if row.get(name).is_none() {
                    row.set(name.clone(), default.clone());
                }
            }
            row
        })
        .collect()
}

/// Alternate gap-fill mode: a missing day repeats the previous day's row
/// instead of emitting sentinels. Used by trend reports that accumulate
/// state day over day.
pub fn make_continuous_with_previous(rows: Vec<Row>, format: DateFormat) -> Vec<Row> {
    let observed: Vec<i64> = rows.iter().filter_map(row_timestamp).collect();
    if observed.len() <= 1 {
        return rows;
    }

    let Some((start, end)) = observed.iter().copied().minmax().into_option() else {
        return rows;
    };
    let start = start_of_day(start);

    let mut filled: Vec<Row> = Vec::new();
    let mut day = start;
    while day <= end {
        let matched = rows
            .iter()
            .find(|row| row_timestamp(row).map(start_of_day) == Some(day));
        match matched {
            Some(row) => filled.push(row.clone()),
            None => {
                let Some(previous) = filled.last() else {
                    debug!("No prior row to carry forward at {}", day);
                    day += SECONDS_PER_DAY;
                    continue;
                };
                let mut carried = previous.clone();
                carried.key = Some(day.to_string());
                carried.timestamp = Some(day);
                carried.name = format_epoch(day, format);
                filled.push(carried);
            }
        }
        day += SECONDS_PER_DAY;
    }

    filled
}

fn row_timestamp(row: &Row) -> Option<i64> {
    row.timestamp
        .or_else(|| row.key.as_deref().and_then(parse_epoch_key))
}
