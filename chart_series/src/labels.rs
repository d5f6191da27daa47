use chrono::{DateTime, Datelike, Utc};
use chart_series_report_types::Interval;

use crate::defaults::SECONDS_PER_DAY;

/// Calendar label formats used on chart axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DateFormat {
    /// "09/02" — month/day, the default trend label.
    MonthDay,
    /// "02/09" — day/month, used by day and week intervals.
    DayMonth,
    /// "Sep 2020"
    Month,
    /// "Q3 2020"
    Quarter,
}

/// Maps a trend interval to the label format its x-axis uses.
pub fn interval_format(interval: Interval) -> DateFormat {
    match interval {
        Interval::Day | Interval::Week => DateFormat::DayMonth,
        Interval::Month => DateFormat::Month,
        Interval::Quarter => DateFormat::Quarter,
    }
}

/// Formats an epoch-seconds timestamp as a UTC calendar label.
///
/// Timestamps outside chrono's representable range fall back to the raw
/// number, matching the pipeline's no-failure contract.
pub fn format_epoch(epoch: i64, format: DateFormat) -> String {
    let date = match DateTime::<Utc>::from_timestamp(epoch, 0) {
        Some(date) => date,
        None => return epoch.to_string(),
    };
    match format {
        DateFormat::MonthDay => date.format("%m/%d").to_string(),
        DateFormat::DayMonth => date.format("%d/%m").to_string(),
        DateFormat::Month => date.format("%b %Y").to_string(),
        DateFormat::Quarter => format!("Q{} {}", date.month0() / 3 + 1, date.year()),
    }
}

/// Truncates an epoch-seconds timestamp to its UTC day boundary.
///
/// Upstream timestamps may carry intra-day offsets; bucket matching is
/// done on the truncated value.
pub fn start_of_day(epoch: i64) -> i64 {
    epoch.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY
}

/// Parses a bucket key as an epoch-seconds timestamp.
pub fn parse_epoch_key(key: &str) -> Option<i64> {
    key.trim().parse::<i64>().ok()
}
