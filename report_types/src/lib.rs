use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

/// Closed set of report families handled by the pipeline.
///
/// Every family maps to exactly one policy entry in the registry. The
/// variants carry their external wire identifier, which is what widget
/// configurations and backend payloads use to select a report.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Per-user CI configuration change counts.
    JobConfigChanges,
    /// CI job run counts grouped by an arbitrary dimension.
    JobCounts,
    /// CI job run durations (seconds) grouped by an arbitrary dimension.
    JobDurations,
    /// Ticket counts, optionally stacked by a secondary dimension.
    TicketCounts,
    /// Ticket counts bucketed over time.
    TicketTrend,
    /// Static-analysis issue counts.
    IssueCounts,
    /// Assessment completion counts.
    AssessmentCounts,
    /// Work-item counts.
    WorkItemCounts,
    /// Issue resolution times (seconds).
    ResolutionTimes,
    /// Backlog size bucketed over time.
    BacklogTrend,
    /// Time to first response on issues (seconds).
    FirstResponseTimes,
    /// Pull-request activity grouped by author or time.
    PrActivity,
}

impl ReportKind {
    pub const ALL: [ReportKind; 12] = [
        ReportKind::JobConfigChanges,
        ReportKind::JobCounts,
        ReportKind::JobDurations,
        ReportKind::TicketCounts,
        ReportKind::TicketTrend,
        ReportKind::IssueCounts,
        ReportKind::AssessmentCounts,
        ReportKind::WorkItemCounts,
        ReportKind::ResolutionTimes,
        ReportKind::BacklogTrend,
        ReportKind::FirstResponseTimes,
        ReportKind::PrActivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::JobConfigChanges => "job_config_change_counts",
            ReportKind::JobCounts => "jobs_count_report",
            ReportKind::JobDurations => "jobs_duration_report",
            ReportKind::TicketCounts => "tickets_report",
            ReportKind::TicketTrend => "tickets_report_trends",
            ReportKind::IssueCounts => "issues_report",
            ReportKind::AssessmentCounts => "assessment_count_report",
            ReportKind::WorkItemCounts => "workitem_count_report",
            ReportKind::ResolutionTimes => "resolution_time_report",
            ReportKind::BacklogTrend => "backlog_trend_report",
            ReportKind::FirstResponseTimes => "issue_first_response_report",
            ReportKind::PrActivity => "pr_activity_report",
        }
    }

    /// Whether the family's primary axis is a time dimension and therefore
    /// goes through continuous-timeline reconstruction.
    pub fn is_trend(&self) -> bool {
        matches!(self, ReportKind::TicketTrend | ReportKind::BacklogTrend)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| anyhow!("Unknown report type: '{}'", s))
    }
}

/// Time bucket width of a trend report.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interval {
    Day,
    Week,
    Month,
    Quarter,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Day => "day",
            Interval::Week => "week",
            Interval::Month => "month",
            Interval::Quarter => "quarter",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Interval::Day),
            "week" => Ok(Interval::Week),
            "month" => Ok(Interval::Month),
            "quarter" => Ok(Interval::Quarter),
            _ => Err(anyhow!(
                "Invalid interval: '{}'. Valid values are 'day', 'week', 'month', 'quarter'",
                s
            )),
        }
    }
}

/// Visualization hint attached to merged multi-series fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChartMark {
    Bar,
    Line,
    StackedBar,
}

impl ChartMark {
    /// Short tag embedded in merged field names.
    pub fn tag(&self) -> &'static str {
        match self {
            ChartMark::Bar => "bar",
            ChartMark::Line => "line",
            ChartMark::StackedBar => "stack",
        }
    }
}

/// Direction applied by the sort/slice engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(anyhow!(
                "Invalid sort order: '{}'. Valid values are 'asc' or 'desc'",
                s
            )),
        }
    }
}
