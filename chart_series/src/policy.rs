use std::collections::HashMap;
use std::str::FromStr;

use anyhow::anyhow;
use chart_series_report_types::{ReportKind, SortOrder};

use crate::defaults::{DEFAULT_MAX_RECORDS, DEFAULT_TOP_N_STACKS};
use crate::labels::DateFormat;
use crate::units::DurationUnit;

/// Label of the synthetic field that absorbs collapsed stack entries.
///
/// Story-point-like stacking dimensions call their remainder
/// "Unestimated"; everything else calls it "Other". This is an explicit
/// policy choice, never inferred from display labels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OverflowLabel {
    Other,
    Unestimated,
}

impl OverflowLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowLabel::Other => "Other",
            OverflowLabel::Unestimated => "Unestimated",
        }
    }
}

impl FromStr for OverflowLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "other" => Ok(OverflowLabel::Other),
            "unestimated" => Ok(OverflowLabel::Unestimated),
            _ => Err(anyhow!(
                "Invalid overflow label: '{}'. Valid values are 'other' or 'unestimated'",
                s
            )),
        }
    }
}

/// How a bucket's display name is derived.
///
/// The closed set of label strategies the registry can attach to a
/// report; applied identically to parent buckets and stack entries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LabelRule {
    /// The raw aggregation key.
    RawKey,
    /// The human-readable `additional_key` when present (assignee and
    /// reporter groupings), else the raw key.
    PreferAdditional,
    /// `additional_key/key` composite when both are present.
    AdditionalSlashKey,
    /// The key is an epoch timestamp rendered as a calendar label.
    EpochDate(DateFormat),
}

/// Policy bundle for one report family. Read-only for the duration of a
/// transform invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportPolicy {
    pub kind: ReportKind,
    /// Default primary grouping dimension of the report.
    pub across_field: String,
    /// Stacking dimensions the report supports.
    pub stack_fields: Vec<String>,
    /// Metric the family charts; also the stack-collapse total key.
    pub total_key: String,
    /// Display-name rule for parent buckets.
    pub label: LabelRule,
    /// Display-name rule for stack entries.
    pub stack_label: LabelRule,
    /// Value-sort key. `None` preserves backend order.
    pub sort_key: Option<String>,
    pub sort_order: SortOrder,
    pub max_records: usize,
    /// Keep the last `max_records` entries instead of the first.
    pub slice_from_end: bool,
    /// Reverse for display after sorting and slicing.
    pub should_reverse: bool,
    /// Retain the parent total alongside expanded stack fields.
    pub keep_total_with_stacks: bool,
    pub convert_unit: Option<DurationUnit>,
    pub top_n_stacks: usize,
    pub overflow_label: OverflowLabel,
    /// Across values that are time dimensions: value sorting is skipped
    /// and the call routes through timeline reconstruction.
    pub time_axis_keys: Vec<String>,
}

impl ReportPolicy {
    /// Generic fallback applied when a report family has no registry
    /// entry.
    pub fn fallback(kind: ReportKind) -> ReportPolicy {
        ReportPolicy {
            kind,
            across_field: "key".to_string(),
            stack_fields: Vec::new(),
            total_key: "count".to_string(),
            label: LabelRule::RawKey,
            stack_label: LabelRule::RawKey,
            sort_key: None,
            sort_order: SortOrder::Descending,
            max_records: DEFAULT_MAX_RECORDS,
            slice_from_end: false,
            should_reverse: false,
            keep_total_with_stacks: true,
            convert_unit: None,
            top_n_stacks: DEFAULT_TOP_N_STACKS,
            overflow_label: OverflowLabel::Other,
            time_axis_keys: Vec::new(),
        }
    }

    pub fn is_time_axis(&self, across: &str) -> bool {
        self.time_axis_keys.iter().any(|key| key == across)
    }
}

/// Registry of report policies, populated once at load time and passed by
/// reference into every transform call.
#[derive(Clone, Debug)]
pub struct PolicyRegistry {
    policies: HashMap<ReportKind, ReportPolicy>,
}

impl PolicyRegistry {
    pub fn new() -> PolicyRegistry {
        PolicyRegistry {
            policies: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in policy of every report
    /// family.
    pub fn builtin() -> PolicyRegistry {
        let mut registry = PolicyRegistry::new();
        for kind in ReportKind::ALL {
            registry.insert(builtin_policy(kind));
        }
        registry
    }

    pub fn insert(&mut self, policy: ReportPolicy) {
        self.policies.insert(policy.kind, policy);
    }

    pub fn get_mut(&mut self, kind: ReportKind) -> Option<&mut ReportPolicy> {
        self.policies.get_mut(&kind)
    }

    /// Resolves the policy for a report family.
    ///
    /// A miss degrades to built-in generic defaults. Misconfiguration
    /// should be caught during development, so debug builds log at error
    /// level while release builds stay quiet.
    pub fn resolve(&self, kind: ReportKind) -> ReportPolicy {
        match self.policies.get(&kind) {
            Some(policy) => policy.clone(),
            None => {
                if cfg!(debug_assertions) {
                    log::error!("No policy registered for report '{}', using fallback", kind);
                } else {
                    log::debug!("No policy registered for report '{}', using fallback", kind);
                }
                ReportPolicy::fallback(kind)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        PolicyRegistry::builtin()
    }
}

fn builtin_policy(kind: ReportKind) -> ReportPolicy {
    let base = ReportPolicy::fallback(kind);
    match kind {
        ReportKind::JobConfigChanges => ReportPolicy {
            across_field: "user_id".to_string(),
            stack_fields: vec!["trend".to_string()],
            stack_label: LabelRule::EpochDate(DateFormat::MonthDay),
            ..base
        },
        ReportKind::JobCounts => ReportPolicy {
            across_field: "user_id".to_string(),
            stack_fields: vec!["trend".to_string(), "job_status".to_string()],
            stack_label: LabelRule::EpochDate(DateFormat::MonthDay),
            ..base
        },
        ReportKind::JobDurations => ReportPolicy {
            across_field: "user_id".to_string(),
            total_key: "median".to_string(),
            convert_unit: Some(DurationUnit::Minutes),
            ..base
        },
        ReportKind::TicketCounts => ReportPolicy {
            across_field: "status".to_string(),
            stack_fields: vec!["priority".to_string(), "assignee".to_string()],
            total_key: "total_tickets".to_string(),
            label: LabelRule::RawKey,
            stack_label: LabelRule::PreferAdditional,
            sort_key: Some("total_tickets".to_string()),
            keep_total_with_stacks: false,
            time_axis_keys: vec![
                "issue_created".to_string(),
                "issue_updated".to_string(),
                "issue_resolved".to_string(),
            ],
            ..base
        },
        ReportKind::TicketTrend => ReportPolicy {
            across_field: "trend".to_string(),
            total_key: "total_tickets".to_string(),
            label: LabelRule::EpochDate(DateFormat::MonthDay),
            time_axis_keys: vec!["trend".to_string()],
            ..base
        },
        ReportKind::IssueCounts => ReportPolicy {
            across_field: "type".to_string(),
            total_key: "total_issues".to_string(),
            sort_key: Some("total_issues".to_string()),
            keep_total_with_stacks: false,
            ..base
        },
        ReportKind::AssessmentCounts => ReportPolicy {
            across_field: "template_id".to_string(),
            stack_fields: vec!["completed".to_string(), "submitted".to_string()],
            total_key: "total".to_string(),
            sort_key: Some("total".to_string()),
            keep_total_with_stacks: false,
            ..base
        },
        ReportKind::WorkItemCounts => ReportPolicy {
            across_field: "state".to_string(),
            stack_fields: vec!["tag".to_string(), "state".to_string()],
            total_key: "total".to_string(),
            sort_key: Some("total".to_string()),
            keep_total_with_stacks: false,
            ..base
        },
        ReportKind::ResolutionTimes => ReportPolicy {
            across_field: "assignee".to_string(),
            total_key: "median".to_string(),
            label: LabelRule::PreferAdditional,
            convert_unit: Some(DurationUnit::Days),
            time_axis_keys: vec![
                "issue_created".to_string(),
                "issue_updated".to_string(),
                "issue_resolved".to_string(),
            ],
            ..base
        },
        ReportKind::BacklogTrend => ReportPolicy {
            across_field: "trend".to_string(),
            stack_fields: vec!["priority".to_string()],
            total_key: "total_tickets".to_string(),
            label: LabelRule::EpochDate(DateFormat::DayMonth),
            stack_label: LabelRule::PreferAdditional,
            slice_from_end: true,
            keep_total_with_stacks: false,
            convert_unit: Some(DurationUnit::Days),
            time_axis_keys: vec!["trend".to_string()],
            ..base
        },
        ReportKind::FirstResponseTimes => ReportPolicy {
            across_field: "assignee".to_string(),
            total_key: "median".to_string(),
            label: LabelRule::PreferAdditional,
            convert_unit: Some(DurationUnit::Days),
            ..base
        },
        ReportKind::PrActivity => ReportPolicy {
            across_field: "author".to_string(),
            stack_fields: vec!["repo".to_string()],
            label: LabelRule::PreferAdditional,
            stack_label: LabelRule::PreferAdditional,
            slice_from_end: true,
            ..base
        },
    }
}
