use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Assignee placeholder when the tracker reports none.
pub const UNASSIGNED: &str = "Unassigned";

/// Status an issue is assumed to hold at creation when the changelog
/// doesn't say otherwise.
pub const INITIAL_STATUS: &str = "To Do";

/// A contiguous span during which an issue held one status under one
/// assignee. Spans for a single issue are ordered, non-overlapping, and
/// cover [created, now) with no gaps; `end` is exclusive.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StageInterval {
    pub status: String,
    pub assignee: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Elapsed wall-clock days (24h = 1.0), not a calendar-day count.
    pub duration_days: f64,
}

/// One entry of an issue's raw change history. A single event may carry a
/// status transition, an assignee transition, or both; `None` means the
/// field was untouched by this event.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChangeEvent {
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

/// A tracked unit of work as consumed by the metrics core. Immutable once
/// parsed; `stages` and `stage_durations` are derived from the change
/// history at fetch time.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Issue {
    pub id: String,
    pub link: String,
    pub name: String,
    pub kind: String,
    pub assignee: String,
    pub status: String,
    pub status_category: String,
    pub sprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_end: Option<DateTime<Utc>>,
    /// Tracker-logged time in 8-hour days; 0 when nothing was logged.
    pub time_spent_days: f64,
    pub story_points: f64,
    pub created: DateTime<Utc>,
    pub stages: Vec<StageInterval>,
    /// Total days per raw status label, summed across `stages`.
    pub stage_durations: HashMap<String, f64>,
}

impl Issue {
    pub fn is_completed(&self) -> bool {
        self.status_category == "Done"
    }

    /// Sum of all stage durations: the issue's full age in days.
    pub fn total_stage_days(&self) -> f64 {
        self.stage_durations.values().sum()
    }
}
