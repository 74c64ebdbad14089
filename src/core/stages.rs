use crate::core::issue::{ChangeEvent, StageInterval, INITIAL_STATUS, UNASSIGNED};
use crate::core::timespan::date_diff_days;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Statuses containing "done" (any casing) merge with each other even when
/// worded differently ("Done", "Closed and Done"). Reopen/reclose churn in
/// real changelogs records no-op Done -> Done transitions; without this the
/// history fragments into near-zero slivers.
fn is_done(status: &str) -> bool {
    status.to_lowercase().contains("done")
}

/// Rebuild an issue's full status timeline from its raw change history.
///
/// The result covers [created, now) exactly: contiguous, ordered, no
/// overlaps. Each span is tagged with the status and assignee in effect
/// *before* the boundary that ends it. Events that touch neither status
/// nor assignee are not boundaries; events sharing one timestamp collapse
/// into a single boundary with all of their field updates applied
/// together.
///
/// `now` is an explicit input so the function stays a pure function of
/// (creation time, change history, current time); only the final span's
/// duration varies between successive calls.
pub fn reconstruct(
    created: DateTime<Utc>,
    events: &[ChangeEvent],
    current_assignee: &str,
    now: DateTime<Utc>,
) -> Vec<StageInterval> {
    // Stable sort: events at the same instant keep their log order.
    let mut sorted: Vec<ChangeEvent> = events.to_vec();
    sorted.sort_by_key(|e| e.at);

    let changes: Vec<&ChangeEvent> = sorted
        .iter()
        .filter(|e| e.status.is_some() || e.assignee.is_some())
        .collect();

    let mut status = INITIAL_STATUS.to_string();
    let mut assignee = if current_assignee.is_empty() {
        UNASSIGNED.to_string()
    } else {
        current_assignee.to_string()
    };
    let mut last_boundary = created;

    let mut raw: Vec<StageInterval> = Vec::new();
    let mut i = 0;
    while i < changes.len() {
        let at = changes[i].at;
        raw.push(StageInterval {
            status: status.clone(),
            assignee: assignee.clone(),
            start: last_boundary,
            end: at,
            duration_days: date_diff_days(last_boundary, at),
        });

        // Apply every change recorded at this instant as one boundary.
        while i < changes.len() && changes[i].at == at {
            if let Some(s) = &changes[i].status {
                status = s.clone();
            }
            if let Some(a) = &changes[i].assignee {
                assignee = if a.is_empty() {
                    UNASSIGNED.to_string()
                } else {
                    a.clone()
                };
            }
            i += 1;
        }
        last_boundary = at;
    }

    raw.push(StageInterval {
        status,
        assignee,
        start: last_boundary,
        end: now,
        duration_days: date_diff_days(last_boundary, now),
    });

    merge_adjacent(raw)
}

/// Collapse adjacent spans that share a status, or whose statuses are both
/// "done"-like. The surviving span keeps the earlier span's assignee and
/// absorbs the later one's extent. Idempotent.
pub fn merge_adjacent(intervals: Vec<StageInterval>) -> Vec<StageInterval> {
    let mut merged: Vec<StageInterval> = Vec::new();

    for interval in intervals {
        let mergeable = merged.last().map(|last| {
            last.status == interval.status || (is_done(&last.status) && is_done(&interval.status))
        });
        if mergeable == Some(true) {
            let last = merged.last_mut().unwrap();
            last.end = interval.end;
            last.duration_days += interval.duration_days;
        } else {
            merged.push(interval);
        }
    }

    merged
}

/// Fold span durations per raw status label. Labels are case-sensitive:
/// "In Progress" and "in progress" are distinct tracker states here;
/// keyword classification happens downstream.
pub fn durations_by_status(intervals: &[StageInterval]) -> HashMap<String, f64> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for interval in intervals {
        *totals.entry(interval.status.clone()).or_insert(0.0) += interval.duration_days;
    }
    totals
}
