use crate::core::issue::Issue;
use crate::core::timespan::{day_bounds, days_between, is_work_day, Span};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

/// Day-level classification of one developer's sprint: active and idle
/// work days plus overtime on days off. Date lists are chronological.
#[derive(Debug, Serialize, Clone)]
pub struct DevDayReport {
    pub name: String,
    pub active_days: u32,
    pub idle_dates: Vec<NaiveDate>,
    pub overtime_dates: Vec<NaiveDate>,
    /// Work days in the (now-clipped) sprint window; always equals
    /// active_days + idle_dates.len().
    pub total_work_days: u32,
}

impl DevDayReport {
    pub fn idle_days(&self) -> u32 {
        self.idle_dates.len() as u32
    }

    pub fn overtime_days(&self) -> u32 {
        self.overtime_dates.len() as u32
    }
}

/// Derive the [start, end] window for a set of sprint issues. Explicit
/// sprint dates attached to the issues win; with none on a side, that
/// side falls back to the extremes of the reconstructed stage boundaries.
/// Returns None when neither source has data; callers report nothing
/// rather than guess a window.
pub fn sprint_window(issues: &[Issue]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let explicit_start = issues.iter().filter_map(|t| t.sprint_start).min();
    let explicit_end = issues.iter().filter_map(|t| t.sprint_end).max();

    let stage_start = issues
        .iter()
        .flat_map(|t| t.stages.iter().map(|s| s.start))
        .min();
    let stage_end = issues
        .iter()
        .flat_map(|t| t.stages.iter().map(|s| s.end))
        .max();

    let start = explicit_start.or(stage_start)?;
    let end = explicit_end.or(stage_end)?;
    Some((start, end))
}

fn is_in_progress(status: &str, keywords: &[String]) -> bool {
    let s = status.to_lowercase();
    keywords.iter().any(|k| s.contains(&k.to_lowercase()))
}

/// A developer's in-progress-class spans across the sprint's issues.
/// Attribution is deliberately broad: a stage counts when the issue is
/// currently assigned to the developer OR the stage itself was held by
/// them, so people reassigned off a task mid-stream keep their history.
fn developer_spans(issues: &[Issue], dev: &str, keywords: &[String]) -> Vec<Span> {
    let mut spans = Vec::new();
    for issue in issues {
        for stage in &issue.stages {
            if issue.assignee != dev && stage.assignee != dev {
                continue;
            }
            if !is_in_progress(&stage.status, keywords) {
                continue;
            }
            spans.push(Span {
                start: stage.start,
                end: stage.end,
            });
        }
    }
    spans
}

/// Classify every calendar day of the sprint window for every developer
/// seen on the sprint's issues (current or historical assignee).
///
/// Work days split into active (an in-progress-class span overlaps the
/// day) and idle; non-work days only surface when overlapped (overtime).
/// Days after `now` have not happened and are not classified. Results are
/// sorted by idle days descending.
pub fn classify_sprint(
    issues: &[Issue],
    work_days: &[u32],
    keywords: &[String],
    now: DateTime<Utc>,
) -> Vec<DevDayReport> {
    let window = match sprint_window(issues) {
        Some(w) => w,
        None => return Vec::new(),
    };

    let start_date = window.0.date_naive();
    let end = window.1.min(now);
    if end < window.0 {
        return Vec::new();
    }
    let days = days_between(start_date, end.date_naive());

    let mut developers: BTreeSet<String> = BTreeSet::new();
    for issue in issues {
        if !issue.assignee.is_empty() {
            developers.insert(issue.assignee.clone());
        }
        for stage in &issue.stages {
            if !stage.assignee.is_empty() {
                developers.insert(stage.assignee.clone());
            }
        }
    }

    let mut reports: Vec<DevDayReport> = developers
        .into_iter()
        .map(|dev| {
            let spans = developer_spans(issues, &dev, keywords);
            let mut active_days = 0u32;
            let mut idle_dates = Vec::new();
            let mut overtime_dates = Vec::new();
            let mut total_work_days = 0u32;

            for &date in &days {
                let (day_start, day_end) = day_bounds(date);
                let overlapped = spans
                    .iter()
                    .any(|s| day_start <= s.end && day_end >= s.start);

                if is_work_day(date, work_days) {
                    total_work_days += 1;
                    if overlapped {
                        active_days += 1;
                    } else {
                        idle_dates.push(date);
                    }
                } else if overlapped {
                    overtime_dates.push(date);
                }
            }

            DevDayReport {
                name: dev,
                active_days,
                idle_dates,
                overtime_dates,
                total_work_days,
            }
        })
        .collect();

    reports.sort_by(|a, b| b.idle_days().cmp(&a.idle_days()).then(a.name.cmp(&b.name)));
    reports
}

/// Collapse consecutive dates into "a..b" ranges for display. Pure
/// formatting; counts come from the raw lists.
pub fn compress_dates(dates: &[NaiveDate]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < dates.len() {
        let run_start = dates[i];
        let mut run_end = run_start;
        while i + 1 < dates.len() && dates[i + 1] == run_end.succ_opt().unwrap() {
            run_end = dates[i + 1];
            i += 1;
        }
        if run_start == run_end {
            out.push(run_start.format("%Y-%m-%d").to_string());
        } else {
            out.push(format!(
                "{}..{}",
                run_start.format("%Y-%m-%d"),
                run_end.format("%Y-%m-%d")
            ));
        }
        i += 1;
    }
    out
}

/// Unique sprint names, ascending.
pub fn unique_sprints(issues: &[Issue]) -> Vec<String> {
    let names: BTreeSet<String> = issues
        .iter()
        .filter(|t| !t.sprint.is_empty())
        .map(|t| t.sprint.clone())
        .collect();
    names.into_iter().collect()
}

/// Pick the sprint a report should default to: the highest-numbered
/// "Sprint N", else the last name that isn't a catch-all board bucket.
pub fn default_sprint(issues: &[Issue]) -> Option<String> {
    let sprints = unique_sprints(issues);
    if sprints.is_empty() {
        return None;
    }

    let numbered = Regex::new(r"(?i)sprint\s+(\d+)").unwrap();
    let latest_numbered = sprints
        .iter()
        .filter_map(|name| {
            numbered
                .captures(name)
                .and_then(|c| c[1].parse::<u64>().ok())
                .map(|n| (n, name.clone()))
        })
        .max_by_key(|(n, _)| *n);
    if let Some((_, name)) = latest_numbered {
        return Some(name);
    }

    let boards = ["Triage", "Backlog", "Kanban"];
    sprints
        .iter()
        .filter(|s| !boards.contains(&s.as_str()))
        .next_back()
        .or_else(|| sprints.last())
        .cloned()
}
