use crate::core::issue::Issue;
use crate::core::timespan::{elapsed_days, work_days_touched, Span};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

/// Active working time attributed to one developer inside a sprint
/// window, built from stage spans rather than issue-level assignment so
/// reassigned work lands with whoever actually held it.
#[derive(Debug, Clone)]
pub struct DevEffort {
    pub name: String,
    pub task_ids: BTreeSet<String>,
    pub spans: Vec<Span>,
    pub task_spans: HashMap<String, Vec<Span>>,
}

impl DevEffort {
    /// Merged wall-clock days of active work (lead-time figure, no
    /// work-day filtering).
    pub fn effort_days(&self) -> f64 {
        elapsed_days(&self.spans)
    }

    pub fn task_effort_days(&self, task_id: &str) -> f64 {
        self.task_spans
            .get(task_id)
            .map(|s| elapsed_days(s))
            .unwrap_or(0.0)
    }
}

fn is_active(status: &str, active_statuses: &[String]) -> bool {
    let s = status.to_lowercase();
    active_statuses.iter().any(|a| a == &s)
}

fn clip(start: DateTime<Utc>, end: DateTime<Utc>, window: (DateTime<Utc>, DateTime<Utc>)) -> Option<Span> {
    let clip_start = start.max(window.0);
    let clip_end = end.min(window.1);
    if clip_start < clip_end {
        Some(Span {
            start: clip_start,
            end: clip_end,
        })
    } else {
        None
    }
}

/// An issue's active-stage spans clipped to the window, regardless of who
/// held them.
pub fn task_active_spans(
    issue: &Issue,
    window: (DateTime<Utc>, DateTime<Utc>),
    active_statuses: &[String],
) -> Vec<Span> {
    issue
        .stages
        .iter()
        .filter(|stage| is_active(&stage.status, active_statuses))
        .filter_map(|stage| clip(stage.start, stage.end, window))
        .collect()
}

/// Aggregate active effort per developer across the issues that pass
/// `filter`. One shared routine parameterized by a task-inclusion
/// predicate, so "all tasks" and "only tasks over estimate" views run the
/// same accounting.
pub fn developer_effort<F>(
    issues: &[Issue],
    window: (DateTime<Utc>, DateTime<Utc>),
    active_statuses: &[String],
    filter: F,
) -> Vec<DevEffort>
where
    F: Fn(&Issue) -> bool,
{
    let mut by_dev: HashMap<String, DevEffort> = HashMap::new();

    for issue in issues.iter().filter(|t| filter(t)) {
        for stage in &issue.stages {
            if !is_active(&stage.status, active_statuses) {
                continue;
            }
            let dev = if stage.assignee.is_empty() {
                issue.assignee.clone()
            } else {
                stage.assignee.clone()
            };
            let entry = by_dev.entry(dev.clone()).or_insert_with(|| DevEffort {
                name: dev,
                task_ids: BTreeSet::new(),
                spans: Vec::new(),
                task_spans: HashMap::new(),
            });
            if let Some(span) = clip(stage.start, stage.end, window) {
                entry.spans.push(span);
                entry
                    .task_spans
                    .entry(issue.id.clone())
                    .or_default()
                    .push(span);
            }
            entry.task_ids.insert(issue.id.clone());
        }
    }

    let mut efforts: Vec<DevEffort> = by_dev.into_values().collect();
    efforts.sort_by(|a, b| {
        b.effort_days()
            .partial_cmp(&a.effort_days())
            .unwrap()
            .then(a.name.cmp(&b.name))
    });
    efforts
}

/// True when the issue's active work days inside the window beat its
/// story-point estimate. The comparison uses the work-day-bounded count
/// (a day counts once, weekends off-calendar) so estimates in points line
/// up with days actually available.
pub fn exceeds_estimate(
    issue: &Issue,
    window: (DateTime<Utc>, DateTime<Utc>),
    active_statuses: &[String],
    work_days: &[u32],
) -> bool {
    if issue.story_points <= 0.0 {
        return false;
    }
    let spans = task_active_spans(issue, window, active_statuses);
    work_days_touched(&spans, work_days) as f64 > issue.story_points
}

/// The subset of issues whose time spent exceeded their estimate.
pub fn tasks_exceeding_estimate<'a>(
    issues: &'a [Issue],
    window: (DateTime<Utc>, DateTime<Utc>),
    active_statuses: &[String],
    work_days: &[u32],
) -> Vec<&'a Issue> {
    issues
        .iter()
        .filter(|t| exceeds_estimate(t, window, active_statuses, work_days))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::issue::StageInterval;
    use chrono::TimeZone;

    fn ts(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    fn stage(status: &str, assignee: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> StageInterval {
        StageInterval {
            status: status.to_string(),
            assignee: assignee.to_string(),
            start,
            end,
            duration_days: crate::core::timespan::date_diff_days(start, end),
        }
    }

    fn issue_with_stages(id: &str, assignee: &str, points: f64, stages: Vec<StageInterval>) -> Issue {
        let durations = crate::core::stages::durations_by_status(&stages);
        Issue {
            id: id.to_string(),
            link: String::new(),
            name: "task".to_string(),
            kind: "Task".to_string(),
            assignee: assignee.to_string(),
            status: "In Progress".to_string(),
            status_category: "In Progress".to_string(),
            sprint: "Sprint 1".to_string(),
            sprint_start: None,
            sprint_end: None,
            time_spent_days: 0.0,
            story_points: points,
            created: ts(1, 0),
            stages,
            stage_durations: durations,
        }
    }

    fn active() -> Vec<String> {
        vec![
            "in progress".to_string(),
            "code review".to_string(),
            "ready for qa".to_string(),
        ]
    }

    #[test]
    fn test_effort_clips_to_window() {
        let issue = issue_with_stages(
            "AM-1",
            "Alice",
            0.0,
            vec![stage("In Progress", "Alice", ts(1, 0), ts(20, 0))],
        );
        let window = (ts(5, 0), ts(10, 0));

        let efforts = developer_effort(&[issue], window, &active(), |_| true);
        assert_eq!(efforts.len(), 1);
        assert!((efforts[0].effort_days() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_effort_ignores_inactive_stages() {
        let issue = issue_with_stages(
            "AM-1",
            "Alice",
            0.0,
            vec![
                stage("To Do", "Alice", ts(1, 0), ts(5, 0)),
                stage("In Progress", "Alice", ts(5, 0), ts(7, 0)),
            ],
        );
        let window = (ts(1, 0), ts(10, 0));

        let efforts = developer_effort(&[issue], window, &active(), |_| true);
        assert!((efforts[0].effort_days() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_effort_follows_stage_assignee() {
        // Bob held the active stage even though Alice owns the issue now.
        let issue = issue_with_stages(
            "AM-1",
            "Alice",
            0.0,
            vec![stage("In Progress", "Bob", ts(2, 0), ts(4, 0))],
        );
        let window = (ts(1, 0), ts(10, 0));

        let efforts = developer_effort(&[issue], window, &active(), |_| true);
        assert_eq!(efforts[0].name, "Bob");
    }

    #[test]
    fn test_effort_merges_parallel_tasks() {
        // Two tasks active simultaneously: wall-clock effort, not a sum.
        let a = issue_with_stages(
            "AM-1",
            "Alice",
            0.0,
            vec![stage("In Progress", "Alice", ts(2, 0), ts(4, 0))],
        );
        let b = issue_with_stages(
            "AM-2",
            "Alice",
            0.0,
            vec![stage("In Progress", "Alice", ts(3, 0), ts(5, 0))],
        );
        let window = (ts(1, 0), ts(10, 0));

        let efforts = developer_effort(&[a, b], window, &active(), |_| true);
        assert_eq!(efforts.len(), 1);
        assert_eq!(efforts[0].task_ids.len(), 2);
        assert!((efforts[0].effort_days() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_predicate_filters_tasks() {
        let a = issue_with_stages(
            "AM-1",
            "Alice",
            0.0,
            vec![stage("In Progress", "Alice", ts(2, 0), ts(4, 0))],
        );
        let b = issue_with_stages(
            "AM-2",
            "Bob",
            0.0,
            vec![stage("In Progress", "Bob", ts(2, 0), ts(4, 0))],
        );
        let window = (ts(1, 0), ts(10, 0));

        let efforts = developer_effort(&[a, b], window, &active(), |t| t.id == "AM-2");
        assert_eq!(efforts.len(), 1);
        assert_eq!(efforts[0].name, "Bob");
    }

    #[test]
    fn test_exceeds_estimate_by_work_days() {
        // Active Mon 2024-01-08 through Fri 2024-01-12: 5 work days
        // against a 3-point estimate.
        let issue = issue_with_stages(
            "AM-1",
            "Alice",
            3.0,
            vec![stage("In Progress", "Alice", ts(8, 9), ts(12, 17))],
        );
        let window = (ts(1, 0), ts(31, 0));
        let mon_fri = [1, 2, 3, 4, 5];

        assert!(exceeds_estimate(&issue, window, &active(), &mon_fri));
    }

    #[test]
    fn test_unestimated_tasks_never_exceed() {
        let issue = issue_with_stages(
            "AM-1",
            "Alice",
            0.0,
            vec![stage("In Progress", "Alice", ts(1, 0), ts(31, 0))],
        );
        let window = (ts(1, 0), ts(31, 0));
        assert!(!exceeds_estimate(&issue, window, &active(), &[1, 2, 3, 4, 5]));
    }
}
