use crate::core::issue::Issue;
use crate::core::timespan::round1;
use serde::Serialize;
use std::collections::HashMap;

/// Accumulated figures for one developer or one sprint.
#[derive(Debug, Serialize, Default, Clone)]
pub struct GroupStats {
    pub time: f64,
    pub tasks: u32,
    pub points: f64,
}

#[derive(Debug, Serialize, Clone)]
pub struct NamedStats {
    pub name: String,
    pub time: f64,
    pub tasks: u32,
    pub points: f64,
}

#[derive(Debug, Serialize, Clone)]
pub struct StatusCount {
    pub name: String,
    pub value: u32,
}

/// The cross-issue rollup consumed by the overview and per-group tables.
#[derive(Debug, Serialize)]
pub struct Metrics {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    /// Whole percent of tasks whose status category is Done.
    pub completion_rate: u32,
    pub total_time_spent: f64,
    pub total_story_points: f64,
    pub dev_stats: Vec<NamedStats>,
    pub sprint_stats: Vec<NamedStats>,
    pub status_stats: Vec<StatusCount>,
}

/// Days an issue spent in development-class statuses: a stage label counts
/// when it contains any inclusion keyword, unless it also contains an
/// exclusion keyword. Exclusion wins ("ready for qa" stays out even
/// though it contains "qa"-adjacent development wording). Matching is
/// case-insensitive on both sides.
pub fn development_days(issue: &Issue, include: &[String], exclude: &[String]) -> f64 {
    issue
        .stage_durations
        .iter()
        .filter(|(label, _)| {
            let l = label.to_lowercase();
            include.iter().any(|k| l.contains(&k.to_lowercase()))
                && !exclude.iter().any(|k| l.contains(&k.to_lowercase()))
        })
        .map(|(_, days)| days)
        .sum()
}

/// Roll every issue up into the dashboard metrics. Zero issues is an
/// expected state and produces an all-zero result.
pub fn compute(issues: &[Issue], include: &[String], exclude: &[String]) -> Metrics {
    let total_tasks = issues.len() as u32;
    let completed_tasks = issues.iter().filter(|t| t.is_completed()).count() as u32;
    let completion_rate = if total_tasks > 0 {
        ((completed_tasks as f64 / total_tasks as f64) * 100.0).round() as u32
    } else {
        0
    };

    let mut dev: HashMap<String, GroupStats> = HashMap::new();
    let mut sprint: HashMap<String, GroupStats> = HashMap::new();
    let mut status: HashMap<String, u32> = HashMap::new();

    for issue in issues {
        let dev_days = development_days(issue, include, exclude);

        let ds = dev.entry(issue.assignee.clone()).or_default();
        ds.time += dev_days;
        ds.tasks += 1;
        ds.points += issue.story_points;

        let ss = sprint.entry(issue.sprint.clone()).or_default();
        ss.time += dev_days;
        ss.tasks += 1;
        ss.points += issue.story_points;

        *status.entry(issue.status.clone()).or_insert(0) += 1;
    }

    // Prefer tracker-logged time when present, else the issue's full
    // reconstructed age.
    let total_time_spent = round1(
        issues
            .iter()
            .map(|t| {
                if t.time_spent_days > 0.0 {
                    t.time_spent_days
                } else {
                    t.total_stage_days()
                }
            })
            .sum(),
    );
    let total_story_points = issues.iter().map(|t| t.story_points).sum();

    let mut dev_stats: Vec<NamedStats> = dev
        .into_iter()
        .map(|(name, s)| NamedStats {
            name,
            time: s.time,
            tasks: s.tasks,
            points: s.points,
        })
        .collect();
    dev_stats.sort_by(|a, b| b.time.partial_cmp(&a.time).unwrap().then(a.name.cmp(&b.name)));

    let mut sprint_stats: Vec<NamedStats> = sprint
        .into_iter()
        .map(|(name, s)| NamedStats {
            name,
            time: s.time,
            tasks: s.tasks,
            points: s.points,
        })
        .collect();
    sprint_stats.sort_by(|a, b| a.name.cmp(&b.name));

    let mut status_stats: Vec<StatusCount> = status
        .into_iter()
        .map(|(name, value)| StatusCount { name, value })
        .collect();
    status_stats.sort_by(|a, b| b.value.cmp(&a.value).then(a.name.cmp(&b.name)));

    Metrics {
        total_tasks,
        completed_tasks,
        completion_rate,
        total_time_spent,
        total_story_points,
        dev_stats,
        sprint_stats,
        status_stats,
    }
}
