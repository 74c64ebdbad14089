use crate::core::config::Settings;
use crate::core::effort;
use crate::core::idle;
use crate::core::issue::Issue;
use crate::core::metrics;
use crate::core::timespan::round1;
use chrono::{DateTime, Utc};
use comfy_table::Table;
use serde::Serialize;

/// Sprint performance list: one row per sprint with summed effort.
pub fn run_list(issues: &[Issue], settings: &Settings, format: &str) {
    let m = metrics::compute(
        issues,
        &settings.statuses.development,
        &settings.statuses.development_exclude,
    );

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&m.sprint_stats).unwrap_or_default()
        );
        return;
    }

    if m.sprint_stats.is_empty() {
        println!("No sprint data available.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Sprint",
        "Issues",
        "Total Effort (d)",
        "Avg Effort/Issue (d)",
    ]);
    for sprint in &m.sprint_stats {
        let avg = if sprint.tasks > 0 {
            round1(sprint.time / sprint.tasks as f64)
        } else {
            0.0
        };
        table.add_row(vec![
            sprint.name.as_str(),
            &sprint.tasks.to_string(),
            &round1(sprint.time).to_string(),
            &avg.to_string(),
        ]);
    }
    println!("{table}");
}

#[derive(Serialize)]
struct DevEffortRow {
    name: String,
    tasks: usize,
    effort_days: f64,
}

#[derive(Serialize)]
struct SprintDetail {
    sprint: String,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    developers: Vec<DevEffortRow>,
    tasks_exceeding_estimate: Vec<String>,
}

/// Sprint detail: per-developer active effort over the sprint window,
/// the over-estimate task list, and optionally one developer's per-task
/// breakdown.
pub fn run_detail(
    issues: &[Issue],
    settings: &Settings,
    name: &str,
    dev_filter: Option<&str>,
    exceeded_only: bool,
    format: &str,
) {
    let tasks: Vec<Issue> = issues.iter().filter(|t| t.sprint == name).cloned().collect();
    if tasks.is_empty() {
        println!("No issues found for sprint \"{}\".", name);
        return;
    }

    let window = match idle::sprint_window(&tasks) {
        Some(w) => w,
        None => {
            println!("Sprint \"{}\" has no dates or history to report on.", name);
            return;
        }
    };

    let active = &settings.statuses.sprint_active;
    let work_days = &settings.calendar.work_days;

    let exceeding: Vec<String> = effort::tasks_exceeding_estimate(&tasks, window, active, work_days)
        .iter()
        .map(|t| t.id.clone())
        .collect();

    let efforts = effort::developer_effort(&tasks, window, active, |t| {
        !exceeded_only || exceeding.contains(&t.id)
    });

    if format == "json" {
        let detail = SprintDetail {
            sprint: name.to_string(),
            window_start: window.0,
            window_end: window.1,
            developers: efforts
                .iter()
                .map(|e| DevEffortRow {
                    name: e.name.clone(),
                    tasks: e.task_ids.len(),
                    effort_days: round1(e.effort_days()),
                })
                .collect(),
            tasks_exceeding_estimate: exceeding,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&detail).unwrap_or_default()
        );
        return;
    }

    println!("Sprint: {}", name);
    println!(
        "Window: {} .. {}",
        window.0.format("%Y-%m-%d"),
        window.1.format("%Y-%m-%d")
    );
    println!("Time > Points: {} task(s)", exceeding.len());
    println!();

    println!("DEVELOPER EFFORT (ACTIVE TIME)");
    println!("==============================");
    let mut table = Table::new();
    table.set_header(vec!["Developer", "Tasks", "Effort (d)"]);
    for e in &efforts {
        table.add_row(vec![
            e.name.as_str(),
            &e.task_ids.len().to_string(),
            &round1(e.effort_days()).to_string(),
        ]);
    }
    println!("{table}");

    if let Some(dev) = dev_filter {
        let Some(selected) = efforts.iter().find(|e| e.name == dev) else {
            println!("\nNo active work found for {} in this sprint.", dev);
            return;
        };

        println!("\nTASKS FOR {}", dev.to_uppercase());
        println!("{}", "=".repeat(10 + dev.len()));
        let mut table = Table::new();
        table.set_header(vec!["Task", "Name", "Points", "Time Spent (d)"]);
        let mut task_ids: Vec<&String> = selected.task_spans.keys().collect();
        task_ids.sort();
        for task_id in task_ids {
            let task = tasks.iter().find(|t| &t.id == task_id);
            let points = task
                .map(|t| {
                    if t.story_points > 0.0 {
                        t.story_points.to_string()
                    } else {
                        "-".to_string()
                    }
                })
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![
                task_id.as_str(),
                task.map(|t| t.name.as_str()).unwrap_or(""),
                &points,
                &round1(selected.task_effort_days(task_id)).to_string(),
            ]);
        }
        println!("{table}");
    }

    if exceeded_only && exceeding.is_empty() {
        println!("\nNo tasks exceeded their estimate in this sprint.");
    }
}
