use crate::core::config::Settings;
use crate::core::idle;
use crate::core::issue::Issue;
use chrono::Utc;
use comfy_table::Table;

/// Idle-day report for one sprint: work days a developer had nothing
/// in progress.
pub fn run(issues: &[Issue], settings: &Settings, sprint: Option<&str>, format: &str) {
    let sprint_name = match sprint.map(|s| s.to_string()).or_else(|| idle::default_sprint(issues)) {
        Some(s) => s,
        None => {
            println!("No sprints found in the current data set.");
            return;
        }
    };

    let tasks: Vec<Issue> = issues
        .iter()
        .filter(|t| t.sprint == sprint_name)
        .cloned()
        .collect();
    let reports = idle::classify_sprint(
        &tasks,
        &settings.calendar.work_days,
        &settings.statuses.in_progress,
        Utc::now(),
    );

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).unwrap_or_default()
        );
        return;
    }

    println!("IDLE TIME: {}", sprint_name);
    println!("==========={}", "=".repeat(sprint_name.len()));
    if reports.is_empty() {
        println!("No data available for the selected sprint.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Developer",
        "Idle Days",
        "Active Days",
        "Sprint Work Days",
        "Idle Dates",
    ]);
    for r in &reports {
        table.add_row(vec![
            r.name.as_str(),
            &r.idle_days().to_string(),
            &r.active_days.to_string(),
            &r.total_work_days.to_string(),
            &idle::compress_dates(&r.idle_dates).join(", "),
        ]);
    }
    println!("{table}");
}
