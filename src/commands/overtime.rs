use crate::core::config::Settings;
use crate::core::idle;
use crate::core::issue::Issue;
use chrono::Utc;
use comfy_table::Table;

/// Overtime report for one sprint: days off that still saw in-progress
/// work. Only developers with at least one overtime day appear.
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
    let mut reports = idle::classify_sprint(
        &tasks,
        &settings.calendar.work_days,
        &settings.statuses.in_progress,
        Utc::now(),
    );
    reports.retain(|r| r.overtime_days() > 0);
    reports.sort_by(|a, b| {
        b.overtime_days()
            .cmp(&a.overtime_days())
            .then(a.name.cmp(&b.name))
    });

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).unwrap_or_default()
        );
        return;
    }

    println!("OVERTIME: {}", sprint_name);
    println!("=========={}", "=".repeat(sprint_name.len()));
    if reports.is_empty() {
        println!("No overtime detected for this sprint.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Developer", "Overtime Days", "Dates Worked"]);
    for r in &reports {
        table.add_row(vec![
            r.name.as_str(),
            &r.overtime_days().to_string(),
            &idle::compress_dates(&r.overtime_dates).join(", "),
        ]);
    }
    println!("{table}");
}
