use crate::core::config::Settings;
use crate::core::issue::Issue;
use crate::core::metrics;
use crate::core::timespan::round1;
use comfy_table::Table;

pub fn run(issues: &[Issue], settings: &Settings, format: &str) {
    let m = metrics::compute(
        issues,
        &settings.statuses.development,
        &settings.statuses.development_exclude,
    );

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&m).unwrap_or_default());
        return;
    }

    println!("OVERVIEW");
    println!("========");
    println!("Total tasks: {}", m.total_tasks);
    println!(
        "Completed: {} ({}%)",
        m.completed_tasks, m.completion_rate
    );
    println!("Total time spent: {} d", m.total_time_spent);
    println!("Total story points: {}", m.total_story_points);
    if m.total_tasks > 0 {
        println!(
            "Avg time per task: {} d",
            round1(m.total_time_spent / m.total_tasks as f64)
        );
    }
    println!();

    println!("BY DEVELOPER");
    println!("============");
    let mut table = Table::new();
    table.set_header(vec!["Developer", "Tasks", "Dev Time (d)", "Points"]);
    for dev in &m.dev_stats {
        table.add_row(vec![
            dev.name.as_str(),
            &dev.tasks.to_string(),
            &round1(dev.time).to_string(),
            &dev.points.to_string(),
        ]);
    }
    println!("{table}");
    println!();

    println!("BY SPRINT");
    println!("=========");
    let mut table = Table::new();
    table.set_header(vec!["Sprint", "Tasks", "Dev Time (d)", "Points"]);
    for sprint in &m.sprint_stats {
        table.add_row(vec![
            sprint.name.as_str(),
            &sprint.tasks.to_string(),
            &round1(sprint.time).to_string(),
            &sprint.points.to_string(),
        ]);
    }
    println!("{table}");
    println!();

    println!("BY STATUS");
    println!("=========");
    let mut table = Table::new();
    table.set_header(vec!["Status", "Tasks"]);
    for status in &m.status_stats {
        table.add_row(vec![status.name.as_str(), &status.value.to_string()]);
    }
    println!("{table}");
}
