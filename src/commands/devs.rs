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
        println!(
            "{}",
            serde_json::to_string_pretty(&m.dev_stats).unwrap_or_default()
        );
        return;
    }

    if m.dev_stats.is_empty() {
        println!("No developer data available.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Developer",
        "Tasks",
        "Dev Time (d)",
        "Points",
        "Avg d/Task",
    ]);
    for dev in &m.dev_stats {
        let avg = if dev.tasks > 0 {
            round1(dev.time / dev.tasks as f64)
        } else {
            0.0
        };
        table.add_row(vec![
            dev.name.as_str(),
            &dev.tasks.to_string(),
            &round1(dev.time).to_string(),
            &dev.points.to_string(),
            &avg.to_string(),
        ]);
    }
    println!("{table}");
}
