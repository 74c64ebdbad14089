use crate::core::config;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

fn format_work_days(days: &[u32]) -> String {
    days.iter()
        .filter_map(|&d| DAY_NAMES.get(d as usize).copied())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse "1,2,3,4,5" into validated, sorted, deduplicated weekday
/// indices (0 = Sunday .. 6 = Saturday).
fn parse_work_days(input: &str) -> Result<Vec<u32>, String> {
    let mut days = Vec::new();
    for part in input.split(',') {
        let day: u32 = part
            .trim()
            .parse()
            .map_err(|_| format!("Invalid weekday \"{}\". Use digits 0-6.", part.trim()))?;
        if day > 6 {
            return Err(format!("Weekday {} is out of range 0-6.", day));
        }
        if !days.contains(&day) {
            days.push(day);
        }
    }
    days.sort_unstable();
    Ok(days)
}

/// Show the effective settings, or persist a new work-day calendar.
pub fn run(work_days: Option<&str>) {
    let mut settings = config::load();

    if let Some(input) = work_days {
        let days = match parse_work_days(input) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("Error: {}", e);
                return;
            }
        };
        settings.calendar.work_days = days;
        match config::save(&settings) {
            Ok(path) => println!(
                "[SprintScope] Work days set to {} ({}).",
                format_work_days(&settings.calendar.work_days),
                path.display()
            ),
            Err(e) => eprintln!("Error: {}", e),
        }
        return;
    }

    println!("SETTINGS");
    println!("========");
    println!(
        "Tracker: {}",
        if settings.tracker.base_url.is_empty() {
            "(not configured)"
        } else {
            &settings.tracker.base_url
        }
    );
    println!("Query: {}", settings.tracker.query);
    println!(
        "Work days: {}",
        format_work_days(&settings.calendar.work_days)
    );
    println!("Cache TTL: {} minute(s)", settings.cache.ttl_minutes);
    println!(
        "Development statuses: {}",
        settings.statuses.development.join(", ")
    );
    println!(
        "Development exclusions: {}",
        settings.statuses.development_exclude.join(", ")
    );
    println!(
        "In-progress statuses: {}",
        settings.statuses.in_progress.join(", ")
    );
    println!(
        "Sprint-effort statuses: {}",
        settings.statuses.sprint_active.join(", ")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_work_days() {
        assert_eq!(parse_work_days("1,2,3,4,5").unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(parse_work_days("5, 1, 1").unwrap(), vec![1, 5]);
    }

    #[test]
    fn test_parse_work_days_rejects_bad_input() {
        assert!(parse_work_days("7").is_err());
        assert!(parse_work_days("mon").is_err());
    }

    #[test]
    fn test_format_work_days() {
        assert_eq!(format_work_days(&[1, 2, 3, 4, 5]), "Mon, Tue, Wed, Thu, Fri");
        assert_eq!(format_work_days(&[0, 6]), "Sun, Sat");
    }
}
