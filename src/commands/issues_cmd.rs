use crate::core::issue::Issue;
use crate::core::timespan::round1;
use comfy_table::Table;

pub struct IssueFilter<'a> {
    pub sprint: Option<&'a str>,
    pub assignee: Option<&'a str>,
    pub status: Option<&'a str>,
}

fn matches(issue: &Issue, filter: &IssueFilter) -> bool {
    let contains = |haystack: &str, needle: &str| {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    };
    filter.sprint.map_or(true, |s| contains(&issue.sprint, s))
        && filter.assignee.map_or(true, |a| contains(&issue.assignee, a))
        && filter.status.map_or(true, |s| contains(&issue.status, s))
}

/// Issue explorer: filterable listing, or `--open KEY` to jump to the
/// tracker page in a browser.
pub fn run(issues: &[Issue], filter: &IssueFilter, open_key: Option<&str>, format: &str) {
    if let Some(key) = open_key {
        let Some(issue) = issues.iter().find(|t| t.id == key) else {
            eprintln!("Error: No issue with key {} in the current data set.", key);
            return;
        };
        if let Err(e) = open::that(&issue.link) {
            eprintln!("Error: Cannot open {}: {}", issue.link, e);
        }
        return;
    }

    let selected: Vec<&Issue> = issues.iter().filter(|t| matches(t, filter)).collect();

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&selected).unwrap_or_default()
        );
        return;
    }

    if selected.is_empty() {
        println!("No issues match the given filters.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Key",
        "Name",
        "Type",
        "Status",
        "Assignee",
        "Sprint",
        "Points",
        "Age (d)",
    ]);
    for issue in &selected {
        let name: String = issue.name.chars().take(40).collect();
        table.add_row(vec![
            issue.id.as_str(),
            &name,
            &issue.kind,
            &issue.status,
            &issue.assignee,
            &issue.sprint,
            &issue.story_points.to_string(),
            &round1(issue.total_stage_days()).to_string(),
        ]);
    }
    println!("{table}");
    println!("{} issue(s)", selected.len());
}
