use crate::core::issue::{ChangeEvent, Issue, UNASSIGNED};
use crate::core::stages;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Parse a tracker timestamp. The REST API emits RFC 3339 with a
/// colon-less zone offset ("2024-01-01T10:00:00.000+0100"), which strict
/// RFC 3339 parsing rejects, so try both.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid timestamp \"{}\": {}", raw, e))
}

fn str_field<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str()
}

/// Pull change events out of `changelog.histories`. Any malformed
/// history timestamp fails the whole issue: a partial timeline would
/// silently misattribute time.
fn parse_change_events(raw: &Value) -> Result<Vec<ChangeEvent>, String> {
    let histories = match raw.pointer("/changelog/histories") {
        Some(Value::Array(h)) => h,
        _ => return Ok(Vec::new()),
    };

    let mut events = Vec::new();
    for history in histories {
        let created = str_field(history, &["created"])
            .ok_or_else(|| "Changelog entry without timestamp".to_string())?;
        let at = parse_timestamp(created)?;

        let mut status = None;
        let mut assignee = None;
        if let Some(Value::Array(items)) = history.get("items") {
            for item in items {
                match str_field(item, &["field"]) {
                    Some("status") => {
                        status = Some(
                            str_field(item, &["toString"]).unwrap_or_default().to_string(),
                        );
                    }
                    Some("assignee") => {
                        assignee = Some(
                            str_field(item, &["toString"]).unwrap_or(UNASSIGNED).to_string(),
                        );
                    }
                    _ => {}
                }
            }
        }

        events.push(ChangeEvent { at, status, assignee });
    }
    Ok(events)
}

/// Scan `fields` for the sprint custom field (an array whose first
/// element carries a name and optional start/end dates) and the common
/// story-point custom field ids.
fn parse_custom_fields(
    fields: &Value,
) -> (String, Option<DateTime<Utc>>, Option<DateTime<Utc>>, f64) {
    let mut sprint = "Backlog".to_string();
    let mut sprint_start = None;
    let mut sprint_end = None;
    let mut story_points = 0.0;

    if let Some(map) = fields.as_object() {
        for (key, value) in map {
            if key.contains("customfield_") {
                if let Some(first) = value.as_array().and_then(|a| a.first()) {
                    if let Some(name) = str_field(first, &["name"]) {
                        sprint = name.to_string();
                        sprint_start = str_field(first, &["startDate"])
                            .and_then(|s| parse_timestamp(s).ok());
                        sprint_end = str_field(first, &["endDate"])
                            .or_else(|| str_field(first, &["completeDate"]))
                            .and_then(|s| parse_timestamp(s).ok());
                    }
                }
            }
            if key == "customfield_10016" || key == "customfield_10002" {
                if let Some(points) = value.as_f64() {
                    story_points = points;
                }
            }
        }
    }

    (sprint, sprint_start, sprint_end, story_points)
}

/// Transform one raw search result into an `Issue`, reconstructing its
/// stage timeline as of `now`. Missing key, missing creation timestamp,
/// or an unparsable changelog fails this issue only.
pub fn parse_issue(raw: &Value, base_url: &str, now: DateTime<Utc>) -> Result<Issue, String> {
    let key = str_field(raw, &["key"])
        .ok_or_else(|| "Issue without a key".to_string())?
        .to_string();
    let fields = raw
        .get("fields")
        .ok_or_else(|| format!("Issue {} has no fields", key))?;

    let created_raw = str_field(fields, &["created"])
        .ok_or_else(|| format!("Issue {} has no creation timestamp", key))?;
    let created = parse_timestamp(created_raw).map_err(|e| format!("Issue {}: {}", key, e))?;

    let assignee = str_field(fields, &["assignee", "displayName"])
        .unwrap_or(UNASSIGNED)
        .to_string();
    let status = str_field(fields, &["status", "name"])
        .unwrap_or("Unknown")
        .to_string();
    let status_category = str_field(fields, &["status", "statusCategory", "name"])
        .unwrap_or("To Do")
        .to_string();

    let events = parse_change_events(raw).map_err(|e| format!("Issue {}: {}", key, e))?;
    let stage_list = stages::reconstruct(created, &events, &assignee, now);
    let stage_durations = stages::durations_by_status(&stage_list);

    let (sprint, sprint_start, sprint_end, story_points) = parse_custom_fields(fields);

    // Tracker-logged seconds -> 8-hour working days.
    let time_spent_days = fields
        .get("timespent")
        .and_then(|v| v.as_f64())
        .map(|secs| secs / 3600.0 / 8.0)
        .unwrap_or(0.0);

    Ok(Issue {
        link: format!("{}/browse/{}", base_url.trim_end_matches('/'), key),
        id: key,
        name: str_field(fields, &["summary"]).unwrap_or_default().to_string(),
        kind: str_field(fields, &["issuetype", "name"]).unwrap_or("Task").to_string(),
        assignee,
        status,
        status_category,
        sprint,
        sprint_start,
        sprint_end,
        time_spent_days,
        story_points,
        created,
        stages: stage_list,
        stage_durations,
    })
}

/// Parse a whole fetched batch. A malformed issue is skipped, not fatal;
/// the skipped count is surfaced so reports can say what was excluded.
pub fn parse_batch(raw: &[Value], base_url: &str, now: DateTime<Utc>) -> (Vec<Issue>, usize) {
    let mut issues = Vec::new();
    let mut skipped = 0;
    for value in raw {
        match parse_issue(value, base_url, now) {
            Ok(issue) => issues.push(issue),
            Err(e) => {
                eprintln!("[SprintScope] Skipping issue: {}", e);
                skipped += 1;
            }
        }
    }
    (issues, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
    }

    fn raw_issue() -> Value {
        json!({
            "key": "AM-101",
            "fields": {
                "created": "2024-01-01T00:00:00.000+0000",
                "summary": "Fix login flow",
                "issuetype": { "name": "Bug" },
                "assignee": { "displayName": "Alice" },
                "status": {
                    "name": "In Progress",
                    "statusCategory": { "name": "In Progress" }
                },
                "timespent": 28800,
                "customfield_10016": 5,
                "customfield_10020": [{
                    "name": "Sprint 7",
                    "startDate": "2024-01-01T00:00:00.000+0000",
                    "endDate": "2024-01-14T00:00:00.000+0000"
                }]
            },
            "changelog": {
                "histories": [{
                    "created": "2024-01-03T00:00:00.000+0000",
                    "items": [{
                        "field": "status",
                        "fromString": "To Do",
                        "toString": "In Progress"
                    }]
                }]
            }
        })
    }

    #[test]
    fn test_parse_full_issue() {
        let issue = parse_issue(&raw_issue(), "https://team.atlassian.net", now()).unwrap();
        assert_eq!(issue.id, "AM-101");
        assert_eq!(issue.link, "https://team.atlassian.net/browse/AM-101");
        assert_eq!(issue.kind, "Bug");
        assert_eq!(issue.assignee, "Alice");
        assert_eq!(issue.sprint, "Sprint 7");
        assert!(issue.sprint_start.is_some());
        assert!(issue.sprint_end.is_some());
        assert!((issue.story_points - 5.0).abs() < 1e-9);
        // 28800s logged = 8h = one 8-hour day
        assert!((issue.time_spent_days - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_reconstructs_stages() {
        let issue = parse_issue(&raw_issue(), "https://team.atlassian.net", now()).unwrap();
        assert_eq!(issue.stages.len(), 2);
        assert_eq!(issue.stages[0].status, "To Do");
        assert!((issue.stages[0].duration_days - 2.0).abs() < 1e-9);
        assert_eq!(issue.stages[1].status, "In Progress");
        assert!((issue.stage_durations["In Progress"] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_created_fails_issue() {
        let mut raw = raw_issue();
        raw["fields"].as_object_mut().unwrap().remove("created");
        assert!(parse_issue(&raw, "https://x", now()).is_err());
    }

    #[test]
    fn test_bad_changelog_timestamp_fails_issue() {
        let mut raw = raw_issue();
        raw["changelog"]["histories"][0]["created"] = json!("not-a-date");
        assert!(parse_issue(&raw, "https://x", now()).is_err());
    }

    #[test]
    fn test_defaults_for_sparse_issue() {
        let raw = json!({
            "key": "AM-1",
            "fields": { "created": "2024-01-01T00:00:00.000+0000" }
        });
        let issue = parse_issue(&raw, "https://x", now()).unwrap();
        assert_eq!(issue.assignee, "Unassigned");
        assert_eq!(issue.status, "Unknown");
        assert_eq!(issue.status_category, "To Do");
        assert_eq!(issue.sprint, "Backlog");
        assert_eq!(issue.kind, "Task");
        assert_eq!(issue.story_points, 0.0);
        assert_eq!(issue.stages.len(), 1);
    }

    #[test]
    fn test_assignee_removal_becomes_unassigned() {
        let mut raw = raw_issue();
        raw["changelog"]["histories"]
            .as_array_mut()
            .unwrap()
            .push(json!({
                "created": "2024-01-04T00:00:00.000+0000",
                "items": [
                    { "field": "status", "toString": "Blocked" },
                    { "field": "assignee", "toString": null }
                ]
            }));
        let issue = parse_issue(&raw, "https://x", now()).unwrap();
        let last = issue.stages.last().unwrap();
        assert_eq!(last.status, "Blocked");
        assert_eq!(last.assignee, "Unassigned");
    }

    #[test]
    fn test_batch_skips_malformed_only() {
        let good = raw_issue();
        let bad = json!({ "key": "AM-2", "fields": {} });
        let (issues, skipped) = parse_batch(&[good, bad], "https://x", now());
        assert_eq!(issues.len(), 1);
        assert_eq!(skipped, 1);
    }
}
