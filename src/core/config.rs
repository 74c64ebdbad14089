use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".sprintscoperc";

/// 0 = Sunday, 1 = Monday, ..., 6 = Saturday
pub const DEFAULT_WORK_DAYS: [u32; 5] = [1, 2, 3, 4, 5];

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub statuses: StatusConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TrackerConfig {
    /// Base URL of the tracker site, e.g. "https://team.atlassian.net".
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub email: String,
    /// API token; the SPRINTSCOPE_TOKEN environment variable wins over
    /// the file so the secret can stay out of it.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_query")]
    pub query: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CalendarConfig {
    #[serde(default = "default_work_days")]
    pub work_days: Vec<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,
}

/// The three keyword sets are intentionally separate: development time
/// (broad, with exclusions), the in-progress class driving idle/overtime
/// days (narrow), and the exact-match sprint-effort statuses. They feed
/// different metrics with different precision; do not unify them.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StatusConfig {
    #[serde(default = "default_development")]
    pub development: Vec<String>,
    #[serde(default = "default_development_exclude")]
    pub development_exclude: Vec<String>,
    #[serde(default = "default_in_progress")]
    pub in_progress: Vec<String>,
    #[serde(default = "default_sprint_active")]
    pub sprint_active: Vec<String>,
}

fn default_query() -> String {
    "order by created DESC".to_string()
}

fn default_work_days() -> Vec<u32> {
    DEFAULT_WORK_DAYS.to_vec()
}

fn default_ttl_minutes() -> u64 {
    720
}

fn default_development() -> Vec<String> {
    ["progress", "review", "developing", "implementing"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_development_exclude() -> Vec<String> {
    ["ready for qa", "in qa"].iter().map(|s| s.to_string()).collect()
}

fn default_in_progress() -> Vec<String> {
    ["in progress", "in development"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_sprint_active() -> Vec<String> {
    ["in progress", "code review", "ready for qa"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            work_days: default_work_days(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_minutes: default_ttl_minutes(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        StatusConfig {
            development: default_development(),
            development_exclude: default_development_exclude(),
            in_progress: default_in_progress(),
            sprint_active: default_sprint_active(),
        }
    }
}

impl Settings {
    pub fn resolved_token(&self) -> String {
        std::env::var("SPRINTSCOPE_TOKEN").unwrap_or_else(|_| self.tracker.token.clone())
    }

    pub fn resolved_email(&self) -> String {
        std::env::var("SPRINTSCOPE_EMAIL").unwrap_or_else(|_| self.tracker.email.clone())
    }
}

fn find_config_file() -> Option<PathBuf> {
    // Check working directory first
    let local = Path::new(CONFIG_FILE);
    if local.exists() {
        return Some(local.to_path_buf());
    }

    // Fall back to home directory
    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(CONFIG_FILE);
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

pub fn load() -> Settings {
    match find_config_file() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                eprintln!(
                    "[SprintScope] Warning: Failed to parse {}: {}",
                    path.display(),
                    e
                );
                Settings::default()
            }),
            Err(e) => {
                eprintln!(
                    "[SprintScope] Warning: Failed to read {}: {}",
                    path.display(),
                    e
                );
                Settings::default()
            }
        },
        None => Settings::default(),
    }
}

/// Persist settings to the file they were loaded from, or a fresh
/// `.sprintscoperc` in the home directory when none exists yet.
pub fn save(settings: &Settings) -> Result<PathBuf, String> {
    let path = find_config_file()
        .or_else(|| dirs::home_dir().map(|h| h.join(CONFIG_FILE)))
        .ok_or_else(|| "Cannot determine a config file location".to_string())?;

    let content = toml::to_string_pretty(settings)
        .map_err(|e| format!("Cannot serialize settings: {}", e))?;
    std::fs::write(&path, content)
        .map_err(|e| format!("Cannot write {}: {}", path.display(), e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.calendar.work_days, vec![1, 2, 3, 4, 5]);
        assert_eq!(settings.cache.ttl_minutes, 720);
        assert_eq!(settings.statuses.in_progress.len(), 2);
        assert_eq!(settings.statuses.sprint_active.len(), 3);
        assert!(settings.tracker.base_url.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[tracker]
base_url = "https://team.atlassian.net"
email = "dev@team.example"
query = "project = \"AM\" order by created DESC"

[calendar]
work_days = [0, 1, 2, 3, 4]

[cache]
ttl_minutes = 60

[statuses]
in_progress = ["in progress"]
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.tracker.base_url, "https://team.atlassian.net");
        assert_eq!(settings.calendar.work_days, vec![0, 1, 2, 3, 4]);
        assert_eq!(settings.cache.ttl_minutes, 60);
        assert_eq!(settings.statuses.in_progress, vec!["in progress"]);
        // Unset sections keep their defaults
        assert_eq!(settings.statuses.development.len(), 4);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[cache]
ttl_minutes = 5
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.cache.ttl_minutes, 5);
        assert_eq!(settings.calendar.work_days, vec![1, 2, 3, 4, 5]);
        assert_eq!(settings.tracker.query, "order by created DESC");
    }

    #[test]
    fn test_settings_roundtrip() {
        let mut settings = Settings::default();
        settings.calendar.work_days = vec![2, 3, 4];
        let serialized = toml::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&serialized).unwrap();
        assert_eq!(back.calendar.work_days, vec![2, 3, 4]);
    }
}
