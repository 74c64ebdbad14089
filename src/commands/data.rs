use crate::core::cache::{CacheMetadata, IssueCache};
use crate::core::config::Settings;
use crate::core::issue::Issue;
use crate::tracker::client::TrackerClient;
use crate::tracker::parse;
use chrono::Utc;

/// Issues ready for the metrics core, plus where they came from.
pub struct LoadedData {
    pub issues: Vec<Issue>,
    pub skipped: usize,
    pub from_cache: bool,
    pub metadata: Option<CacheMetadata>,
}

/// Load the working result set: a fresh-enough cache wins, otherwise
/// fetch and re-cache. A failed fetch falls back to stale cached data
/// (with a warning) before giving up.
pub fn load(settings: &Settings, force_refresh: bool) -> Result<LoadedData, String> {
    let mut cache = IssueCache::open_default()?;
    let query = settings.tracker.query.clone();

    if !force_refresh && cache.is_valid(settings.cache.ttl_minutes, &query)? {
        let issues = cache.load()?;
        if !issues.is_empty() {
            return Ok(LoadedData {
                issues,
                skipped: 0,
                from_cache: true,
                metadata: cache.metadata()?,
            });
        }
    }

    match fetch_fresh(settings, &query) {
        Ok((issues, skipped)) => {
            cache.save(&issues, &query)?;
            Ok(LoadedData {
                issues,
                skipped,
                from_cache: false,
                metadata: cache.metadata()?,
            })
        }
        Err(fetch_err) => match cache.load() {
            Ok(issues) if !issues.is_empty() => {
                eprintln!(
                    "[SprintScope] Warning: {} (showing cached data)",
                    fetch_err
                );
                Ok(LoadedData {
                    issues,
                    skipped: 0,
                    from_cache: true,
                    metadata: cache.metadata()?,
                })
            }
            _ => Err(fetch_err),
        },
    }
}

fn fetch_fresh(settings: &Settings, query: &str) -> Result<(Vec<Issue>, usize), String> {
    let client = TrackerClient::new(
        &settings.tracker.base_url,
        &settings.resolved_email(),
        &settings.resolved_token(),
    )?;

    println!("[SprintScope] Fetching issues from tracker...");
    let raw = client.fetch_issues(query, |count| {
        println!("[SprintScope] Fetched {} issue(s) so far...", count);
    })?;
    println!("[SprintScope] Fetch complete: {} issue(s).", raw.len());

    Ok(parse::parse_batch(&raw, &settings.tracker.base_url, Utc::now()))
}
