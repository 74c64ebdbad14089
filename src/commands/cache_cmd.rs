use crate::core::cache::IssueCache;
use chrono::Utc;

/// Show cache freshness, or wipe it with `--clear`.
pub fn run(clear: bool) {
    let cache = match IssueCache::open_default() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    if clear {
        match cache.clear() {
            Ok(()) => println!("[SprintScope] Cache cleared."),
            Err(e) => eprintln!("Error: {}", e),
        }
        return;
    }

    match cache.metadata() {
        Ok(Some(meta)) => {
            let age = Utc::now().signed_duration_since(meta.last_fetch);
            let age_str = if age.num_minutes() < 60 {
                format!("{} minute(s)", age.num_minutes().max(0))
            } else {
                format!("{} hour(s)", age.num_hours())
            };
            println!("Cached issues: {}", meta.total_issues);
            println!("Query: {}", meta.query);
            println!(
                "Last fetch: {} ({} ago)",
                meta.last_fetch.format("%Y-%m-%d %H:%M UTC"),
                age_str
            );
        }
        Ok(None) => println!("Cache is empty."),
        Err(e) => eprintln!("Error: {}", e),
    }
}
