use crate::core::issue::Issue;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Bookkeeping row describing the cached result set.
#[derive(Debug, Clone)]
pub struct CacheMetadata {
    pub last_fetch: DateTime<Utc>,
    pub total_issues: u32,
    pub query: String,
}

pub fn default_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".sprintscope").join("issues.db")
}

fn query_hash(query: &str) -> String {
    format!("sha256:{:x}", Sha256::digest(query.as_bytes()))
}

/// SQLite-backed cache of the last fetched result set, keyed by the
/// search query. An explicit service instance with an open/drop
/// lifecycle; callers construct one and pass it where needed. Only one
/// refresh runs at a time, so a single connection is enough.
pub struct IssueCache {
    conn: Connection,
}

impl IssueCache {
    pub fn open(path: &Path) -> Result<Self, String> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("Cannot create cache directory: {}", e))?;
        }
        let conn = Connection::open(path).map_err(|e| format!("Cannot open cache: {}", e))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS issues (
                id TEXT PRIMARY KEY,
                query_hash TEXT NOT NULL,
                payload TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                last_fetch TEXT NOT NULL,
                total_issues INTEGER NOT NULL,
                query TEXT NOT NULL,
                query_hash TEXT NOT NULL
            );",
        )
        .map_err(|e| format!("Cannot create cache tables: {}", e))?;

        Ok(IssueCache { conn })
    }

    pub fn open_default() -> Result<Self, String> {
        Self::open(&default_path())
    }

    /// Replace the cached result set for `query` and stamp the metadata
    /// row. All-or-nothing: a failed save leaves the previous contents.
    pub fn save(&mut self, issues: &[Issue], query: &str) -> Result<(), String> {
        let hash = query_hash(query);
        let tx = self
            .conn
            .transaction()
            .map_err(|e| format!("Cannot start cache transaction: {}", e))?;

        tx.execute("DELETE FROM issues", [])
            .map_err(|e| format!("Cannot clear cached issues: {}", e))?;

        for issue in issues {
            let payload = serde_json::to_string(issue)
                .map_err(|e| format!("Cannot serialize issue {}: {}", issue.id, e))?;
            tx.execute(
                "INSERT OR REPLACE INTO issues (id, query_hash, payload) VALUES (?1, ?2, ?3)",
                params![issue.id, hash, payload],
            )
            .map_err(|e| format!("Cannot cache issue {}: {}", issue.id, e))?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, last_fetch, total_issues, query, query_hash)
             VALUES ('issues', ?1, ?2, ?3, ?4)",
            params![Utc::now().to_rfc3339(), issues.len() as u32, query, hash],
        )
        .map_err(|e| format!("Cannot update cache metadata: {}", e))?;

        tx.commit()
            .map_err(|e| format!("Cannot commit cache transaction: {}", e))
    }

    pub fn load(&self) -> Result<Vec<Issue>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM issues")
            .map_err(|e| format!("Cache query error: {}", e))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| format!("Cache query error: {}", e))?;

        let mut issues = Vec::new();
        for payload in rows.flatten() {
            let issue: Issue = serde_json::from_str(&payload)
                .map_err(|e| format!("Corrupt cached issue: {}", e))?;
            issues.push(issue);
        }
        Ok(issues)
    }

    pub fn metadata(&self) -> Result<Option<CacheMetadata>, String> {
        let row = self
            .conn
            .query_row(
                "SELECT last_fetch, total_issues, query FROM metadata WHERE key = 'issues'",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| format!("Cache metadata error: {}", e))?;

        match row {
            Some((last_fetch_str, total_issues, query)) => {
                let last_fetch = DateTime::parse_from_rfc3339(&last_fetch_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| format!("Corrupt cache timestamp: {}", e))?;
                Ok(Some(CacheMetadata {
                    last_fetch,
                    total_issues,
                    query,
                }))
            }
            None => Ok(None),
        }
    }

    /// True when a result set for this exact query is present and younger
    /// than the TTL.
    pub fn is_valid(&self, ttl_minutes: u64, query: &str) -> Result<bool, String> {
        let meta = match self.metadata()? {
            Some(m) => m,
            None => return Ok(false),
        };
        if meta.query != query {
            return Ok(false);
        }
        let age_minutes = Utc::now()
            .signed_duration_since(meta.last_fetch)
            .num_minutes();
        Ok(age_minutes >= 0 && (age_minutes as u64) < ttl_minutes)
    }

    pub fn clear(&self) -> Result<(), String> {
        self.conn
            .execute("DELETE FROM issues", [])
            .map_err(|e| format!("Cannot clear cache: {}", e))?;
        self.conn
            .execute("DELETE FROM metadata", [])
            .map_err(|e| format!("Cannot clear cache metadata: {}", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn make_issue(id: &str) -> Issue {
        Issue {
            id: id.to_string(),
            link: format!("https://tracker.example.com/browse/{}", id),
            name: "task".to_string(),
            kind: "Task".to_string(),
            assignee: "Alice".to_string(),
            status: "To Do".to_string(),
            status_category: "To Do".to_string(),
            sprint: "Sprint 1".to_string(),
            sprint_start: None,
            sprint_end: None,
            time_spent_days: 0.0,
            story_points: 1.0,
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            stages: Vec::new(),
            stage_durations: HashMap::new(),
        }
    }

    fn temp_cache() -> (tempfile::TempDir, IssueCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = IssueCache::open(&dir.path().join("issues.db")).unwrap();
        (dir, cache)
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (_dir, mut cache) = temp_cache();
        cache
            .save(&[make_issue("AM-1"), make_issue("AM-2")], "project = AM")
            .unwrap();

        let mut loaded = cache.load().unwrap();
        loaded.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "AM-1");
        assert_eq!(loaded[0].assignee, "Alice");
    }

    #[test]
    fn test_save_replaces_previous_set() {
        let (_dir, mut cache) = temp_cache();
        cache.save(&[make_issue("AM-1")], "q").unwrap();
        cache.save(&[make_issue("AM-9")], "q").unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "AM-9");
    }

    #[test]
    fn test_metadata_recorded() {
        let (_dir, mut cache) = temp_cache();
        assert!(cache.metadata().unwrap().is_none());

        cache.save(&[make_issue("AM-1")], "project = AM").unwrap();
        let meta = cache.metadata().unwrap().unwrap();
        assert_eq!(meta.total_issues, 1);
        assert_eq!(meta.query, "project = AM");
    }

    #[test]
    fn test_ttl_validity() {
        let (_dir, mut cache) = temp_cache();
        cache.save(&[make_issue("AM-1")], "q").unwrap();

        assert!(cache.is_valid(60, "q").unwrap());
        // Zero TTL: even a fresh cache has aged out.
        assert!(!cache.is_valid(0, "q").unwrap());
    }

    #[test]
    fn test_query_change_invalidates() {
        let (_dir, mut cache) = temp_cache();
        cache.save(&[make_issue("AM-1")], "project = AM").unwrap();
        assert!(!cache.is_valid(60, "project = ZZ").unwrap());
    }

    #[test]
    fn test_clear_empties_everything() {
        let (_dir, mut cache) = temp_cache();
        cache.save(&[make_issue("AM-1")], "q").unwrap();
        cache.clear().unwrap();

        assert!(cache.load().unwrap().is_empty());
        assert!(cache.metadata().unwrap().is_none());
        assert!(!cache.is_valid(60, "q").unwrap());
    }
}
