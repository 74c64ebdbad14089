use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

/// Pages the tracker hands back per request.
const BATCH_SIZE: u32 = 100;
/// Safety cap on pagination round trips.
const MAX_ITERATIONS: u32 = 50;

/// Blocking client for the tracker's JQL search endpoint. Fetches run to
/// completion or fail as a unit; no partial result ever escapes, the
/// only in-flight adjustment being the one-shot Basic -> Bearer
/// authentication fallback.
pub struct TrackerClient {
    http: reqwest::blocking::Client,
    base_url: String,
    email: String,
    token: String,
}

fn issue_key(issue: &Value) -> Option<&str> {
    issue.get("key").and_then(|k| k.as_str())
}

/// Keep only issues whose key hasn't been seen yet. Paginated search
/// results can repeat entries when the backing index shifts mid-fetch.
fn dedupe_new(seen: &mut HashSet<String>, batch: Vec<Value>) -> Vec<Value> {
    batch
        .into_iter()
        .filter(|issue| match issue_key(issue) {
            Some(key) => seen.insert(key.to_string()),
            None => false,
        })
        .collect()
}

impl TrackerClient {
    pub fn new(base_url: &str, email: &str, token: &str) -> Result<Self, String> {
        if base_url.is_empty() {
            return Err(
                "Tracker base_url is not configured. Set [tracker] base_url in .sprintscoperc."
                    .to_string(),
            );
        }
        if token.is_empty() {
            return Err(
                "Tracker token is not configured. Set SPRINTSCOPE_TOKEN or [tracker] token."
                    .to_string(),
            );
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("sprintscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Cannot build HTTP client: {}", e))?;

        Ok(TrackerClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            token: token.to_string(),
        })
    }

    fn request_page(
        &self,
        query: &str,
        next_page_token: Option<&str>,
        use_bearer: bool,
    ) -> Result<reqwest::blocking::Response, String> {
        let url = format!("{}/rest/api/3/search/jql", self.base_url);
        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("X-Atlassian-Token", "no-check")
            .query(&[
                ("jql", query),
                ("maxResults", &BATCH_SIZE.to_string()),
                ("expand", "changelog"),
                ("fields", "*all"),
            ]);

        if let Some(token) = next_page_token {
            request = request.query(&[("nextPageToken", token)]);
        }

        request = if use_bearer {
            request.bearer_auth(&self.token)
        } else {
            request.basic_auth(&self.email, Some(&self.token))
        };

        request.send().map_err(|e| format!("Request failed: {}", e))
    }

    /// Fetch every page of the query result. `progress` is called with
    /// the running issue count after each page.
    pub fn fetch_issues<F>(&self, query: &str, mut progress: F) -> Result<Vec<Value>, String>
    where
        F: FnMut(usize),
    {
        let mut all_issues: Vec<Value> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut use_bearer = false;
        let mut next_page_token: Option<String> = None;
        let mut iteration = 0;

        loop {
            if iteration >= MAX_ITERATIONS {
                eprintln!(
                    "[SprintScope] Warning: reached maximum page count ({}), stopping fetch.",
                    MAX_ITERATIONS
                );
                break;
            }

            let mut response = self.request_page(query, next_page_token.as_deref(), use_bearer)?;

            // Some sites only accept the token as a Bearer credential;
            // switch once and retry the same page.
            if (response.status() == 401 || response.status() == 403) && !use_bearer {
                use_bearer = true;
                response = self.request_page(query, next_page_token.as_deref(), use_bearer)?;
            }

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().unwrap_or_default();
                let preview: String = body.chars().take(100).collect();
                return Err(format!("API {}: {}", status.as_u16(), preview));
            }

            let result: Value = response
                .json()
                .map_err(|e| format!("Invalid API response: {}", e))?;

            let batch = match result.get("issues") {
                Some(Value::Array(items)) if !items.is_empty() => items.clone(),
                _ => break,
            };

            let new_issues = dedupe_new(&mut seen, batch);
            if new_issues.is_empty() {
                break;
            }
            all_issues.extend(new_issues);
            progress(all_issues.len());

            if result.get("isLast").and_then(|v| v.as_bool()) == Some(true) {
                break;
            }
            next_page_token = result
                .get("nextPageToken")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            if next_page_token.is_none() {
                break;
            }

            iteration += 1;
        }

        Ok(all_issues)
    }
}
