use anyhow::{Context, Result};
use std::time::Duration;

const GITHUB_API_BASE: &str = "https://api.github.com";
const REPO_OWNER: &str = "oscilla-video";
const REPO_NAME: &str = "oscilla";

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    pub version: String,
    pub url: String,
}

/// Queries the latest GitHub release. Runs on its own thread, concurrent
/// with a render job; it shares no state with one.
pub fn fetch_latest_release() -> Result<ReleaseInfo> {
    let url = format!(
        "{}/repos/{}/{}/releases/latest",
        GITHUB_API_BASE, REPO_OWNER, REPO_NAME
    );
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(8))
        .build()
        .context("Failed to build HTTP client")?;
    let payload: serde_json::Value = client
        .get(&url)
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", "oscilla")
        .send()
        .context("Unable to reach GitHub")?
        .error_for_status()
        .context("GitHub returned an error status")?
        .json()
        .context("Invalid response from GitHub")?;

    Ok(ReleaseInfo {
        version: payload
            .get("tag_name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        url: payload
            .get("html_url")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
    })
}

/// Numeric version components, tolerant of a leading `v` and hyphenated
/// suffixes.
fn normalize_version(version: &str) -> Vec<u64> {
    version
        .trim()
        .trim_start_matches('v')
        .replace('-', ".")
        .split('.')
        .filter_map(|part| part.parse().ok())
        .collect()
}

pub fn is_update_available(current: &str, latest: &str) -> bool {
    normalize_version(latest) > normalize_version(current)
}
