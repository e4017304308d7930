//! Client for the GitHub releases API

use crate::constants::github::{RELEASES_PER_PAGE, REQUEST_TIMEOUT, USER_AGENT};
use crate::errors::GitHubError;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// One entry of `GET /repos/{owner}/{repo}/releases`, newest first
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prerelease: bool,
}

impl Release {
    /// The release name, or its tag when it has none
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.tag_name,
        }
    }
}

#[derive(Clone)]
pub struct GitHubApi {
    client: Client,
    api_url: String,
}

impl GitHubApi {
    pub fn new(api_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client for GitHub: {}", e))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    /// Releases endpoint of an `owner/repository` page
    pub fn releases_page(&self, repo_page: &str) -> String {
        format!(
            "{}/repos/{}/releases",
            self.api_url.trim_end_matches('/'),
            repo_page.trim_matches('/')
        )
    }

    pub async fn get_releases(&self, releases_page: &str) -> Result<Vec<Release>, GitHubError> {
        let request_failed = |e: reqwest::Error| GitHubError::Request {
            url: releases_page.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(releases_page)
            .header(header::ACCEPT, "application/vnd.github+json")
            .query(&[("per_page", RELEASES_PER_PAGE)])
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GitHubError::NotFound {
                url: releases_page.to_string(),
            });
        }
        if !status.is_success() {
            return Err(GitHubError::Status {
                url: releases_page.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await.map_err(|e| GitHubError::Decode {
            url: releases_page.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Retrieved releases from {}", releases_page);

        parse_releases(body, releases_page)
    }
}

/// Reads a releases body; `{"message": "Not Found"}` means the repository
/// does not exist
pub fn parse_releases(body: Value, releases_page: &str) -> Result<Vec<Release>, GitHubError> {
    if body.get("message").and_then(Value::as_str) == Some("Not Found") {
        return Err(GitHubError::NotFound {
            url: releases_page.to_string(),
        });
    }

    serde_json::from_value(body).map_err(|e| GitHubError::Decode {
        url: releases_page.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = "https://api.github.com/repos/oasisprotocol/oasis-core/releases";

    #[test]
    fn releases_page_tolerates_slashes() {
        let github = GitHubApi::new("https://api.github.com/").unwrap();
        assert_eq!(github.releases_page("/oasisprotocol/oasis-core/"), PAGE);
        assert_eq!(github.releases_page("oasisprotocol/oasis-core"), PAGE);
    }

    #[test]
    fn not_found_message_is_classified() {
        let err = parse_releases(json!({ "message": "Not Found" }), PAGE).unwrap_err();
        assert_eq!(err, GitHubError::NotFound { url: PAGE.to_string() });
    }

    #[test]
    fn unnamed_release_falls_back_to_its_tag() {
        let releases = parse_releases(
            json!([
                { "id": 2, "tag_name": "v22.1", "name": "" },
                { "id": 1, "tag_name": "v22.0", "name": "Oasis Core 22.0", "prerelease": true }
            ]),
            PAGE,
        )
        .unwrap();

        assert_eq!(releases[0].display_name(), "v22.1");
        assert_eq!(releases[1].display_name(), "Oasis Core 22.0");
        assert!(releases[1].prerelease);
    }

    #[test]
    fn object_body_is_a_decode_error() {
        assert!(matches!(
            parse_releases(json!({ "documentation_url": "x" }), PAGE),
            Err(GitHubError::Decode { .. })
        ));
    }
}
