//! Mock GitHub releases API

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const REPO_PAGE: &str = "oasisprotocol/oasis-core";

pub struct MockGitHubServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockGitHubServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    fn releases_path(repo_page: &str) -> String {
        format!("/repos/{}/releases", repo_page)
    }

    /// Releases as `(id, tag)` pairs, newest first
    pub async fn mock_releases(&self, repo_page: &str, releases: &[(u64, &str)]) {
        let body: Vec<Value> = releases
            .iter()
            .map(|(id, tag)| {
                json!({
                    "id": id,
                    "tag_name": tag,
                    "name": format!("Release {}", tag),
                    "html_url": format!("https://github.com/{}/releases/tag/{}", repo_page, tag),
                    "published_at": "2024-01-01T12:00:00Z",
                    "prerelease": false
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path(Self::releases_path(repo_page)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_not_found(&self, repo_page: &str) {
        Mock::given(method("GET"))
            .and(path(Self::releases_path(repo_page)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest/releases/releases#list-releases"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_status(&self, repo_page: &str, status_code: u16) {
        Mock::given(method("GET"))
            .and(path(Self::releases_path(repo_page)))
            .respond_with(ResponseTemplate::new(status_code))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_body(&self, repo_page: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(Self::releases_path(repo_page)))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
