//! Mock webhook server for testing alert delivery

use serde_json::Value;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct MockWebhookServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockWebhookServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    pub async fn mock_success(&self) {
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_failure(&self, status_code: u16) {
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(status_code))
            .mount(&self.server)
            .await;
    }

    pub fn webhook_url(&self) -> String {
        format!("{}/webhook", self.base_url)
    }

    /// JSON bodies received so far
    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|req| req.body_json::<Value>().ok())
            .collect()
    }

    /// Polls until `count` requests arrived or a second has passed
    pub async fn wait_for_requests(&self, count: usize) -> Vec<Value> {
        for _ in 0..100 {
            let bodies = self.received_bodies().await;
            if bodies.len() >= count {
                return bodies;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.received_bodies().await
    }
}
