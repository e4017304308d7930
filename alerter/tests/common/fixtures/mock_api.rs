//! Mock chain API server
//!
//! Responses follow the API server's envelope: `{"result": ...}` on success
//! and `{"error": "..."}` otherwise.

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub struct MockApiServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockApiServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    pub async fn mock_result(&self, endpoint: &str, result: Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
            .mount(&self.server)
            .await;
    }

    /// Like [`Self::mock_result`] but only for requests carrying `height`
    pub async fn mock_result_at_height(&self, endpoint: &str, height: u64, result: Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(query_param("height", height.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_error(&self, endpoint: &str, message: &str) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": message })))
            .mount(&self.server)
            .await;
    }

    /// Every direct check succeeds for a node at `height` with `peers` peers
    pub async fn mock_healthy_node(&self, height: u64, peers: u64) {
        self.mock_result("/api/ping", json!("pong")).await;
        self.mock_result("/api/pingnode", json!(height)).await;
        self.mock_result("/api/nodecontroller/synced", json!(true)).await;
        self.mock_result("/api/prometheus/gauge", json!(peers)).await;
        self.mock_result(
            "/api/consensus/blockheader",
            json!({ "height": height, "time": "2024-01-01T12:00:00Z" }),
        )
        .await;
    }

    pub async fn mock_connections(&self, names: &[&str]) {
        self.mock_result("/api/getconnectionslist", json!(names)).await;
    }

    /// Registry entries resolved for a validator at startup
    pub async fn mock_validator_registry(&self, entity_id: &str, consensus_id: &str, address: &str) {
        self.mock_result(
            "/api/registry/node",
            json!({ "entity_id": entity_id, "consensus": { "id": consensus_id } }),
        )
        .await;
        self.mock_result("/api/consensus/pubkeyaddress", json!(address)).await;
    }

    /// Chain data read through a validator's data source
    pub async fn mock_validator_chain(
        &self,
        node_public_key: &str,
        voting_power: u64,
        latest_height: u64,
        signers: &[&str],
        bonded: u128,
    ) {
        self.mock_result(
            "/api/scheduler/validators",
            json!([{ "id": node_public_key, "voting_power": voting_power }]),
        )
        .await;
        self.mock_result("/api/consensus/block", json!({ "height": latest_height })).await;
        let signatures: Vec<Value> = signers
            .iter()
            .map(|a| json!({ "validator_address": a }))
            .chain(std::iter::once(Value::Null))
            .collect();
        self.mock_result(
            "/api/consensus/blocklastcommit",
            json!({ "signatures": signatures }),
        )
        .await;
        self.mock_result("/api/staking/events", Value::Null).await;
        self.mock_result(
            "/api/staking/account",
            json!({
                "escrow": {
                    "active": { "balance": bonded.to_string() },
                    "debonding": { "balance": "0" }
                }
            }),
        )
        .await;
        self.mock_result("/api/staking/delegations", Value::Null).await;
    }
}
