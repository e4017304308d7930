//! Client for the chain API server
//!
//! Every endpoint answers `{"result": ...}` on success or `{"error": "..."}`
//! on failure; errors are classified into [`ApiError`] variants from their
//! message text.

pub mod github;
pub mod liveness;
pub mod types;

pub use github::GitHubApi;
pub use liveness::ApiLiveness;

use crate::constants::api::REQUEST_TIMEOUT;
use crate::errors::ApiError;
use anyhow::anyhow;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use types::{
    BlockHeader, ConsensusBlock, Delegations, Gauge, RegistryNode, SessionValidator, SignedBlock,
    StakingAccount,
};

#[derive(Clone)]
pub struct OasisApi {
    client: Client,
}

impl OasisApi {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client for the API server: {}", e))?;
        Ok(Self { client })
    }

    pub async fn get_web_sockets_connected_to_an_api(&self, api_url: &str) -> Result<Vec<String>, ApiError> {
        self.call(api_url, "/api/getconnectionslist", &[]).await
    }

    pub async fn ping_api(&self, api_url: &str) -> Result<Value, ApiError> {
        self.call(api_url, "/api/ping", &[]).await
    }

    pub async fn ping_node(&self, api_url: &str, node_name: &str) -> Result<Value, ApiError> {
        self.call(api_url, "/api/pingnode", &[("name", node_name)]).await
    }

    pub async fn get_node(&self, api_url: &str, node_name: &str, node_id: &str) -> Result<Value, ApiError> {
        self.call(api_url, "/api/registry/node", &[("name", node_name), ("nodeID", node_id)])
            .await
    }

    pub async fn get_registry_node(
        &self,
        api_url: &str,
        node_name: &str,
        node_id: &str,
    ) -> Result<RegistryNode, ApiError> {
        self.call(api_url, "/api/registry/node", &[("name", node_name), ("nodeID", node_id)])
            .await
    }

    /// Returns true while the node is still syncing
    pub async fn get_is_syncing(&self, api_url: &str, node_name: &str) -> Result<bool, ApiError> {
        let synced: bool = self
            .call(api_url, "/api/nodecontroller/synced", &[("name", node_name)])
            .await?;
        Ok(!synced)
    }

    pub async fn get_prometheus_gauge(
        &self,
        api_url: &str,
        node_name: &str,
        gauge_name: &str,
    ) -> Result<f64, ApiError> {
        let gauge: Gauge = self
            .call(api_url, "/api/prometheus/gauge", &[("name", node_name), ("gauge", gauge_name)])
            .await?;
        Ok(gauge.0)
    }

    pub async fn get_block_header(&self, api_url: &str, node_name: &str) -> Result<BlockHeader, ApiError> {
        self.call(api_url, "/api/consensus/blockheader", &[("name", node_name)])
            .await
    }

    pub async fn get_block_header_at_height(
        &self,
        api_url: &str,
        node_name: &str,
        height: u64,
    ) -> Result<BlockHeader, ApiError> {
        let height = height.to_string();
        self.call(
            api_url,
            "/api/consensus/blockheader",
            &[("name", node_name), ("height", &height)],
        )
        .await
    }

    pub async fn get_consensus_block(&self, api_url: &str, node_name: &str) -> Result<ConsensusBlock, ApiError> {
        self.call(api_url, "/api/consensus/block", &[("name", node_name)])
            .await
    }

    pub async fn get_session_validators(
        &self,
        api_url: &str,
        node_name: &str,
    ) -> Result<Vec<SessionValidator>, ApiError> {
        let validators: Option<Vec<SessionValidator>> = self
            .call(api_url, "/api/scheduler/validators", &[("name", node_name)])
            .await?;
        Ok(validators.unwrap_or_default())
    }

    pub async fn get_signed_blocks(
        &self,
        api_url: &str,
        node_name: &str,
        height: u64,
    ) -> Result<SignedBlock, ApiError> {
        let height = height.to_string();
        self.call(
            api_url,
            "/api/consensus/blocklastcommit",
            &[("name", node_name), ("height", &height)],
        )
        .await
    }

    pub async fn get_staking_account(
        &self,
        api_url: &str,
        node_name: &str,
        address: &str,
    ) -> Result<StakingAccount, ApiError> {
        self.call(
            api_url,
            "/api/staking/account",
            &[("name", node_name), ("address", address)],
        )
        .await
    }

    pub async fn get_staking_delegations(
        &self,
        api_url: &str,
        node_name: &str,
        address: &str,
    ) -> Result<Delegations, ApiError> {
        self.call(
            api_url,
            "/api/staking/delegations",
            &[("name", node_name), ("address", address)],
        )
        .await
    }

    pub async fn get_events_by_height(
        &self,
        api_url: &str,
        node_name: &str,
        height: u64,
    ) -> Result<Vec<Value>, ApiError> {
        let height = height.to_string();
        let events: Option<Vec<Value>> = self
            .call(api_url, "/api/staking/events", &[("name", node_name), ("height", &height)])
            .await?;
        Ok(events.unwrap_or_default())
    }

    pub async fn get_tendermint_address(
        &self,
        api_url: &str,
        consensus_public_key: &str,
    ) -> Result<String, ApiError> {
        self.call(
            api_url,
            "/api/consensus/pubkeyaddress",
            &[("consensus_public_key", consensus_public_key)],
        )
        .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        api_url: &str,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let endpoint = format!("{}{}", api_url.trim_end_matches('/'), path);

        let response = self
            .client
            .get(&endpoint)
            .query(params)
            .send()
            .await
            .map_err(|e| ApiError::Request {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let body: Value = response.json().await.map_err(|e| ApiError::Request {
            endpoint: endpoint.clone(),
            reason: format!("invalid JSON body: {}", e),
        })?;
        debug!("{} responded with {}", endpoint, body);

        let result = extract_result(body)?;
        serde_json::from_value(result).map_err(|e| ApiError::Decode {
            endpoint,
            reason: e.to_string(),
        })
    }
}

/// Unwraps the `result` of a response body or classifies its `error`
pub fn extract_result(body: Value) -> Result<Value, ApiError> {
    let Value::Object(mut map) = body else {
        return Err(ApiError::UnexpectedApiRead(body.to_string()));
    };

    if let Some(result) = map.remove("result") {
        return Ok(result);
    }

    match map.remove("error") {
        Some(Value::String(message)) => Err(classify_error(&message)),
        Some(other) => Err(classify_error(&other.to_string())),
        None => Err(ApiError::UnexpectedApiRead(Value::Object(map).to_string())),
    }
}

pub fn classify_error(message: &str) -> ApiError {
    let message_owned = message.to_string();

    if message.contains("API call") && message.contains("failed") {
        ApiError::ApiCallFailed(message_owned)
    } else if message.contains("Node name requested doesn't exist")
        || message.contains("needs to be setup before it can be queried")
    {
        ApiError::NodeNotConnected(message_owned)
    } else if message.contains("Failed to ping node by retrieving highest block height!") {
        ApiError::ConnectionLost(message_owned)
    } else if message.contains("Failed to Unmarshal Public Key") {
        ApiError::InvalidConsensusPublicKey("Failed to parse Consensus public key.".to_string())
    } else {
        ApiError::UnexpectedApiCall(message_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("Error: API call pingNode failed." => matches ApiError::ApiCallFailed(_); "api call failed")]
    #[test_case("Node name requested doesn't exist" => matches ApiError::NodeNotConnected(_); "unknown node")]
    #[test_case("An API for node-1 needs to be setup before it can be queried" => matches ApiError::NodeNotConnected(_); "api not set up")]
    #[test_case("Failed to ping node by retrieving highest block height!" => matches ApiError::ConnectionLost(_); "connection lost")]
    #[test_case("Failed to Unmarshal Public Key" => matches ApiError::InvalidConsensusPublicKey(_); "bad key")]
    #[test_case("something odd happened" => matches ApiError::UnexpectedApiCall(_); "anything else")]
    fn errors_are_classified_by_message(message: &str) -> ApiError {
        classify_error(message)
    }

    #[test]
    fn result_is_unwrapped() {
        let value = extract_result(json!({"result": {"height": 10}})).unwrap();
        assert_eq!(value, json!({"height": 10}));
    }

    #[test]
    fn body_without_result_or_error_is_an_unexpected_read() {
        let err = extract_result(json!({"status": "ok"})).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedApiRead(_)));
        assert!(err.is_fatal());
    }
}
