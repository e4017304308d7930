//! Builders for node identities and states

use alerter::config::NodeAlertConfig;
use alerter::state::{NodeIdentity, NodeState};
use alerter::registry::NodeHandle;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

pub const CHAIN: &str = "test-chain";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

pub fn validator_identity(name: &str, api_url: &str) -> NodeIdentity {
    NodeIdentity {
        name: name.to_string(),
        api_url: api_url.to_string(),
        chain: CHAIN.to_string(),
        is_validator: true,
        is_archive_node: false,
        node_public_key: format!("{}-node-key", name),
        staking_address: Some(format!("{}-staking", name)),
        entity_public_key: format!("{}-entity", name),
        consensus_public_key: format!("{}-consensus", name),
        tendermint_address: format!("{}-tm", name),
        exporter_url: None,
    }
}

pub fn full_node_identity(name: &str, api_url: &str) -> NodeIdentity {
    NodeIdentity {
        name: name.to_string(),
        api_url: api_url.to_string(),
        chain: CHAIN.to_string(),
        is_validator: false,
        is_archive_node: false,
        node_public_key: format!("{}-node-key", name),
        staking_address: None,
        entity_public_key: String::new(),
        consensus_public_key: String::new(),
        tendermint_address: String::new(),
        exporter_url: None,
    }
}

pub fn validator(name: &str) -> NodeState {
    NodeState::new(
        Arc::new(validator_identity(name, "http://localhost:8080")),
        NodeAlertConfig::default(),
    )
}

pub fn validator_with(name: &str, config: NodeAlertConfig) -> NodeState {
    NodeState::new(Arc::new(validator_identity(name, "http://localhost:8080")), config)
}

pub fn full_node(name: &str) -> NodeState {
    NodeState::new(
        Arc::new(full_node_identity(name, "http://localhost:8080")),
        NodeAlertConfig::default(),
    )
}

pub fn full_node_with(name: &str, config: NodeAlertConfig) -> NodeState {
    NodeState::new(Arc::new(full_node_identity(name, "http://localhost:8080")), config)
}

pub fn handle(identity: NodeIdentity) -> NodeHandle {
    NodeHandle::new(NodeState::new(Arc::new(identity), NodeAlertConfig::default()))
}
