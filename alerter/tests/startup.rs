mod common;

use alerter::alerts::{AlertCode, Severity};
use alerter::api::OasisApi;
use alerter::config::{NodeAlertConfig, NodeConfig};
use alerter::startup::{initialise_node, initialise_nodes};
use alerter::timing::{ManualClock, SharedClock};
use common::fixtures::*;
use std::sync::Arc;

fn node_config(name: &str, api_url: &str, is_validator: bool) -> NodeConfig {
    NodeConfig {
        name: name.to_string(),
        api_url: api_url.to_string(),
        chain: CHAIN.to_string(),
        is_validator,
        node_public_key: format!("{}-node-key", name),
        staking_address: is_validator.then(|| format!("{}-staking", name)),
        is_archive_node: false,
        monitor_node: true,
        use_as_data_source: true,
        exporter_url: None,
    }
}

#[tokio::test]
async fn validator_keys_are_resolved() {
    let api = MockApiServer::start().await;
    api.mock_healthy_node(10, 8).await;
    api.mock_validator_registry("entity-abc", "consensus-abc", "tm-abc").await;

    let identity = initialise_node(&OasisApi::new().unwrap(), &node_config("validator-1", &api.base_url, true))
        .await
        .unwrap();

    assert_eq!(identity.entity_public_key, "entity-abc");
    assert_eq!(identity.consensus_public_key, "consensus-abc");
    assert_eq!(identity.tendermint_address, "tm-abc");
    assert_eq!(identity.staking_address.as_deref(), Some("validator-1-staking"));
}

#[tokio::test]
async fn full_nodes_skip_key_resolution() {
    let api = MockApiServer::start().await;
    api.mock_healthy_node(10, 8).await;

    let identity = initialise_node(&OasisApi::new().unwrap(), &node_config("sentry-1", &api.base_url, false))
        .await
        .unwrap();

    assert!(identity.entity_public_key.is_empty());
    assert!(identity.tendermint_address.is_empty());
}

#[tokio::test]
async fn inaccessible_nodes_are_reported_and_skipped() {
    let api = MockApiServer::start().await;
    api.mock_result("/api/ping", serde_json::json!("pong")).await;
    api.mock_error("/api/pingnode", "Node name requested doesn't exist").await;

    let healthy = MockApiServer::start().await;
    healthy.mock_healthy_node(10, 8).await;

    let counter = CounterChannel::new();
    let channels = CounterChannel::channel_set(&counter);
    let clock: SharedClock = Arc::new(ManualClock::new(start_time()));
    let nodes = vec![
        node_config("validator-1", &api.base_url, true),
        node_config("sentry-1", &api.base_url, false),
        node_config("sentry-2", &healthy.base_url, false),
    ];

    let registry = initialise_nodes(
        &OasisApi::new().unwrap(),
        &nodes,
        &NodeAlertConfig::default(),
        &channels,
        None,
        &clock,
    )
    .await;

    assert_eq!(registry.len(), 1);
    assert!(registry.get("sentry-2").is_some());
    assert_eq!(
        counter.events(),
        vec![
            (Severity::Critical, AlertCode::NodeInaccessibleDuringStartup),
            (Severity::Warning, AlertCode::NodeInaccessibleDuringStartup),
        ]
    );
}
