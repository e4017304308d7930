//! Node initialisation from configuration
//!
//! Every configured node is checked against its API server before any
//! monitor starts. Validators also have their entity key, consensus key and
//! tendermint address resolved here, since block and event checks need them.
//! Nodes that cannot be initialised are reported and left out, and so are
//! repositories whose releases page cannot be read.

use crate::alerts::Alert;
use crate::api::{GitHubApi, OasisApi};
use crate::channels::ChannelSet;
use crate::config::{NodeAlertConfig, NodeConfig, RepoConfig};
use crate::constants::api::PEERS_GAUGE;
use crate::errors::{ApiError, GitHubError};
use crate::registry::{NodeHandle, NodeRegistry};
use crate::state::{NodeIdentity, NodeState};
use crate::store::Store;
use crate::timing::SharedClock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Resolves the identity of one node against its API server
pub async fn initialise_node(api: &OasisApi, node: &NodeConfig) -> Result<NodeIdentity, ApiError> {
    info!("Initialising {}", node.name);

    let pong = api.ping_api(&node.api_url).await?;
    if pong.as_str() != Some("pong") {
        warn!("API at {} replied '{}' to a ping", node.api_url, pong);
    }
    api.ping_node(&node.api_url, &node.name).await?;

    let entity_public_key = if node.is_validator {
        let registered = api
            .get_node(&node.api_url, &node.name, &node.node_public_key)
            .await?;
        entity_id(&registered, &node.api_url)?
    } else {
        String::new()
    };

    // Fails early when the node does not expose its metrics
    api.get_prometheus_gauge(&node.api_url, &node.name, PEERS_GAUGE)
        .await?;

    let (consensus_public_key, tendermint_address) = if node.is_validator {
        let registry_node = api
            .get_registry_node(&node.api_url, &node.name, &node.node_public_key)
            .await?;
        let consensus_public_key = registry_node.consensus.id;
        let tendermint_address = api
            .get_tendermint_address(&node.api_url, &consensus_public_key)
            .await?;
        (consensus_public_key, tendermint_address)
    } else {
        (String::new(), String::new())
    };

    Ok(NodeIdentity {
        name: node.name.clone(),
        api_url: node.api_url.clone(),
        chain: node.chain.clone(),
        is_validator: node.is_validator,
        is_archive_node: node.is_archive_node,
        node_public_key: node.node_public_key.clone(),
        staking_address: node.staking_address.clone(),
        entity_public_key,
        consensus_public_key,
        tendermint_address,
        exporter_url: node.exporter_url.clone(),
    })
}

fn entity_id(registered: &Value, api_url: &str) -> Result<String, ApiError> {
    registered
        .get("entity_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::Decode {
            endpoint: format!("{}/api/registry/node", api_url),
            reason: "missing entity_id".to_string(),
        })
}

/// Initialises every configured node and indexes the ones that made it
pub async fn initialise_nodes(
    api: &OasisApi,
    nodes: &[NodeConfig],
    alert_config: &NodeAlertConfig,
    channels: &ChannelSet,
    store: Option<&Store>,
    clock: &SharedClock,
) -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    for node in nodes {
        let identity = match initialise_node(api, node).await {
            Ok(identity) => identity,
            Err(e) => {
                error!("!!! Could not initialise {}: {}", node.name, e);
                let alert = Alert::node_inaccessible_during_startup(&node.name);
                if node.is_validator {
                    channels.alert_critical(alert);
                } else {
                    channels.alert_warning(alert);
                }
                continue;
            }
        };

        let mut state = NodeState::new(Arc::new(identity), alert_config.clone());
        if let Some(store) = store {
            if let Err(e) = state.load_state(store, clock.now()).await {
                warn!("Could not load saved state of {}: {}", node.name, e);
            }
        }

        info!("Successfully initialised {}", node.name);
        registry.register(NodeHandle::new(state), node.monitor_node, node.use_as_data_source);
    }

    registry
}

/// Keeps the repositories whose releases page answers
pub async fn initialise_repositories(
    github: &GitHubApi,
    repos: &[RepoConfig],
    channels: &ChannelSet,
) -> Vec<RepoConfig> {
    let mut reachable = Vec::new();

    for repo in repos {
        let releases_page = github.releases_page(&repo.repo_page);
        info!("Trying to connect to {}", releases_page);

        match github.get_releases(&releases_page).await {
            Ok(_) | Err(GitHubError::Decode { .. }) => {
                info!("Successfully reached {}", releases_page);
                reachable.push(repo.clone());
            }
            Err(e) => {
                error!("!!! Could not initialise repository {}: {}", repo.name, e);
                channels.alert_warning(Alert::repo_inaccessible_during_startup(&repo.name));
            }
        }
    }

    reachable
}
