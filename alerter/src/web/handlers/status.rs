// Status endpoints

use axum::extract::{Path, State};
use chrono::Utc;
use futures::future::join_all;
use tracing::warn;

use super::common::{not_found, ApiResponse, ApiResult};
use crate::state::{NodeSnapshot, SystemSnapshot};
use crate::web::{AppState, HealthSummary};

/// Liveness of the alerter itself plus a count of nodes currently down
pub async fn get_health(State(state): State<AppState>) -> ApiResult<HealthSummary> {
    let down = join_all(state.registry.all().map(|node| node.is_down())).await;
    let nodes_down = down.into_iter().filter(|d| *d).count();

    ApiResponse::ok(HealthSummary {
        alerter_name: state.alerter_name.to_string(),
        nodes_total: state.registry.len(),
        nodes_down,
        systems_total: state.systems.len(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}

pub async fn get_all_nodes(State(state): State<AppState>) -> ApiResult<Vec<NodeSnapshot>> {
    let snapshots = join_all(
        state
            .registry
            .all()
            .map(|node| async move { node.state.read().await.snapshot() }),
    )
    .await;
    ApiResponse::ok(snapshots)
}

pub async fn get_node(
    Path(node_name): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<NodeSnapshot> {
    match state.registry.get(&node_name) {
        Some(node) => ApiResponse::ok(node.state.read().await.snapshot()),
        None => {
            warn!("Status requested for unknown node {}", node_name);
            Err(not_found(format!("Node {} not found", node_name)))
        }
    }
}

pub async fn get_all_systems(State(state): State<AppState>) -> ApiResult<Vec<SystemSnapshot>> {
    let snapshots = join_all(
        state
            .systems
            .iter()
            .map(|system| async move { system.read().await.snapshot() }),
    )
    .await;
    ApiResponse::ok(snapshots)
}
