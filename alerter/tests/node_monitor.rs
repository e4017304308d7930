mod common;

use alerter::alerts::{AlertCode, Severity};
use alerter::api::OasisApi;
use alerter::config::StoreConfig;
use alerter::registry::NodeHandle;
use alerter::store::{keys, Store};
use alerter::supervisor::PassOutcome;
use alerter::timing::ManualClock;
use alerter::{MonitorContext, NodeMonitor};
use chrono::Duration;
use common::fixtures::*;
use std::sync::Arc;

struct Harness {
    counter: Arc<CounterChannel>,
    clock: Arc<ManualClock>,
    ctx: MonitorContext,
}

fn harness(store: Option<Arc<Store>>) -> Harness {
    let counter = CounterChannel::new();
    let clock = Arc::new(ManualClock::new(start_time()));
    let ctx = MonitorContext {
        api: OasisApi::new().unwrap(),
        channels: Arc::new(CounterChannel::channel_set(&counter)),
        store,
        store_config: StoreConfig::default(),
        clock: clock.clone(),
    };
    Harness { counter, clock, ctx }
}

/// A validator reading its own chain data, with archive checks off
fn self_sourced_validator(h: &Harness, node: &NodeHandle, max_catch_up_blocks: u64) -> NodeMonitor {
    NodeMonitor::new(node.clone(), h.ctx.clone(), max_catch_up_blocks, vec![node.clone()], true)
}

#[tokio::test]
async fn healthy_full_node_pass_is_silent() {
    let api = MockApiServer::start().await;
    api.mock_healthy_node(100, 12).await;

    let h = harness(None);
    let node = handle(full_node_identity("full-1", &api.base_url));
    let mut monitor = NodeMonitor::new(node.clone(), h.ctx.clone(), 500, vec![node.clone()], true);

    assert_eq!(monitor.name(), "Node monitor (full-1)");
    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);

    let state = node.state.read().await;
    assert_eq!(state.no_of_peers(), Some(12));
    assert_eq!(state.finalized_block_height(), 100);
    assert!(!state.is_down());
    assert!(!state.is_syncing());
    assert_eq!(state.bonded_balance(), Some(0));
    assert_eq!(state.is_active(), Some(false));
    assert_eq!(h.counter.total(), 0);
}

#[tokio::test]
async fn validator_pass_reads_chain_data_and_advances_cursor() {
    let api = MockApiServer::start().await;
    api.mock_healthy_node(50, 12).await;
    api.mock_connections(&["validator-1"]).await;
    api.mock_validator_chain("validator-1-node-key", 10, 50, &["validator-1-tm"], 5_000_000_000)
        .await;

    let h = harness(None);
    let node = handle(validator_identity("validator-1", &api.base_url));
    let mut monitor = self_sourced_validator(&h, &node, 500);

    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);

    // Started one below the tip and checked that height
    assert_eq!(monitor.last_height_checked(), Some(50));
    assert!(!monitor.is_catching_up());
    assert_eq!(
        monitor.last_data_source_used().map(|n| n.name().to_string()),
        Some("validator-1".to_string())
    );

    let state = node.state.read().await;
    assert_eq!(state.is_active(), Some(true));
    assert_eq!(state.voting_power(), Some(10));
    assert_eq!(state.bonded_balance(), Some(5_000_000_000));
    assert_eq!(state.debonding_balance(), Some(0));
    assert_eq!(state.shares_balance(), Some(0));
    assert_eq!(state.consecutive_blocks_missed_so_far(), 0);
    assert_eq!(h.counter.total(), 0);
}

#[tokio::test]
async fn cursor_does_not_pass_the_tip() {
    let api = MockApiServer::start().await;
    api.mock_healthy_node(50, 12).await;
    api.mock_connections(&["validator-1"]).await;
    api.mock_validator_chain("validator-1-node-key", 10, 50, &["validator-1-tm"], 0)
        .await;

    let h = harness(None);
    let node = handle(validator_identity("validator-1", &api.base_url));
    let mut monitor = self_sourced_validator(&h, &node, 500);

    monitor.run_pass().await;
    monitor.run_pass().await;
    assert_eq!(monitor.last_height_checked(), Some(51));

    // Nothing left to check until the chain moves
    monitor.run_pass().await;
    assert_eq!(monitor.last_height_checked(), Some(51));
}

#[tokio::test]
async fn missing_precommits_are_counted_across_passes() {
    let api = MockApiServer::start().await;
    api.mock_healthy_node(50, 12).await;
    api.mock_connections(&["validator-1"]).await;
    api.mock_validator_chain("validator-1-node-key", 10, 50, &["someone-else-tm"], 0)
        .await;

    let h = harness(None);
    let node = handle(validator_identity("validator-1", &api.base_url));
    let mut monitor = self_sourced_validator(&h, &node, 500);

    monitor.run_pass().await;
    assert_eq!(node.state.read().await.consecutive_blocks_missed_so_far(), 1);
    assert_eq!(h.counter.count_code(AlertCode::MissedBlocks), 0);

    monitor.run_pass().await;
    assert_eq!(node.state.read().await.consecutive_blocks_missed_so_far(), 2);
    assert_eq!(h.counter.events(), vec![(Severity::Info, AlertCode::MissedBlocks)]);
}

#[tokio::test]
async fn far_behind_cursor_jumps_to_catch_up_window() {
    let api = MockApiServer::start().await;
    api.mock_healthy_node(1000, 12).await;
    api.mock_connections(&["validator-1"]).await;
    api.mock_validator_chain("validator-1-node-key", 10, 1000, &["validator-1-tm"], 0)
        .await;

    let store = Arc::new(Store::in_memory("test").await.unwrap());
    let h = harness(Some(store.clone()));
    let node = handle(validator_identity("validator-1", &api.base_url));
    let mut monitor = self_sourced_validator(&h, &node, 100);

    store
        .set(&keys::node_monitor_last_height_checked(monitor.name()), "5")
        .await
        .unwrap();
    monitor.load_state().await.unwrap();
    assert_eq!(monitor.last_height_checked(), Some(5));

    monitor.run_pass().await;

    // Checked 900, still far from the tip
    assert_eq!(monitor.last_height_checked(), Some(901));
    assert!(monitor.is_catching_up());
}

#[tokio::test]
async fn pass_persists_cursor_and_alive_key() {
    let api = MockApiServer::start().await;
    api.mock_healthy_node(50, 12).await;
    api.mock_connections(&["validator-1"]).await;
    api.mock_validator_chain("validator-1-node-key", 10, 50, &["validator-1-tm"], 0)
        .await;

    let store = Arc::new(Store::in_memory("test").await.unwrap());
    let h = harness(Some(store.clone()));
    let node = handle(validator_identity("validator-1", &api.base_url));
    let mut monitor = self_sourced_validator(&h, &node, 500);

    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);

    let name = monitor.name().to_string();
    assert_eq!(
        store
            .get_int(&keys::node_monitor_last_height_checked(&name))
            .await
            .unwrap(),
        Some(50)
    );
    assert_eq!(
        store.get_int(&keys::node_monitor_alive(&name)).await.unwrap(),
        Some(start_time().timestamp())
    );

    // A fresh monitor picks the cursor back up
    let mut restarted = self_sourced_validator(&h, &node, 500);
    restarted.load_state().await.unwrap();
    assert_eq!(restarted.last_height_checked(), Some(50));
}

#[tokio::test]
async fn lost_connection_escalates_then_recovers() {
    let api = MockApiServer::start().await;
    api.mock_error("/api/pingnode", "Failed to ping node by retrieving highest block height!")
        .await;

    let h = harness(None);
    let node = handle(full_node_identity("full-1", &api.base_url));
    let mut monitor = NodeMonitor::new(node.clone(), h.ctx.clone(), 500, vec![], true);

    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);
    assert!(node.is_down().await);
    assert_eq!(h.counter.events(), vec![(Severity::Info, AlertCode::ExperiencingDelays)]);

    h.clock.advance(Duration::seconds(30));
    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);
    assert_eq!(
        h.counter.events().last(),
        Some(&(Severity::Warning, AlertCode::CannotAccessNode))
    );

    api.server.reset().await;
    api.mock_healthy_node(100, 12).await;
    h.clock.advance(Duration::seconds(30));
    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);

    assert!(!node.is_down().await);
    assert_eq!(
        h.counter.events().last(),
        Some(&(Severity::Info, AlertCode::NowAccessible))
    );
}

#[tokio::test]
async fn unknown_node_is_reported_as_disconnected_once() {
    let api = MockApiServer::start().await;
    api.mock_error("/api/pingnode", "Node name requested doesn't exist").await;

    let h = harness(None);
    let node = handle(validator_identity("validator-1", &api.base_url));
    let mut monitor = NodeMonitor::new(node.clone(), h.ctx.clone(), 500, vec![], true);

    monitor.run_pass().await;
    monitor.run_pass().await;

    assert!(!node.state.read().await.is_connected_to_api_server());
    assert_eq!(
        h.counter.events(),
        vec![(Severity::Critical, AlertCode::NodeNotConnectedToApiServer)]
    );

    api.server.reset().await;
    api.mock_healthy_node(100, 12).await;
    monitor.run_pass().await;

    assert!(node.state.read().await.is_connected_to_api_server());
    assert_eq!(h.counter.count_code(AlertCode::NodeConnectedToApiServerAgain), 1);
}

#[tokio::test]
async fn unreachable_api_warns_then_goes_critical_for_validators() {
    // Nothing listens on port 1
    let h = harness(None);
    let node = handle(validator_identity("validator-1", "http://127.0.0.1:1"));
    let mut monitor = NodeMonitor::new(node.clone(), h.ctx.clone(), 500, vec![], true);

    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);
    assert!(monitor.api_liveness().is_api_down());
    assert_eq!(h.counter.events(), vec![(Severity::Warning, AlertCode::ApiIsDown)]);

    h.clock.advance(Duration::seconds(5));
    monitor.run_pass().await;
    assert_eq!(h.counter.total(), 1);

    h.clock.advance(Duration::seconds(20));
    monitor.run_pass().await;
    monitor.run_pass().await;
    assert_eq!(
        h.counter.events(),
        vec![
            (Severity::Warning, AlertCode::ApiIsDown),
            (Severity::Critical, AlertCode::ApiIsDown),
        ]
    );
}

#[tokio::test]
async fn unparsable_public_key_stops_the_monitor() {
    let api = MockApiServer::start().await;
    api.mock_error("/api/pingnode", "Failed to Unmarshal Public Key").await;

    let h = harness(None);
    let node = handle(validator_identity("validator-1", &api.base_url));
    let mut monitor = NodeMonitor::new(node, h.ctx.clone(), 500, vec![], true);

    assert!(matches!(monitor.run_pass().await, PassOutcome::Stop(_)));
    assert_eq!(h.counter.total(), 0);
}

#[tokio::test]
async fn failed_api_call_is_reported_as_read_error() {
    let api = MockApiServer::start().await;
    api.mock_error("/api/pingnode", "Error: API call pingNode failed.").await;

    let h = harness(None);
    let node = handle(full_node_identity("full-1", &api.base_url));
    let mut monitor = NodeMonitor::new(node, h.ctx.clone(), 500, vec![], true);

    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);
    assert_eq!(
        h.counter.events(),
        vec![(Severity::Error, AlertCode::ErrorWhenReadingData)]
    );
}

#[tokio::test]
async fn no_connected_data_source_is_critical() {
    let api = MockApiServer::start().await;
    api.mock_healthy_node(50, 12).await;
    api.mock_connections(&[]).await;

    let h = harness(None);
    let node = handle(validator_identity("validator-1", &api.base_url));
    let mut monitor = self_sourced_validator(&h, &node, 500);

    assert_eq!(monitor.run_pass().await, PassOutcome::Continue);
    assert_eq!(
        h.counter.events(),
        vec![(Severity::Critical, AlertCode::CouldNotFindLiveNodeConnectedToApiServer)]
    );
    assert_eq!(monitor.last_height_checked(), None);
}

#[tokio::test]
async fn missing_archive_node_is_alerted_once() {
    let api = MockApiServer::start().await;
    api.mock_healthy_node(50, 12).await;
    api.mock_connections(&["validator-1"]).await;
    api.mock_validator_chain("validator-1-node-key", 10, 50, &["validator-1-tm"], 0)
        .await;

    let h = harness(None);
    let node = handle(validator_identity("validator-1", &api.base_url));
    let mut monitor = NodeMonitor::new(node.clone(), h.ctx.clone(), 500, vec![node.clone()], false);

    assert!(monitor.archive_monitoring_data_sources().is_empty());

    monitor.run_pass().await;
    monitor.run_pass().await;

    assert!(monitor.no_live_archive_node_alert_sent());
    assert_eq!(
        h.counter.events(),
        vec![(
            Severity::Critical,
            AlertCode::CouldNotFindLiveArchiveNodeConnectedToApiServer
        )]
    );
    // The regular walk still advanced
    assert_eq!(monitor.last_height_checked(), Some(51));
}

#[tokio::test]
async fn archive_node_found_again_is_announced() {
    let api = MockApiServer::start().await;
    api.mock_healthy_node(50, 12).await;
    api.mock_connections(&["validator-1"]).await;
    api.mock_validator_chain("validator-1-node-key", 10, 50, &["validator-1-tm"], 0)
        .await;

    let h = harness(None);
    let node = handle(validator_identity("validator-1", &api.base_url));
    let archive = handle(alerter::state::NodeIdentity {
        is_archive_node: true,
        ..full_node_identity("archive-1", &api.base_url)
    });
    let mut monitor = NodeMonitor::new(
        node.clone(),
        h.ctx.clone(),
        500,
        vec![archive.clone(), node.clone()],
        false,
    );

    // Archive is not connected yet
    monitor.run_pass().await;
    assert!(monitor.no_live_archive_node_alert_sent());

    api.server.reset().await;
    api.mock_healthy_node(50, 12).await;
    api.mock_connections(&["validator-1", "archive-1"]).await;
    api.mock_validator_chain("validator-1-node-key", 10, 50, &["validator-1-tm"], 0)
        .await;
    archive
        .state
        .write()
        .await
        .update_finalized_block_height(50, &h.ctx.channels, start_time());
    h.counter.clear();

    monitor.run_pass().await;

    assert!(!monitor.no_live_archive_node_alert_sent());
    assert_eq!(
        h.counter.events(),
        vec![(Severity::Info, AlertCode::FoundLiveArchiveNodeAgain)]
    );
}
