// File: alerter/src/monitor/node.rs
use crate::alerts::Alert;
use crate::api::ApiLiveness;
use crate::constants::api::PEERS_GAUGE;
use crate::constants::node_monitor::CATCHING_UP_THRESHOLD;
use crate::errors::{MonitorError, NoLiveSourceError};
use crate::monitor::MonitorContext;
use crate::registry::NodeHandle;
use crate::store::keys;
use std::time::Duration;
use tracing::{debug, info};

/// Polls the chain API about one node
///
/// Direct monitoring asks the node itself for liveness, sync status, peers
/// and height. Indirect monitoring asks a live data source of the same chain
/// about the node's validator status, balances, precommits and staking
/// events, one block height per pass.
pub struct NodeMonitor {
    name: String,
    node: NodeHandle,
    ctx: MonitorContext,
    max_catch_up_blocks: u64,

    // Other data sources of the chain first, then the node itself
    indirect_sources: Vec<NodeHandle>,
    archive_sources: Vec<NodeHandle>,
    archive_alerts_disabled: bool,

    liveness: ApiLiveness,
    last_data_source_used: Option<NodeHandle>,
    last_height_checked: Option<u64>,
    catching_up: bool,
    no_live_archive_node_alert_sent: bool,
}

impl NodeMonitor {
    pub fn new(
        node: NodeHandle,
        ctx: MonitorContext,
        max_catch_up_blocks: u64,
        data_sources: Vec<NodeHandle>,
        archive_alerts_disabled: bool,
    ) -> Self {
        let archive_sources = data_sources
            .iter()
            .filter(|n| n.identity.is_archive_node)
            .cloned()
            .collect();

        Self {
            name: format!("Node monitor ({})", node.name()),
            node,
            ctx,
            max_catch_up_blocks,
            indirect_sources: data_sources,
            archive_sources,
            archive_alerts_disabled,
            liveness: ApiLiveness::new(),
            last_data_source_used: None,
            last_height_checked: None,
            catching_up: false,
            no_live_archive_node_alert_sent: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    pub fn context(&self) -> &MonitorContext {
        &self.ctx
    }

    pub fn indirect_monitoring_disabled(&self) -> bool {
        self.indirect_sources.is_empty()
    }

    pub fn indirect_monitoring_data_sources(&self) -> &[NodeHandle] {
        &self.indirect_sources
    }

    pub fn archive_monitoring_data_sources(&self) -> &[NodeHandle] {
        &self.archive_sources
    }

    pub fn is_catching_up(&self) -> bool {
        self.catching_up
    }

    pub fn last_height_checked(&self) -> Option<u64> {
        self.last_height_checked
    }

    pub fn last_data_source_used(&self) -> Option<&NodeHandle> {
        self.last_data_source_used.as_ref()
    }

    pub fn no_live_archive_node_alert_sent(&self) -> bool {
        self.no_live_archive_node_alert_sent
    }

    pub fn api_liveness(&self) -> &ApiLiveness {
        &self.liveness
    }

    pub(crate) fn api_liveness_mut(&mut self) -> &mut ApiLiveness {
        &mut self.liveness
    }

    pub(crate) fn mark_no_live_archive_node(&mut self) {
        if !self.no_live_archive_node_alert_sent {
            self.no_live_archive_node_alert_sent = true;
            self.ctx
                .channels
                .alert_critical(Alert::no_live_archive_node_connected(&self.name));
        }
    }

    pub async fn status(&self) -> String {
        let node_status = self.node.state.read().await.status();
        match self.last_height_checked {
            Some(height) if self.node.identity.is_validator => {
                format!("{}, last_height_checked={}", node_status, height)
            }
            None if self.node.identity.is_validator => {
                format!("{}, last_height_checked=None", node_status)
            }
            _ => node_status,
        }
    }

    pub async fn load_state(&mut self) -> Result<(), MonitorError> {
        let Some(store) = self.ctx.store.clone() else {
            return Ok(());
        };

        let key = keys::node_monitor_last_height_checked(&self.name);
        self.last_height_checked = store
            .get_int(&key)
            .await?
            .and_then(|height| u64::try_from(height).ok());
        debug!(
            "Restored {} state: {}={:?}",
            self.name, key, self.last_height_checked
        );
        Ok(())
    }

    /// Persists the height cursor and refreshes the alive key
    pub async fn save_state(&self) -> Result<(), MonitorError> {
        let Some(store) = self.ctx.store.as_ref() else {
            return Ok(());
        };

        let config = &self.ctx.store_config;
        debug!(
            "Saving node monitor state: {} last_height_checked={:?}",
            self.name, self.last_height_checked
        );

        if let Some(height) = self.last_height_checked {
            store
                .set_for(
                    &keys::node_monitor_last_height_checked(&self.name),
                    &height.to_string(),
                    Duration::from_secs(config.node_monitor_last_height_key_timeout),
                )
                .await?;
        }

        let now = self.ctx.clock.now();
        store
            .set_for(
                &keys::node_monitor_alive(&self.name),
                &now.timestamp().to_string(),
                Duration::from_secs(config.node_monitor_alive_key_timeout),
            )
            .await?;
        Ok(())
    }

    pub async fn data_source_indirect(&mut self) -> Result<NodeHandle, MonitorError> {
        self.select_data_source(false).await
    }

    /// Like [`Self::data_source_indirect`] but restricted to archive nodes
    pub async fn data_source_archive(&mut self) -> Result<NodeHandle, MonitorError> {
        self.select_data_source(true).await
    }

    // First source reported as connected by its API server and not known to be down
    async fn select_data_source(&mut self, archive: bool) -> Result<NodeHandle, MonitorError> {
        let candidates = if archive {
            &self.archive_sources
        } else {
            &self.indirect_sources
        };

        for source in candidates {
            let connected = self
                .ctx
                .api
                .get_web_sockets_connected_to_an_api(&source.identity.api_url)
                .await?;

            if connected.iter().any(|n| n == source.name()) && !source.is_down().await {
                self.last_data_source_used = Some(source.clone());
                self.ctx
                    .api
                    .ping_node(&source.identity.api_url, source.name())
                    .await?;
                return Ok(source.clone());
            }
        }

        Err(if archive {
            NoLiveSourceError::Archive
        } else {
            NoLiveSourceError::Indirect
        }
        .into())
    }

    pub async fn monitor_direct(&mut self) -> Result<(), MonitorError> {
        let identity = self.node.identity.clone();
        let api = &self.ctx.api;
        let channels = &self.ctx.channels;

        debug!("Checking if {} is alive", identity.name);
        api.ping_node(&identity.api_url, &identity.name).await?;
        self.node
            .state
            .write()
            .await
            .set_as_up(channels, self.ctx.clock.now());

        let is_syncing = api.get_is_syncing(&identity.api_url, &identity.name).await?;
        debug!("{} is syncing: {}", identity.name, is_syncing);
        self.node.state.write().await.set_is_syncing(is_syncing, channels);

        let peers = api
            .get_prometheus_gauge(&identity.api_url, &identity.name, PEERS_GAUGE)
            .await?;
        debug!("{} no. of peers: {}", identity.name, peers);
        self.node
            .state
            .write()
            .await
            .set_no_of_peers(peers.max(0.0) as u64, channels);

        let header = api.get_block_header(&identity.api_url, &identity.name).await?;
        debug!("{} finalized_block_height: {}", identity.name, header.height);
        self.node
            .state
            .write()
            .await
            .update_finalized_block_height(header.height, channels, self.ctx.clock.now());

        self.liveness.set_api_as_up(&self.name, channels);
        self.node.state.write().await.connect_with_api(channels);
        Ok(())
    }

    pub async fn monitor_indirect(&mut self) -> Result<(), MonitorError> {
        if !self.node.identity.is_validator {
            self.monitor_indirect_full_node().await;
            return Ok(());
        }

        self.monitor_indirect_validator().await?;

        self.liveness.set_api_as_up(&self.name, &self.ctx.channels);
        if let Some(source) = &self.last_data_source_used {
            source.state.write().await.connect_with_api(&self.ctx.channels);
        }
        Ok(())
    }

    async fn monitor_indirect_full_node(&mut self) {
        // Placeholders so full nodes persist a complete record
        let channels = &self.ctx.channels;
        let mut state = self.node.state.write().await;
        state.set_bonded_balance(0, channels);
        state.set_debonding_balance(0, channels);
        state.set_shares_balance(0, channels);
        state.set_active(false, channels);
    }

    async fn monitor_indirect_validator(&mut self) -> Result<(), MonitorError> {
        let source = self.data_source_indirect().await?;
        let identity = self.node.identity.clone();
        let api = self.ctx.api.clone();
        let channels = self.ctx.channels.clone();

        let validators = api
            .get_session_validators(&source.identity.api_url, source.name())
            .await?;
        let validator = validators.iter().find(|v| v.id == identity.node_public_key);
        let is_active = validator.is_some();
        let voting_power = validator.map(|v| v.voting_power).unwrap_or(0);
        debug!(
            "{} active: {}, voting power: {}",
            identity.name, is_active, voting_power
        );
        {
            let mut state = self.node.state.write().await;
            state.set_active(is_active, &channels);
            state.set_voting_power(voting_power, &channels);
        }

        let latest_height = api
            .get_consensus_block(&source.identity.api_url, source.name())
            .await?
            .height;

        // Chain has not started yet
        if latest_height == 0 {
            return Ok(());
        }

        let mut last_checked = *self.last_height_checked.get_or_insert(latest_height - 1);
        let mut checked_height = None;

        if latest_height.saturating_sub(last_checked) > self.max_catch_up_blocks {
            let height = latest_height - self.max_catch_up_blocks;
            self.check_block(&source, height).await?;
            self.check_events(&source, height).await?;
            last_checked = height;
            checked_height = Some(height);
        } else if last_checked <= latest_height {
            self.check_block(&source, last_checked).await?;
            self.check_events(&source, last_checked).await?;
            checked_height = Some(last_checked);
        }
        self.last_height_checked = Some(last_checked);
        self.catching_up = latest_height.saturating_sub(last_checked) > CATCHING_UP_THRESHOLD;

        let staking_address = identity.staking_address.as_deref().ok_or_else(|| {
            MonitorError::Data(format!("no staking address configured for {}", identity.name))
        })?;

        let account = api
            .get_staking_account(&source.identity.api_url, source.name(), staking_address)
            .await?;
        debug!(
            "{} bonded_balance: {}, debonding_balance: {}",
            identity.name, account.escrow.active.balance, account.escrow.debonding.balance
        );
        {
            let mut state = self.node.state.write().await;
            state.set_bonded_balance(account.escrow.active.balance, &channels);
            state.set_debonding_balance(account.escrow.debonding.balance, &channels);
        }

        let delegations = api
            .get_staking_delegations(&source.identity.api_url, source.name(), staking_address)
            .await?;
        let shares = delegations.total_shares();
        debug!("{} shares balance: {}", identity.name, shares);
        self.node.state.write().await.set_shares_balance(shares, &channels);

        if !self.archive_alerts_disabled {
            match self.monitor_archive_state(checked_height).await {
                Ok(()) => {}
                Err(MonitorError::NoLiveSource(NoLiveSourceError::Archive)) => {
                    self.mark_no_live_archive_node();
                }
                Err(e) => return Err(e),
            }
        }

        if checked_height.is_some() {
            self.last_height_checked = self.last_height_checked.map(|h| h + 1);
        }
        Ok(())
    }

    /// Walks the cursor against an archive node's height; events at a height
    /// already handled in this pass are not processed twice
    async fn monitor_archive_state(&mut self, checked_height: Option<u64>) -> Result<(), MonitorError> {
        let archive_node = self.data_source_archive().await?;
        let last_height_to_check = archive_node.finalized_block_height().await;

        let mut last_checked = *self
            .last_height_checked
            .get_or_insert(last_height_to_check.saturating_sub(1));

        if last_height_to_check < last_checked {
            // Archive node is behind the cursor, nothing to check
        } else if last_height_to_check - last_checked > self.max_catch_up_blocks {
            let height = last_height_to_check - self.max_catch_up_blocks;
            if checked_height != Some(height) {
                self.check_events(&archive_node, height).await?;
            }
            last_checked = height;
        } else if checked_height != Some(last_checked) {
            self.check_events(&archive_node, last_checked).await?;
        }

        self.last_height_checked = Some(last_checked);
        self.catching_up = last_height_to_check.saturating_sub(last_checked) > CATCHING_UP_THRESHOLD;

        if self.no_live_archive_node_alert_sent {
            self.no_live_archive_node_alert_sent = false;
            self.ctx
                .channels
                .alert_info(Alert::found_live_archive_node_again(&self.name));
        }
        Ok(())
    }

    /// Marks every validator data source whose precommit is absent at `height`
    async fn check_block(&self, source: &NodeHandle, height: u64) -> Result<(), MonitorError> {
        info!("{} obtaining data at height {}", self.name, height);
        let api = &self.ctx.api;
        let channels = &self.ctx.channels;

        let signed_block = api
            .get_signed_blocks(&source.identity.api_url, source.name(), height)
            .await?;
        let signers = signed_block.signers();
        let missing_validators = signed_block.missing_validators();
        debug!("Precommit validators: {:?}", signers);
        debug!("Total missing validators: {}", missing_validators);

        let header = api
            .get_block_header_at_height(&source.identity.api_url, source.name(), height)
            .await?;

        for validator in &self.indirect_sources {
            let mut state = validator.state.write().await;
            let identity = &validator.identity;
            if identity.is_validator && !signers.contains(identity.tendermint_address.as_str()) {
                // Precommits at `height` are for the block before it
                state.add_missed_block(height.saturating_sub(1), header.time, missing_validators, channels);
            } else {
                state.clear_missed_blocks(channels);
            }
        }

        debug!("Moving to next height.");
        Ok(())
    }

    async fn check_events(&self, source: &NodeHandle, height: u64) -> Result<(), MonitorError> {
        info!("{} obtaining events at height {}", self.name, height);

        let events = self
            .ctx
            .api
            .get_events_by_height(&source.identity.api_url, source.name(), height)
            .await?;
        debug!("{} events found at block height {}", events.len(), height);

        for event in &events {
            for node in &self.indirect_sources {
                node.state
                    .read()
                    .await
                    .process_event(height, event, &self.ctx.channels);
            }
        }
        Ok(())
    }
}
