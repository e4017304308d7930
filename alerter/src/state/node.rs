//! Observed state of one chain node and the alert decisions on each change

use crate::alerts::node::BalanceKind;
use crate::alerts::{Alert, Severity};
use crate::channels::ChannelSet;
use crate::config::NodeAlertConfig;
use crate::constants::missed_blocks;
use crate::scaling::{scale_to_giga, scale_to_nano};
use crate::store::{keys, HashUpdate, Store};
use crate::timing::{pretty_duration, TimedOccurrenceTracker, TimedTaskLimiter};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Immutable facts about a node, resolved once at startup
#[derive(Debug, Clone, Serialize)]
pub struct NodeIdentity {
    pub name: String,
    pub api_url: String,
    pub chain: String,
    pub is_validator: bool,
    pub is_archive_node: bool,
    pub node_public_key: String,
    pub staking_address: Option<String>,
    pub entity_public_key: String,
    pub consensus_public_key: String,
    pub tendermint_address: String,
    pub exporter_url: Option<String>,
}

/// Serializable view of a node for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub chain: String,
    pub is_validator: bool,
    pub is_down: bool,
    pub went_down_at: Option<DateTime<Utc>>,
    pub connected_to_api_server: bool,
    pub is_syncing: bool,
    pub no_of_peers: Option<u64>,
    pub finalized_block_height: u64,
    pub bonded_balance: Option<String>,
    pub debonding_balance: Option<String>,
    pub shares_balance: Option<String>,
    pub voting_power: Option<u64>,
    pub is_active: Option<bool>,
    pub consecutive_blocks_missed: u64,
}

#[derive(Debug, Clone)]
pub struct NodeState {
    identity: Arc<NodeIdentity>,
    config: NodeAlertConfig,

    went_down_at: Option<DateTime<Utc>>,
    initial_downtime_alert_sent: bool,
    connected_to_api_server: bool,

    is_syncing: bool,
    no_of_peers: Option<u64>,
    finalized_block_height: u64,
    time_of_last_height_change: Option<DateTime<Utc>>,
    time_of_last_height_check_activity: Option<DateTime<Utc>>,
    no_change_in_height_warning_sent: bool,

    bonded_balance: Option<u128>,
    debonding_balance: Option<u128>,
    shares_balance: Option<u128>,
    voting_power: Option<u64>,
    active: Option<bool>,

    consecutive_blocks_missed: u64,

    downtime_alert_limiter: TimedTaskLimiter,
    finalized_height_alert_limiter: TimedTaskLimiter,
    timed_block_miss_tracker: TimedOccurrenceTracker,
}

impl NodeState {
    pub fn new(identity: Arc<NodeIdentity>, config: NodeAlertConfig) -> Self {
        let downtime_alert_limiter =
            TimedTaskLimiter::new(Duration::seconds(config.downtime_alert_interval_seconds as i64));
        let finalized_height_alert_limiter =
            TimedTaskLimiter::new(Duration::seconds(config.no_change_in_height_interval_seconds as i64));
        let timed_block_miss_tracker = TimedOccurrenceTracker::new(
            config.max_missed_blocks_in_time_interval,
            Duration::seconds(config.max_missed_blocks_time_interval_seconds as i64),
        );

        Self {
            identity,
            config,
            went_down_at: None,
            initial_downtime_alert_sent: false,
            connected_to_api_server: true,
            is_syncing: false,
            no_of_peers: None,
            finalized_block_height: 0,
            time_of_last_height_change: None,
            time_of_last_height_check_activity: None,
            no_change_in_height_warning_sent: false,
            bonded_balance: None,
            debonding_balance: None,
            shares_balance: None,
            voting_power: None,
            active: None,
            consecutive_blocks_missed: 0,
            downtime_alert_limiter,
            finalized_height_alert_limiter,
            timed_block_miss_tracker,
        }
    }

    pub fn identity(&self) -> &Arc<NodeIdentity> {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn is_validator(&self) -> bool {
        self.identity.is_validator
    }

    pub fn is_down(&self) -> bool {
        self.went_down_at.is_some()
    }

    pub fn went_down_at(&self) -> Option<DateTime<Utc>> {
        self.went_down_at
    }

    pub fn is_connected_to_api_server(&self) -> bool {
        self.connected_to_api_server
    }

    pub fn is_syncing(&self) -> bool {
        self.is_syncing
    }

    pub fn no_of_peers(&self) -> Option<u64> {
        self.no_of_peers
    }

    pub fn finalized_block_height(&self) -> u64 {
        self.finalized_block_height
    }

    pub fn time_of_last_height_change(&self) -> Option<DateTime<Utc>> {
        self.time_of_last_height_change
    }

    pub fn time_of_last_height_check_activity(&self) -> Option<DateTime<Utc>> {
        self.time_of_last_height_check_activity
    }

    pub fn is_no_change_in_height_warning_sent(&self) -> bool {
        self.no_change_in_height_warning_sent
    }

    pub fn finalized_height_alert_limiter(&self) -> &TimedTaskLimiter {
        &self.finalized_height_alert_limiter
    }

    pub fn bonded_balance(&self) -> Option<u128> {
        self.bonded_balance
    }

    pub fn debonding_balance(&self) -> Option<u128> {
        self.debonding_balance
    }

    pub fn shares_balance(&self) -> Option<u128> {
        self.shares_balance
    }

    pub fn voting_power(&self) -> Option<u64> {
        self.voting_power
    }

    pub fn is_active(&self) -> Option<bool> {
        self.active
    }

    pub fn consecutive_blocks_missed_so_far(&self) -> u64 {
        self.consecutive_blocks_missed
    }

    pub fn is_missing_blocks(&self) -> bool {
        self.consecutive_blocks_missed > 0
    }

    pub fn status(&self) -> String {
        format!(
            "bonded_balance={}, debonding_balance={}, shares_balance={}, is_syncing={}, \
             no_of_peers={}, active={}, finalized_block_height={}, is_missing_blocks={}",
            fmt_opt(self.bonded_balance),
            fmt_opt(self.debonding_balance),
            fmt_opt(self.shares_balance),
            self.is_syncing,
            fmt_opt(self.no_of_peers),
            fmt_opt(self.active),
            self.finalized_block_height,
            self.is_missing_blocks()
        )
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            name: self.identity.name.clone(),
            chain: self.identity.chain.clone(),
            is_validator: self.identity.is_validator,
            is_down: self.is_down(),
            went_down_at: self.went_down_at,
            connected_to_api_server: self.connected_to_api_server,
            is_syncing: self.is_syncing,
            no_of_peers: self.no_of_peers,
            finalized_block_height: self.finalized_block_height,
            bonded_balance: self.bonded_balance.map(|b| b.to_string()),
            debonding_balance: self.debonding_balance.map(|b| b.to_string()),
            shares_balance: self.shares_balance.map(|b| b.to_string()),
            voting_power: self.voting_power,
            is_active: self.active,
            consecutive_blocks_missed: self.consecutive_blocks_missed,
        }
    }

    fn validator_severity(&self) -> Severity {
        if self.is_validator() {
            Severity::Critical
        } else {
            Severity::Warning
        }
    }

    pub fn set_as_down(&mut self, channels: &ChannelSet, now: DateTime<Utc>) {
        debug!("{} set_as_down: is_down(currently)={}", self.name(), self.is_down());

        match self.went_down_at {
            Some(_) if !self.initial_downtime_alert_sent => {
                channels.alert(self.validator_severity(), Alert::cannot_access_node(self.name()));
                self.downtime_alert_limiter.did_task(now);
                self.initial_downtime_alert_sent = true;
            }
            Some(went_down_at) => {
                if self.downtime_alert_limiter.can_do_task(now) {
                    let downtime = pretty_duration(now - went_down_at);
                    channels.alert(
                        self.validator_severity(),
                        Alert::still_cannot_access_node(self.name(), went_down_at, &downtime),
                    );
                    self.downtime_alert_limiter.did_task(now);
                }
            }
            None => {
                // Could be a hiccup, so only an info for now
                channels.alert_info(Alert::experiencing_delays(self.name()));
                self.went_down_at = Some(now);
                self.initial_downtime_alert_sent = false;
            }
        }
    }

    pub fn set_as_up(&mut self, channels: &ChannelSet, now: DateTime<Utc>) {
        debug!("{} set_as_up: is_down(currently)={}", self.name(), self.is_down());

        if let Some(went_down_at) = self.went_down_at {
            if self.initial_downtime_alert_sent {
                let downtime = pretty_duration(now - went_down_at);
                channels.alert_info(Alert::now_accessible(self.name(), went_down_at, &downtime));
            }

            self.downtime_alert_limiter.reset();
            self.went_down_at = None;
        }
    }

    pub fn set_bonded_balance(&mut self, new_balance: u128, channels: &ChannelSet) {
        self.set_balance(BalanceKind::Bonded, new_balance, channels)
    }

    pub fn set_debonding_balance(&mut self, new_balance: u128, channels: &ChannelSet) {
        self.set_balance(BalanceKind::Debonding, new_balance, channels)
    }

    pub fn set_shares_balance(&mut self, new_balance: u128, channels: &ChannelSet) {
        self.set_balance(BalanceKind::Shares, new_balance, channels)
    }

    fn set_balance(&mut self, kind: BalanceKind, new_balance: u128, channels: &ChannelSet) {
        let (old, threshold) = match kind {
            BalanceKind::Bonded => (
                self.bonded_balance,
                self.config.change_in_bonded_balance_threshold,
            ),
            BalanceKind::Debonding => (
                self.debonding_balance,
                self.config.change_in_debonding_balance_threshold,
            ),
            BalanceKind::Shares => (
                self.shares_balance,
                self.config.change_in_shares_balance_threshold,
            ),
        };
        debug!(
            "{} set_{}: before={}, new={}",
            self.name(),
            kind.label().replace(' ', "_"),
            fmt_opt(old),
            new_balance
        );

        if let Some(old) = old.filter(|o| *o != new_balance) {
            let threshold = scale_to_giga(threshold);
            let scaled_old = scale_to_nano(old);
            let scaled_new = scale_to_nano(new_balance);
            let name = self.name();

            if self.is_validator() && new_balance == 0 {
                let alert = Alert::balance_decreased(kind, name, scaled_old, scaled_new);
                match kind {
                    BalanceKind::Bonded => channels.alert_critical(alert),
                    BalanceKind::Debonding | BalanceKind::Shares => channels.alert_info(alert),
                }
            } else if self.is_validator() && old == 0 {
                channels.alert_info(Alert::balance_increased(kind, name, scaled_old, scaled_new));
            } else if old.abs_diff(new_balance) > threshold {
                if new_balance > old {
                    channels.alert_info(Alert::balance_increased_by(kind, name, scaled_old, scaled_new));
                } else {
                    channels.alert_info(Alert::balance_decreased_by(kind, name, scaled_old, scaled_new));
                }
            }
        }

        match kind {
            BalanceKind::Bonded => self.bonded_balance = Some(new_balance),
            BalanceKind::Debonding => self.debonding_balance = Some(new_balance),
            BalanceKind::Shares => self.shares_balance = Some(new_balance),
        }
    }

    pub fn set_is_syncing(&mut self, now_is_syncing: bool, channels: &ChannelSet) {
        debug!(
            "{} set_is_syncing: before={}, new={}",
            self.name(),
            self.is_syncing,
            now_is_syncing
        );

        if !self.is_syncing && now_is_syncing {
            channels.alert_warning(Alert::is_syncing(self.name()));
        } else if self.is_syncing && !now_is_syncing {
            channels.alert_info(Alert::is_no_longer_syncing(self.name()));
        }

        self.is_syncing = now_is_syncing;
    }

    pub fn set_no_of_peers(&mut self, new_no_of_peers: u64, channels: &ChannelSet) {
        debug!(
            "{} set_no_of_peers: before={}, new={}",
            self.name(),
            fmt_opt(self.no_of_peers),
            new_no_of_peers
        );

        if let Some(old) = self.no_of_peers.filter(|o| *o != new_no_of_peers) {
            let new = new_no_of_peers;
            let name = self.name();

            if self.is_validator() {
                let danger = self.config.validator_peer_danger_boundary;
                let safe = self.config.validator_peer_safe_boundary;

                if new <= safe {
                    if new > old {
                        channels.alert_info(Alert::peers_increased(name, old, new));
                    } else if new > danger {
                        channels.alert_warning(Alert::peers_decreased(name, old, new));
                    } else {
                        channels.alert_critical(Alert::peers_decreased(name, old, new));
                    }
                } else if old <= safe {
                    channels.alert_info(Alert::peers_increased_outside_safe_range(name, safe));
                }
            } else {
                let danger = self.config.full_node_peer_danger_boundary;

                if new > old {
                    if new <= danger {
                        channels.alert_info(Alert::peers_increased(name, old, new));
                    } else if old <= danger {
                        channels.alert_info(Alert::peers_increased_outside_danger_range(name, danger));
                    }
                } else if new <= danger {
                    channels.alert_warning(Alert::peers_decreased(name, old, new));
                }
            }
        }

        self.no_of_peers = Some(new_no_of_peers);
    }

    pub fn set_voting_power(&mut self, new_voting_power: u64, channels: &ChannelSet) {
        debug!(
            "{} set_voting_power: before={}, new={}",
            self.name(),
            fmt_opt(self.voting_power),
            new_voting_power
        );

        if let Some(old) = self.voting_power.filter(|o| *o != new_voting_power) {
            let new = new_voting_power;
            let name = self.name();

            if self.is_validator() && new == 0 {
                channels.alert_critical(Alert::voting_power_decreased(name, old, new));
            } else if self.is_validator() && old == 0 {
                channels.alert_info(Alert::voting_power_increased(name, old, new));
            } else if new > old {
                channels.alert_info(Alert::voting_power_increased_by(name, old, new));
            } else {
                channels.alert_info(Alert::voting_power_decreased_by(name, old, new));
            }
        }

        self.voting_power = Some(new_voting_power);
    }

    pub fn set_active(&mut self, now_is_active: bool, channels: &ChannelSet) {
        debug!(
            "{} set_active: active(currently)={}, new={}",
            self.name(),
            fmt_opt(self.active),
            now_is_active
        );

        if self.active.is_some_and(|a| a != now_is_active) {
            if now_is_active {
                channels.alert_info(Alert::validator_is_now_active(self.name()));
            } else {
                channels.alert_critical(Alert::validator_is_not_active(self.name()));
            }
        }

        self.active = Some(now_is_active);
    }

    pub fn update_finalized_block_height(
        &mut self,
        new_finalized_height: u64,
        channels: &ChannelSet,
        now: DateTime<Utc>,
    ) {
        debug!(
            "{} update_finalized_block_height: finalized_block_height(currently)={}, new={}",
            self.name(),
            self.finalized_block_height,
            new_finalized_height
        );

        if self.finalized_block_height != new_finalized_height {
            if self.no_change_in_height_warning_sent {
                self.no_change_in_height_warning_sent = false;
                channels.alert_info(Alert::finalized_height_updated(self.name()));
            }

            if self.finalized_block_height > new_finalized_height {
                info!(
                    "The finalized height of node {} decreased to {}.",
                    self.name(),
                    new_finalized_height
                );
            }

            self.finalized_block_height = new_finalized_height;
            self.time_of_last_height_change = Some(now);
            self.time_of_last_height_check_activity = Some(now);
            self.finalized_height_alert_limiter.set_last_time_that_did_task(now);
            return;
        }

        let elapsed = now - self.time_of_last_height_change.unwrap_or(now);
        let interval = pretty_duration(elapsed);
        let first_warning = Duration::seconds(self.config.no_change_in_height_first_warning_seconds as i64);

        if !self.no_change_in_height_warning_sent && elapsed > first_warning {
            self.no_change_in_height_warning_sent = true;
            channels.alert_warning(Alert::finalized_height_did_not_change(self.name(), &interval));
            self.time_of_last_height_check_activity = Some(now);
            self.finalized_height_alert_limiter.set_last_time_that_did_task(now);
        } else if self.no_change_in_height_warning_sent
            && self.finalized_height_alert_limiter.can_do_task(now)
        {
            channels.alert(
                self.validator_severity(),
                Alert::finalized_height_did_not_change(self.name(), &interval),
            );
            self.time_of_last_height_check_activity = Some(now);
            self.finalized_height_alert_limiter.set_last_time_that_did_task(now);
        }
    }

    /// Records a missed precommit; `block_time` drives the windowed tracker
    pub fn add_missed_block(
        &mut self,
        block_height: u64,
        block_time: DateTime<Utc>,
        missing_validators: usize,
        channels: &ChannelSet,
    ) {
        let blocks_missed = self.consecutive_blocks_missed + 1;
        let danger = self.config.missed_blocks_danger_boundary;

        debug!(
            "{} add_missed_block: before={}, new={}, missing_validators={}",
            self.name(),
            self.consecutive_blocks_missed,
            blocks_missed,
            missing_validators
        );

        self.timed_block_miss_tracker.action_happened(block_time);

        let name = self.identity.name.as_str();
        if !self.is_missing_blocks() {
            // First miss is not alerted
        } else if (2..danger).contains(&blocks_missed) {
            channels.alert_info(Alert::missed_blocks(name, blocks_missed, block_height, missing_validators));
        } else if blocks_missed == missed_blocks::WARNING_AT {
            channels.alert_warning(Alert::missed_blocks(name, blocks_missed, block_height, missing_validators));
        } else if blocks_missed >= missed_blocks::CRITICAL_MIN.max(danger)
            && blocks_missed % missed_blocks::CRITICAL_EVERY == 0
        {
            channels.alert_critical(Alert::missed_blocks(name, blocks_missed, block_height, missing_validators));
            self.timed_block_miss_tracker.reset();
        }

        if self.timed_block_miss_tracker.too_many_occurrences(block_time) {
            channels.alert_critical(Alert::timed_missed_blocks(
                name,
                self.timed_block_miss_tracker.max_occurrences(),
                &self.timed_block_miss_tracker.interval_pretty(),
                block_height,
                missing_validators,
            ));
            self.timed_block_miss_tracker.reset();
        }

        self.consecutive_blocks_missed = blocks_missed;
    }

    pub fn clear_missed_blocks(&mut self, channels: &ChannelSet) {
        debug!("{} clear_missed_blocks", self.name());

        if self.consecutive_blocks_missed > 1 {
            channels.alert_info(Alert::no_longer_missing_blocks(
                self.name(),
                self.consecutive_blocks_missed,
            ));
        }

        self.consecutive_blocks_missed = 0;
    }

    /// Classifies a staking event and alerts if it involves this node's entity
    pub fn process_event(&self, height: u64, event: &Value, channels: &ChannelSet) {
        let name = self.name();
        let is_me = |v: &Value, key: &str| {
            let key_value = text(v, key);
            !self.identity.entity_public_key.is_empty() && key_value == self.identity.entity_public_key
        };

        if let Some(escrow) = event.get("escrow") {
            if let Some(take) = escrow.get("take") {
                if is_me(take, "owner") {
                    let amount = text(take, "amount");
                    debug!("{} slashed {} tokens at height {}", name, amount, height);
                    channels.alert_critical(Alert::slashed(name, &amount, height));
                }
            } else if let Some(add) = escrow.get("add") {
                let amount = text(add, "amount");
                if is_me(add, "owner") {
                    debug!("{} added {} tokens at height {}", name, amount, height);
                    channels.alert_info(Alert::escrow_add_self_owner(name, &amount, height, &text(add, "escrow")));
                } else if is_me(add, "escrow") {
                    debug!("{} received {} tokens at height {}", name, amount, height);
                    channels.alert_info(Alert::escrow_add_self_escrow(name, &amount, height, &text(add, "owner")));
                }
            } else if let Some(reclaim) = escrow.get("reclaim") {
                let amount = text(reclaim, "amount");
                if is_me(reclaim, "owner") {
                    debug!("{} reclaimed {} tokens at height {}", name, amount, height);
                    channels.alert_info(Alert::escrow_reclaim_self_owner(
                        name,
                        &amount,
                        height,
                        &text(reclaim, "escrow"),
                    ));
                } else if is_me(reclaim, "escrow") {
                    debug!("{} had {} tokens reclaimed at height {}", name, amount, height);
                    channels.alert_info(Alert::escrow_reclaim_self_escrow(
                        name,
                        &amount,
                        height,
                        &text(reclaim, "owner"),
                    ));
                }
            }
        } else if let Some(burn) = event.get("burn") {
            if is_me(burn, "owner") {
                let amount = text(burn, "amount");
                debug!("{} burned {} tokens at height {}", name, amount, height);
                channels.alert_critical(Alert::tokens_burned(name, &amount, height));
            }
        } else if let Some(transfer) = event.get("transfer") {
            let amount = text(transfer, "amount");
            if is_me(transfer, "from") {
                debug!("{} transferred {} tokens at height {}", name, amount, height);
                channels.alert_info(Alert::tokens_transferred_to(name, &amount, height, &text(transfer, "to")));
            } else if is_me(transfer, "to") {
                debug!("{} received {} tokens at height {}", name, amount, height);
                channels.alert_info(Alert::tokens_transferred_from(
                    name,
                    &amount,
                    height,
                    &text(transfer, "from"),
                ));
            }
        } else if let Some(change) = event.get("allowance_change") {
            if is_me(change, "owner") {
                let negative = change.get("negative").and_then(Value::as_bool).unwrap_or(false);
                info!(
                    "{} allowance_change {} tokens at height {}, beneficiary {}",
                    name,
                    text(change, "amount_change"),
                    height,
                    text(change, "beneficiary")
                );
                channels.alert_critical(Alert::allowance_change(
                    name,
                    &text(change, "amount_change"),
                    negative,
                    &text(change, "beneficiary"),
                    &text(change, "allowance"),
                    height,
                ));
            }
        } else {
            debug!("{} received unknown event: {}", name, event);
            channels.alert_warning(Alert::unknown_event_found(name, height, event));
        }
    }

    pub fn disconnect_from_api(&mut self, channels: &ChannelSet) {
        debug!("{} disconnect_from_api", self.name());

        if self.connected_to_api_server {
            channels.alert(
                self.validator_severity(),
                Alert::node_not_connected_to_api_server(self.name()),
            );
        }

        self.connected_to_api_server = false;
    }

    pub fn connect_with_api(&mut self, channels: &ChannelSet) {
        debug!("{} connect_with_api", self.name());

        if !self.connected_to_api_server {
            channels.alert_info(Alert::node_connected_to_api_server_again(self.name()));
        }

        self.connected_to_api_server = true;
    }

    pub async fn load_state(&mut self, store: &Store, now: DateTime<Utc>) -> Result<(), sqlx::Error> {
        let bucket = keys::hash_blockchain(&self.identity.chain);
        let name = self.identity.name.clone();
        let field = |f: &str| keys::node_field(f, &name);

        let went_down_at = store.hget(&bucket, &field("went_down_at")).await?;
        self.bonded_balance = store.hget_parsed(&bucket, &field("bonded_balance")).await?;
        self.debonding_balance = store.hget_parsed(&bucket, &field("debonding_balance")).await?;
        self.shares_balance = store.hget_parsed(&bucket, &field("shares_balance")).await?;
        self.is_syncing = store.hget_bool(&bucket, &field("is_syncing")).await?.unwrap_or(false);
        self.voting_power = store.hget_parsed(&bucket, &field("voting_power")).await?;
        self.consecutive_blocks_missed = store
            .hget_parsed(&bucket, &field("consecutive_blocks_missed"))
            .await?
            .unwrap_or(0);
        self.no_of_peers = store.hget_parsed(&bucket, &field("no_of_peers")).await?;
        self.active = store.hget_bool(&bucket, &field("active")).await?;
        self.time_of_last_height_check_activity = store
            .hget_parsed(&bucket, &field("time_of_last_height_check_activity"))
            .await?;
        self.time_of_last_height_change = store
            .hget_parsed(&bucket, &field("time_of_last_height_change"))
            .await?;
        self.finalized_block_height = store
            .hget_parsed(&bucket, &field("finalized_block_height"))
            .await?
            .unwrap_or(0);
        self.no_change_in_height_warning_sent = store
            .hget_bool(&bucket, &field("no_change_in_height_warning_sent"))
            .await?
            .unwrap_or(false);

        match self.time_of_last_height_check_activity {
            Some(activity) => self.finalized_height_alert_limiter.set_last_time_that_did_task(activity),
            None => {
                self.finalized_height_alert_limiter.did_task(now);
                self.time_of_last_height_change = Some(now);
            }
        }

        self.went_down_at = match went_down_at {
            None => None,
            Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(at) => Some(at.with_timezone(&Utc)),
                Err(e) => {
                    error!("Error when parsing went_down_at '{}' of {}: {}", raw, name, e);
                    None
                }
            },
        };

        debug!("Restored {} state: {}", name, self.status());
        Ok(())
    }

    pub async fn save_state(&self, store: &Store) -> Result<(), sqlx::Error> {
        store.apply(&self.persisted_fields()).await
    }

    /// Everything `save_state` writes, read without touching the store
    pub fn persisted_fields(&self) -> HashUpdate {
        debug!("Saving {} state: {}", self.name(), self.status());

        let bucket = keys::hash_blockchain(&self.identity.chain);
        let field = |f: &str| keys::node_field(f, &self.identity.name);
        let ts = |t: Option<DateTime<Utc>>| t.map(|t| t.to_rfc3339());

        let fields = vec![
            (field("went_down_at"), ts(self.went_down_at)),
            (field("bonded_balance"), self.bonded_balance.map(|v| v.to_string())),
            (field("debonding_balance"), self.debonding_balance.map(|v| v.to_string())),
            (field("shares_balance"), self.shares_balance.map(|v| v.to_string())),
            (field("is_syncing"), Some(self.is_syncing.to_string())),
            (field("no_of_peers"), self.no_of_peers.map(|v| v.to_string())),
            (field("voting_power"), self.voting_power.map(|v| v.to_string())),
            (
                field("consecutive_blocks_missed"),
                Some(self.consecutive_blocks_missed.to_string()),
            ),
            (field("is_missing_blocks"), Some(self.is_missing_blocks().to_string())),
            (field("active"), self.active.map(|v| v.to_string())),
            (
                field("time_of_last_height_check_activity"),
                ts(self.time_of_last_height_check_activity),
            ),
            (field("time_of_last_height_change"), ts(self.time_of_last_height_change)),
            (
                field("finalized_block_height"),
                Some(self.finalized_block_height.to_string()),
            ),
            (
                field("no_change_in_height_warning_sent"),
                Some(self.no_change_in_height_warning_sent.to_string()),
            ),
        ];

        HashUpdate { bucket, fields }
    }
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string())
}

// String form of a JSON field, without quotes for strings
fn text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
