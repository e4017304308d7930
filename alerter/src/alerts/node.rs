// File: alerter/src/alerts/node.rs
use super::{Alert, AlertCode};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// The three balances tracked for a validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceKind {
    Bonded,
    Debonding,
    Shares,
}

impl BalanceKind {
    pub fn label(&self) -> &'static str {
        match self {
            BalanceKind::Bonded => "bonded balance",
            BalanceKind::Debonding => "debonding balance",
            BalanceKind::Shares => "shares balance",
        }
    }

    fn increased(&self) -> AlertCode {
        match self {
            BalanceKind::Bonded => AlertCode::BondedBalanceIncreased,
            BalanceKind::Debonding => AlertCode::DebondingBalanceIncreased,
            BalanceKind::Shares => AlertCode::SharesBalanceIncreased,
        }
    }

    fn decreased(&self) -> AlertCode {
        match self {
            BalanceKind::Bonded => AlertCode::BondedBalanceDecreased,
            BalanceKind::Debonding => AlertCode::DebondingBalanceDecreased,
            BalanceKind::Shares => AlertCode::SharesBalanceDecreased,
        }
    }

    fn increased_by(&self) -> AlertCode {
        match self {
            BalanceKind::Bonded => AlertCode::BondedBalanceIncreasedBy,
            BalanceKind::Debonding => AlertCode::DebondingBalanceIncreasedBy,
            BalanceKind::Shares => AlertCode::SharesBalanceIncreasedBy,
        }
    }

    fn decreased_by(&self) -> AlertCode {
        match self {
            BalanceKind::Bonded => AlertCode::BondedBalanceDecreasedBy,
            BalanceKind::Debonding => AlertCode::DebondingBalanceDecreasedBy,
            BalanceKind::Shares => AlertCode::SharesBalanceDecreasedBy,
        }
    }
}

fn fmt_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

impl Alert {
    pub fn experiencing_delays(node: &str) -> Self {
        Alert::new(
            AlertCode::ExperiencingDelays,
            node,
            format!("{} is experiencing delays in its responses.", node),
        )
    }

    pub fn cannot_access_node(node: &str) -> Self {
        Alert::new(
            AlertCode::CannotAccessNode,
            node,
            format!("I cannot access {}.", node),
        )
    }

    pub fn still_cannot_access_node(node: &str, went_down_at: DateTime<Utc>, downtime: &str) -> Self {
        Alert::new(
            AlertCode::StillCannotAccessNode,
            node,
            format!(
                "I still cannot access {}. Node became inaccessible at {} and has been inaccessible for (at most) {}.",
                node,
                fmt_time(went_down_at),
                downtime
            ),
        )
    }

    pub fn now_accessible(node: &str, went_down_at: DateTime<Utc>, downtime: &str) -> Self {
        Alert::new(
            AlertCode::NowAccessible,
            node,
            format!(
                "{} is now accessible. Node became inaccessible at {} and was inaccessible for (at most) {}.",
                node,
                fmt_time(went_down_at),
                downtime
            ),
        )
    }

    pub fn balance_increased(kind: BalanceKind, node: &str, old: f64, new: f64) -> Self {
        Alert::new(
            kind.increased(),
            node,
            format!("{} {} increased from {} to {}.", node, kind.label(), old, new),
        )
    }

    pub fn balance_decreased(kind: BalanceKind, node: &str, old: f64, new: f64) -> Self {
        Alert::new(
            kind.decreased(),
            node,
            format!("{} {} decreased from {} to {}.", node, kind.label(), old, new),
        )
    }

    pub fn balance_increased_by(kind: BalanceKind, node: &str, old: f64, new: f64) -> Self {
        Alert::new(
            kind.increased_by(),
            node,
            format!(
                "{} {} increased by {}. New balance: {}.",
                node,
                kind.label(),
                crate::scaling::round_to(new - old, 3),
                new
            ),
        )
    }

    pub fn balance_decreased_by(kind: BalanceKind, node: &str, old: f64, new: f64) -> Self {
        Alert::new(
            kind.decreased_by(),
            node,
            format!(
                "{} {} decreased by {}. New balance: {}.",
                node,
                kind.label(),
                crate::scaling::round_to(old - new, 3),
                new
            ),
        )
    }

    pub fn is_syncing(node: &str) -> Self {
        Alert::new(AlertCode::IsSyncing, node, format!("{} is syncing.", node))
    }

    pub fn is_no_longer_syncing(node: &str) -> Self {
        Alert::new(
            AlertCode::IsNoLongerSyncing,
            node,
            format!("{} is no longer syncing.", node),
        )
    }

    pub fn peers_increased(node: &str, old: u64, new: u64) -> Self {
        Alert::new(
            AlertCode::PeersIncreased,
            node,
            format!("{} peers increased from {} to {}.", node, old, new),
        )
    }

    pub fn peers_increased_outside_danger_range(node: &str, danger: u64) -> Self {
        Alert::new(
            AlertCode::PeersIncreasedOutsideDangerRange,
            node,
            format!(
                "{} peers increased to more than {} peers. No further peer change alerts will be sent unless the number of peers goes below {}.",
                node, danger, danger
            ),
        )
    }

    pub fn peers_increased_outside_safe_range(node: &str, safe: u64) -> Self {
        Alert::new(
            AlertCode::PeersIncreasedOutsideSafeRange,
            node,
            format!(
                "{} peers increased to more than {} peers. No further peer change alerts will be sent unless the number of peers goes below {}.",
                node, safe, safe
            ),
        )
    }

    pub fn peers_decreased(node: &str, old: u64, new: u64) -> Self {
        Alert::new(
            AlertCode::PeersDecreased,
            node,
            format!("{} peers decreased from {} to {}.", node, old, new),
        )
    }

    pub fn voting_power_increased(node: &str, old: u64, new: u64) -> Self {
        Alert::new(
            AlertCode::VotingPowerIncreased,
            node,
            format!("{} voting power increased from {} to {}.", node, old, new),
        )
    }

    pub fn voting_power_decreased(node: &str, old: u64, new: u64) -> Self {
        Alert::new(
            AlertCode::VotingPowerDecreased,
            node,
            format!("{} voting power decreased from {} to {}.", node, old, new),
        )
    }

    pub fn voting_power_increased_by(node: &str, old: u64, new: u64) -> Self {
        Alert::new(
            AlertCode::VotingPowerIncreasedBy,
            node,
            format!(
                "{} voting power increased by {}. New voting power: {}.",
                node,
                new - old,
                new
            ),
        )
    }

    pub fn voting_power_decreased_by(node: &str, old: u64, new: u64) -> Self {
        Alert::new(
            AlertCode::VotingPowerDecreasedBy,
            node,
            format!(
                "{} voting power decreased by {}. New voting power: {}.",
                node,
                old - new,
                new
            ),
        )
    }

    pub fn validator_is_now_active(node: &str) -> Self {
        Alert::new(
            AlertCode::ValidatorIsNowActive,
            node,
            format!("{} is now in the active validator set.", node),
        )
    }

    pub fn validator_is_not_active(node: &str) -> Self {
        Alert::new(
            AlertCode::ValidatorIsNotActive,
            node,
            format!("{} is not in the active validator set.", node),
        )
    }

    pub fn missed_blocks(node: &str, blocks_missed: u64, height: u64, missing_validators: usize) -> Self {
        Alert::new(
            AlertCode::MissedBlocks,
            node,
            format!(
                "{} missed {} blocks in a row (height: {}, total validators missing: {}).",
                node, blocks_missed, height, missing_validators
            ),
        )
    }

    pub fn timed_missed_blocks(
        node: &str,
        blocks_in_interval: usize,
        interval: &str,
        height: u64,
        missing_validators: usize,
    ) -> Self {
        Alert::new(
            AlertCode::TimedMissedBlocks,
            node,
            format!(
                "{} missed more than {} blocks in {} (height: {}, total validators missing: {}).",
                node, blocks_in_interval, interval, height, missing_validators
            ),
        )
    }

    pub fn no_longer_missing_blocks(node: &str, consecutive_blocks_missed: u64) -> Self {
        Alert::new(
            AlertCode::NoLongerMissingBlocks,
            node,
            format!(
                "{} is no longer missing blocks (total missed: {}).",
                node, consecutive_blocks_missed
            ),
        )
    }

    pub fn finalized_height_did_not_change(node: &str, interval: &str) -> Self {
        Alert::new(
            AlertCode::FinalizedHeightDidNotChange,
            node,
            format!("{} finalized block height did not change in {}.", node, interval),
        )
    }

    pub fn finalized_height_updated(node: &str) -> Self {
        Alert::new(
            AlertCode::FinalizedHeightUpdated,
            node,
            format!("{} finalized block height has now been updated.", node),
        )
    }

    pub fn slashed(node: &str, amount: &str, height: u64) -> Self {
        Alert::new(
            AlertCode::Slashed,
            node,
            format!("{} has been slashed {} tokens at height {}.", node, amount, height),
        )
    }

    pub fn escrow_add_self_owner(node: &str, amount: &str, height: u64, escrow: &str) -> Self {
        Alert::new(
            AlertCode::EscrowAddEventSelfOwner,
            node,
            format!(
                "{} added {} tokens to escrow account {} at height {}.",
                node, amount, escrow, height
            ),
        )
    }

    pub fn escrow_add_self_escrow(node: &str, amount: &str, height: u64, owner: &str) -> Self {
        Alert::new(
            AlertCode::EscrowAddEventSelfEscrow,
            node,
            format!(
                "{} received {} tokens in escrow from {} at height {}.",
                node, amount, owner, height
            ),
        )
    }

    pub fn escrow_reclaim_self_owner(node: &str, amount: &str, height: u64, escrow: &str) -> Self {
        Alert::new(
            AlertCode::EscrowReclaimEventSelfOwner,
            node,
            format!(
                "{} reclaimed {} tokens from escrow account {} at height {}.",
                node, amount, escrow, height
            ),
        )
    }

    pub fn escrow_reclaim_self_escrow(node: &str, amount: &str, height: u64, owner: &str) -> Self {
        Alert::new(
            AlertCode::EscrowReclaimEventSelfEscrow,
            node,
            format!(
                "{} had {} tokens reclaimed from its escrow by {} at height {}.",
                node, amount, owner, height
            ),
        )
    }

    pub fn tokens_burned(node: &str, amount: &str, height: u64) -> Self {
        Alert::new(
            AlertCode::TokensBurned,
            node,
            format!("{} burned {} tokens at height {}.", node, amount, height),
        )
    }

    pub fn tokens_transferred_to(node: &str, amount: &str, height: u64, destination: &str) -> Self {
        Alert::new(
            AlertCode::TokensTransferredTo,
            node,
            format!(
                "{} transferred {} tokens to {} at height {}.",
                node, amount, destination, height
            ),
        )
    }

    pub fn tokens_transferred_from(node: &str, amount: &str, height: u64, source: &str) -> Self {
        Alert::new(
            AlertCode::TokensTransferredFrom,
            node,
            format!(
                "{} received {} tokens from {} at height {}.",
                node, amount, source, height
            ),
        )
    }

    pub fn allowance_change(
        node: &str,
        amount_change: &str,
        negative: bool,
        beneficiary: &str,
        allowance: &str,
        height: u64,
    ) -> Self {
        let direction = if negative { "decreased" } else { "increased" };
        Alert::new(
            AlertCode::AllowanceChange,
            node,
            format!(
                "{} allowance for {} {} by {} at height {}. New allowance: {}.",
                node, beneficiary, direction, amount_change, height, allowance
            ),
        )
    }

    pub fn unknown_event_found(node: &str, height: u64, event: &Value) -> Self {
        Alert::new(
            AlertCode::UnknownEventFound,
            node,
            format!("{} found an unknown event at height {}: {}.", node, height, event),
        )
    }

    pub fn node_not_connected_to_api_server(node: &str) -> Self {
        Alert::new(
            AlertCode::NodeNotConnectedToApiServer,
            node,
            format!("{} is not connected to the API server.", node),
        )
    }

    pub fn node_connected_to_api_server_again(node: &str) -> Self {
        Alert::new(
            AlertCode::NodeConnectedToApiServerAgain,
            node,
            format!("{} is connected to the API server again.", node),
        )
    }

    pub fn node_inaccessible_during_startup(node: &str) -> Self {
        Alert::new(
            AlertCode::NodeInaccessibleDuringStartup,
            node,
            format!(
                "{} was not accessible during startup. The node will not be monitored.",
                node
            ),
        )
    }
}
