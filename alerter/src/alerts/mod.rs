//! Alert objects raised by the state models and monitors
//!
//! Every alert carries a stable [`AlertCode`] used for enabling/disabling it
//! in configuration, the name of the node, system, repository or monitor it
//! originates from and a rendered message.

pub mod github;
pub mod node;
pub mod system;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Warning,
        Severity::Critical,
        Severity::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! alert_codes {
    ($($variant:ident => $name:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum AlertCode {
            $($variant),*
        }

        impl AlertCode {
            pub const ALL: &'static [AlertCode] = &[$(AlertCode::$variant),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(AlertCode::$variant => $name),*
                }
            }

            pub fn from_name(name: &str) -> Option<AlertCode> {
                match name {
                    $($name => Some(AlertCode::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

alert_codes! {
    ExperiencingDelays => "ExperiencingDelaysAlert",
    CannotAccessNode => "CannotAccessNodeAlert",
    StillCannotAccessNode => "StillCannotAccessNodeAlert",
    NowAccessible => "NowAccessibleAlert",
    BondedBalanceIncreased => "BondedBalanceIncreasedAlert",
    BondedBalanceDecreased => "BondedBalanceDecreasedAlert",
    BondedBalanceIncreasedBy => "BondedBalanceIncreasedByAlert",
    BondedBalanceDecreasedBy => "BondedBalanceDecreasedByAlert",
    DebondingBalanceIncreased => "DebondingBalanceIncreasedAlert",
    DebondingBalanceDecreased => "DebondingBalanceDecreasedAlert",
    DebondingBalanceIncreasedBy => "DebondingBalanceIncreasedByAlert",
    DebondingBalanceDecreasedBy => "DebondingBalanceDecreasedByAlert",
    SharesBalanceIncreased => "SharesBalanceIncreasedAlert",
    SharesBalanceDecreased => "SharesBalanceDecreasedAlert",
    SharesBalanceIncreasedBy => "SharesBalanceIncreasedByAlert",
    SharesBalanceDecreasedBy => "SharesBalanceDecreasedByAlert",
    IsSyncing => "IsSyncingAlert",
    IsNoLongerSyncing => "IsNoLongerSyncingAlert",
    PeersIncreased => "PeersIncreasedAlert",
    PeersIncreasedOutsideDangerRange => "PeersIncreasedOutsideDangerRangeAlert",
    PeersIncreasedOutsideSafeRange => "PeersIncreasedOutsideSafeRangeAlert",
    PeersDecreased => "PeersDecreasedAlert",
    VotingPowerIncreased => "VotingPowerIncreasedAlert",
    VotingPowerDecreased => "VotingPowerDecreasedAlert",
    VotingPowerIncreasedBy => "VotingPowerIncreasedByAlert",
    VotingPowerDecreasedBy => "VotingPowerDecreasedByAlert",
    ValidatorIsNowActive => "ValidatorIsNowActiveAlert",
    ValidatorIsNotActive => "ValidatorIsNotActiveAlert",
    MissedBlocks => "MissedBlocksAlert",
    TimedMissedBlocks => "TimedMissedBlocksAlert",
    NoLongerMissingBlocks => "NoLongerMissingBlocksAlert",
    FinalizedHeightDidNotChange => "NodeFinalizedBlockHeightDidNotChangeInAlert",
    FinalizedHeightUpdated => "NodeFinalizedBlockHeightHasNowBeenUpdatedAlert",
    Slashed => "SlashedAlert",
    EscrowAddEventSelfOwner => "EscrowAddEventSelfOwnerAlert",
    EscrowAddEventSelfEscrow => "EscrowAddEventSelfEscrowAlert",
    EscrowReclaimEventSelfOwner => "EscrowReclaimEventSelfOwnerAlert",
    EscrowReclaimEventSelfEscrow => "EscrowReclaimEventSelfEscrowAlert",
    TokensBurned => "TokensBurnedAlert",
    TokensTransferredTo => "TokensTransferedToAlert",
    TokensTransferredFrom => "TokensTransferedFromAlert",
    AllowanceChange => "AllowanceChangeAlert",
    UnknownEventFound => "UnknownEventFoundAlert",
    NodeNotConnectedToApiServer => "NodeWasNotConnectedToApiServerAlert",
    NodeConnectedToApiServerAgain => "NodeConnectedToApiServerAgainAlert",
    NodeInaccessibleDuringStartup => "NodeInaccessibleDuringStartup",
    NewGitHubRelease => "NewGitHubReleaseAlert",
    CannotAccessGitHubPage => "CannotAccessGitHubPageAlert",
    RepoInaccessibleDuringStartup => "RepoInaccessibleDuringStartup",
    ApiIsDown => "ApiIsDownAlert",
    ApiIsUpAgain => "ApiIsUpAgainAlert",
    ErrorWhenReadingData => "ErrorWhenReadingDataFromNode",
    CouldNotFindLiveNodeConnectedToApiServer => "CouldNotFindLiveNodeConnectedToApiServerAlert",
    CouldNotFindLiveArchiveNodeConnectedToApiServer => "CouldNotFindLiveArchiveNodeConnectedToApiServerAlert",
    FoundLiveArchiveNodeAgain => "FoundLiveArchiveNodeAgainAlert",
    TerminatedDueToException => "TerminatedDueToExceptionAlert",
    TerminatedDueToFatalException => "TerminatedDueToFatalExceptionAlert",
    AlerterAlive => "AlerterAliveAlert",
    NewProcessCpuSecondsTotal => "NewProcessCPUSecondsTotalAlert",
    NewVirtualMemoryUsage => "NewVirtualMemoryUsageAlert",
    MemoryUsageIncreased => "MemoryUsageIncreasedAlert",
    MemoryUsageDecreased => "MemoryUsageDecreasedAlert",
    MemoryUsageIncreasedInsideWarningRange => "MemoryUsageIncreasedInsideWarningRangeAlert",
    MemoryUsageIncreasedInsideDangerRange => "MemoryUsageIncreasedInsideDangerRangeAlert",
    OpenFileDescriptorsIncreased => "OpenFileDescriptorsIncreasedAlert",
    OpenFileDescriptorsDecreased => "OpenFileDescriptorsDecreasedAlert",
    OpenFileDescriptorsIncreasedInsideWarningRange => "OpenFileDescriptorsIncreasedInsideWarningRangeAlert",
    OpenFileDescriptorsIncreasedInsideDangerRange => "OpenFileDescriptorsIncreasedInsideDangerRangeAlert",
    SystemCpuUsageIncreased => "SystemCPUUsageIncreasedAlert",
    SystemCpuUsageDecreased => "SystemCPUUsageDecreasedAlert",
    SystemCpuUsageIncreasedInsideWarningRange => "SystemCPUUsageIncreasedInsideWarningRangeAlert",
    SystemCpuUsageIncreasedInsideDangerRange => "SystemCPUUsageIncreasedInsideDangerRangeAlert",
    SystemRamUsageIncreased => "SystemRAMUsageIncreasedAlert",
    SystemRamUsageDecreased => "SystemRAMUsageDecreasedAlert",
    SystemRamUsageIncreasedInsideWarningRange => "SystemRAMUsageIncreasedInsideWarningRangeAlert",
    SystemRamUsageIncreasedInsideDangerRange => "SystemRAMUsageIncreasedInsideDangerRangeAlert",
    SystemStorageUsageIncreased => "SystemStorageUsageIncreasedAlert",
    SystemStorageUsageDecreased => "SystemStorageUsageDecreasedAlert",
    SystemStorageUsageIncreasedInsideWarningRange => "SystemStorageUsageIncreasedInsideWarningRangeAlert",
    SystemStorageUsageIncreasedInsideDangerRange => "SystemStorageUsageIncreasedInsideDangerRangeAlert",
}

impl fmt::Display for AlertCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AlertCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub code: AlertCode,
    pub origin: String,
    pub message: String,
}

impl Alert {
    pub fn new(code: AlertCode, origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub fn api_is_down(monitor: &str) -> Self {
        Alert::new(
            AlertCode::ApiIsDown,
            monitor,
            format!("{}: API server is not reachable.", monitor),
        )
    }

    pub fn api_is_up_again(monitor: &str) -> Self {
        Alert::new(
            AlertCode::ApiIsUpAgain,
            monitor,
            format!("{}: API server is reachable again.", monitor),
        )
    }

    pub fn error_when_reading_data(origin: &str, reason: &str) -> Self {
        Alert::new(
            AlertCode::ErrorWhenReadingData,
            origin,
            format!("Error when reading data from {}: {}.", origin, reason),
        )
    }

    pub fn no_live_node_connected(monitor: &str) -> Self {
        Alert::new(
            AlertCode::CouldNotFindLiveNodeConnectedToApiServer,
            monitor,
            format!(
                "{}: could not find a live node connected with an API server for indirect monitoring.",
                monitor
            ),
        )
    }

    pub fn no_live_archive_node_connected(monitor: &str) -> Self {
        Alert::new(
            AlertCode::CouldNotFindLiveArchiveNodeConnectedToApiServer,
            monitor,
            format!(
                "{}: could not find a live archive node connected with an API server. Archive monitoring is paused.",
                monitor
            ),
        )
    }

    pub fn found_live_archive_node_again(monitor: &str) -> Self {
        Alert::new(
            AlertCode::FoundLiveArchiveNodeAgain,
            monitor,
            format!("{}: found a live archive node again. Archive monitoring resumed.", monitor),
        )
    }

    pub fn terminated_due_to_exception(component: &str, reason: &str) -> Self {
        Alert::new(
            AlertCode::TerminatedDueToException,
            component,
            format!("{} terminated due to exception: {}. Restarting.", component, reason),
        )
    }

    pub fn terminated_due_to_fatal_exception(component: &str, reason: &str) -> Self {
        Alert::new(
            AlertCode::TerminatedDueToFatalException,
            component,
            format!("{} terminated due to fatal exception: {}.", component, reason),
        )
    }

    pub fn alerter_alive(alerter_name: &str) -> Self {
        Alert::new(
            AlertCode::AlerterAlive,
            alerter_name,
            format!("Still running - {}.", alerter_name),
        )
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_codes_round_trip_through_names() {
        for code in AlertCode::ALL {
            assert_eq!(AlertCode::from_name(code.as_str()), Some(*code));
        }
        assert_eq!(AlertCode::from_name("NotARealAlert"), None);
    }

    #[test]
    fn severities_serialize_uppercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }
}
