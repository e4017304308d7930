// File: alerter/src/config/mod.rs
pub mod manager;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;
pub use manager::ConfigManager;

use crate::alerts::{AlertCode, Severity};
use crate::channels::AlertFilter;
use crate::errors::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    pub monitoring_periods: MonitoringPeriods,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub alert_intervals_and_limits: NodeAlertConfig,
    #[serde(default)]
    pub system_intervals_and_limits: SystemAlertConfig,
    #[serde(default)]
    pub periodic_alive_reminder: AliveReminderConfig,
    #[serde(default)]
    pub severities_enabled: SeveritiesEnabled,
    #[serde(default)]
    pub alerts_enabled: HashMap<String, bool>,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub repositories: BTreeMap<String, RepoConfig>,
    // Populated from the files under nodes/
    #[serde(skip)]
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub alerter_name: String,
    pub unique_identifier: String,
    #[serde(default = "default_web_host")]
    pub web_host: String,
    #[serde(default = "default_web_port")]
    pub web_port: u16,
    pub database_path: Option<String>,
    #[serde(default)]
    pub webhook_url: String,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8096
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringPeriods {
    pub node_monitor_period_seconds: u64,
    pub system_monitor_period_seconds: u64,
    pub node_monitor_max_catch_up_blocks: u64,
    #[serde(default = "default_github_monitor_period")]
    pub github_monitor_period_seconds: u64,
}

fn default_github_monitor_period() -> u64 {
    3600
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub node_monitor_alive_key_timeout: u64,
    pub node_monitor_last_height_key_timeout: u64,
    pub system_monitor_alive_key_timeout: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            node_monitor_alive_key_timeout: 86400,
            node_monitor_last_height_key_timeout: 86400,
            system_monitor_alive_key_timeout: 86400,
        }
    }
}

/// Thresholds and intervals driving the node alert rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAlertConfig {
    pub downtime_alert_interval_seconds: u64,
    pub validator_peer_danger_boundary: u64,
    pub validator_peer_safe_boundary: u64,
    pub full_node_peer_danger_boundary: u64,
    pub no_change_in_height_interval_seconds: u64,
    pub no_change_in_height_first_warning_seconds: u64,
    /// In whole tokens, scaled to base units before comparison
    pub change_in_bonded_balance_threshold: u64,
    pub change_in_debonding_balance_threshold: u64,
    pub change_in_shares_balance_threshold: u64,
    pub max_missed_blocks_time_interval_seconds: u64,
    pub max_missed_blocks_in_time_interval: usize,
    pub missed_blocks_danger_boundary: u64,
}

impl Default for NodeAlertConfig {
    fn default() -> Self {
        Self {
            downtime_alert_interval_seconds: 900,
            validator_peer_danger_boundary: 1,
            validator_peer_safe_boundary: 5,
            full_node_peer_danger_boundary: 10,
            no_change_in_height_interval_seconds: 600,
            no_change_in_height_first_warning_seconds: 180,
            change_in_bonded_balance_threshold: 1,
            change_in_debonding_balance_threshold: 1,
            change_in_shares_balance_threshold: 1,
            max_missed_blocks_time_interval_seconds: 120,
            max_missed_blocks_in_time_interval: 10,
            missed_blocks_danger_boundary: 5,
        }
    }
}

/// A `safe < danger` pair of percentage boundaries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub safe: f64,
    pub danger: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBands {
    pub process_memory_usage: Band,
    pub open_file_descriptors: Band,
    pub system_cpu_usage: Band,
    pub system_ram_usage: Band,
    pub system_storage_usage: Band,
}

impl MetricBands {
    fn named(&self) -> [(&'static str, Band); 5] {
        [
            ("process_memory_usage", self.process_memory_usage),
            ("open_file_descriptors", self.open_file_descriptors),
            ("system_cpu_usage", self.system_cpu_usage),
            ("system_ram_usage", self.system_ram_usage),
            ("system_storage_usage", self.system_storage_usage),
        ]
    }
}

impl Default for MetricBands {
    fn default() -> Self {
        let band = Band {
            safe: 85.0,
            danger: 95.0,
        };
        Self {
            process_memory_usage: band,
            open_file_descriptors: band,
            system_cpu_usage: band,
            system_ram_usage: band,
            system_storage_usage: band,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemAlertConfig {
    #[serde(default)]
    pub validator: MetricBands,
    #[serde(default)]
    pub node: MetricBands,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliveReminderConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for AliveReminderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeveritiesEnabled {
    #[serde(rename = "Info", default = "enabled")]
    pub info: bool,
    #[serde(rename = "Warning", default = "enabled")]
    pub warning: bool,
    #[serde(rename = "Critical", default = "enabled")]
    pub critical: bool,
    #[serde(rename = "Error", default = "enabled")]
    pub error: bool,
}

fn enabled() -> bool {
    true
}

impl Default for SeveritiesEnabled {
    fn default() -> Self {
        Self {
            info: true,
            warning: true,
            critical: true,
            error: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(skip)]
    pub name: String,
    pub api_url: String,
    pub chain: String,
    pub is_validator: bool,
    pub node_public_key: String,
    pub staking_address: Option<String>,
    #[serde(default)]
    pub is_archive_node: bool,
    #[serde(default = "enabled")]
    pub monitor_node: bool,
    #[serde(default)]
    pub use_as_data_source: bool,
    pub exporter_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    /// Minimum time between two "cannot access" alerts of one repository
    #[serde(default = "default_github_error_interval")]
    pub error_interval_seconds: u64,
}

fn default_github_api_url() -> String {
    crate::api::github::DEFAULT_API_URL.to_string()
}

fn default_github_error_interval() -> u64 {
    3600
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            error_interval_seconds: default_github_error_interval(),
        }
    }
}

/// A repository whose releases are announced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    #[serde(skip)]
    pub name: String,
    /// `owner/repository`, as in the repository URL
    pub repo_page: String,
    #[serde(default = "enabled")]
    pub monitor_repo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodesConfigFile {
    pub nodes: BTreeMap<String, NodeConfig>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.alert_intervals_and_limits;

        if limits.validator_peer_danger_boundary == 0 {
            return Err(ConfigError::InvalidValue {
                field: "validator_peer_danger_boundary".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if limits.validator_peer_safe_boundary <= limits.validator_peer_danger_boundary {
            return Err(ConfigError::InvalidValue {
                field: "validator_peer_safe_boundary".to_string(),
                reason: format!(
                    "must be greater than validator_peer_danger_boundary ({})",
                    limits.validator_peer_danger_boundary
                ),
            });
        }
        if limits.no_change_in_height_first_warning_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "no_change_in_height_first_warning_seconds".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if limits.no_change_in_height_interval_seconds
            <= limits.no_change_in_height_first_warning_seconds
        {
            return Err(ConfigError::InvalidValue {
                field: "no_change_in_height_interval_seconds".to_string(),
                reason: format!(
                    "must be greater than no_change_in_height_first_warning_seconds ({})",
                    limits.no_change_in_height_first_warning_seconds
                ),
            });
        }

        let system = &self.system_intervals_and_limits;
        for (class, bands) in [("validator", &system.validator), ("node", &system.node)] {
            for (metric, band) in bands.named() {
                if band.danger <= band.safe {
                    return Err(ConfigError::InvalidValue {
                        field: format!("system_intervals_and_limits.{}.{}", class, metric),
                        reason: format!(
                            "danger ({}) must be greater than safe ({})",
                            band.danger, band.safe
                        ),
                    });
                }
            }
        }

        for (name, repo) in &self.repositories {
            let parts: Vec<&str> = repo.repo_page.trim_matches('/').split('/').collect();
            if parts.len() != 2 || parts.iter().any(|p| p.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("repositories.{}.repo_page", name),
                    reason: format!("'{}' is not of the form owner/repository", repo.repo_page),
                });
            }
        }

        for node in &self.nodes {
            if node.is_validator && node.staking_address.is_none() {
                return Err(ConfigError::MissingRequired {
                    field: format!("nodes.{}.staking_address", node.name),
                });
            }
        }

        Ok(())
    }

    /// Repositories flagged for monitoring, in name order
    pub fn monitored_repositories(&self) -> Vec<RepoConfig> {
        self.repositories
            .values()
            .filter(|r| r.monitor_repo)
            .cloned()
            .collect()
    }

    /// Builds the global alert filter, warning about gaps in `[alerts_enabled]`
    pub fn alert_filter(&self) -> AlertFilter {
        for name in self.alerts_enabled.keys() {
            if AlertCode::from_name(name).is_none() {
                warn!("Unknown alert '{}' in [alerts_enabled], ignoring", name);
            }
        }

        let mut disabled_alerts = Vec::new();
        if self.alerts_enabled.is_empty() {
            warn!("No [alerts_enabled] section, all alerts are enabled");
        } else {
            for code in AlertCode::ALL {
                match self.alerts_enabled.get(code.as_str()) {
                    Some(true) => {}
                    Some(false) => disabled_alerts.push(*code),
                    None => {
                        warn!("Alert '{}' missing from [alerts_enabled], enabling it", code);
                    }
                }
            }
        }

        let severities = &self.severities_enabled;
        let disabled_severities = Severity::ALL.into_iter().filter(|s| match s {
            Severity::Info => !severities.info,
            Severity::Warning => !severities.warning,
            Severity::Critical => !severities.critical,
            Severity::Error => !severities.error,
        });

        AlertFilter::new(disabled_alerts, disabled_severities)
    }
}
