//! Periodic monitors
//!
//! A [`NodeMonitor`] polls the chain API about one node, a [`SystemMonitor`]
//! scrapes the metrics exporter of one host and a [`GitHubMonitor`] watches
//! the releases of one repository. All are driven by the supervisor, one pass
//! per period.

pub mod github;
pub mod node;
pub mod runner;
pub mod system;

pub use github::GitHubMonitor;
pub use node::NodeMonitor;
pub use system::SystemMonitor;

use crate::api::OasisApi;
use crate::channels::ChannelSet;
use crate::config::StoreConfig;
use crate::store::Store;
use crate::timing::SharedClock;
use std::sync::Arc;

/// Collaborators shared by every monitor
#[derive(Clone)]
pub struct MonitorContext {
    pub api: OasisApi,
    pub channels: Arc<ChannelSet>,
    /// Persistence is disabled when absent
    pub store: Option<Arc<Store>>,
    pub store_config: StoreConfig,
    pub clock: SharedClock,
}
